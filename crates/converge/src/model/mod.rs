//! Models: typed views of the catalog objects the engine manages.
//!
//! A model is a snapshot of one recognized catalog object (a table, a
//! column, a link, an identity or a constraint) taken from the current
//! catalog image, keyed by its [`ObjectKey`]. Models are never mutated in
//! place. [`ModelSchema::modify`] and [`ModelSchema::erase`] consume a model,
//! submit the DDL, and broadcast [`Signal`]s to the models that depend on
//! it in two passes: a before pass, the mutation itself, then an after pass.
//! Dependents are re-resolved from the catalog before each delivery, so a
//! reaction always sees the effects of earlier reactions.

use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::names::{ColumnNames, LinkNames, TableNames};
use converge_catalog::{Change, ObjectKey, OnDelete, SchemaImage};
use std::collections::HashMap;
use std::fmt;

mod column;
mod constraint;
mod identity;
mod link;
mod table;

pub use column::{ColumnModel, ColumnState};
pub use constraint::ConstraintModel;
pub use identity::{IdentityModel, IdentityState};
pub use link::{LinkModel, LinkState};
pub use table::{TableModel, TableRef, TableState};

/// The surrogate key column every managed table has.
pub(crate) const ID: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Table,
    Column,
    Link,
    Identity,
    Constraint,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Model {
    Table(TableModel),
    Column(ColumnModel),
    Link(LinkModel),
    Identity(IdentityModel),
    Constraint(ConstraintModel),
}

/// The logical state of a model: what a fact can ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Table(TableState),
    Column(ColumnState),
    Link(LinkState),
    Identity(IdentityState),
    Constraint,
}

impl State {
    pub fn label(&self) -> Option<&str> {
        match self {
            State::Table(state) => Some(&state.label),
            State::Column(state) => Some(&state.label),
            State::Link(state) => Some(&state.label),
            State::Identity(_) | State::Constraint => None,
        }
    }

    pub fn is_required(&self) -> Option<bool> {
        match self {
            State::Column(state) => Some(state.is_required),
            State::Link(state) => Some(state.is_required),
            _ => None,
        }
    }
}

impl Model {
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Table(_) => ModelKind::Table,
            Model::Column(_) => ModelKind::Column,
            Model::Link(_) => ModelKind::Link,
            Model::Identity(_) => ModelKind::Identity,
            Model::Constraint(_) => ModelKind::Constraint,
        }
    }

    pub fn key(&self) -> ObjectKey {
        match self {
            Model::Table(model) => model.key(),
            Model::Column(model) => model.key(),
            Model::Link(model) => model.key(),
            Model::Identity(model) => model.key(),
            Model::Constraint(model) => model.key(),
        }
    }

    pub fn state(&self) -> State {
        match self {
            Model::Table(model) => State::Table(model.state()),
            Model::Column(model) => State::Column(model.state()),
            Model::Link(model) => State::Link(model.state()),
            Model::Identity(model) => State::Identity(model.state()),
            Model::Constraint(_) => State::Constraint,
        }
    }

    /// Keys of the objects that must hear about changes to this one.
    fn dependents(&self, schema: &SchemaImage) -> Vec<ObjectKey> {
        match self {
            Model::Table(model) => model.dependents(schema),
            Model::Column(model) => field_dependents(schema, &model.table.name, &model.name),
            Model::Link(model) => field_dependents(schema, &model.table.name, &model.name),
            Model::Identity(_) | Model::Constraint(_) => Vec::new(),
        }
    }
}

/// The identity a field belongs to, and the constraints of its table.
fn field_dependents(schema: &SchemaImage, table: &str, column: &str) -> Vec<ObjectKey> {
    let Some(image) = schema.table(table) else {
        return Vec::new();
    };
    let mut keys = Vec::new();
    if let Some(primary_key) = image.primary_key()
        && primary_key.columns.iter().any(|c| c == column)
    {
        keys.push(ObjectKey::unique_key(table, &primary_key.name));
    }
    keys.extend(constraint_keys(schema, table));
    keys
}

fn constraint_keys(schema: &SchemaImage, table: &str) -> Vec<ObjectKey> {
    schema
        .table(table)
        .map(|image| {
            image
                .triggers
                .values()
                .filter(|trigger| trigger.comment.is_some())
                .map(|trigger| ObjectKey::trigger(table, &trigger.name))
                .collect()
        })
        .unwrap_or_default()
}

type Recognizer = fn(&SchemaImage, &ObjectKey) -> bool;

/// Recognizers in order. The predicates are mutually exclusive.
static RECOGNIZERS: &[(ModelKind, Recognizer)] = &[
    (ModelKind::Table, TableModel::recognizes),
    (ModelKind::Column, ColumnModel::recognizes),
    (ModelKind::Link, LinkModel::recognizes),
    (ModelKind::Identity, IdentityModel::recognizes),
    (ModelKind::Constraint, ConstraintModel::recognizes),
];

/// Which kind of model, if any, manages the object named by `key`.
pub fn recognize(schema: &SchemaImage, key: &ObjectKey) -> Option<ModelKind> {
    let mut matches = RECOGNIZERS
        .iter()
        .filter(|(_, recognizes)| recognizes(schema, key))
        .map(|(kind, _)| *kind);
    let kind = matches.next()?;
    if let Some(other) = matches.next() {
        panic!("{key} is recognized as both {kind:?} and {other:?}");
    }
    Some(kind)
}

fn load(schema: &SchemaImage, kind: ModelKind, key: &ObjectKey) -> Result<Model> {
    Ok(match kind {
        ModelKind::Table => Model::Table(TableModel::load(schema, key)?),
        ModelKind::Column => Model::Column(ColumnModel::load(schema, key)?),
        ModelKind::Link => Model::Link(LinkModel::load(schema, key)?),
        ModelKind::Identity => Model::Identity(IdentityModel::load(schema, key)?),
        ModelKind::Constraint => Model::Constraint(ConstraintModel::load(schema, key)?),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Modify,
    Erase,
}

/// A notification sent to dependents around a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub phase: Phase,
    pub action: Action,
}

impl Signal {
    pub const BEFORE_MODIFY: Signal = Signal {
        phase: Phase::Before,
        action: Action::Modify,
    };
    pub const AFTER_MODIFY: Signal = Signal {
        phase: Phase::After,
        action: Action::Modify,
    };
    pub const BEFORE_ERASE: Signal = Signal {
        phase: Phase::Before,
        action: Action::Erase,
    };
    pub const AFTER_ERASE: Signal = Signal {
        phase: Phase::After,
        action: Action::Erase,
    };
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            Phase::Before => "before",
            Phase::After => "after",
        };
        let action = match self.action {
            Action::Modify => "modify",
            Action::Erase => "erase",
        };
        write!(f, "{phase} {action}")
    }
}

/// What a dependent is told about a mutation of its master.
#[derive(Debug, Clone, Copy)]
pub struct Notice<'a> {
    pub signal: Signal,
    /// The master's key: before the mutation in the before pass, after it
    /// in the after pass.
    pub master: &'a ObjectKey,
    pub master_kind: ModelKind,
    pub old: &'a State,
    /// `None` when the master is being erased.
    pub new: Option<&'a State>,
}

impl<'a> Notice<'a> {
    /// The master's new label, if the mutation changes it.
    pub fn new_label(&self) -> Option<&'a str> {
        let new = self.new?.label()?;
        (self.old.label() != Some(new)).then_some(new)
    }

    /// Does the mutation change the type of a master column?
    pub fn changes_type(&self) -> bool {
        match (self.old, self.new) {
            (State::Column(old), Some(State::Column(new))) => old.ty != new.ty,
            _ => false,
        }
    }

    /// Is the master the table called `table`?
    pub fn is_table(&self, table: &str) -> bool {
        self.master_kind == ModelKind::Table && self.master.table_name() == table
    }

    /// Is the master a column or link of the table called `table`?
    /// Returns the column name.
    pub fn field_of(&self, table: &str) -> Option<&'a str> {
        match self.master {
            ObjectKey::Column { table: t, name }
                if t == table
                    && matches!(self.master_kind, ModelKind::Column | ModelKind::Link) =>
            {
                Some(name.as_str())
            }
            _ => None,
        }
    }
}

/// The registry of models over a [`Driver`]'s catalog image.
///
/// Resolved models are cached by key until the driver submits a change.
pub struct ModelSchema<'d, C> {
    driver: &'d mut Driver<C>,
    models: HashMap<ObjectKey, Model>,
    generation: u64,
}

impl<'d, C: Connection> ModelSchema<'d, C> {
    pub fn new(driver: &'d mut Driver<C>) -> Self {
        let generation = driver.generation();
        Self {
            driver,
            models: HashMap::new(),
            generation,
        }
    }

    pub fn image(&mut self) -> Result<&SchemaImage> {
        self.driver.get_schema()
    }

    pub fn submit(&mut self, change: Change) -> Result<()> {
        self.driver.submit(&change)
    }

    /// The model managing the object named by `key`, if any.
    pub fn resolve(&mut self, key: &ObjectKey) -> Result<Option<Model>> {
        if self.driver.generation() != self.generation {
            self.models.clear();
            self.generation = self.driver.generation();
        }
        if let Some(model) = self.models.get(key) {
            return Ok(Some(model.clone()));
        }

        let schema = self.driver.get_schema()?;
        let Some(kind) = recognize(schema, key) else {
            return Ok(None);
        };
        let model = load(schema, kind, key)?;
        self.models.insert(key.clone(), model.clone());
        Ok(Some(model))
    }

    /// Forget an erased model.
    pub(crate) fn detach(&mut self, key: &ObjectKey) {
        self.models.remove(key);
    }

    pub fn table(&mut self, label: &str) -> Result<Option<TableModel>> {
        let key = ObjectKey::table(TableNames::new(label).name);
        Ok(match self.resolve(&key)? {
            Some(Model::Table(table)) => Some(table),
            _ => None,
        })
    }

    /// The table with `label`, or else with the first former label found.
    pub fn find_table(&mut self, label: &str, former: &[String]) -> Result<Option<TableModel>> {
        for label in std::iter::once(label).chain(former.iter().map(String::as_str)) {
            if let Some(table) = self.table(label)? {
                return Ok(Some(table));
            }
        }
        Ok(None)
    }

    pub fn column(&mut self, table: &TableRef, label: &str) -> Result<Option<ColumnModel>> {
        let names = ColumnNames::new(&table.label, label);
        match self.resolve(&ObjectKey::column(&table.name, &names.name))? {
            Some(Model::Column(column)) => Ok(Some(column)),
            Some(Model::Link(link)) => Err(Error::mismatch(
                "Discovered link in place of column",
                format!("{}.{}", table.label, link.label),
            )),
            _ => Ok(None),
        }
    }

    pub fn link(&mut self, table: &TableRef, label: &str) -> Result<Option<LinkModel>> {
        let names = LinkNames::new(&table.label, label);
        match self.resolve(&ObjectKey::column(&table.name, &names.name))? {
            Some(Model::Link(link)) => Ok(Some(link)),
            Some(Model::Column(column)) => Err(Error::mismatch(
                "Discovered column in place of link",
                format!("{}.{}", table.label, column.label),
            )),
            _ => Ok(None),
        }
    }

    /// The primary key of a table.
    pub fn identity(&mut self, table: &TableRef) -> Result<Option<IdentityModel>> {
        let name = self
            .image()?
            .table(&table.name)
            .and_then(|image| image.primary_key())
            .map(|key| key.name.clone());
        let Some(name) = name else {
            return Ok(None);
        };
        Ok(match self.resolve(&ObjectKey::unique_key(&table.name, name))? {
            Some(Model::Identity(identity)) => Some(identity),
            _ => None,
        })
    }

    /// Bring a model to a new state.
    pub fn modify(&mut self, model: Model, new: State) -> Result<()> {
        let old = model.state();
        if old == new {
            return Ok(());
        }
        validate(&model, &new)?;

        let kind = model.kind();
        let master = model.key();
        tracing::debug!(model = %master, "modifying");

        let dependents = self.dependents(&model)?;
        self.broadcast(dependents, Signal::BEFORE_MODIFY, &master, kind, &old, Some(&new))?;

        let Some(model) = self.resolve(&master)? else {
            return Ok(());
        };
        let master = self.do_modify(model, &new)?;

        let Some(model) = self.resolve(&master)? else {
            return Ok(());
        };
        let dependents = self.dependents(&model)?;
        self.broadcast(dependents, Signal::AFTER_MODIFY, &master, kind, &old, Some(&new))
    }

    /// Drop a model and everything that cannot outlive it.
    pub fn erase(&mut self, model: Model) -> Result<()> {
        let old = model.state();
        let kind = model.kind();
        let master = model.key();
        tracing::debug!(model = %master, "erasing");

        let dependents = self.dependents(&model)?;
        self.broadcast(dependents, Signal::BEFORE_ERASE, &master, kind, &old, None)?;

        let Some(model) = self.resolve(&master)? else {
            return Ok(());
        };
        let orphans = self.dependents(&model)?;
        self.do_erase(&model)?;
        self.detach(&master);
        self.broadcast(orphans, Signal::AFTER_ERASE, &master, kind, &old, None)
    }

    fn dependents(&mut self, model: &Model) -> Result<Vec<Model>> {
        let keys = model.dependents(self.image()?);
        let mut dependents = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(dependent) = self.resolve(&key)? {
                dependents.push(dependent);
            }
        }
        Ok(dependents)
    }

    fn broadcast(
        &mut self,
        dependents: Vec<Model>,
        signal: Signal,
        master: &ObjectKey,
        master_kind: ModelKind,
        old: &State,
        new: Option<&State>,
    ) -> Result<()> {
        for dependent in dependents {
            // Erased masters take their dependents' objects with them, so
            // the after-erase pass goes to the snapshots taken beforehand.
            let dependent = if signal == Signal::AFTER_ERASE {
                dependent
            } else {
                match self.resolve(&dependent.key())? {
                    Some(dependent) => dependent,
                    None => continue,
                }
            };
            tracing::trace!(%signal, master = %master, dependent = %dependent.key(), "signal");
            let notice = Notice {
                signal,
                master,
                master_kind,
                old,
                new,
            };
            self.react(dependent, &notice)?;
        }
        Ok(())
    }

    fn do_modify(&mut self, model: Model, new: &State) -> Result<ObjectKey> {
        match (model, new) {
            (Model::Table(model), State::Table(new)) => model.do_modify(self, new),
            (Model::Column(model), State::Column(new)) => model.do_modify(self, new),
            (Model::Link(model), State::Link(new)) => model.do_modify(self, new),
            (Model::Identity(model), State::Identity(new)) => model.do_modify(self, new),
            (model, _) => Err(state_kind_mismatch(&model)),
        }
    }

    fn do_erase(&mut self, model: &Model) -> Result<()> {
        match model {
            Model::Table(model) => model.do_erase(self),
            Model::Column(model) => model.do_erase(self),
            Model::Link(model) => model.do_erase(self),
            Model::Identity(model) => model.do_erase(self),
            Model::Constraint(model) => model.do_erase(self),
        }
    }

    fn react(&mut self, model: Model, notice: &Notice<'_>) -> Result<()> {
        match model {
            Model::Table(_) => Ok(()),
            Model::Column(model) => model.react(self, notice),
            Model::Link(model) => model.react(self, notice),
            Model::Identity(model) => model.react(self, notice),
            Model::Constraint(model) => model.react(self, notice),
        }
    }

    pub(crate) fn rename_column(&mut self, table: &str, name: &str, new_name: &str) -> Result<()> {
        if name == new_name {
            return Ok(());
        }
        self.submit(Change::RenameColumn {
            table: table.to_string(),
            name: name.to_string(),
            new_name: new_name.to_string(),
        })
    }

    pub(crate) fn rename_constraint(
        &mut self,
        table: &str,
        name: &str,
        new_name: &str,
    ) -> Result<()> {
        if name == new_name {
            return Ok(());
        }
        self.submit(Change::RenameConstraint {
            table: table.to_string(),
            name: name.to_string(),
            new_name: new_name.to_string(),
        })
    }

    pub(crate) fn rename_type(&mut self, name: &str, new_name: &str) -> Result<()> {
        if name == new_name {
            return Ok(());
        }
        self.submit(Change::RenameType {
            name: name.to_string(),
            new_name: new_name.to_string(),
        })
    }

    pub(crate) fn rename_index(&mut self, name: &str, new_name: &str) -> Result<()> {
        if name == new_name {
            return Ok(());
        }
        self.submit(Change::RenameIndex {
            name: name.to_string(),
            new_name: new_name.to_string(),
        })
    }

    pub(crate) fn rename_function(&mut self, name: &str, new_name: &str) -> Result<()> {
        if name == new_name {
            return Ok(());
        }
        self.submit(Change::RenameFunction {
            name: name.to_string(),
            new_name: new_name.to_string(),
        })
    }

    pub(crate) fn rename_trigger(&mut self, table: &str, name: &str, new_name: &str) -> Result<()> {
        if name == new_name {
            return Ok(());
        }
        self.submit(Change::RenameTrigger {
            table: table.to_string(),
            name: name.to_string(),
            new_name: new_name.to_string(),
        })
    }

    pub(crate) fn drop_type_if_exists(&mut self, name: &str) -> Result<()> {
        if !self.image()?.types.contains_key(name) {
            return Ok(());
        }
        self.submit(Change::DropType {
            name: name.to_string(),
        })
    }

    pub(crate) fn drop_trigger_if_exists(&mut self, table: &str, name: &str) -> Result<()> {
        let exists = self
            .image()?
            .contains(&ObjectKey::trigger(table, name));
        if !exists {
            return Ok(());
        }
        self.submit(Change::DropTrigger {
            table: table.to_string(),
            name: name.to_string(),
        })
    }

    /// Drop a procedure unless it is missing or some trigger still uses it.
    pub(crate) fn drop_function_if_unused(&mut self, name: &str) -> Result<()> {
        let image = self.image()?;
        let is_used = image
            .tables
            .values()
            .flat_map(|table| table.triggers.values())
            .any(|trigger| trigger.procedure == name);
        if is_used || !image.procedures.contains_key(name) {
            return Ok(());
        }
        self.submit(Change::DropFunction {
            name: name.to_string(),
        })
    }

    /// Re-create a foreign key with a different `ON DELETE` action.
    pub(crate) fn set_on_delete(&mut self, table: &str, name: &str, on_delete: OnDelete) -> Result<()> {
        let fk = self
            .image()?
            .table(table)
            .and_then(|image| image.foreign_keys.get(name))
            .cloned();
        let Some(fk) = fk.filter(|fk| fk.on_delete != on_delete) else {
            return Ok(());
        };
        self.submit(Change::DropConstraint {
            table: table.to_string(),
            name: fk.name.clone(),
        })?;
        self.submit(Change::AddForeignKey {
            table: table.to_string(),
            name: fk.name,
            columns: fk.columns,
            target_table: fk.target_table,
            target_columns: fk.target_columns,
            on_delete,
        })
    }
}

fn validate(model: &Model, new: &State) -> Result<()> {
    match (model, new) {
        (Model::Table(model), State::Table(new)) => model.validate(new),
        (Model::Column(model), State::Column(new)) => model.validate(new),
        (Model::Link(model), State::Link(new)) => model.validate(new),
        (Model::Identity(_), State::Identity(_)) => Ok(()),
        (model, _) => Err(state_kind_mismatch(model)),
    }
}

fn state_kind_mismatch(model: &Model) -> Error {
    Error::mismatch(
        &format!("Got a state of the wrong kind for {:?}", model.kind()),
        model.key(),
    )
}

/// The label to store in metadata: `None` when it is the derived one.
pub(crate) fn saved_label(label: &str, derived: &str) -> Option<String> {
    (label != derived).then(|| label.to_string())
}

/// The title to store in metadata: `None` when it is the derived one.
pub(crate) fn saved_title(title: Option<&str>, derived: &str) -> Option<String> {
    title.filter(|title| *title != derived).map(str::to_string)
}
