//! Catalog image for converge.
//!
//! A [`Catalog`] is an in-memory mirror of the parts of a Postgres catalog
//! that the engine cares about: schemas, tables with their columns, unique
//! keys, foreign keys and triggers, plus schema-level enum types, sequences,
//! indexes and trigger procedures.
//!
//! Objects are identified structurally, by name within their parent. There
//! are no surrogate ids: an [`ObjectKey`] names a table, or a column, unique
//! key or trigger within a table.
//!
//! Mutations are expressed as [`Change`] values. A change renders to exactly
//! one DDL statement ([`Change::to_sql`]) and can be simulated against an
//! image ([`Catalog::apply`]) with the same preconditions Postgres enforces.

use indexmap::IndexMap;
use std::fmt;

mod apply;
pub use apply::CatalogError;

mod change;
pub use change::{Change, ColumnDef};

#[cfg(test)]
mod tests;

/// The schema that facts are deployed to.
pub const PUBLIC_SCHEMA: &str = "public";

/// The schema holding built-in types.
pub const SYSTEM_SCHEMA: &str = "pg_catalog";

/// Identifies a catalog object by name within its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKey {
    Table(String),
    Column { table: String, name: String },
    UniqueKey { table: String, name: String },
    Trigger { table: String, name: String },
}

impl ObjectKey {
    pub fn table(name: impl Into<String>) -> Self {
        ObjectKey::Table(name.into())
    }

    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Self {
        ObjectKey::Column {
            table: table.into(),
            name: name.into(),
        }
    }

    pub fn unique_key(table: impl Into<String>, name: impl Into<String>) -> Self {
        ObjectKey::UniqueKey {
            table: table.into(),
            name: name.into(),
        }
    }

    pub fn trigger(table: impl Into<String>, name: impl Into<String>) -> Self {
        ObjectKey::Trigger {
            table: table.into(),
            name: name.into(),
        }
    }

    /// The name of the table this object is or belongs to.
    pub fn table_name(&self) -> &str {
        match self {
            ObjectKey::Table(name) => name,
            ObjectKey::Column { table, .. }
            | ObjectKey::UniqueKey { table, .. }
            | ObjectKey::Trigger { table, .. } => table,
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKey::Table(name) => write!(f, "table {}", name),
            ObjectKey::Column { table, name } => write!(f, "column {}.{}", table, name),
            ObjectKey::UniqueKey { table, name } => write!(f, "constraint {}.{}", table, name),
            ObjectKey::Trigger { table, name } => write!(f, "trigger {}.{}", table, name),
        }
    }
}

/// Reference to a type by schema and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub schema: String,
    pub name: String,
}

impl TypeRef {
    /// A built-in type such as `int4` or `text`.
    pub fn system(name: impl Into<String>) -> Self {
        Self {
            schema: SYSTEM_SCHEMA.to_string(),
            name: name.into(),
        }
    }

    /// A type defined in the deployment schema (an enum type).
    pub fn public(name: impl Into<String>) -> Self {
        Self {
            schema: PUBLIC_SCHEMA.to_string(),
            name: name.into(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.schema == SYSTEM_SCHEMA
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Referential action of a foreign key when the referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnDelete {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl OnDelete {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::NoAction => "NO ACTION",
            OnDelete::Restrict => "RESTRICT",
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
            OnDelete::SetDefault => "SET DEFAULT",
        }
    }

    /// Decode `pg_constraint.confdeltype`.
    pub fn from_pg_code(code: &str) -> Option<Self> {
        match code {
            "a" => Some(OnDelete::NoAction),
            "r" => Some(OnDelete::Restrict),
            "c" => Some(OnDelete::Cascade),
            "n" => Some(OnDelete::SetNull),
            "d" => Some(OnDelete::SetDefault),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    Before,
    After,
}

impl TriggerTiming {
    pub fn as_sql(&self) -> &'static str {
        match self {
            TriggerTiming::Before => "BEFORE",
            TriggerTiming::After => "AFTER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

impl TriggerEvent {
    pub fn as_sql(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
        }
    }
}

/// Image of a database catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub schemas: IndexMap<String, SchemaImage>,
}

impl Catalog {
    /// An empty catalog with an empty deployment schema.
    pub fn new() -> Self {
        let mut schemas = IndexMap::new();
        schemas.insert(PUBLIC_SCHEMA.to_string(), SchemaImage::new(PUBLIC_SCHEMA));
        Self { schemas }
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaImage> {
        self.schemas.get(name)
    }

    /// The deployment schema.
    pub fn public(&self) -> Option<&SchemaImage> {
        self.schema(PUBLIC_SCHEMA)
    }
}

/// Image of a schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaImage {
    pub name: String,
    pub tables: IndexMap<String, TableImage>,
    pub types: IndexMap<String, EnumTypeImage>,
    pub sequences: IndexMap<String, SequenceImage>,
    pub indexes: IndexMap<String, IndexImage>,
    pub procedures: IndexMap<String, ProcedureImage>,
}

impl SchemaImage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableImage> {
        self.tables.get(name)
    }

    /// Does the object named by `key` exist?
    pub fn contains(&self, key: &ObjectKey) -> bool {
        let Some(table) = self.table(key.table_name()) else {
            return false;
        };
        match key {
            ObjectKey::Table(_) => true,
            ObjectKey::Column { name, .. } => table.columns.contains_key(name),
            ObjectKey::UniqueKey { name, .. } => table.unique_keys.contains_key(name),
            ObjectKey::Trigger { name, .. } => table.triggers.contains_key(name),
        }
    }

    /// Foreign keys of *other* tables that point at `table`.
    pub fn referring_foreign_keys(&self, table: &str) -> Vec<(&TableImage, &ForeignKeyImage)> {
        self.tables
            .values()
            .filter(|origin| origin.name != table)
            .flat_map(|origin| {
                origin
                    .foreign_keys
                    .values()
                    .filter(|fk| fk.target_table == table)
                    .map(move |fk| (origin, fk))
            })
            .collect()
    }

    /// Sequences owned by a column.
    pub fn owned_sequences<'a>(
        &'a self,
        table: &'a str,
        column: &'a str,
    ) -> impl Iterator<Item = &'a SequenceImage> + 'a {
        self.sequences.values().filter(move |sequence| {
            sequence
                .owner
                .as_ref()
                .is_some_and(|(t, c)| t == table && c == column)
        })
    }

    /// Does a relation (table, sequence, index, or the index backing a
    /// unique key) with this name exist?
    pub fn has_relation(&self, name: &str) -> bool {
        self.tables.contains_key(name)
            || self.sequences.contains_key(name)
            || self.indexes.contains_key(name)
            || self
                .tables
                .values()
                .any(|table| table.unique_keys.contains_key(name))
    }
}

/// Image of a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableImage {
    pub name: String,
    pub is_unlogged: bool,
    pub comment: Option<String>,
    pub columns: IndexMap<String, ColumnImage>,
    pub unique_keys: IndexMap<String, UniqueKeyImage>,
    pub foreign_keys: IndexMap<String, ForeignKeyImage>,
    pub triggers: IndexMap<String, TriggerImage>,
}

impl TableImage {
    pub fn column(&self, name: &str) -> Option<&ColumnImage> {
        self.columns.get(name)
    }

    pub fn primary_key(&self) -> Option<&UniqueKeyImage> {
        self.unique_keys.values().find(|key| key.is_primary)
    }

    /// The first non-primary unique key over exactly this one column.
    pub fn unique_key_of(&self, column: &str) -> Option<&UniqueKeyImage> {
        self.unique_keys
            .values()
            .find(|key| !key.is_primary && key.columns.len() == 1 && key.columns[0] == column)
    }

    /// Foreign keys that include this column.
    pub fn foreign_keys_of(&self, column: &str) -> Vec<&ForeignKeyImage> {
        self.foreign_keys
            .values()
            .filter(|fk| fk.columns.iter().any(|c| c == column))
            .collect()
    }

    pub fn has_constraint(&self, name: &str) -> bool {
        self.unique_keys.contains_key(name) || self.foreign_keys.contains_key(name)
    }
}

/// Image of a column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnImage {
    pub name: String,
    pub type_ref: TypeRef,
    pub is_not_null: bool,
    /// The default expression, as SQL text.
    pub default: Option<String>,
    pub comment: Option<String>,
}

/// Image of a `UNIQUE` or `PRIMARY KEY` constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueKeyImage {
    pub name: String,
    pub columns: Vec<String>,
    pub is_primary: bool,
    pub comment: Option<String>,
}

/// Image of a `FOREIGN KEY` constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyImage {
    pub name: String,
    pub columns: Vec<String>,
    pub target_table: String,
    pub target_columns: Vec<String>,
    pub on_delete: OnDelete,
}

/// Image of a row-level trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerImage {
    pub name: String,
    pub timing: TriggerTiming,
    pub event: TriggerEvent,
    pub procedure: String,
    pub comment: Option<String>,
}

/// Image of an enum type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumTypeImage {
    pub name: String,
    pub labels: Vec<String>,
}

/// Image of a sequence, with its owning column if any.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceImage {
    pub name: String,
    pub owner: Option<(String, String)>,
}

/// Image of an index that does not back a constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexImage {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
}

/// Image of an argument-less stored procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureImage {
    pub name: String,
    pub return_type: String,
    pub language: String,
    pub source: String,
}
