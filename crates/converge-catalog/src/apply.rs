//! Simulating changes against a catalog image.
//!
//! [`Catalog::apply`] mutates the image the way Postgres would mutate its
//! catalog for the same statement, and rejects the statement where Postgres
//! would: missing objects, name collisions, and drops that would orphan a
//! dependent object.

use crate::{
    Catalog, Change, ColumnImage, EnumTypeImage, ForeignKeyImage, IndexImage, PUBLIC_SCHEMA,
    ProcedureImage, SchemaImage, SequenceImage, TableImage, TriggerImage, TypeRef, UniqueKeyImage,
};
use indexmap::IndexMap;

/// Errors that can occur while simulating a change.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// The catalog has no deployment schema.
    SchemaNotFound { change: String, schema: String },
    /// A change requires a table that doesn't exist.
    TableNotFound { change: String, table: String },
    /// A change requires a column that doesn't exist.
    ColumnNotFound {
        change: String,
        table: String,
        column: String,
    },
    /// A change requires a column to NOT exist, but it does.
    ColumnAlreadyExists {
        change: String,
        table: String,
        column: String,
    },
    /// A change requires a constraint that doesn't exist.
    ConstraintNotFound {
        change: String,
        table: String,
        name: String,
    },
    /// A change requires a constraint to NOT exist, but it does.
    ConstraintAlreadyExists {
        change: String,
        table: String,
        name: String,
    },
    /// Some other object (type, sequence, index, function, trigger) is missing.
    ObjectNotFound {
        change: String,
        kind: &'static str,
        name: String,
    },
    /// Some other object with this name already exists.
    ObjectAlreadyExists {
        change: String,
        kind: &'static str,
        name: String,
    },
    /// The object cannot be dropped because another object depends on it.
    DependentObjects {
        change: String,
        name: String,
        dependent: String,
    },
    /// A foreign key targets columns that carry no unique constraint.
    NoUniqueConstraint {
        change: String,
        table: String,
        columns: Vec<String>,
    },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::SchemaNotFound { change, schema } => {
                write!(f, "{}: schema '{}' does not exist", change, schema)
            }
            CatalogError::TableNotFound { change, table } => {
                write!(f, "{}: table '{}' does not exist", change, table)
            }
            CatalogError::ColumnNotFound {
                change,
                table,
                column,
            } => {
                write!(f, "{}: column '{}.{}' does not exist", change, table, column)
            }
            CatalogError::ColumnAlreadyExists {
                change,
                table,
                column,
            } => {
                write!(f, "{}: column '{}.{}' already exists", change, table, column)
            }
            CatalogError::ConstraintNotFound {
                change,
                table,
                name,
            } => write!(
                f,
                "{}: constraint '{}' of table '{}' does not exist",
                change, name, table
            ),
            CatalogError::ConstraintAlreadyExists {
                change,
                table,
                name,
            } => write!(
                f,
                "{}: constraint '{}' of table '{}' already exists",
                change, name, table
            ),
            CatalogError::ObjectNotFound { change, kind, name } => {
                write!(f, "{}: {} '{}' does not exist", change, kind, name)
            }
            CatalogError::ObjectAlreadyExists { change, kind, name } => {
                write!(f, "{}: {} '{}' already exists", change, kind, name)
            }
            CatalogError::DependentObjects {
                change,
                name,
                dependent,
            } => write!(
                f,
                "{}: cannot drop '{}' because {} depends on it",
                change, name, dependent
            ),
            CatalogError::NoUniqueConstraint {
                change,
                table,
                columns,
            } => write!(
                f,
                "{}: there is no unique constraint matching given keys for referenced table '{}' ({})",
                change,
                table,
                columns.join(", ")
            ),
        }
    }
}

impl std::error::Error for CatalogError {}

impl Catalog {
    /// Apply a change to the deployment schema of this image.
    ///
    /// On error the image is left untouched.
    pub fn apply(&mut self, change: &Change) -> Result<(), CatalogError> {
        let change_desc = format!("{}", change);
        let Some(schema) = self.schemas.get_mut(PUBLIC_SCHEMA) else {
            return Err(CatalogError::SchemaNotFound {
                change: change_desc,
                schema: PUBLIC_SCHEMA.to_string(),
            });
        };
        Simulator {
            schema,
            change: change_desc,
        }
        .apply(change)
    }
}

struct Simulator<'a> {
    schema: &'a mut SchemaImage,
    change: String,
}

impl Simulator<'_> {
    fn table_not_found(&self, table: &str) -> CatalogError {
        CatalogError::TableNotFound {
            change: self.change.clone(),
            table: table.to_string(),
        }
    }

    fn column_not_found(&self, table: &str, column: &str) -> CatalogError {
        CatalogError::ColumnNotFound {
            change: self.change.clone(),
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    fn constraint_not_found(&self, table: &str, name: &str) -> CatalogError {
        CatalogError::ConstraintNotFound {
            change: self.change.clone(),
            table: table.to_string(),
            name: name.to_string(),
        }
    }

    fn not_found(&self, kind: &'static str, name: &str) -> CatalogError {
        CatalogError::ObjectNotFound {
            change: self.change.clone(),
            kind,
            name: name.to_string(),
        }
    }

    fn already_exists(&self, kind: &'static str, name: &str) -> CatalogError {
        CatalogError::ObjectAlreadyExists {
            change: self.change.clone(),
            kind,
            name: name.to_string(),
        }
    }

    fn dependent(&self, name: &str, dependent: String) -> CatalogError {
        CatalogError::DependentObjects {
            change: self.change.clone(),
            name: name.to_string(),
            dependent,
        }
    }

    fn table(&self, name: &str) -> Result<&TableImage, CatalogError> {
        self.schema
            .tables
            .get(name)
            .ok_or_else(|| self.table_not_found(name))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut TableImage, CatalogError> {
        let missing = self.table_not_found(name);
        self.schema.tables.get_mut(name).ok_or(missing)
    }

    fn column_mut(&mut self, table: &str, name: &str) -> Result<&mut ColumnImage, CatalogError> {
        let missing = self.column_not_found(table, name);
        self.table_mut(table)?.columns.get_mut(name).ok_or(missing)
    }

    fn check_columns(&self, table: &str, columns: &[String]) -> Result<(), CatalogError> {
        let image = self.table(table)?;
        for column in columns {
            if !image.columns.contains_key(column) {
                return Err(self.column_not_found(table, column));
            }
        }
        Ok(())
    }

    fn check_relation_free(&self, name: &str) -> Result<(), CatalogError> {
        if self.schema.has_relation(name) {
            return Err(self.already_exists("relation", name));
        }
        Ok(())
    }

    fn check_type(&self, type_ref: &TypeRef) -> Result<(), CatalogError> {
        if !type_ref.is_system() && !self.schema.types.contains_key(&type_ref.name) {
            return Err(self.not_found("type", &type_ref.name));
        }
        Ok(())
    }

    /// Describe the first foreign key that references `table.column`, not
    /// counting keys of `table` that include the column themselves.
    fn foreign_keys_onto(&self, table: &str, column: &str) -> Option<String> {
        self.schema.tables.values().find_map(|origin| {
            origin
                .foreign_keys
                .values()
                .find(|fk| {
                    fk.target_table == table
                        && fk.target_columns.iter().any(|c| c == column)
                        && !(origin.name == table && fk.columns.iter().any(|c| c == column))
                })
                .map(|fk| format!("constraint '{}' of table '{}'", fk.name, origin.name))
        })
    }

    fn apply(mut self, change: &Change) -> Result<(), CatalogError> {
        match change {
            Change::CreateTable {
                name,
                columns,
                is_unlogged,
            } => {
                self.check_relation_free(name)?;
                let mut images = IndexMap::new();
                for column in columns {
                    self.check_type(&column.type_ref)?;
                    if images.contains_key(&column.name) {
                        return Err(CatalogError::ColumnAlreadyExists {
                            change: self.change.clone(),
                            table: name.clone(),
                            column: column.name.clone(),
                        });
                    }
                    images.insert(
                        column.name.clone(),
                        ColumnImage {
                            name: column.name.clone(),
                            type_ref: column.type_ref.clone(),
                            is_not_null: column.is_not_null,
                            default: column.default.clone(),
                            comment: None,
                        },
                    );
                }
                self.schema.tables.insert(
                    name.clone(),
                    TableImage {
                        name: name.clone(),
                        is_unlogged: *is_unlogged,
                        columns: images,
                        ..Default::default()
                    },
                );
            }

            Change::DropTable { name } => {
                self.table(name)?;
                if let Some((origin, fk)) = self.schema.referring_foreign_keys(name).first() {
                    let dependent = format!("constraint '{}' of table '{}'", fk.name, origin.name);
                    return Err(self.dependent(name, dependent));
                }
                self.schema.tables.shift_remove(name);
                self.schema
                    .sequences
                    .retain(|_, s| !s.owner.as_ref().is_some_and(|(t, _)| t == name));
                self.schema.indexes.retain(|_, i| &i.table != name);
            }

            Change::RenameTable { name, new_name } => {
                self.table(name)?;
                self.check_relation_free(new_name)?;
                if let Some(mut table) = self.schema.tables.shift_remove(name) {
                    table.name = new_name.clone();
                    self.schema.tables.insert(new_name.clone(), table);
                }
                for table in self.schema.tables.values_mut() {
                    for fk in table.foreign_keys.values_mut() {
                        if &fk.target_table == name {
                            fk.target_table = new_name.clone();
                        }
                    }
                }
                for index in self.schema.indexes.values_mut() {
                    if &index.table == name {
                        index.table = new_name.clone();
                    }
                }
                for sequence in self.schema.sequences.values_mut() {
                    if let Some((table, _)) = &mut sequence.owner {
                        if table == name {
                            *table = new_name.clone();
                        }
                    }
                }
            }

            Change::CommentOnTable { name, comment } => {
                self.table_mut(name)?.comment = comment.clone();
            }

            Change::AddColumn { table, column } => {
                self.check_type(&column.type_ref)?;
                if self.table(table)?.columns.contains_key(&column.name) {
                    return Err(CatalogError::ColumnAlreadyExists {
                        change: self.change.clone(),
                        table: table.clone(),
                        column: column.name.clone(),
                    });
                }
                self.table_mut(table)?.columns.insert(
                    column.name.clone(),
                    ColumnImage {
                        name: column.name.clone(),
                        type_ref: column.type_ref.clone(),
                        is_not_null: column.is_not_null,
                        default: column.default.clone(),
                        comment: None,
                    },
                );
            }

            Change::DropColumn { table, name } => {
                self.check_columns(table, std::slice::from_ref(name))?;
                if let Some(dependent) = self.foreign_keys_onto(table, name) {
                    return Err(self.dependent(name, dependent));
                }
                let image = self.table_mut(table)?;
                image.columns.shift_remove(name);
                image
                    .unique_keys
                    .retain(|_, k| !k.columns.iter().any(|c| c == name));
                image
                    .foreign_keys
                    .retain(|_, k| !k.columns.iter().any(|c| c == name));
                self.schema
                    .indexes
                    .retain(|_, i| !(&i.table == table && i.columns.iter().any(|c| c == name)));
                self.schema.sequences.retain(|_, s| {
                    !s.owner
                        .as_ref()
                        .is_some_and(|(t, c)| t == table && c == name)
                });
            }

            Change::RenameColumn {
                table,
                name,
                new_name,
            } => {
                self.check_columns(table, std::slice::from_ref(name))?;
                if self.table(table)?.columns.contains_key(new_name) {
                    return Err(CatalogError::ColumnAlreadyExists {
                        change: self.change.clone(),
                        table: table.clone(),
                        column: new_name.clone(),
                    });
                }
                let rename = |columns: &mut Vec<String>| {
                    for column in columns.iter_mut() {
                        if column == name {
                            *column = new_name.clone();
                        }
                    }
                };
                let image = self.table_mut(table)?;
                let columns = std::mem::take(&mut image.columns);
                image.columns = columns
                    .into_iter()
                    .map(|(key, mut column)| {
                        if &key == name {
                            column.name = new_name.clone();
                            (new_name.clone(), column)
                        } else {
                            (key, column)
                        }
                    })
                    .collect();
                for key in image.unique_keys.values_mut() {
                    rename(&mut key.columns);
                }
                for fk in image.foreign_keys.values_mut() {
                    rename(&mut fk.columns);
                }
                for origin in self.schema.tables.values_mut() {
                    for fk in origin.foreign_keys.values_mut() {
                        if &fk.target_table == table {
                            rename(&mut fk.target_columns);
                        }
                    }
                }
                for index in self.schema.indexes.values_mut() {
                    if &index.table == table {
                        rename(&mut index.columns);
                    }
                }
                for sequence in self.schema.sequences.values_mut() {
                    if let Some((t, c)) = &mut sequence.owner {
                        if t == table && c == name {
                            *c = new_name.clone();
                        }
                    }
                }
            }

            Change::AlterColumnType {
                table,
                name,
                type_ref,
                ..
            } => {
                self.check_type(type_ref)?;
                self.column_mut(table, name)?.type_ref = type_ref.clone();
            }

            Change::AlterColumnNotNull {
                table,
                name,
                is_not_null,
            } => {
                if !is_not_null {
                    let in_primary_key = self
                        .table(table)?
                        .primary_key()
                        .filter(|pk| pk.columns.iter().any(|c| c == name))
                        .map(|pk| pk.name.clone());
                    if let Some(pk) = in_primary_key {
                        return Err(CatalogError::DependentObjects {
                            change: self.change.clone(),
                            name: name.clone(),
                            dependent: format!("primary key '{}'", pk),
                        });
                    }
                }
                self.column_mut(table, name)?.is_not_null = *is_not_null;
            }

            Change::AlterColumnDefault {
                table,
                name,
                default,
            } => {
                self.column_mut(table, name)?.default = default.clone();
            }

            Change::CommentOnColumn {
                table,
                name,
                comment,
            } => {
                self.column_mut(table, name)?.comment = comment.clone();
            }

            Change::AddUniqueKey {
                table,
                name,
                columns,
                is_primary,
            } => {
                self.check_columns(table, columns)?;
                if self.table(table)?.has_constraint(name) {
                    return Err(CatalogError::ConstraintAlreadyExists {
                        change: self.change.clone(),
                        table: table.clone(),
                        name: name.clone(),
                    });
                }
                self.check_relation_free(name)?;
                if *is_primary {
                    if let Some(existing) = self.table(table)?.primary_key() {
                        return Err(CatalogError::ConstraintAlreadyExists {
                            change: self.change.clone(),
                            table: table.clone(),
                            name: existing.name.clone(),
                        });
                    }
                }
                let image = self.table_mut(table)?;
                if *is_primary {
                    for column in columns {
                        if let Some(column) = image.columns.get_mut(column) {
                            column.is_not_null = true;
                        }
                    }
                }
                image.unique_keys.insert(
                    name.clone(),
                    UniqueKeyImage {
                        name: name.clone(),
                        columns: columns.clone(),
                        is_primary: *is_primary,
                        comment: None,
                    },
                );
            }

            Change::AddForeignKey {
                table,
                name,
                columns,
                target_table,
                target_columns,
                on_delete,
            } => {
                self.check_columns(table, columns)?;
                self.check_columns(target_table, target_columns)?;
                if self.table(table)?.has_constraint(name) {
                    return Err(CatalogError::ConstraintAlreadyExists {
                        change: self.change.clone(),
                        table: table.clone(),
                        name: name.clone(),
                    });
                }
                let has_unique = self
                    .table(target_table)?
                    .unique_keys
                    .values()
                    .any(|key| &key.columns == target_columns);
                if !has_unique {
                    return Err(CatalogError::NoUniqueConstraint {
                        change: self.change.clone(),
                        table: target_table.clone(),
                        columns: target_columns.clone(),
                    });
                }
                self.table_mut(table)?.foreign_keys.insert(
                    name.clone(),
                    ForeignKeyImage {
                        name: name.clone(),
                        columns: columns.clone(),
                        target_table: target_table.clone(),
                        target_columns: target_columns.clone(),
                        on_delete: *on_delete,
                    },
                );
            }

            Change::DropConstraint { table, name } => {
                let image = self.table(table)?;
                if let Some(key) = image.unique_keys.get(name) {
                    let dependent = self.schema.tables.values().find_map(|origin| {
                        origin
                            .foreign_keys
                            .values()
                            .find(|fk| &fk.target_table == table && fk.target_columns == key.columns)
                            .map(|fk| format!("constraint '{}' of table '{}'", fk.name, origin.name))
                    });
                    if let Some(dependent) = dependent {
                        return Err(self.dependent(name, dependent));
                    }
                    self.table_mut(table)?.unique_keys.shift_remove(name);
                } else if image.foreign_keys.contains_key(name) {
                    self.table_mut(table)?.foreign_keys.shift_remove(name);
                } else {
                    return Err(self.constraint_not_found(table, name));
                }
            }

            Change::RenameConstraint {
                table,
                name,
                new_name,
            } => {
                let image = self.table(table)?;
                if !image.has_constraint(name) {
                    return Err(self.constraint_not_found(table, name));
                }
                if image.has_constraint(new_name) {
                    return Err(CatalogError::ConstraintAlreadyExists {
                        change: self.change.clone(),
                        table: table.clone(),
                        name: new_name.clone(),
                    });
                }
                let is_unique = image.unique_keys.contains_key(name);
                if is_unique {
                    self.check_relation_free(new_name)?;
                }
                let image = self.table_mut(table)?;
                if is_unique {
                    if let Some(mut key) = image.unique_keys.shift_remove(name) {
                        key.name = new_name.clone();
                        image.unique_keys.insert(new_name.clone(), key);
                    }
                } else if let Some(mut fk) = image.foreign_keys.shift_remove(name) {
                    fk.name = new_name.clone();
                    image.foreign_keys.insert(new_name.clone(), fk);
                }
            }

            Change::CommentOnConstraint {
                table,
                name,
                comment,
            } => {
                let missing = self.constraint_not_found(table, name);
                let key = self
                    .table_mut(table)?
                    .unique_keys
                    .get_mut(name)
                    .ok_or(missing)?;
                key.comment = comment.clone();
            }

            Change::CreateEnumType { name, labels } => {
                if self.schema.types.contains_key(name) {
                    return Err(self.already_exists("type", name));
                }
                self.schema.types.insert(
                    name.clone(),
                    EnumTypeImage {
                        name: name.clone(),
                        labels: labels.clone(),
                    },
                );
            }

            Change::DropType { name } => {
                if !self.schema.types.contains_key(name) {
                    return Err(self.not_found("type", name));
                }
                let type_ref = TypeRef::public(name.clone());
                let dependent = self.schema.tables.values().find_map(|table| {
                    table
                        .columns
                        .values()
                        .find(|c| c.type_ref == type_ref)
                        .map(|c| format!("column '{}.{}'", table.name, c.name))
                });
                if let Some(dependent) = dependent {
                    return Err(self.dependent(name, dependent));
                }
                self.schema.types.shift_remove(name);
            }

            Change::RenameType { name, new_name } => {
                if !self.schema.types.contains_key(name) {
                    return Err(self.not_found("type", name));
                }
                if self.schema.types.contains_key(new_name) {
                    return Err(self.already_exists("type", new_name));
                }
                if let Some(mut image) = self.schema.types.shift_remove(name) {
                    image.name = new_name.clone();
                    self.schema.types.insert(new_name.clone(), image);
                }
                let old = TypeRef::public(name.clone());
                for table in self.schema.tables.values_mut() {
                    for column in table.columns.values_mut() {
                        if column.type_ref == old {
                            column.type_ref = TypeRef::public(new_name.clone());
                        }
                    }
                }
            }

            Change::CreateSequence { name, owner } => {
                self.check_relation_free(name)?;
                if let Some((table, column)) = owner {
                    self.check_columns(table, std::slice::from_ref(column))?;
                }
                self.schema.sequences.insert(
                    name.clone(),
                    SequenceImage {
                        name: name.clone(),
                        owner: owner.clone(),
                    },
                );
            }

            Change::RenameSequence { name, new_name } => {
                if !self.schema.sequences.contains_key(name) {
                    return Err(self.not_found("sequence", name));
                }
                self.check_relation_free(new_name)?;
                if let Some(mut sequence) = self.schema.sequences.shift_remove(name) {
                    sequence.name = new_name.clone();
                    self.schema.sequences.insert(new_name.clone(), sequence);
                }
            }

            Change::DropSequence { name } => {
                if self.schema.sequences.shift_remove(name).is_none() {
                    return Err(self.not_found("sequence", name));
                }
            }

            Change::CreateIndex {
                name,
                table,
                columns,
            } => {
                self.check_columns(table, columns)?;
                self.check_relation_free(name)?;
                self.schema.indexes.insert(
                    name.clone(),
                    IndexImage {
                        name: name.clone(),
                        table: table.clone(),
                        columns: columns.clone(),
                    },
                );
            }

            Change::RenameIndex { name, new_name } => {
                if !self.schema.indexes.contains_key(name) {
                    return Err(self.not_found("index", name));
                }
                self.check_relation_free(new_name)?;
                if let Some(mut index) = self.schema.indexes.shift_remove(name) {
                    index.name = new_name.clone();
                    self.schema.indexes.insert(new_name.clone(), index);
                }
            }

            Change::DropIndex { name } => {
                if self.schema.indexes.shift_remove(name).is_none() {
                    return Err(self.not_found("index", name));
                }
            }

            Change::CreateFunction {
                name,
                return_type,
                language,
                source,
                or_replace,
            } => {
                if !or_replace && self.schema.procedures.contains_key(name) {
                    return Err(self.already_exists("function", name));
                }
                self.schema.procedures.insert(
                    name.clone(),
                    ProcedureImage {
                        name: name.clone(),
                        return_type: return_type.clone(),
                        language: language.clone(),
                        source: source.clone(),
                    },
                );
            }

            Change::RenameFunction { name, new_name } => {
                if !self.schema.procedures.contains_key(name) {
                    return Err(self.not_found("function", name));
                }
                if self.schema.procedures.contains_key(new_name) {
                    return Err(self.already_exists("function", new_name));
                }
                if let Some(mut procedure) = self.schema.procedures.shift_remove(name) {
                    procedure.name = new_name.clone();
                    self.schema.procedures.insert(new_name.clone(), procedure);
                }
                for table in self.schema.tables.values_mut() {
                    for trigger in table.triggers.values_mut() {
                        if &trigger.procedure == name {
                            trigger.procedure = new_name.clone();
                        }
                    }
                }
            }

            Change::DropFunction { name } => {
                if !self.schema.procedures.contains_key(name) {
                    return Err(self.not_found("function", name));
                }
                let dependent = self.schema.tables.values().find_map(|table| {
                    table
                        .triggers
                        .values()
                        .find(|t| &t.procedure == name)
                        .map(|t| format!("trigger '{}' on table '{}'", t.name, table.name))
                });
                if let Some(dependent) = dependent {
                    return Err(self.dependent(name, dependent));
                }
                self.schema.procedures.shift_remove(name);
            }

            Change::CreateTrigger {
                table,
                name,
                timing,
                event,
                procedure,
            } => {
                if !self.schema.procedures.contains_key(procedure) {
                    return Err(self.not_found("function", procedure));
                }
                if self.table(table)?.triggers.contains_key(name) {
                    return Err(self.already_exists("trigger", name));
                }
                self.table_mut(table)?.triggers.insert(
                    name.clone(),
                    TriggerImage {
                        name: name.clone(),
                        timing: *timing,
                        event: *event,
                        procedure: procedure.clone(),
                        comment: None,
                    },
                );
            }

            Change::RenameTrigger {
                table,
                name,
                new_name,
            } => {
                let image = self.table(table)?;
                if !image.triggers.contains_key(name) {
                    return Err(self.not_found("trigger", name));
                }
                if image.triggers.contains_key(new_name) {
                    return Err(self.already_exists("trigger", new_name));
                }
                let image = self.table_mut(table)?;
                if let Some(mut trigger) = image.triggers.shift_remove(name) {
                    trigger.name = new_name.clone();
                    image.triggers.insert(new_name.clone(), trigger);
                }
            }

            Change::DropTrigger { table, name } => {
                let missing = self.not_found("trigger", name);
                self.table_mut(table)?
                    .triggers
                    .shift_remove(name)
                    .ok_or(missing)?;
            }

            Change::CommentOnTrigger {
                table,
                name,
                comment,
            } => {
                let missing = self.not_found("trigger", name);
                let trigger = self
                    .table_mut(table)?
                    .triggers
                    .get_mut(name)
                    .ok_or(missing)?;
                trigger.comment = comment.clone();
            }
        }
        Ok(())
    }
}
