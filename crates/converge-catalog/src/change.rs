//! Typed schema changes.
//!
//! Each [`Change`] corresponds to exactly one DDL statement. The driver
//! submits changes one at a time, so the engine never needs to parse SQL to
//! know what it did to the catalog.

use crate::{OnDelete, TriggerEvent, TriggerTiming, TypeRef};
use converge_sql as sql;

/// A column as declared in `CREATE TABLE` or `ADD COLUMN`.
///
/// Defaults are never part of the definition; they are set with a separate
/// [`Change::AlterColumnDefault`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub type_ref: TypeRef,
    pub is_not_null: bool,
    /// Default expression, as SQL text.
    pub default: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, type_ref: TypeRef, is_not_null: bool) -> Self {
        Self {
            name: name.into(),
            type_ref,
            is_not_null,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Option<String>) -> Self {
        self.default = default;
        self
    }
}

/// A single DDL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    CreateTable {
        name: String,
        columns: Vec<ColumnDef>,
        is_unlogged: bool,
    },
    DropTable {
        name: String,
    },
    RenameTable {
        name: String,
        new_name: String,
    },
    CommentOnTable {
        name: String,
        comment: Option<String>,
    },

    AddColumn {
        table: String,
        column: ColumnDef,
    },
    DropColumn {
        table: String,
        name: String,
    },
    RenameColumn {
        table: String,
        name: String,
        new_name: String,
    },
    AlterColumnType {
        table: String,
        name: String,
        type_ref: TypeRef,
        /// Conversion expression for `USING`.
        using: Option<String>,
    },
    AlterColumnNotNull {
        table: String,
        name: String,
        is_not_null: bool,
    },
    AlterColumnDefault {
        table: String,
        name: String,
        /// The new default expression; `None` drops the default.
        default: Option<String>,
    },
    CommentOnColumn {
        table: String,
        name: String,
        comment: Option<String>,
    },

    AddUniqueKey {
        table: String,
        name: String,
        columns: Vec<String>,
        is_primary: bool,
    },
    AddForeignKey {
        table: String,
        name: String,
        columns: Vec<String>,
        target_table: String,
        target_columns: Vec<String>,
        on_delete: OnDelete,
    },
    DropConstraint {
        table: String,
        name: String,
    },
    RenameConstraint {
        table: String,
        name: String,
        new_name: String,
    },
    CommentOnConstraint {
        table: String,
        name: String,
        comment: Option<String>,
    },

    CreateEnumType {
        name: String,
        labels: Vec<String>,
    },
    DropType {
        name: String,
    },
    RenameType {
        name: String,
        new_name: String,
    },

    CreateSequence {
        name: String,
        owner: Option<(String, String)>,
    },
    RenameSequence {
        name: String,
        new_name: String,
    },
    DropSequence {
        name: String,
    },

    CreateIndex {
        name: String,
        table: String,
        columns: Vec<String>,
    },
    RenameIndex {
        name: String,
        new_name: String,
    },
    DropIndex {
        name: String,
    },

    CreateFunction {
        name: String,
        return_type: String,
        language: String,
        source: String,
        or_replace: bool,
    },
    RenameFunction {
        name: String,
        new_name: String,
    },
    DropFunction {
        name: String,
    },

    CreateTrigger {
        table: String,
        name: String,
        timing: TriggerTiming,
        event: TriggerEvent,
        procedure: String,
    },
    RenameTrigger {
        table: String,
        name: String,
        new_name: String,
    },
    DropTrigger {
        table: String,
        name: String,
    },
    CommentOnTrigger {
        table: String,
        name: String,
        comment: Option<String>,
    },
}

const NO_ARGS: &[&str] = &[];

impl Change {
    /// Render the statement.
    pub fn to_sql(&self) -> String {
        match self {
            Change::CreateTable {
                name,
                columns,
                is_unlogged,
            } => {
                let definitions: Vec<String> = columns
                    .iter()
                    .map(|c| {
                        sql::define_column(
                            &c.name,
                            &c.type_ref.name,
                            c.is_not_null,
                            c.default.as_deref(),
                        )
                    })
                    .collect();
                sql::create_table(name, &definitions, *is_unlogged)
            }
            Change::DropTable { name } => sql::drop_table(name),
            Change::RenameTable { name, new_name } => sql::rename_table(name, new_name),
            Change::CommentOnTable { name, comment } => {
                sql::comment_on_table(name, comment.as_deref())
            }

            Change::AddColumn { table, column } => sql::add_column(
                table,
                &column.name,
                &column.type_ref.name,
                column.is_not_null,
                column.default.as_deref(),
            ),
            Change::DropColumn { table, name } => sql::drop_column(table, name),
            Change::RenameColumn {
                table,
                name,
                new_name,
            } => sql::rename_column(table, name, new_name),
            Change::AlterColumnType {
                table,
                name,
                type_ref,
                using,
            } => sql::alter_column_type(table, name, &type_ref.name, using.as_deref()),
            Change::AlterColumnNotNull {
                table,
                name,
                is_not_null,
            } => sql::alter_column_not_null(table, name, *is_not_null),
            Change::AlterColumnDefault {
                table,
                name,
                default,
            } => sql::alter_column_default(table, name, default.as_deref()),
            Change::CommentOnColumn {
                table,
                name,
                comment,
            } => sql::comment_on_column(table, name, comment.as_deref()),

            Change::AddUniqueKey {
                table,
                name,
                columns,
                is_primary,
            } => sql::add_unique_constraint(table, name, columns, *is_primary),
            Change::AddForeignKey {
                table,
                name,
                columns,
                target_table,
                target_columns,
                on_delete,
            } => sql::add_foreign_key_constraint(
                table,
                name,
                columns,
                target_table,
                target_columns,
                None,
                Some(on_delete.as_sql()),
            ),
            Change::DropConstraint { table, name } => sql::drop_constraint(table, name),
            Change::RenameConstraint {
                table,
                name,
                new_name,
            } => sql::rename_constraint(table, name, new_name),
            Change::CommentOnConstraint {
                table,
                name,
                comment,
            } => sql::comment_on_constraint(table, name, comment.as_deref()),

            Change::CreateEnumType { name, labels } => sql::create_enum_type(name, labels),
            Change::DropType { name } => sql::drop_type(name),
            Change::RenameType { name, new_name } => sql::rename_type(name, new_name),

            Change::CreateSequence { name, owner } => sql::create_sequence(
                name,
                owner.as_ref().map(|(t, c)| (t.as_str(), c.as_str())),
            ),
            Change::RenameSequence { name, new_name } => sql::rename_sequence(name, new_name),
            Change::DropSequence { name } => sql::drop_sequence(name),

            Change::CreateIndex {
                name,
                table,
                columns,
            } => sql::create_index(name, table, columns),
            Change::RenameIndex { name, new_name } => sql::rename_index(name, new_name),
            Change::DropIndex { name } => sql::drop_index(name),

            Change::CreateFunction {
                name,
                return_type,
                language,
                source,
                or_replace,
            } => sql::create_function(name, NO_ARGS, return_type, language, source, *or_replace),
            Change::RenameFunction { name, new_name } => {
                sql::rename_function(name, NO_ARGS, new_name)
            }
            Change::DropFunction { name } => sql::drop_function(name, NO_ARGS),

            Change::CreateTrigger {
                table,
                name,
                timing,
                event,
                procedure,
            } => sql::create_trigger(
                table,
                name,
                timing.as_sql(),
                event.as_sql(),
                procedure,
                &[],
            ),
            Change::RenameTrigger {
                table,
                name,
                new_name,
            } => sql::rename_trigger(table, name, new_name),
            Change::DropTrigger { table, name } => sql::drop_trigger(table, name),
            Change::CommentOnTrigger {
                table,
                name,
                comment,
            } => sql::comment_on_trigger(table, name, comment.as_deref()),
        }
    }
}

fn comment_summary(comment: &Option<String>) -> &str {
    comment.as_deref().unwrap_or("(none)")
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::CreateTable {
                name, is_unlogged, ..
            } => {
                let unlogged = if *is_unlogged { " (unlogged)" } else { "" };
                write!(f, "+ table {}{}", name, unlogged)
            }
            Change::DropTable { name } => write!(f, "- table {}", name),
            Change::RenameTable { name, new_name } => {
                write!(f, "~ rename table {} -> {}", name, new_name)
            }
            Change::CommentOnTable { name, comment } => {
                write!(f, "~ table {} comment: {}", name, comment_summary(comment))
            }

            Change::AddColumn { table, column } => {
                let nullable = if column.is_not_null { "" } else { " (nullable)" };
                write!(
                    f,
                    "+ column {}.{}: {}{}",
                    table, column.name, column.type_ref, nullable
                )
            }
            Change::DropColumn { table, name } => write!(f, "- column {}.{}", table, name),
            Change::RenameColumn {
                table,
                name,
                new_name,
            } => write!(f, "~ rename column {}.{} -> {}", table, name, new_name),
            Change::AlterColumnType {
                table,
                name,
                type_ref,
                ..
            } => write!(f, "~ column {}.{}: type -> {}", table, name, type_ref),
            Change::AlterColumnNotNull {
                table,
                name,
                is_not_null,
            } => {
                let to = if *is_not_null { "not null" } else { "nullable" };
                write!(f, "~ column {}.{}: {}", table, name, to)
            }
            Change::AlterColumnDefault {
                table,
                name,
                default,
            } => write!(
                f,
                "~ column {}.{} default: {}",
                table,
                name,
                comment_summary(default)
            ),
            Change::CommentOnColumn {
                table,
                name,
                comment,
            } => write!(
                f,
                "~ column {}.{} comment: {}",
                table,
                name,
                comment_summary(comment)
            ),

            Change::AddUniqueKey {
                table,
                name,
                columns,
                is_primary,
            } => {
                let kind = if *is_primary { "PRIMARY KEY" } else { "UNIQUE" };
                write!(
                    f,
                    "+ {} {}.{} ({})",
                    kind,
                    table,
                    name,
                    columns.join(", ")
                )
            }
            Change::AddForeignKey {
                table,
                name,
                columns,
                target_table,
                target_columns,
                on_delete,
            } => write!(
                f,
                "+ FOREIGN KEY {}.{} ({}) -> {}.{} ON DELETE {}",
                table,
                name,
                columns.join(", "),
                target_table,
                target_columns.join(", "),
                on_delete.as_sql()
            ),
            Change::DropConstraint { table, name } => {
                write!(f, "- constraint {}.{}", table, name)
            }
            Change::RenameConstraint {
                table,
                name,
                new_name,
            } => write!(f, "~ rename constraint {}.{} -> {}", table, name, new_name),
            Change::CommentOnConstraint {
                table,
                name,
                comment,
            } => write!(
                f,
                "~ constraint {}.{} comment: {}",
                table,
                name,
                comment_summary(comment)
            ),

            Change::CreateEnumType { name, labels } => {
                write!(f, "+ type {} ({})", name, labels.join(", "))
            }
            Change::DropType { name } => write!(f, "- type {}", name),
            Change::RenameType { name, new_name } => {
                write!(f, "~ rename type {} -> {}", name, new_name)
            }

            Change::CreateSequence { name, owner } => match owner {
                Some((table, column)) => {
                    write!(f, "+ sequence {} owned by {}.{}", name, table, column)
                }
                None => write!(f, "+ sequence {}", name),
            },
            Change::RenameSequence { name, new_name } => {
                write!(f, "~ rename sequence {} -> {}", name, new_name)
            }
            Change::DropSequence { name } => write!(f, "- sequence {}", name),

            Change::CreateIndex {
                name,
                table,
                columns,
            } => write!(f, "+ INDEX {} on {} ({})", name, table, columns.join(", ")),
            Change::RenameIndex { name, new_name } => {
                write!(f, "~ rename index {} -> {}", name, new_name)
            }
            Change::DropIndex { name } => write!(f, "- INDEX {}", name),

            Change::CreateFunction {
                name, or_replace, ..
            } => {
                if *or_replace {
                    write!(f, "~ function {}()", name)
                } else {
                    write!(f, "+ function {}()", name)
                }
            }
            Change::RenameFunction { name, new_name } => {
                write!(f, "~ rename function {}() -> {}", name, new_name)
            }
            Change::DropFunction { name } => write!(f, "- function {}()", name),

            Change::CreateTrigger {
                table,
                name,
                timing,
                event,
                procedure,
            } => write!(
                f,
                "+ trigger {}.{} {} {} -> {}()",
                table,
                name,
                timing.as_sql(),
                event.as_sql(),
                procedure
            ),
            Change::RenameTrigger {
                table,
                name,
                new_name,
            } => write!(f, "~ rename trigger {}.{} -> {}", table, name, new_name),
            Change::DropTrigger { table, name } => write!(f, "- trigger {}.{}", table, name),
            Change::CommentOnTrigger {
                table,
                name,
                comment,
            } => write!(
                f,
                "~ trigger {}.{} comment: {}",
                table,
                name,
                comment_summary(comment)
            ),
        }
    }
}
