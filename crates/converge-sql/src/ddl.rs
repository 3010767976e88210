//! DDL statement builders.
//!
//! One function per statement form. Identifiers are always quoted, values
//! are rendered with [`sql_value`](crate::sql_value), and every statement is
//! a single line except `CREATE TABLE`.

use crate::{Ident, SqlValue, quote_idents};

#[cfg(test)]
mod tests;

/// `CREATE [UNLOGGED] TABLE {name} ( {definition}, ... );`
///
/// `definitions` are column definitions as produced by [`define_column`].
pub fn create_table(name: &str, definitions: &[String], is_unlogged: bool) -> String {
    let mut lines = Vec::with_capacity(definitions.len() + 2);
    lines.push(format!(
        "CREATE{} TABLE {} (",
        if is_unlogged { " UNLOGGED" } else { "" },
        Ident(name)
    ));
    for (index, definition) in definitions.iter().enumerate() {
        let comma = if index + 1 < definitions.len() { "," } else { "" };
        lines.push(format!("    {}{}", definition, comma));
    }
    lines.push(");".to_string());
    lines.join("\n")
}

pub fn drop_table(name: &str) -> String {
    format!("DROP TABLE {};", Ident(name))
}

pub fn rename_table(name: &str, new_name: &str) -> String {
    format!("ALTER TABLE {} RENAME TO {};", Ident(name), Ident(new_name))
}

pub fn comment_on_table(name: &str, text: Option<&str>) -> String {
    format!(
        "COMMENT ON TABLE {} IS {};",
        Ident(name),
        SqlValue::from(text.map(str::to_string))
    )
}

/// `{name} {type_name} [NOT NULL] [DEFAULT {default}]`, for the body of
/// `CREATE TABLE` or `ADD COLUMN`.
pub fn define_column(
    name: &str,
    type_name: &str,
    is_not_null: bool,
    default: Option<&str>,
) -> String {
    let mut definition = format!("{} {}", Ident(name), Ident(type_name));
    if is_not_null {
        definition.push_str(" NOT NULL");
    }
    if let Some(default) = default {
        definition.push_str(" DEFAULT ");
        definition.push_str(default);
    }
    definition
}

/// Existing rows receive `default`, which lets a `NOT NULL` column be added
/// to a populated table.
pub fn add_column(
    table_name: &str,
    name: &str,
    type_name: &str,
    is_not_null: bool,
    default: Option<&str>,
) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {};",
        Ident(table_name),
        define_column(name, type_name, is_not_null, default)
    )
}

pub fn drop_column(table_name: &str, name: &str) -> String {
    format!(
        "ALTER TABLE {} DROP COLUMN {};",
        Ident(table_name),
        Ident(name)
    )
}

pub fn rename_column(table_name: &str, name: &str, new_name: &str) -> String {
    format!(
        "ALTER TABLE {} RENAME COLUMN {} TO {};",
        Ident(table_name),
        Ident(name),
        Ident(new_name)
    )
}

/// `ALTER TABLE {table} ALTER COLUMN {name} SET DATA TYPE {type} [USING {expr}];`
pub fn alter_column_type(
    table_name: &str,
    name: &str,
    type_name: &str,
    using: Option<&str>,
) -> String {
    let using = using.map(|expr| format!(" USING {}", expr)).unwrap_or_default();
    format!(
        "ALTER TABLE {} ALTER COLUMN {} SET DATA TYPE {}{};",
        Ident(table_name),
        Ident(name),
        Ident(type_name),
        using
    )
}

pub fn alter_column_not_null(table_name: &str, name: &str, is_not_null: bool) -> String {
    format!(
        "ALTER TABLE {} ALTER COLUMN {} {} NOT NULL;",
        Ident(table_name),
        Ident(name),
        if is_not_null { "SET" } else { "DROP" }
    )
}

/// Set the column default to a SQL expression, or drop it.
pub fn alter_column_default(table_name: &str, name: &str, default: Option<&str>) -> String {
    match default {
        Some(expr) => format!(
            "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {};",
            Ident(table_name),
            Ident(name),
            expr
        ),
        None => format!(
            "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT;",
            Ident(table_name),
            Ident(name)
        ),
    }
}

pub fn comment_on_column(table_name: &str, name: &str, text: Option<&str>) -> String {
    format!(
        "COMMENT ON COLUMN {}.{} IS {};",
        Ident(table_name),
        Ident(name),
        SqlValue::from(text.map(str::to_string))
    )
}

/// `ALTER TABLE {table} ADD CONSTRAINT {name} { UNIQUE | PRIMARY KEY } (...);`
pub fn add_unique_constraint<T: AsRef<str>>(
    table_name: &str,
    name: &str,
    column_names: &[T],
    is_primary: bool,
) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} {} ({});",
        Ident(table_name),
        Ident(name),
        if is_primary { "PRIMARY KEY" } else { "UNIQUE" },
        quote_idents(column_names)
    )
}

pub fn add_foreign_key_constraint<T: AsRef<str>>(
    table_name: &str,
    name: &str,
    column_names: &[T],
    target_table_name: &str,
    target_column_names: &[T],
    on_update: Option<&str>,
    on_delete: Option<&str>,
) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}){}{};",
        Ident(table_name),
        Ident(name),
        quote_idents(column_names),
        Ident(target_table_name),
        quote_idents(target_column_names),
        on_update
            .map(|action| format!(" ON UPDATE {}", action))
            .unwrap_or_default(),
        on_delete
            .map(|action| format!(" ON DELETE {}", action))
            .unwrap_or_default(),
    )
}

pub fn drop_constraint(table_name: &str, name: &str) -> String {
    format!(
        "ALTER TABLE {} DROP CONSTRAINT {};",
        Ident(table_name),
        Ident(name)
    )
}

pub fn rename_constraint(table_name: &str, name: &str, new_name: &str) -> String {
    format!(
        "ALTER TABLE {} RENAME CONSTRAINT {} TO {};",
        Ident(table_name),
        Ident(name),
        Ident(new_name)
    )
}

pub fn comment_on_constraint(table_name: &str, name: &str, text: Option<&str>) -> String {
    format!(
        "COMMENT ON CONSTRAINT {} ON {} IS {};",
        Ident(name),
        Ident(table_name),
        SqlValue::from(text.map(str::to_string))
    )
}

pub fn create_enum_type<T: AsRef<str>>(name: &str, labels: &[T]) -> String {
    let labels = SqlValue::List(
        labels
            .iter()
            .map(|label| SqlValue::from(label.as_ref()))
            .collect(),
    );
    format!("CREATE TYPE {} AS ENUM ({});", Ident(name), labels)
}

pub fn drop_type(name: &str) -> String {
    format!("DROP TYPE {};", Ident(name))
}

pub fn rename_type(name: &str, new_name: &str) -> String {
    format!("ALTER TYPE {} RENAME TO {};", Ident(name), Ident(new_name))
}

pub fn comment_on_type(name: &str, text: Option<&str>) -> String {
    format!(
        "COMMENT ON TYPE {} IS {};",
        Ident(name),
        SqlValue::from(text.map(str::to_string))
    )
}

/// `CREATE SEQUENCE {name} [OWNED BY {table}.{column}];`
pub fn create_sequence(name: &str, owner: Option<(&str, &str)>) -> String {
    match owner {
        Some((table_name, column_name)) => format!(
            "CREATE SEQUENCE {} OWNED BY {}.{};",
            Ident(name),
            Ident(table_name),
            Ident(column_name)
        ),
        None => format!("CREATE SEQUENCE {};", Ident(name)),
    }
}

pub fn rename_sequence(name: &str, new_name: &str) -> String {
    format!(
        "ALTER SEQUENCE {} RENAME TO {};",
        Ident(name),
        Ident(new_name)
    )
}

pub fn drop_sequence(name: &str) -> String {
    format!("DROP SEQUENCE {};", Ident(name))
}

/// The default expression that draws the next value from a sequence.
///
/// ```
/// assert_eq!(
///     converge_sql::nextval("individual_seq"),
///     "nextval('\"individual_seq\"'::regclass)"
/// );
/// ```
pub fn nextval(sequence_name: &str) -> String {
    format!(
        "nextval({}::regclass)",
        SqlValue::from(Ident(sequence_name).to_string())
    )
}

pub fn create_index<T: AsRef<str>>(name: &str, table_name: &str, column_names: &[T]) -> String {
    format!(
        "CREATE INDEX {} ON {} ({});",
        Ident(name),
        Ident(table_name),
        quote_idents(column_names)
    )
}

pub fn rename_index(name: &str, new_name: &str) -> String {
    format!("ALTER INDEX {} RENAME TO {};", Ident(name), Ident(new_name))
}

pub fn drop_index(name: &str) -> String {
    format!("DROP INDEX {};", Ident(name))
}

/// `CREATE [OR REPLACE] FUNCTION {name}({type}, ...) RETURNS {return_type}
/// LANGUAGE {language} AS {source}`
pub fn create_function<T: AsRef<str>>(
    name: &str,
    types: &[T],
    return_type: &str,
    language: &str,
    source: &str,
    or_replace: bool,
) -> String {
    format!(
        "CREATE {}FUNCTION {}({}) RETURNS {} LANGUAGE {} AS {}",
        if or_replace { "OR REPLACE " } else { "" },
        Ident(name),
        quote_idents(types),
        Ident(return_type),
        language,
        SqlValue::from(source)
    )
}

pub fn rename_function<T: AsRef<str>>(name: &str, types: &[T], new_name: &str) -> String {
    format!(
        "ALTER FUNCTION {}({}) RENAME TO {}",
        Ident(name),
        quote_idents(types),
        Ident(new_name)
    )
}

pub fn drop_function<T: AsRef<str>>(name: &str, types: &[T]) -> String {
    format!("DROP FUNCTION {}({})", Ident(name), quote_idents(types))
}

/// `CREATE TRIGGER {name} {when} {event} ON {table} FOR EACH ROW
/// EXECUTE PROCEDURE {function}({argument}, ...)`
pub fn create_trigger(
    table_name: &str,
    name: &str,
    when: &str,
    event: &str,
    function_name: &str,
    arguments: &[SqlValue],
) -> String {
    format!(
        "CREATE TRIGGER {} {} {} ON {} FOR EACH ROW EXECUTE PROCEDURE {}({})",
        Ident(name),
        when,
        event,
        Ident(table_name),
        Ident(function_name),
        SqlValue::List(arguments.to_vec())
    )
}

pub fn rename_trigger(table_name: &str, name: &str, new_name: &str) -> String {
    format!(
        "ALTER TRIGGER {} ON {} RENAME TO {}",
        Ident(name),
        Ident(table_name),
        Ident(new_name)
    )
}

pub fn drop_trigger(table_name: &str, name: &str) -> String {
    format!("DROP TRIGGER {} ON {}", Ident(name), Ident(table_name))
}

pub fn comment_on_trigger(table_name: &str, name: &str, text: Option<&str>) -> String {
    format!(
        "COMMENT ON TRIGGER {} ON {} IS {};",
        Ident(name),
        Ident(table_name),
        SqlValue::from(text.map(str::to_string))
    )
}

/// `CAST({expr} AS {type_name})`
pub fn cast(expr: &str, type_name: &str) -> String {
    format!("CAST({} AS {})", expr, Ident(type_name))
}
