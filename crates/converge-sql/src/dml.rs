//! Data statement builders.

use crate::{Ident, SqlValue, quote_idents};

/// `SELECT {name}, ... FROM {table};`
pub fn select<T: AsRef<str>>(table_name: &str, names: &[T]) -> String {
    format!("SELECT {}\n    FROM {};", quote_idents(names), Ident(table_name))
}

/// `INSERT INTO {table} ({name}, ...) VALUES ({value}, ...) RETURNING ...;`
///
/// With no values, inserts `DEFAULT VALUES`.
pub fn insert<T: AsRef<str>>(
    table_name: &str,
    names: &[T],
    values: &[SqlValue],
    returning_names: &[T],
) -> String {
    let mut lines = Vec::new();
    if names.is_empty() {
        lines.push(format!("INSERT INTO {}", Ident(table_name)));
    } else {
        lines.push(format!(
            "INSERT INTO {} ({})",
            Ident(table_name),
            quote_idents(names)
        ));
    }
    if values.is_empty() {
        lines.push("    DEFAULT VALUES".to_string());
    } else {
        lines.push(format!("    VALUES ({})", SqlValue::List(values.to_vec())));
    }
    if !returning_names.is_empty() {
        lines.push(format!("    RETURNING {}", quote_idents(returning_names)));
    }
    lines.join("\n") + ";"
}

/// `UPDATE {table} SET {name} = {value}, ... WHERE {key} = {key_value} RETURNING ...;`
///
/// An update with nothing to set rewrites the key to itself, so the
/// statement still locks and returns the row.
pub fn update<T: AsRef<str>>(
    table_name: &str,
    key_name: &str,
    key_value: &SqlValue,
    assignments: &[(T, SqlValue)],
    returning_names: &[T],
) -> String {
    let set = if assignments.is_empty() {
        format!("{} = {}", Ident(key_name), key_value)
    } else {
        assignments
            .iter()
            .map(|(name, value)| format!("{} = {}", Ident(name.as_ref()), value))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut lines = vec![
        format!("UPDATE {}", Ident(table_name)),
        format!("    SET {}", set),
        format!("    WHERE {} = {}", Ident(key_name), key_value),
    ];
    if !returning_names.is_empty() {
        lines.push(format!("    RETURNING {}", quote_idents(returning_names)));
    }
    lines.join("\n") + ";"
}

/// `DELETE FROM {table} WHERE {key} = {key_value};`
pub fn delete(table_name: &str, key_name: &str, key_value: &SqlValue) -> String {
    format!(
        "DELETE FROM {}\n    WHERE {} = {};",
        Ident(table_name),
        Ident(key_name),
        key_value
    )
}
