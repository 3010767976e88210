//! Names derived from labels.
//!
//! A label is the user-facing identifier of a table or field; everything
//! the engine creates in the database is named by mangling labels with a
//! role suffix. Deriving every name from the labels is what lets the engine
//! find its objects again without any bookkeeping tables.

pub use converge_sql::mangle;

/// Turn `date_of_birth` into `Date Of Birth`.
pub fn label_to_title(label: &str) -> String {
    let mut title = String::with_capacity(label.len());
    let mut previous: Option<char> = None;
    for ch in label.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if previous.is_some_and(char::is_alphabetic) {
            title.extend(ch.to_lowercase());
        } else {
            title.extend(ch.to_uppercase());
        }
        previous = Some(ch);
    }
    title
}

/// Recover a link label from its column name: `individual_id` -> `individual`.
pub fn name_to_label(name: &str) -> String {
    match name.strip_suffix("id") {
        Some(stem) if stem.ends_with('_') => stem.trim_end_matches('_').to_string(),
        _ => name.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub label: String,
    pub title: String,
    pub name: String,
    pub uk_name: String,
    pub seq_name: String,
}

impl TableNames {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            title: label_to_title(label),
            name: mangle(&[label], None),
            uk_name: mangle(&[label], Some("uk")),
            seq_name: mangle(&[label], Some("seq")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub label: String,
    pub title: String,
    pub name: String,
    pub enum_name: String,
    pub uk_name: String,
}

impl ColumnNames {
    pub fn new(table_label: &str, label: &str) -> Self {
        Self {
            label: label.to_string(),
            title: label_to_title(label),
            name: mangle(&[label], None),
            enum_name: mangle(&[table_label, label], Some("enum")),
            uk_name: mangle(&[table_label, label], Some("uk")),
        }
    }
}

/// The foreign key and the index over a link column share `fk_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkNames {
    pub label: String,
    pub title: String,
    pub name: String,
    pub fk_name: String,
    pub uk_name: String,
}

impl LinkNames {
    pub fn new(table_label: &str, label: &str) -> Self {
        Self {
            label: label.to_string(),
            title: label_to_title(label),
            name: mangle(&[label], Some("id")),
            fk_name: mangle(&[table_label, label], Some("fk")),
            uk_name: mangle(&[table_label, label], Some("uk")),
        }
    }
}

/// The primary key, its trigger and its trigger procedure share `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityNames {
    pub name: String,
}

impl IdentityNames {
    pub fn new(table_label: &str) -> Self {
        Self {
            name: mangle(&[table_label], Some("pk")),
        }
    }
}
