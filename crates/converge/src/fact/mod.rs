//! Facts: declarations of desired schema state.
//!
//! A fact is built from one mapping of a specification document. The kind
//! is the single discriminant key present in the mapping (`table`, `column`,
//! `link` or `identity`); `include` is a parse-time directive handled by the
//! [`Driver`](crate::Driver).

use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::{Error, Result};
use camino::Utf8PathBuf;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

mod column;
mod identity;
mod link;
mod table;

pub use column::ColumnFact;
pub use identity::IdentityFact;
pub use link::LinkFact;
pub use table::TableFact;


pub(crate) const INCLUDE: &str = "include";

/// Where a fact came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: Option<Utf8PathBuf>,
    /// Position of the fact in its document, starting at 1.
    pub index: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}, fact #{}", path, self.index),
            None => write!(f, "fact #{}", self.index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    Table(TableFact),
    Column(ColumnFact),
    Link(LinkFact),
    Identity(IdentityFact),
}

impl Fact {
    /// The discriminant key of the fact kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Fact::Table(_) => "table",
            Fact::Column(_) => "column",
            Fact::Link(_) => "link",
            Fact::Identity(_) => "identity",
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            Fact::Table(fact) => fact.location.as_ref(),
            Fact::Column(fact) => fact.location.as_ref(),
            Fact::Link(fact) => fact.location.as_ref(),
            Fact::Identity(fact) => fact.location.as_ref(),
        }
    }

    /// Reconcile the database with this fact.
    pub fn apply<C: Connection>(&self, driver: &mut Driver<C>) -> Result<()> {
        match self {
            Fact::Table(fact) => fact.apply(driver),
            Fact::Column(fact) => fact.apply(driver),
            Fact::Link(fact) => fact.apply(driver),
            Fact::Identity(fact) => fact.apply(driver),
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::Table(fact) => fmt::Display::fmt(fact, f),
            Fact::Column(fact) => fmt::Display::fmt(fact, f),
            Fact::Link(fact) => fmt::Display::fmt(fact, f),
            Fact::Identity(fact) => fmt::Display::fmt(fact, f),
        }
    }
}

struct FactKind {
    key: &'static str,
    build: fn(Value, Option<Location>) -> Result<Fact>,
}

static FACT_KINDS: &[FactKind] = &[
    FactKind {
        key: "table",
        build: TableFact::build,
    },
    FactKind {
        key: "column",
        build: ColumnFact::build,
    },
    FactKind {
        key: "link",
        build: LinkFact::build,
    },
    FactKind {
        key: "identity",
        build: IdentityFact::build,
    },
];

/// Build a fact from one mapping of a specification document.
pub fn build(value: &Value, location: Location) -> Result<Fact> {
    let Value::Object(map) = value else {
        return Err(Error::specification(format!("Expected a fact, got {value}"))
            .wrap("While parsing:", &location));
    };

    let mut kinds = FACT_KINDS.iter().filter(|kind| map.contains_key(kind.key));
    let (Some(kind), None) = (kinds.next(), kinds.next()) else {
        let keys: Vec<&str> = FACT_KINDS.iter().map(|kind| kind.key).collect();
        return Err(Error::specification(format!(
            "Expected exactly one of: {}, {INCLUDE}",
            keys.join(", ")
        ))
        .wrap("While parsing:", &location));
    };

    (kind.build)(value.clone(), Some(location.clone()))
        .map_err(|e| e.wrap(format!("While parsing {} fact:", kind.key), &location))
}

/// Decode a fact mapping into its typed specification.
fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::specification(e.to_string()))
}

/// A value given either alone or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

fn check_label(label: &str) -> Result<()> {
    let mut chars = label.chars();
    let is_valid = chars
        .next()
        .is_some_and(|first| first.is_ascii_lowercase() || first == '_')
        && chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_');
    if !is_valid {
        return Err(Error::specification(format!("Got ill-formed label: {label:?}")));
    }
    Ok(())
}

fn check_labels(labels: &[String]) -> Result<()> {
    labels.iter().try_for_each(|label| check_label(label))
}

fn check_title(title: Option<&str>) -> Result<()> {
    match title {
        Some(title) if title.is_empty() || title.trim() != title => Err(Error::specification(
            format!("Got ill-formed title: {title:?}"),
        )),
        _ => Ok(()),
    }
}

/// Split `table.label` (or a bare `label` with `of: table`) into the table
/// label and the field label.
fn qualify(label: &str, of: Option<&str>) -> Result<(String, String)> {
    let (table, label) = match label.split_once('.') {
        Some((table, label)) => {
            if of.is_some_and(|of| of != table) {
                return Err(Error::specification(format!(
                    "Got mismatched table names: {table}, {}",
                    of.unwrap_or_default()
                )));
            }
            (table, label)
        }
        None => match of {
            Some(of) => (of, label),
            None => {
                return Err(Error::specification(format!(
                    "Got missing table name: {label}"
                )));
            }
        },
    };
    check_label(table)?;
    check_label(label)?;
    Ok((table.to_string(), label.to_string()))
}

fn unexpected_clause(clause: &str) -> Error {
    Error::specification(format!("Got unexpected clause: {clause}"))
}

fn missing_clause(clause: &str) -> Error {
    Error::specification(format!("Got missing clause: {clause}"))
}
