use super::{Fact, Location, OneOrMany, check_label, check_labels, check_title, decode, unexpected_clause};
use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::Result;
use crate::model::{Model, ModelSchema, State, TableModel, TableState};
use crate::names::TableNames;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Declares that a table exists (or does not).
#[derive(Debug, Clone, PartialEq)]
pub struct TableFact {
    pub label: String,
    /// Labels the table may still have from an earlier deployment.
    pub former_labels: Vec<String>,
    pub is_reliable: bool,
    /// `None` means the title derived from the label.
    pub title: Option<String>,
    pub is_present: bool,
    pub location: Option<Location>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableSpec {
    table: String,
    was: Option<OneOrMany<String>>,
    reliable: Option<bool>,
    title: Option<String>,
    present: Option<bool>,
}

impl TableFact {
    pub(crate) fn build(value: Value, location: Option<Location>) -> Result<Fact> {
        let spec: TableSpec = decode(value)?;
        check_label(&spec.table)?;
        let former_labels = spec.was.map(OneOrMany::into_vec).unwrap_or_default();
        check_labels(&former_labels)?;
        check_title(spec.title.as_deref())?;

        let is_present = spec.present.unwrap_or(true);
        if !is_present {
            if spec.reliable.is_some() {
                return Err(unexpected_clause("reliable"));
            }
            if spec.title.is_some() {
                return Err(unexpected_clause("title"));
            }
        }

        let names = TableNames::new(&spec.table);
        Ok(Fact::Table(Self {
            title: spec.title.filter(|title| *title != names.title),
            label: spec.table,
            former_labels,
            is_reliable: spec.reliable.unwrap_or(true),
            is_present,
            location,
        }))
    }

    fn state(&self) -> TableState {
        TableState {
            label: self.label.clone(),
            is_reliable: self.is_reliable,
            title: self.title.clone(),
        }
    }

    pub(crate) fn apply<C: Connection>(&self, driver: &mut Driver<C>) -> Result<()> {
        let mut schema = ModelSchema::new(driver);
        let table = schema.find_table(&self.label, &self.former_labels)?;
        match (table, self.is_present) {
            (None, true) => TableModel::build(&mut schema, &self.state()),
            (Some(table), true) => schema.modify(Model::Table(table), State::Table(self.state())),
            (Some(table), false) => schema.erase(Model::Table(table)),
            (None, false) => Ok(()),
        }
    }
}

impl fmt::Display for TableFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table: {}", self.label)?;
        if !self.is_present {
            write!(f, " (absent)")?;
        }
        Ok(())
    }
}
