use super::{
    Fact, Location, OneOrMany, check_label, check_labels, check_title, decode, qualify,
    unexpected_clause,
};
use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::model::{LinkModel, LinkState, Model, ModelSchema, State};
use crate::names::LinkNames;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Declares a column referencing another table.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkFact {
    pub table_label: String,
    pub label: String,
    pub former_labels: Vec<String>,
    pub target_label: String,
    pub is_required: bool,
    pub is_unique: bool,
    pub title: Option<String>,
    pub is_present: bool,
    pub location: Option<Location>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LinkSpec {
    link: String,
    of: Option<String>,
    was: Option<OneOrMany<String>>,
    to: Option<String>,
    required: Option<bool>,
    unique: Option<bool>,
    title: Option<String>,
    present: Option<bool>,
}

impl LinkFact {
    pub(crate) fn build(value: Value, location: Option<Location>) -> Result<Fact> {
        let spec: LinkSpec = decode(value)?;
        let (table_label, label) = qualify(&spec.link, spec.of.as_deref())?;
        let former_labels = spec.was.map(OneOrMany::into_vec).unwrap_or_default();
        check_labels(&former_labels)?;
        check_title(spec.title.as_deref())?;
        if let Some(target) = &spec.to {
            check_label(target)?;
        }

        let is_present = spec.present.unwrap_or(true);
        if !is_present {
            let clauses = [
                ("to", spec.to.is_some()),
                ("required", spec.required.is_some()),
                ("unique", spec.unique.is_some()),
                ("title", spec.title.is_some()),
            ];
            if let Some((clause, _)) = clauses.iter().find(|(_, given)| *given) {
                return Err(unexpected_clause(clause));
            }
        }

        let names = LinkNames::new(&table_label, &label);
        Ok(Fact::Link(Self {
            target_label: spec.to.unwrap_or_else(|| label.clone()),
            title: spec.title.filter(|title| *title != names.title),
            table_label,
            label,
            former_labels,
            is_required: spec.required.unwrap_or(true),
            is_unique: spec.unique.unwrap_or(false),
            is_present,
            location,
        }))
    }

    pub(crate) fn apply<C: Connection>(&self, driver: &mut Driver<C>) -> Result<()> {
        let mut schema = ModelSchema::new(driver);
        let Some(table) = schema.table(&self.table_label)? else {
            if !self.is_present {
                return Ok(());
            }
            return Err(Error::prerequisite("table", &self.table_label));
        };
        let table = table.table_ref();

        let mut link = None;
        for label in std::iter::once(&self.label).chain(&self.former_labels) {
            link = schema.link(&table, label)?;
            if link.is_some() {
                break;
            }
        }

        if !self.is_present {
            return match link {
                Some(link) => schema.erase(Model::Link(link)),
                None => Ok(()),
            };
        }

        let Some(target) = schema.table(&self.target_label)? else {
            return Err(Error::prerequisite("table", &self.target_label));
        };
        let state = LinkState {
            label: self.label.clone(),
            target: self.target_label.clone(),
            is_required: self.is_required,
            is_unique: self.is_unique,
            title: self.title.clone(),
        };
        match link {
            Some(link) => schema.modify(Model::Link(link), State::Link(state)),
            None => {
                if schema.column(&table, &self.label)?.is_some() {
                    return Err(Error::mismatch(
                        "Discovered column with the same label",
                        format!("{}.{}", self.table_label, self.label),
                    ));
                }
                LinkModel::build(&mut schema, &table, &target.table_ref(), &state)
            }
        }
    }
}

impl fmt::Display for LinkFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link: {}.{}", self.table_label, self.label)?;
        if self.is_present {
            write!(f, " -> {}", self.target_label)
        } else {
            write!(f, " (absent)")
        }
    }
}
