use super::{
    Fact, Location, OneOrMany, check_labels, check_title, decode, missing_clause, qualify,
    unexpected_clause,
};
use crate::connection::Connection;
use crate::domain::{ColumnDefault, ColumnType, Domain};
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::model::{ColumnModel, ColumnState, Model, ModelSchema, State};
use crate::names::ColumnNames;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Declares a regular column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFact {
    pub table_label: String,
    pub label: String,
    pub former_labels: Vec<String>,
    /// Always set when the column is present.
    pub ty: Option<ColumnType>,
    pub default: Option<ColumnDefault>,
    pub is_required: bool,
    pub is_unique: bool,
    pub title: Option<String>,
    pub is_present: bool,
    pub location: Option<Location>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColumnSpec {
    column: String,
    of: Option<String>,
    was: Option<OneOrMany<String>>,
    #[serde(rename = "type")]
    ty: Option<TypeSpec>,
    default: Option<Value>,
    required: Option<bool>,
    unique: Option<bool>,
    title: Option<String>,
    present: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TypeSpec {
    Domain(String),
    Enum(Vec<String>),
}

impl TypeSpec {
    fn into_column_type(self) -> Result<ColumnType> {
        match self {
            TypeSpec::Domain(name) => Domain::from_name(&name)
                .map(ColumnType::Domain)
                .ok_or_else(|| Error::specification(format!("Got unknown type: {name}"))),
            TypeSpec::Enum(labels) => {
                if labels.is_empty() {
                    return Err(Error::specification("Got empty enum type"));
                }
                for (index, label) in labels.iter().enumerate() {
                    if label.is_empty() {
                        return Err(Error::specification("Got empty enum label"));
                    }
                    if labels[..index].contains(label) {
                        return Err(Error::specification(format!(
                            "Got duplicate enum label: {label}"
                        )));
                    }
                }
                Ok(ColumnType::Enum(labels))
            }
        }
    }
}

impl ColumnFact {
    pub(crate) fn build(value: Value, location: Option<Location>) -> Result<Fact> {
        let spec: ColumnSpec = decode(value)?;
        let (table_label, label) = qualify(&spec.column, spec.of.as_deref())?;
        let former_labels = spec.was.map(OneOrMany::into_vec).unwrap_or_default();
        check_labels(&former_labels)?;
        check_title(spec.title.as_deref())?;

        let is_present = spec.present.unwrap_or(true);
        if !is_present {
            let clauses = [
                ("type", spec.ty.is_some()),
                ("default", spec.default.is_some()),
                ("required", spec.required.is_some()),
                ("unique", spec.unique.is_some()),
                ("title", spec.title.is_some()),
            ];
            if let Some((clause, _)) = clauses.iter().find(|(_, given)| *given) {
                return Err(unexpected_clause(clause));
            }
            return Ok(Fact::Column(Self {
                table_label,
                label,
                former_labels,
                ty: None,
                default: None,
                is_required: false,
                is_unique: false,
                title: None,
                is_present,
                location,
            }));
        }

        let ty = spec
            .ty
            .ok_or_else(|| missing_clause("type"))?
            .into_column_type()?;
        let default = match &spec.default {
            Some(raw) => ColumnDefault::from_value(&ty, raw)
                .map_err(|e| Error::specification(format!("Got invalid default: {e}")))?,
            None => None,
        };
        let names = ColumnNames::new(&table_label, &label);
        Ok(Fact::Column(Self {
            title: spec.title.filter(|title| *title != names.title),
            table_label,
            label,
            former_labels,
            ty: Some(ty),
            default,
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

        let mut column = None;
        for label in std::iter::once(&self.label).chain(&self.former_labels) {
            column = schema.column(&table, label)?;
            if column.is_some() {
                break;
            }
        }

        if !self.is_present {
            return match column {
                Some(column) => schema.erase(Model::Column(column)),
                None => Ok(()),
            };
        }

        let Some(ty) = &self.ty else {
            return Err(missing_clause("type"));
        };
        let state = ColumnState {
            label: self.label.clone(),
            ty: ty.clone(),
            default: self.default.as_ref().map(|default| default.canonical.clone()),
            is_required: self.is_required,
            is_unique: self.is_unique,
            title: self.title.clone(),
        };
        match column {
            Some(column) => schema.modify(Model::Column(column), State::Column(state)),
            None => {
                if schema.link(&table, &self.label)?.is_some() {
                    return Err(Error::mismatch(
                        "Discovered link with the same label",
                        format!("{}.{}", self.table_label, self.label),
                    ));
                }
                ColumnModel::build(&mut schema, &table, &state)
            }
        }
    }
}

impl fmt::Display for ColumnFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column: {}.{}", self.table_label, self.label)?;
        match &self.ty {
            Some(ty) => write!(f, " ({ty})"),
            None => write!(f, " (absent)"),
        }
    }
}
