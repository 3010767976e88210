use super::{Fact, Location, decode, qualify};
use crate::connection::Connection;
use crate::domain::Generator;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::model::{IdentityModel, IdentityState, Model, ModelSchema, State};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Declares the primary key of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityFact {
    pub table_label: String,
    /// Labels of the key fields (columns or links), in order.
    pub fields: Vec<String>,
    /// One entry per field.
    pub generators: Vec<Option<Generator>>,
    pub location: Option<Location>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IdentitySpec {
    identity: Vec<FieldSpec>,
    of: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldSpec {
    Plain(String),
    Generated(BTreeMap<String, Generator>),
}

impl IdentityFact {
    pub(crate) fn build(value: Value, location: Option<Location>) -> Result<Fact> {
        let spec: IdentitySpec = decode(value)?;
        if spec.identity.is_empty() {
            return Err(Error::specification("Got empty identity"));
        }

        let mut table_label = spec.of;
        let mut fields = Vec::with_capacity(spec.identity.len());
        let mut generators = Vec::with_capacity(spec.identity.len());
        for field in spec.identity {
            let (label, generator) = match field {
                FieldSpec::Plain(label) => (label, None),
                FieldSpec::Generated(map) => {
                    let mut entries = map.into_iter();
                    match (entries.next(), entries.next()) {
                        (Some((label, generator)), None) => (label, Some(generator)),
                        _ => {
                            return Err(Error::specification(
                                "Expected a single field with its generator",
                            ));
                        }
                    }
                }
            };
            let (table, label) = qualify(&label, table_label.as_deref())?;
            if fields.contains(&label) {
                return Err(Error::specification(format!("Got duplicate field: {label}")));
            }
            table_label = Some(table);
            fields.push(label);
            generators.push(generator);
        }

        let Some(table_label) = table_label else {
            return Err(Error::specification("Got missing table name"));
        };
        Ok(Fact::Identity(Self {
            table_label,
            fields,
            generators,
            location,
        }))
    }

    pub(crate) fn apply<C: Connection>(&self, driver: &mut Driver<C>) -> Result<()> {
        let mut schema = ModelSchema::new(driver);
        let Some(table) = schema.table(&self.table_label)? else {
            return Err(Error::prerequisite("table", &self.table_label));
        };
        let table = table.table_ref();

        let mut columns = Vec::with_capacity(self.fields.len());
        for label in &self.fields {
            let name = match schema.column(&table, label)? {
                Some(column) => column.name,
                None => match schema.link(&table, label)? {
                    Some(link) => link.name,
                    None => {
                        return Err(Error::prerequisite(
                            "field",
                            format!("{}.{}", self.table_label, label),
                        ));
                    }
                },
            };
            columns.push(name);
        }

        let state = IdentityState {
            fields: columns,
            generators: self.generators.clone(),
        };
        match schema.identity(&table)? {
            Some(identity) => schema.modify(Model::Identity(identity), State::Identity(state)),
            None => IdentityModel::build(&mut schema, &table, &state),
        }
    }
}

impl fmt::Display for IdentityFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "identity: {}(", self.table_label)?;
        for (index, (field, generator)) in self.fields.iter().zip(&self.generators).enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
            if let Some(generator) = generator {
                write!(f, ": {generator}")?;
            }
        }
        write!(f, ")")
    }
}
