use super::{ID, ModelSchema, saved_label, saved_title};
use crate::connection::Connection;
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::meta::Meta;
use crate::names::TableNames;
use converge_catalog::{Change, ColumnDef, ObjectKey, SchemaImage, TypeRef};

#[derive(Debug, Clone, PartialEq)]
pub struct TableModel {
    pub name: String,
    pub label: String,
    pub title: Option<String>,
    pub is_reliable: bool,
    pub uk_name: String,
    pub seq_name: Option<String>,
    comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableState {
    pub label: String,
    pub is_reliable: bool,
    /// `None` means the title derived from the label.
    pub title: Option<String>,
}

/// The name and label of a table, as seen by the models of its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub label: String,
}

impl TableRef {
    pub(crate) fn load(schema: &SchemaImage, name: &str) -> Option<Self> {
        let table = schema.table(name)?;
        let label = Meta::parse(table.comment.as_deref())
            .label
            .unwrap_or_else(|| name.to_string());
        Some(Self {
            name: name.to_string(),
            label,
        })
    }
}

impl TableModel {
    pub(crate) fn recognizes(schema: &SchemaImage, key: &ObjectKey) -> bool {
        matches!(key, ObjectKey::Table(name) if schema.table(name).is_some())
    }

    pub(crate) fn load(schema: &SchemaImage, key: &ObjectKey) -> Result<Self> {
        let name = key.table_name();
        let table = schema
            .table(name)
            .ok_or_else(|| Error::prerequisite("table", name))?;
        let meta = Meta::parse(table.comment.as_deref());
        let label = meta.label.clone().unwrap_or_else(|| name.to_string());

        let uk = table
            .unique_keys
            .values()
            .find(|key| key.columns == [ID])
            .filter(|_| table.column(ID).is_some());
        let Some(uk) = uk else {
            return Err(Error::mismatch(
                "Discovered table without surrogate key",
                &label,
            ));
        };

        Ok(Self {
            name: name.to_string(),
            title: meta.title,
            is_reliable: !table.is_unlogged,
            uk_name: uk.name.clone(),
            seq_name: schema.owned_sequences(name, ID).next().map(|s| s.name.clone()),
            comment: table.comment.clone(),
            label,
        })
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::table(&self.name)
    }

    pub fn state(&self) -> TableState {
        TableState {
            label: self.label.clone(),
            is_reliable: self.is_reliable,
            title: self.title.clone(),
        }
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef {
            name: self.name.clone(),
            label: self.label.clone(),
        }
    }

    /// Referring links of other tables, then the table's own fields, its
    /// identity and its constraints.
    pub(crate) fn dependents(&self, schema: &SchemaImage) -> Vec<ObjectKey> {
        let mut keys: Vec<ObjectKey> = schema
            .referring_foreign_keys(&self.name)
            .into_iter()
            .flat_map(|(origin, fk)| {
                fk.columns
                    .iter()
                    .map(move |column| ObjectKey::column(&origin.name, column))
            })
            .collect();
        let Some(table) = schema.table(&self.name) else {
            return keys;
        };
        keys.extend(
            table
                .columns
                .keys()
                .filter(|name| *name != ID)
                .map(|name| ObjectKey::column(&self.name, name)),
        );
        keys.extend(
            table
                .primary_key()
                .map(|key| ObjectKey::unique_key(&self.name, &key.name)),
        );
        keys.extend(super::constraint_keys(schema, &self.name));
        keys
    }

    pub(crate) fn build<C: Connection>(
        schema: &mut ModelSchema<'_, C>,
        state: &TableState,
    ) -> Result<()> {
        let names = TableNames::new(&state.label);
        schema.submit(Change::CreateTable {
            name: names.name.clone(),
            columns: vec![ColumnDef::new(
                ID,
                TypeRef::system(Domain::Integer.sql_type()),
                true,
            )],
            is_unlogged: !state.is_reliable,
        })?;
        schema.submit(Change::CreateSequence {
            name: names.seq_name.clone(),
            owner: Some((names.name.clone(), ID.to_string())),
        })?;
        schema.submit(Change::AlterColumnDefault {
            table: names.name.clone(),
            name: ID.to_string(),
            default: Some(converge_sql::nextval(&names.seq_name)),
        })?;
        schema.submit(Change::AddUniqueKey {
            table: names.name.clone(),
            name: names.uk_name.clone(),
            columns: vec![ID.to_string()],
            is_primary: false,
        })?;

        let mut meta = Meta::default();
        let changed = meta.set_label(saved_label(&state.label, &names.name))
            | meta.set_title(saved_title(state.title.as_deref(), &names.title));
        if changed {
            schema.submit(Change::CommentOnTable {
                name: names.name,
                comment: meta.dump(),
            })?;
        }
        Ok(())
    }

    pub(crate) fn validate(&self, new: &TableState) -> Result<()> {
        if self.is_reliable != new.is_reliable {
            return Err(Error::mismatch(
                "Discovered table with mismatched reliability mode",
                &self.label,
            ));
        }
        Ok(())
    }

    pub(crate) fn do_modify<C: Connection>(
        self,
        schema: &mut ModelSchema<'_, C>,
        new: &TableState,
    ) -> Result<ObjectKey> {
        let names = TableNames::new(&new.label);
        if self.name != names.name {
            schema.submit(Change::RenameTable {
                name: self.name.clone(),
                new_name: names.name.clone(),
            })?;
        }
        if let Some(seq_name) = &self.seq_name
            && *seq_name != names.seq_name
        {
            schema.submit(Change::RenameSequence {
                name: seq_name.clone(),
                new_name: names.seq_name.clone(),
            })?;
        }
        schema.rename_constraint(&names.name, &self.uk_name, &names.uk_name)?;

        let mut meta = Meta::parse(self.comment.as_deref());
        let changed = meta.set_label(saved_label(&new.label, &names.name))
            | meta.set_title(saved_title(new.title.as_deref(), &names.title));
        if changed {
            schema.submit(Change::CommentOnTable {
                name: names.name.clone(),
                comment: meta.dump(),
            })?;
        }
        Ok(ObjectKey::table(names.name))
    }

    pub(crate) fn do_erase<C: Connection>(&self, schema: &mut ModelSchema<'_, C>) -> Result<()> {
        schema.submit(Change::DropTable {
            name: self.name.clone(),
        })
    }
}
