use super::{ID, Model, ModelSchema, Notice, Signal, State, TableRef, saved_label, saved_title};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::meta::Meta;
use crate::names::{LinkNames, name_to_label};
use converge_catalog::{Change, ColumnDef, ObjectKey, OnDelete, SchemaImage};

/// A column referencing the surrogate key of another table.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkModel {
    pub table: TableRef,
    pub name: String,
    pub label: String,
    pub target: TableRef,
    pub is_required: bool,
    pub is_unique: bool,
    pub title: Option<String>,
    pub fk_name: String,
    pub index_name: Option<String>,
    pub uk_name: Option<String>,
    comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkState {
    pub label: String,
    /// Label of the target table.
    pub target: String,
    pub is_required: bool,
    pub is_unique: bool,
    pub title: Option<String>,
}

impl LinkModel {
    pub(crate) fn recognizes(schema: &SchemaImage, key: &ObjectKey) -> bool {
        let ObjectKey::Column { table, name } = key else {
            return false;
        };
        schema.table(table).is_some_and(|table| {
            name != ID && table.column(name).is_some() && !table.foreign_keys_of(name).is_empty()
        })
    }

    pub(crate) fn load(schema: &SchemaImage, key: &ObjectKey) -> Result<Self> {
        let ObjectKey::Column { table, name } = key else {
            return Err(Error::prerequisite("link", key.to_string()));
        };
        let table_ref = TableRef::load(schema, table).ok_or_else(|| Error::prerequisite("table", table))?;
        let image = schema.table(table).ok_or_else(|| Error::prerequisite("table", table))?;
        let column = image
            .column(name)
            .ok_or_else(|| Error::prerequisite("link", key.to_string()))?;
        let meta = Meta::parse(column.comment.as_deref());
        let label = meta.label.clone().unwrap_or_else(|| name_to_label(name));

        let Some(fk) = image.foreign_keys_of(name).into_iter().next() else {
            return Err(Error::prerequisite("foreign key", key.to_string()));
        };
        let Some(target) = TableRef::load(schema, &fk.target_table) else {
            return Err(Error::mismatch(
                "Discovered link with unrecognized target",
                &label,
            ));
        };
        let index_name = schema
            .indexes
            .get(&fk.name)
            .filter(|index| index.table == *table)
            .map(|index| index.name.clone());
        let uk_name = image.unique_key_of(name).map(|key| key.name.clone());

        Ok(Self {
            table: table_ref,
            name: name.clone(),
            target,
            is_required: column.is_not_null,
            is_unique: uk_name.is_some(),
            title: meta.title,
            fk_name: fk.name.clone(),
            index_name,
            uk_name,
            comment: column.comment.clone(),
            label,
        })
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::column(&self.table.name, &self.name)
    }

    pub fn state(&self) -> LinkState {
        LinkState {
            label: self.label.clone(),
            target: self.target.label.clone(),
            is_required: self.is_required,
            is_unique: self.is_unique,
            title: self.title.clone(),
        }
    }

    pub(crate) fn build<C: Connection>(
        schema: &mut ModelSchema<'_, C>,
        table: &TableRef,
        target: &TableRef,
        state: &LinkState,
    ) -> Result<()> {
        let names = LinkNames::new(&table.label, &state.label);
        let type_ref = schema
            .image()?
            .table(&target.name)
            .and_then(|image| image.column(ID))
            .map(|column| column.type_ref.clone())
            .ok_or_else(|| {
                Error::mismatch("Discovered table without surrogate key", &target.label)
            })?;

        schema.submit(Change::AddColumn {
            table: table.name.clone(),
            column: ColumnDef::new(&names.name, type_ref, state.is_required),
        })?;
        schema.submit(Change::AddForeignKey {
            table: table.name.clone(),
            name: names.fk_name.clone(),
            columns: vec![names.name.clone()],
            target_table: target.name.clone(),
            target_columns: vec![ID.to_string()],
            on_delete: OnDelete::SetDefault,
        })?;
        if state.is_unique {
            schema.submit(Change::AddUniqueKey {
                table: table.name.clone(),
                name: names.uk_name.clone(),
                columns: vec![names.name.clone()],
                is_primary: false,
            })?;
        } else {
            schema.submit(Change::CreateIndex {
                name: names.fk_name.clone(),
                table: table.name.clone(),
                columns: vec![names.name.clone()],
            })?;
        }

        let mut meta = Meta::default();
        let changed = meta.set_label(saved_label(&state.label, &name_to_label(&names.name)))
            | meta.set_title(saved_title(state.title.as_deref(), &names.title));
        if changed {
            schema.submit(Change::CommentOnColumn {
                table: table.name.clone(),
                name: names.name,
                comment: meta.dump(),
            })?;
        }
        Ok(())
    }

    pub(crate) fn validate(&self, new: &LinkState) -> Result<()> {
        if self.target.label != new.target {
            return Err(Error::mismatch(
                "Discovered link with mismatched target",
                format!("{}.{}", self.table.label, self.label),
            ));
        }
        Ok(())
    }

    pub(crate) fn do_modify<C: Connection>(
        self,
        schema: &mut ModelSchema<'_, C>,
        new: &LinkState,
    ) -> Result<ObjectKey> {
        let table = self.table.name.clone();
        let names = LinkNames::new(&self.table.label, &new.label);
        schema.rename_column(&table, &self.name, &names.name)?;
        schema.rename_constraint(&table, &self.fk_name, &names.fk_name)?;
        if let Some(index_name) = &self.index_name {
            schema.rename_index(index_name, &names.fk_name)?;
        }
        if let Some(uk_name) = &self.uk_name {
            schema.rename_constraint(&table, uk_name, &names.uk_name)?;
        }

        if self.is_required != new.is_required {
            schema.submit(Change::AlterColumnNotNull {
                table: table.clone(),
                name: names.name.clone(),
                is_not_null: new.is_required,
            })?;
        }
        if new.is_unique {
            if self.index_name.is_some() {
                schema.submit(Change::DropIndex {
                    name: names.fk_name.clone(),
                })?;
            }
            if self.uk_name.is_none() {
                schema.submit(Change::AddUniqueKey {
                    table: table.clone(),
                    name: names.uk_name.clone(),
                    columns: vec![names.name.clone()],
                    is_primary: false,
                })?;
            }
        } else {
            if self.uk_name.is_some() {
                schema.submit(Change::DropConstraint {
                    table: table.clone(),
                    name: names.uk_name.clone(),
                })?;
            }
            if self.index_name.is_none() {
                schema.submit(Change::CreateIndex {
                    name: names.fk_name.clone(),
                    table: table.clone(),
                    columns: vec![names.name.clone()],
                })?;
            }
        }

        let mut meta = Meta::parse(self.comment.as_deref());
        let changed = meta.set_label(saved_label(&new.label, &name_to_label(&names.name)))
            | meta.set_title(saved_title(new.title.as_deref(), &names.title));
        if changed {
            schema.submit(Change::CommentOnColumn {
                table: table.clone(),
                name: names.name.clone(),
                comment: meta.dump(),
            })?;
        }
        Ok(ObjectKey::column(table, names.name))
    }

    pub(crate) fn do_erase<C: Connection>(&self, schema: &mut ModelSchema<'_, C>) -> Result<()> {
        if !schema.image()?.contains(&self.key()) {
            return Ok(());
        }
        schema.submit(Change::DropColumn {
            table: self.table.name.clone(),
            name: self.name.clone(),
        })
    }

    pub(crate) fn react<C: Connection>(
        self,
        schema: &mut ModelSchema<'_, C>,
        notice: &Notice<'_>,
    ) -> Result<()> {
        if notice.signal == Signal::AFTER_ERASE {
            schema.detach(&self.key());
            return Ok(());
        }

        if notice.is_table(&self.target.name) {
            // A link cannot outlive the table it points at.
            if self.target.name != self.table.name && notice.signal == Signal::BEFORE_ERASE {
                return schema.erase(Model::Link(self));
            }
            // A link named after its target follows the target's renames.
            if notice.signal == Signal::AFTER_MODIFY
                && let Some(new_label) = notice.new_label()
                && notice.old.label() == Some(self.label.as_str())
            {
                let mut state = self.state();
                state.label = new_label.to_string();
                return schema.modify(Model::Link(self), State::Link(state));
            }
        }

        if notice.signal == Signal::AFTER_MODIFY
            && notice.is_table(&self.table.name)
            && let Some(table_label) = notice.new_label()
        {
            let table = self.table.name.clone();
            let names = LinkNames::new(table_label, &self.label);
            schema.rename_constraint(&table, &self.fk_name, &names.fk_name)?;
            if let Some(index_name) = &self.index_name {
                schema.rename_index(index_name, &names.fk_name)?;
            }
            if let Some(uk_name) = &self.uk_name {
                schema.rename_constraint(&table, uk_name, &names.uk_name)?;
            }
        }
        Ok(())
    }
}
