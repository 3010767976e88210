use super::{ID, ModelSchema, Notice, Signal, TableRef, saved_label, saved_title};
use crate::connection::Connection;
use crate::domain::{ColumnDefault, ColumnType, Domain};
use crate::error::{Error, ErrorKind, Result};
use crate::meta::Meta;
use crate::names::ColumnNames;
use converge_catalog::{Change, ColumnDef, ObjectKey, SchemaImage, TypeRef};
use converge_sql::{cast, quote_ident};

/// Name of the scratch type used while swapping one enum for another.
const SCRATCH_TYPE: &str = "?";

/// A regular (non-link) column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnModel {
    pub table: TableRef,
    pub name: String,
    pub label: String,
    pub ty: ColumnType,
    /// Canonical text of the default.
    pub default: Option<String>,
    pub is_required: bool,
    pub is_unique: bool,
    pub title: Option<String>,
    pub enum_name: Option<String>,
    pub uk_name: Option<String>,
    comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnState {
    pub label: String,
    pub ty: ColumnType,
    pub default: Option<String>,
    pub is_required: bool,
    pub is_unique: bool,
    pub title: Option<String>,
}

impl ColumnModel {
    pub(crate) fn recognizes(schema: &SchemaImage, key: &ObjectKey) -> bool {
        let ObjectKey::Column { table, name } = key else {
            return false;
        };
        schema.table(table).is_some_and(|table| {
            name != ID && table.column(name).is_some() && table.foreign_keys_of(name).is_empty()
        })
    }

    pub(crate) fn load(schema: &SchemaImage, key: &ObjectKey) -> Result<Self> {
        let ObjectKey::Column { table, name } = key else {
            return Err(Error::prerequisite("column", key.to_string()));
        };
        let table_ref = TableRef::load(schema, table).ok_or_else(|| Error::prerequisite("table", table))?;
        let image = schema.table(table).ok_or_else(|| Error::prerequisite("table", table))?;
        let column = image
            .column(name)
            .ok_or_else(|| Error::prerequisite("column", key.to_string()))?;
        let meta = Meta::parse(column.comment.as_deref());
        let label = meta.label.clone().unwrap_or_else(|| name.clone());

        let (ty, enum_name) = if column.type_ref.is_system() {
            match Domain::from_sql_type(&column.type_ref.name) {
                Some(domain) => (ColumnType::Domain(domain), None),
                None => {
                    return Err(Error::mismatch(
                        "Discovered column of unrecognized type",
                        &label,
                    ));
                }
            }
        } else {
            match schema.types.get(&column.type_ref.name) {
                Some(enum_type) => (
                    ColumnType::Enum(enum_type.labels.clone()),
                    Some(enum_type.name.clone()),
                ),
                None => {
                    return Err(Error::mismatch(
                        "Discovered column of unrecognized type",
                        &label,
                    ));
                }
            }
        };
        let uk_name = image.unique_key_of(name).map(|key| key.name.clone());

        Ok(Self {
            table: table_ref,
            name: name.clone(),
            ty,
            default: meta.default,
            is_required: column.is_not_null,
            is_unique: uk_name.is_some(),
            title: meta.title,
            enum_name,
            uk_name,
            comment: column.comment.clone(),
            label,
        })
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::column(&self.table.name, &self.name)
    }

    pub fn state(&self) -> ColumnState {
        ColumnState {
            label: self.label.clone(),
            ty: self.ty.clone(),
            default: self.default.clone(),
            is_required: self.is_required,
            is_unique: self.is_unique,
            title: self.title.clone(),
        }
    }

    pub(crate) fn build<C: Connection>(
        schema: &mut ModelSchema<'_, C>,
        table: &TableRef,
        state: &ColumnState,
    ) -> Result<()> {
        let names = ColumnNames::new(&table.label, &state.label);
        let default = parse_default(&state.ty, state.default.as_deref())?;

        let type_ref = match &state.ty {
            ColumnType::Domain(domain) => TypeRef::system(domain.sql_type()),
            ColumnType::Enum(labels) => {
                schema.submit(Change::CreateEnumType {
                    name: names.enum_name.clone(),
                    labels: labels.clone(),
                })?;
                TypeRef::public(&names.enum_name)
            }
        };
        schema.submit(Change::AddColumn {
            table: table.name.clone(),
            column: ColumnDef::new(&names.name, type_ref, state.is_required)
                .with_default(default.map(|default| default.to_sql())),
        })?;
        if state.is_unique {
            schema.submit(Change::AddUniqueKey {
                table: table.name.clone(),
                name: names.uk_name.clone(),
                columns: vec![names.name.clone()],
                is_primary: false,
            })?;
        }

        let mut meta = Meta::default();
        let changed = meta.set_label(saved_label(&state.label, &names.name))
            | meta.set_title(saved_title(state.title.as_deref(), &names.title))
            | meta.set_default(state.default.clone());
        if changed {
            schema.submit(Change::CommentOnColumn {
                table: table.name.clone(),
                name: names.name,
                comment: meta.dump(),
            })?;
        }
        Ok(())
    }

    pub(crate) fn validate(&self, new: &ColumnState) -> Result<()> {
        if self.ty != new.ty && !self.ty.can_convert_to(&new.ty) {
            return Err(ErrorKind::UnsafeConversion {
                column: format!("{}.{}", self.table.label, self.label),
                from: self.ty.to_string(),
                to: new.ty.to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub(crate) fn do_modify<C: Connection>(
        self,
        schema: &mut ModelSchema<'_, C>,
        new: &ColumnState,
    ) -> Result<ObjectKey> {
        let table = self.table.name.clone();
        let names = ColumnNames::new(&self.table.label, &new.label);
        schema.rename_column(&table, &self.name, &names.name)?;
        if let Some(enum_name) = &self.enum_name {
            schema.rename_type(enum_name, &names.enum_name)?;
        }
        if let Some(uk_name) = &self.uk_name {
            schema.rename_constraint(&table, uk_name, &names.uk_name)?;
        }

        let default = parse_default(&new.ty, new.default.as_deref())?;
        let mut meta = Meta::parse(self.comment.as_deref());
        if self.ty != new.ty {
            self.convert(schema, &names, &new.ty, default.as_ref())?;
        } else if new.default != meta.default {
            schema.submit(Change::AlterColumnDefault {
                table: table.clone(),
                name: names.name.clone(),
                default: default.as_ref().map(ColumnDefault::to_sql),
            })?;
        }

        if self.is_required != new.is_required {
            schema.submit(Change::AlterColumnNotNull {
                table: table.clone(),
                name: names.name.clone(),
                is_not_null: new.is_required,
            })?;
        }
        match (&self.uk_name, new.is_unique) {
            (None, true) => schema.submit(Change::AddUniqueKey {
                table: table.clone(),
                name: names.uk_name.clone(),
                columns: vec![names.name.clone()],
                is_primary: false,
            })?,
            (Some(_), false) => schema.submit(Change::DropConstraint {
                table: table.clone(),
                name: names.uk_name.clone(),
            })?,
            _ => {}
        }

        let changed = meta.set_label(saved_label(&new.label, &names.name))
            | meta.set_title(saved_title(new.title.as_deref(), &names.title))
            | meta.set_default(new.default.clone());
        if changed {
            schema.submit(Change::CommentOnColumn {
                table: table.clone(),
                name: names.name.clone(),
                comment: meta.dump(),
            })?;
        }
        Ok(ObjectKey::column(table, names.name))
    }

    /// Change the column type in place, carrying the data over with a cast.
    fn convert<C: Connection>(
        &self,
        schema: &mut ModelSchema<'_, C>,
        names: &ColumnNames,
        to: &ColumnType,
        default: Option<&ColumnDefault>,
    ) -> Result<()> {
        let table = &self.table.name;
        let column = quote_ident(&names.name);
        let has_default = schema
            .image()?
            .table(table)
            .and_then(|image| image.column(&names.name))
            .is_some_and(|image| image.default.is_some());
        if has_default {
            schema.submit(Change::AlterColumnDefault {
                table: table.clone(),
                name: names.name.clone(),
                default: None,
            })?;
        }

        let alter = |type_ref: TypeRef, using: String| Change::AlterColumnType {
            table: table.clone(),
            name: names.name.clone(),
            type_ref,
            using: Some(using),
        };
        match (&self.ty, to) {
            (ColumnType::Domain(_), ColumnType::Domain(domain)) => {
                schema.submit(alter(
                    TypeRef::system(domain.sql_type()),
                    cast(&column, domain.sql_type()),
                ))?;
            }
            (ColumnType::Domain(_), ColumnType::Enum(labels)) => {
                schema.submit(Change::CreateEnumType {
                    name: names.enum_name.clone(),
                    labels: labels.clone(),
                })?;
                schema.submit(alter(
                    TypeRef::public(&names.enum_name),
                    cast(&column, &names.enum_name),
                ))?;
            }
            (ColumnType::Enum(_), ColumnType::Domain(domain)) => {
                schema.submit(alter(
                    TypeRef::system(domain.sql_type()),
                    cast(&column, domain.sql_type()),
                ))?;
                schema.submit(Change::DropType {
                    name: names.enum_name.clone(),
                })?;
            }
            (ColumnType::Enum(_), ColumnType::Enum(labels)) => {
                schema.submit(Change::CreateEnumType {
                    name: SCRATCH_TYPE.to_string(),
                    labels: labels.clone(),
                })?;
                schema.submit(alter(
                    TypeRef::public(SCRATCH_TYPE),
                    cast(&cast(&column, Domain::Text.sql_type()), SCRATCH_TYPE),
                ))?;
                schema.submit(Change::DropType {
                    name: names.enum_name.clone(),
                })?;
                schema.rename_type(SCRATCH_TYPE, &names.enum_name)?;
            }
        }

        if let Some(default) = default {
            schema.submit(Change::AlterColumnDefault {
                table: table.clone(),
                name: names.name.clone(),
                default: Some(default.to_sql()),
            })?;
        }
        Ok(())
    }

    pub(crate) fn do_erase<C: Connection>(&self, schema: &mut ModelSchema<'_, C>) -> Result<()> {
        if schema.image()?.contains(&self.key()) {
            schema.submit(Change::DropColumn {
                table: self.table.name.clone(),
                name: self.name.clone(),
            })?;
        }
        if let Some(enum_name) = &self.enum_name {
            schema.drop_type_if_exists(enum_name)?;
        }
        Ok(())
    }

    pub(crate) fn react<C: Connection>(
        self,
        schema: &mut ModelSchema<'_, C>,
        notice: &Notice<'_>,
    ) -> Result<()> {
        if notice.signal == Signal::AFTER_ERASE {
            if let Some(enum_name) = &self.enum_name {
                schema.drop_type_if_exists(enum_name)?;
            }
            schema.detach(&self.key());
            return Ok(());
        }

        if notice.signal == Signal::AFTER_MODIFY
            && notice.is_table(&self.table.name)
            && let Some(table_label) = notice.new_label()
        {
            let names = ColumnNames::new(table_label, &self.label);
            if let Some(enum_name) = &self.enum_name {
                schema.rename_type(enum_name, &names.enum_name)?;
            }
            if let Some(uk_name) = &self.uk_name {
                schema.rename_constraint(&self.table.name, uk_name, &names.uk_name)?;
            }
        }
        Ok(())
    }
}

fn parse_default(ty: &ColumnType, default: Option<&str>) -> Result<Option<ColumnDefault>> {
    default
        .map(|text| ColumnDefault::parse(ty, text))
        .transpose()
        .map_err(|e| Error::specification(format!("Got invalid default: {e}")))
}
