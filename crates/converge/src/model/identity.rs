use super::{Model, ModelKind, ModelSchema, Notice, Signal, State, TableRef};
use crate::connection::Connection;
use crate::domain::{Domain, Generator};
use crate::error::{Error, Result};
use crate::meta::Meta;
use crate::names::IdentityNames;
use converge_catalog::{Change, ObjectKey, OnDelete, SchemaImage, TriggerEvent, TriggerTiming};

/// The primary key of a table, with the trigger that generates its values.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityModel {
    pub table: TableRef,
    pub name: String,
    /// Column names of the key, in order.
    pub fields: Vec<String>,
    /// One entry per field.
    pub generators: Vec<Option<Generator>>,
    pub trigger: Option<String>,
    pub procedure: Option<String>,
    comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityState {
    pub fields: Vec<String>,
    pub generators: Vec<Option<Generator>>,
}

impl IdentityModel {
    pub(crate) fn recognizes(schema: &SchemaImage, key: &ObjectKey) -> bool {
        let ObjectKey::UniqueKey { table, name } = key else {
            return false;
        };
        schema
            .table(table)
            .and_then(|table| table.unique_keys.get(name))
            .is_some_and(|key| key.is_primary)
    }

    pub(crate) fn load(schema: &SchemaImage, key: &ObjectKey) -> Result<Self> {
        let ObjectKey::UniqueKey { table, name } = key else {
            return Err(Error::prerequisite("identity", key.to_string()));
        };
        let table_ref = TableRef::load(schema, table).ok_or_else(|| Error::prerequisite("table", table))?;
        let image = schema.table(table).ok_or_else(|| Error::prerequisite("table", table))?;
        let primary_key = image
            .unique_keys
            .get(name)
            .ok_or_else(|| Error::prerequisite("identity", key.to_string()))?;

        let meta = Meta::parse(primary_key.comment.as_deref());
        let mut generators = meta.generators.unwrap_or_default();
        generators.resize(primary_key.columns.len(), None);
        let trigger = image.triggers.get(name);

        Ok(Self {
            table: table_ref,
            name: name.clone(),
            fields: primary_key.columns.clone(),
            generators,
            trigger: trigger.map(|trigger| trigger.name.clone()),
            procedure: trigger.map(|trigger| trigger.procedure.clone()),
            comment: primary_key.comment.clone(),
        })
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::unique_key(&self.table.name, &self.name)
    }

    pub fn state(&self) -> IdentityState {
        IdentityState {
            fields: self.fields.clone(),
            generators: self.generators.clone(),
        }
    }

    pub(crate) fn build<C: Connection>(
        schema: &mut ModelSchema<'_, C>,
        table: &TableRef,
        state: &IdentityState,
    ) -> Result<()> {
        let names = IdentityNames::new(&table.label);
        check_required(schema.image()?, table, &state.fields)?;
        schema.submit(Change::AddUniqueKey {
            table: table.name.clone(),
            name: names.name.clone(),
            columns: state.fields.clone(),
            is_primary: true,
        })?;
        set_links_on_delete(schema, &table.name, &state.fields, OnDelete::Cascade)?;

        let source = generate(schema.image()?, &table.name, &state.fields, &state.generators)?;
        let Some(source) = source else {
            return Ok(());
        };
        schema.submit(Change::CreateFunction {
            name: names.name.clone(),
            return_type: "trigger".to_string(),
            language: "plpgsql".to_string(),
            source,
            or_replace: false,
        })?;
        schema.submit(Change::CreateTrigger {
            table: table.name.clone(),
            name: names.name.clone(),
            timing: TriggerTiming::Before,
            event: TriggerEvent::Insert,
            procedure: names.name.clone(),
        })?;

        let mut meta = Meta::default();
        meta.set_generators(saved_generators(&state.generators));
        schema.submit(Change::CommentOnConstraint {
            table: table.name.clone(),
            name: names.name,
            comment: meta.dump(),
        })
    }

    pub(crate) fn do_modify<C: Connection>(
        self,
        schema: &mut ModelSchema<'_, C>,
        new: &IdentityState,
    ) -> Result<ObjectKey> {
        let table = self.table.name.clone();
        let is_rebuilt = self.fields != new.fields;
        if is_rebuilt {
            let removed: Vec<String> = self
                .fields
                .iter()
                .filter(|field| !new.fields.contains(field))
                .cloned()
                .collect();
            let added: Vec<String> = new
                .fields
                .iter()
                .filter(|field| !self.fields.contains(field))
                .cloned()
                .collect();

            set_links_on_delete(schema, &table, &removed, OnDelete::SetDefault)?;
            check_required(schema.image()?, &self.table, &new.fields)?;
            schema.submit(Change::DropConstraint {
                table: table.clone(),
                name: self.name.clone(),
            })?;
            schema.submit(Change::AddUniqueKey {
                table: table.clone(),
                name: self.name.clone(),
                columns: new.fields.clone(),
                is_primary: true,
            })?;
            set_links_on_delete(schema, &table, &added, OnDelete::Cascade)?;
        }

        let source = generate(schema.image()?, &table, &new.fields, &new.generators)?;
        match source {
            Some(source) => {
                let procedure = self.procedure.clone().unwrap_or_else(|| self.name.clone());
                let current = schema
                    .image()?
                    .procedures
                    .get(&procedure)
                    .map(|image| image.source.clone());
                if current.as_deref() != Some(source.as_str()) {
                    schema.submit(Change::CreateFunction {
                        name: procedure.clone(),
                        return_type: "trigger".to_string(),
                        language: "plpgsql".to_string(),
                        source,
                        or_replace: current.is_some(),
                    })?;
                }
                if self.trigger.is_none() {
                    schema.submit(Change::CreateTrigger {
                        table: table.clone(),
                        name: self.name.clone(),
                        timing: TriggerTiming::Before,
                        event: TriggerEvent::Insert,
                        procedure,
                    })?;
                }
            }
            None => {
                if let Some(trigger) = &self.trigger {
                    schema.drop_trigger_if_exists(&table, trigger)?;
                }
                if let Some(procedure) = &self.procedure {
                    schema.drop_function_if_unused(procedure)?;
                }
            }
        }

        // A rebuilt key lost its comment along with the old constraint.
        let mut meta = if is_rebuilt {
            Meta::default()
        } else {
            Meta::parse(self.comment.as_deref())
        };
        if meta.set_generators(saved_generators(&new.generators)) {
            schema.submit(Change::CommentOnConstraint {
                table: table.clone(),
                name: self.name.clone(),
                comment: meta.dump(),
            })?;
        }
        Ok(ObjectKey::unique_key(table, &self.name))
    }

    pub(crate) fn do_erase<C: Connection>(&self, schema: &mut ModelSchema<'_, C>) -> Result<()> {
        let table = &self.table.name;
        if schema.image()?.contains(&self.key()) {
            schema.submit(Change::DropConstraint {
                table: table.clone(),
                name: self.name.clone(),
            })?;
        }
        self.drop_generator(schema)?;
        set_links_on_delete(schema, table, &self.fields, OnDelete::SetDefault)
    }

    fn drop_generator<C: Connection>(&self, schema: &mut ModelSchema<'_, C>) -> Result<()> {
        if let Some(trigger) = &self.trigger {
            schema.drop_trigger_if_exists(&self.table.name, trigger)?;
        }
        if let Some(procedure) = &self.procedure {
            schema.drop_function_if_unused(procedure)?;
        }
        Ok(())
    }

    pub(crate) fn react<C: Connection>(
        self,
        schema: &mut ModelSchema<'_, C>,
        notice: &Notice<'_>,
    ) -> Result<()> {
        if notice.signal == Signal::AFTER_ERASE {
            self.drop_generator(schema)?;
            schema.detach(&self.key());
            return Ok(());
        }

        let field = notice
            .field_of(&self.table.name)
            .and_then(|name| self.fields.iter().position(|field| field == name));

        if notice.signal == Signal::BEFORE_MODIFY
            && field.is_some()
            && notice.new.and_then(State::is_required) == Some(false)
        {
            return schema.erase(Model::Identity(self));
        }
        if notice.signal != Signal::AFTER_MODIFY {
            return Ok(());
        }

        let mut identity = self;
        // Only the retyped field loses its generator; the others still apply.
        if let Some(index) = field
            && notice.master_kind == ModelKind::Column
            && notice.changes_type()
            && identity.generators[index].is_some()
        {
            let key = identity.key();
            let mut state = identity.state();
            state.generators[index] = None;
            schema.modify(Model::Identity(identity), State::Identity(state))?;
            identity = match schema.resolve(&key)? {
                Some(Model::Identity(identity)) => identity,
                _ => return Ok(()),
            };
        }

        if notice.new_label().is_some() {
            identity.follow_names(schema)?;
        }
        Ok(())
    }

    /// Rename the key, its trigger and its procedure after the table label,
    /// and regenerate the procedure over the current column names.
    fn follow_names<C: Connection>(&self, schema: &mut ModelSchema<'_, C>) -> Result<()> {
        let table = &self.table.name;
        let names = IdentityNames::new(&self.table.label);
        schema.rename_constraint(table, &self.name, &names.name)?;
        if let Some(trigger) = &self.trigger {
            schema.rename_trigger(table, trigger, &names.name)?;
        }
        let Some(procedure) = &self.procedure else {
            return Ok(());
        };
        schema.rename_function(procedure, &names.name)?;

        let source = generate(schema.image()?, table, &self.fields, &self.generators)?;
        let current = schema
            .image()?
            .procedures
            .get(&names.name)
            .map(|image| image.source.clone());
        if let Some(source) = source
            && current.as_deref() != Some(source.as_str())
        {
            schema.submit(Change::CreateFunction {
                name: names.name,
                return_type: "trigger".to_string(),
                language: "plpgsql".to_string(),
                source,
                or_replace: true,
            })?;
        }
        Ok(())
    }
}

fn saved_generators(generators: &[Option<Generator>]) -> Option<Vec<Option<Generator>>> {
    generators
        .iter()
        .any(Option::is_some)
        .then(|| generators.to_vec())
}

fn check_required(schema: &SchemaImage, table: &TableRef, fields: &[String]) -> Result<()> {
    let image = schema
        .table(&table.name)
        .ok_or_else(|| Error::prerequisite("table", &table.label))?;
    for field in fields {
        let column = image
            .column(field)
            .ok_or_else(|| Error::prerequisite("field", format!("{}.{}", table.label, field)))?;
        if !column.is_not_null {
            return Err(Error::mismatch(
                "Discovered nullable field",
                format!("{}.{}", table.label, field),
            ));
        }
    }
    Ok(())
}

/// Switch the `ON DELETE` action of the foreign keys over `fields`.
fn set_links_on_delete<C: Connection>(
    schema: &mut ModelSchema<'_, C>,
    table: &str,
    fields: &[String],
    on_delete: OnDelete,
) -> Result<()> {
    let fk_names: Vec<String> = match schema.image()?.table(table) {
        Some(image) => fields
            .iter()
            .flat_map(|field| image.foreign_keys_of(field))
            .map(|fk| fk.name.clone())
            .collect(),
        None => return Ok(()),
    };
    for fk_name in fk_names {
        schema.set_on_delete(table, &fk_name, on_delete)?;
    }
    Ok(())
}

/// Render the trigger procedure that fills in generated key fields, or
/// `None` when no field has a generator.
///
/// An offset is computed among the records sharing the fields that precede
/// the generated one in the key.
fn generate(
    schema: &SchemaImage,
    table: &str,
    fields: &[String],
    generators: &[Option<Generator>],
) -> Result<Option<String>> {
    let image = schema
        .table(table)
        .ok_or_else(|| Error::prerequisite("table", table))?;
    let mut parts = Vec::new();
    for (index, (field, generator)) in fields.iter().zip(generators).enumerate() {
        let Some(generator) = generator else {
            continue;
        };
        let column = image
            .column(field)
            .ok_or_else(|| Error::prerequisite("field", format!("{table}.{field}")))?;
        let is_link = !image.foreign_keys_of(field).is_empty();
        let domain = column
            .type_ref
            .is_system()
            .then(|| Domain::from_sql_type(&column.type_ref.name))
            .flatten()
            .filter(|_| !is_link);
        let basis = &fields[..index];
        let part = match (generator, domain) {
            (Generator::Offset, Some(Domain::Integer)) => {
                converge_sql::integer_offset_key(table, field, basis)
            }
            (Generator::Offset, Some(Domain::Text)) => {
                converge_sql::text_offset_key(table, field, basis)
            }
            (Generator::Random, Some(Domain::Integer)) => {
                converge_sql::integer_random_key(table, field)
            }
            (Generator::Random, Some(Domain::Text)) => converge_sql::text_random_key(table, field),
            _ => {
                return Err(Error::mismatch(
                    "Expected an integer or text column",
                    format!("{table}.{field}"),
                ));
            }
        };
        parts.push(part);
    }
    Ok((!parts.is_empty()).then(|| converge_sql::primary_key_procedure(&parts)))
}
