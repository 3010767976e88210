use super::{Model, ModelSchema, Notice, Signal, TableRef};
use crate::connection::Connection;
use crate::error::{Error, Result};
use converge_catalog::{ObjectKey, SchemaImage};

/// A commented trigger: a rule attached to a table's fields that does not
/// survive changes to them.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintModel {
    pub table: TableRef,
    pub name: String,
    pub procedure: String,
}

impl ConstraintModel {
    pub(crate) fn recognizes(schema: &SchemaImage, key: &ObjectKey) -> bool {
        let ObjectKey::Trigger { table, name } = key else {
            return false;
        };
        schema
            .table(table)
            .and_then(|table| table.triggers.get(name))
            .is_some_and(|trigger| trigger.comment.is_some())
    }

    pub(crate) fn load(schema: &SchemaImage, key: &ObjectKey) -> Result<Self> {
        let ObjectKey::Trigger { table, name } = key else {
            return Err(Error::prerequisite("constraint", key.to_string()));
        };
        let table_ref = TableRef::load(schema, table).ok_or_else(|| Error::prerequisite("table", table))?;
        let trigger = schema
            .table(table)
            .and_then(|image| image.triggers.get(name))
            .ok_or_else(|| Error::prerequisite("constraint", key.to_string()))?;
        Ok(Self {
            table: table_ref,
            name: name.clone(),
            procedure: trigger.procedure.clone(),
        })
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::trigger(&self.table.name, &self.name)
    }

    pub(crate) fn do_erase<C: Connection>(&self, schema: &mut ModelSchema<'_, C>) -> Result<()> {
        schema.drop_trigger_if_exists(&self.table.name, &self.name)?;
        schema.drop_function_if_unused(&self.procedure)
    }

    pub(crate) fn react<C: Connection>(
        self,
        schema: &mut ModelSchema<'_, C>,
        notice: &Notice<'_>,
    ) -> Result<()> {
        if notice.signal == Signal::AFTER_ERASE {
            self.do_erase(schema)?;
            schema.detach(&self.key());
            return Ok(());
        }
        if notice.signal == Signal::BEFORE_MODIFY
            && notice.field_of(&self.table.name).is_some()
            && (notice.new_label().is_some() || notice.changes_type())
        {
            return schema.erase(Model::Constraint(self));
        }
        Ok(())
    }
}
