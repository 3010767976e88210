//! A database that only exists as a catalog image.

use crate::connection::{Connection, Row};
use crate::error::DbError;
use converge_catalog::{Catalog, Change};

/// A [`Connection`] backed by an in-memory [`Catalog`].
///
/// Changes are simulated with [`Catalog::apply`], which enforces the same
/// preconditions Postgres does, and the rendered SQL of every accepted
/// change is kept in a log. Useful for tests and for previewing a
/// deployment against an introspected catalog.
#[derive(Debug, Clone)]
pub struct MemoryConnection {
    catalog: Catalog,
    log: Vec<String>,
    savepoint: Option<Catalog>,
}

impl MemoryConnection {
    /// An empty database with an empty `public` schema.
    pub fn new() -> Self {
        Self::with_catalog(Catalog::new())
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog,
            log: Vec::new(),
            savepoint: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Direct access to the image, bypassing the log.
    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Every statement run so far.
    pub fn statements(&self) -> &[String] {
        &self.log
    }

    /// Drain the statement log.
    pub fn take_log(&mut self) -> Vec<String> {
        std::mem::take(&mut self.log)
    }
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for MemoryConnection {
    /// Raw SQL cannot be simulated; it is logged and yields no rows.
    fn execute(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        self.log.push(sql.to_string());
        Ok(Vec::new())
    }

    fn introspect(&mut self) -> Result<Catalog, DbError> {
        Ok(self.catalog.clone())
    }

    fn apply(&mut self, change: &Change) -> Result<(), DbError> {
        let sql = change.to_sql();
        let _span = tracing::debug_span!("db.execute", sql = %sql).entered();
        self.catalog.apply(change)?;
        self.log.push(sql);
        Ok(())
    }

    fn begin(&mut self) -> Result<(), DbError> {
        if self.savepoint.is_some() {
            return Err(DbError::new("there is already a transaction in progress"));
        }
        self.savepoint = Some(self.catalog.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DbError> {
        self.savepoint = None;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        if let Some(catalog) = self.savepoint.take() {
            self.catalog = catalog;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converge_catalog::{ColumnDef, TypeRef};

    fn create_table(name: &str) -> Change {
        Change::CreateTable {
            name: name.to_string(),
            columns: vec![ColumnDef::new("id", TypeRef::system("int4"), true)],
            is_unlogged: false,
        }
    }

    #[test]
    fn test_apply_logs_sql() {
        let mut connection = MemoryConnection::new();
        connection.apply(&create_table("individual")).unwrap();

        assert_eq!(connection.statements().len(), 1);
        assert!(connection.statements()[0].starts_with("CREATE TABLE \"individual\""));
        assert!(
            connection
                .introspect()
                .unwrap()
                .public()
                .unwrap()
                .table("individual")
                .is_some()
        );
    }

    #[test]
    fn test_rejected_change_is_not_logged() {
        let mut connection = MemoryConnection::new();
        connection.apply(&create_table("individual")).unwrap();

        let error = connection.apply(&create_table("individual")).unwrap_err();
        assert!(error.message.contains("already exists"), "{}", error.message);
        assert_eq!(connection.take_log().len(), 1);
    }

    #[test]
    fn test_rollback_restores_catalog() {
        let mut connection = MemoryConnection::new();
        connection.begin().unwrap();
        connection.apply(&create_table("individual")).unwrap();
        connection.rollback().unwrap();

        assert_eq!(connection.catalog(), &Catalog::new());
    }
}
