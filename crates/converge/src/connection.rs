//! The seam between the engine and a database.

use crate::error::DbError;
use converge_catalog::{Catalog, Change};

/// A result row with every value in its text representation.
pub type Row = Vec<Option<String>>;

/// A synchronous database session.
///
/// The engine never talks to a database directly: it reads the catalog
/// through [`introspect`](Connection::introspect) and mutates it one
/// [`Change`] at a time through [`apply`](Connection::apply).
pub trait Connection {
    /// Run raw SQL, returning any result rows.
    fn execute(&mut self, sql: &str) -> Result<Vec<Row>, DbError>;

    /// Read the current catalog.
    fn introspect(&mut self) -> Result<Catalog, DbError>;

    /// Run one DDL statement.
    fn apply(&mut self, change: &Change) -> Result<(), DbError> {
        self.execute(&change.to_sql()).map(drop)
    }

    fn begin(&mut self) -> Result<(), DbError> {
        self.execute("BEGIN;").map(drop)
    }

    fn commit(&mut self) -> Result<(), DbError> {
        self.execute("COMMIT;").map(drop)
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        self.execute("ROLLBACK;").map(drop)
    }
}
