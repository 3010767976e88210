//! Traced Postgres connection.
//!
//! Wraps a tokio-postgres client behind the synchronous [`Connection`]
//! trait and logs every statement via tracing.

use crate::connection::{Connection, Row};
use crate::error::DbError;
use crate::introspect;
use converge_catalog::Catalog;
use tokio::runtime::Runtime;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::Instrument;

/// A live database session.
///
/// The client runs on a private current-thread runtime; every call blocks
/// until the server has answered.
pub struct PgConnection {
    runtime: Runtime,
    client: Client,
}

impl PgConnection {
    /// Connect using a libpq-style connection string or URL.
    pub fn connect(url: &str) -> Result<Self, DbError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DbError::new(format!("failed to start runtime: {e}")))?;

        let (client, connection) = runtime.block_on(tokio_postgres::connect(url, NoTls))?;
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "database connection failed");
            }
        });

        Ok(Self { runtime, client })
    }

    /// Run a catalog query, returning typed rows.
    pub(crate) fn query(&self, sql: &str) -> Result<Vec<tokio_postgres::Row>, DbError> {
        let span = tracing::debug_span!("db.query", sql = %sql, rows = tracing::field::Empty);
        let rows = self
            .runtime
            .block_on(self.client.query(sql, &[]).instrument(span.clone()))?;
        span.record("rows", rows.len());
        Ok(rows)
    }
}

impl Connection for PgConnection {
    fn execute(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        let span = tracing::debug_span!("db.execute", sql = %sql, rows = tracing::field::Empty);
        let messages = self
            .runtime
            .block_on(self.client.simple_query(sql).instrument(span.clone()))?;

        let rows: Vec<Row> = messages
            .into_iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::Row(row) => Some(
                    (0..row.len())
                        .map(|index| row.get(index).map(str::to_string))
                        .collect(),
                ),
                _ => None,
            })
            .collect();
        span.record("rows", rows.len());
        Ok(rows)
    }

    fn introspect(&mut self) -> Result<Catalog, DbError> {
        introspect::introspect(self)
    }
}
