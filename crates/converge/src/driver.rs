use crate::connection::{Connection, Row};
use crate::error::{Error, ErrorKind, Result};
use crate::fact::{self, Fact, Location};
use camino::{Utf8Path, Utf8PathBuf};
use converge_catalog::{Catalog, Change, SchemaImage};
use serde::Deserialize;
use serde_json::Value;
use std::time::Instant;

/// Applies facts to a database through a [`Connection`].
///
/// The driver keeps a lazily fetched [`Catalog`] image. Every submitted
/// change invalidates it, so the next read re-introspects the database.
/// The engine assumes it is the only writer to the `public` schema while a
/// deployment runs; wrap the run in a transaction ([`begin`](Self::begin),
/// [`commit`](Self::commit)) to get that guarantee from the server.
///
/// A locked driver refuses every change: applying facts then only checks
/// that the database already satisfies them.
pub struct Driver<C> {
    connection: C,
    catalog: Option<Catalog>,
    is_locked: bool,
    cwd: Option<Utf8PathBuf>,
    generation: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IncludeSpec {
    include: IncludePaths,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IncludePaths {
    One(String),
    Many(Vec<String>),
}

impl<C: Connection> Driver<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            catalog: None,
            is_locked: false,
            cwd: None,
            generation: 0,
        }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    pub fn into_connection(self) -> C {
        self.connection
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    pub fn lock(&mut self) {
        self.is_locked = true;
    }

    pub fn unlock(&mut self) {
        self.is_locked = false;
    }

    /// Forget the cached catalog and unlock.
    pub fn reset(&mut self) {
        self.invalidate();
        self.is_locked = false;
    }

    /// Set the directory relative include paths are resolved against.
    pub fn chdir(&mut self, dir: impl Into<Utf8PathBuf>) {
        self.cwd = Some(dir.into());
    }

    /// Bumped every time the cached catalog is dropped.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub fn begin(&mut self) -> Result<()> {
        self.connection
            .begin()
            .map_err(|e| Error::database(e, Some("BEGIN;".to_string())))
    }

    pub fn commit(&mut self) -> Result<()> {
        self.connection
            .commit()
            .map_err(|e| Error::database(e, Some("COMMIT;".to_string())))
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.invalidate();
        self.connection
            .rollback()
            .map_err(|e| Error::database(e, Some("ROLLBACK;".to_string())))
    }

    /// The catalog image, introspected on first use after a change.
    pub fn get_catalog(&mut self) -> Result<&Catalog> {
        if self.catalog.is_none() {
            let started = Instant::now();
            let catalog = self
                .connection
                .introspect()
                .map_err(|e| Error::database(e, None).wrap("While introspecting the database:", "public"))?;
            tracing::debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                tables = catalog.public().map_or(0, |schema| schema.tables.len()),
                "introspected catalog"
            );
            self.catalog = Some(catalog);
        }
        self.catalog
            .as_ref()
            .ok_or_else(|| Error::prerequisite("catalog", "public"))
    }

    /// The image of the `public` schema.
    pub fn get_schema(&mut self) -> Result<&SchemaImage> {
        self.get_catalog()?
            .public()
            .ok_or_else(|| Error::prerequisite("schema", "public"))
    }

    /// Run raw SQL. This counts as a change: a locked driver refuses it and
    /// the catalog cache is dropped since the SQL may be DDL. Use
    /// [`fetch`](Self::fetch) for reads.
    pub fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        if self.is_locked {
            return Err(Error::new(ErrorKind::StateMismatch(format!(
                "Detected required change: {sql}"
            ))));
        }
        self.invalidate();
        self.execute(sql)
    }

    /// Run a read-only statement. Allowed while locked; the catalog cache
    /// is kept.
    pub fn fetch(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.execute(sql)
    }

    fn execute(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.connection
            .execute(sql)
            .map_err(|e| Error::database(e, Some(sql.to_string())).wrap("While executing SQL:", sql))
    }

    /// Run one DDL statement.
    pub fn submit(&mut self, change: &Change) -> Result<()> {
        if self.is_locked {
            return Err(Error::new(ErrorKind::StateMismatch(format!(
                "Detected required change: {change}"
            ))));
        }
        tracing::debug!(%change, "submitting");
        let result = self.connection.apply(change);
        self.invalidate();
        result.map_err(|e| {
            let sql = change.to_sql();
            Error::database(e, Some(sql.clone())).wrap("While executing SQL:", sql)
        })
    }

    fn invalidate(&mut self) {
        self.catalog = None;
        self.generation += 1;
    }

    /// Parse a YAML (or JSON) document of facts.
    pub fn parse_str(&self, source: &str) -> Result<Vec<Fact>> {
        let value = parse_document(source)?;
        self.parse_value(&value)
    }

    /// Parse a file of facts, following includes.
    pub fn parse_file(&self, path: impl AsRef<Utf8Path>) -> Result<Vec<Fact>> {
        let mut stack = Vec::new();
        self.parse_path(&self.resolve(path.as_ref(), None), &mut stack)
    }

    /// Parse facts from an already decoded document.
    pub fn parse_value(&self, value: &Value) -> Result<Vec<Fact>> {
        self.parse_items(value, None, &mut Vec::new())
    }

    fn parse_path(&self, path: &Utf8Path, stack: &mut Vec<Utf8PathBuf>) -> Result<Vec<Fact>> {
        if stack.iter().any(|seen| seen == path) {
            return Err(Error::specification(format!("Got recursive include: {path}")));
        }
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::specification(format!("Failed to read {path}: {e}")))?;
        let value = parse_document(&source).map_err(|e| e.wrap("While parsing file:", path))?;

        stack.push(path.to_path_buf());
        let facts = self.parse_items(&value, Some(path), stack);
        stack.pop();
        facts
    }

    fn parse_items(
        &self,
        value: &Value,
        origin: Option<&Utf8Path>,
        stack: &mut Vec<Utf8PathBuf>,
    ) -> Result<Vec<Fact>> {
        let items = match value {
            Value::Array(items) => items.iter().collect(),
            Value::Null => Vec::new(),
            other => vec![other],
        };

        let mut facts = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            let location = Location {
                path: origin.map(Utf8Path::to_path_buf),
                index: index + 1,
            };
            if item.get(fact::INCLUDE).is_some() {
                let spec: IncludeSpec = serde_json::from_value(item.clone())
                    .map_err(|e| Error::specification(e.to_string()).wrap("While parsing include:", &location))?;
                let paths = match spec.include {
                    IncludePaths::One(path) => vec![path],
                    IncludePaths::Many(paths) => paths,
                };
                for path in paths {
                    let resolved = self.resolve(Utf8Path::new(&path), origin);
                    facts.extend(self.parse_path(&resolved, stack)?);
                }
            } else {
                facts.push(fact::build(item, location)?);
            }
        }
        Ok(facts)
    }

    /// Resolve an include path: absolute paths are kept, relative ones are
    /// tried against the working directory and then against the directory of
    /// the including file.
    fn resolve(&self, path: &Utf8Path, origin: Option<&Utf8Path>) -> Utf8PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        let from_cwd = match &self.cwd {
            Some(cwd) => cwd.join(path),
            None => path.to_path_buf(),
        };
        if from_cwd.exists() {
            return from_cwd;
        }
        match origin.and_then(Utf8Path::parent) {
            Some(dir) if dir.join(path).exists() => dir.join(path),
            _ => from_cwd,
        }
    }

    /// Reconcile the database with `facts`, in order.
    ///
    /// `lock` overrides the locked state for the duration of the call; the
    /// previous state is restored whether or not the call succeeds.
    pub fn apply(&mut self, facts: &[Fact], lock: Option<bool>) -> Result<()> {
        let was_locked = self.is_locked;
        if let Some(lock) = lock {
            self.is_locked = lock;
        }
        let result = self.apply_all(facts);
        self.is_locked = was_locked;
        result
    }

    fn apply_all(&mut self, facts: &[Fact]) -> Result<()> {
        let verb = if self.is_locked {
            "validating"
        } else {
            "deploying"
        };
        for fact in facts {
            let started = Instant::now();
            tracing::info!(%fact, "{verb}");
            fact.apply(self).map_err(|e| {
                let detail = match fact.location() {
                    Some(location) => format!("{fact}\n{location}"),
                    None => fact.to_string(),
                };
                e.wrap(format!("While {verb} {} fact:", fact.kind()), detail)
            })?;
            tracing::debug!(
                %fact,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "{verb} done"
            );
        }
        Ok(())
    }
}

fn parse_document(source: &str) -> Result<Value> {
    serde_yaml::from_str(source)
        .map_err(|e| Error::specification(format!("Got invalid document: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryConnection;

    #[test]
    fn test_fetch_while_locked() {
        let mut driver = Driver::new(MemoryConnection::new());
        driver.get_catalog().unwrap();
        driver.lock();
        let generation = driver.generation();

        assert!(driver.fetch("SELECT 1").unwrap().is_empty());
        assert_eq!(driver.generation(), generation);
        assert!(driver.catalog.is_some());

        let error = driver.query("SELECT 1").unwrap_err();
        assert_eq!(error.to_string(), "Detected required change: SELECT 1");
        assert_eq!(driver.connection().statements(), ["SELECT 1"]);
    }

    #[test]
    fn test_query_drops_catalog() {
        let mut driver = Driver::new(MemoryConnection::new());
        driver.get_catalog().unwrap();
        let generation = driver.generation();

        driver.query("CREATE TABLE t ()").unwrap();
        assert_eq!(driver.generation(), generation + 1);
        assert!(driver.catalog.is_none());
    }
}
