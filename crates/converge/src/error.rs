use converge_catalog::CatalogError;
use std::fmt;
use thiserror::Error;

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// Malformed or inconsistent input facts.
    #[error("{0}")]
    Specification(String),

    /// A fact depends on an object that does not exist.
    #[error("Detected missing {what}: {name}")]
    PrerequisiteMissing { what: String, name: String },

    /// The database cannot be reconciled with a fact, or a required change
    /// was refused because the driver is locked.
    #[error("{0}")]
    StateMismatch(String),

    /// A column type change outside of the cast matrix.
    #[error("Cannot convert column {column} of type {from} to {to}")]
    UnsafeConversion {
        column: String,
        from: String,
        to: String,
    },

    /// The database rejected a statement.
    #[error("Got an error from the database driver: {message}")]
    Database {
        message: String,
        sql: Option<String>,
    },
}

/// One level of context attached to an error on its way up.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub message: String,
    pub detail: String,
}

/// An [`ErrorKind`] together with the context frames accumulated while it
/// propagated, innermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    context: Vec<Frame>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: Vec::new(),
        }
    }

    pub fn specification(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Specification(message.into()))
    }

    pub fn prerequisite(what: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(ErrorKind::PrerequisiteMissing {
            what: what.into(),
            name: name.into(),
        })
    }

    /// A state mismatch: `"{message}: {subject}"`.
    pub fn mismatch(message: &str, subject: impl fmt::Display) -> Self {
        Self::new(ErrorKind::StateMismatch(format!("{message}: {subject}")))
    }

    pub fn database(error: DbError, sql: Option<String>) -> Self {
        Self::new(ErrorKind::Database {
            message: error.message,
            sql,
        })
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn context(&self) -> &[Frame] {
        &self.context
    }

    /// Attach a context frame.
    pub fn wrap(mut self, message: impl Into<String>, detail: impl fmt::Display) -> Self {
        self.context.push(Frame {
            message: message.into(),
            detail: detail.to_string(),
        });
        self
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for frame in &self.context {
            write!(f, "\n{}", frame.message)?;
            for line in frame.detail.lines() {
                write!(f, "\n    {}", line)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// An error reported by a [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct DbError {
    pub message: String,
    /// SQLSTATE, when the server reported one.
    pub code: Option<String>,
}

impl DbError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }
}

impl From<tokio_postgres::Error> for DbError {
    fn from(error: tokio_postgres::Error) -> Self {
        let message = match error.as_db_error() {
            Some(db) => db.message().to_string(),
            None => error.to_string(),
        };
        Self {
            message,
            code: error.code().map(|code| code.code().to_string()),
        }
    }
}

impl From<CatalogError> for DbError {
    fn from(error: CatalogError) -> Self {
        Self::new(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_context() {
        let error = Error::mismatch("Discovered table without surrogate key", "individual")
            .wrap("While deploying table fact:", "table: individual\nfacts.yaml, #1");
        insta::assert_snapshot!(error.to_string(), @r"
        Discovered table without surrogate key: individual
        While deploying table fact:
            table: individual
            facts.yaml, #1
        ");
    }

    #[test]
    fn test_kind_survives_wrapping() {
        let error = Error::prerequisite("table", "individual").wrap("While deploying", "x");
        assert_eq!(
            error.kind(),
            &ErrorKind::PrerequisiteMissing {
                what: "table".to_string(),
                name: "individual".to_string(),
            }
        );
        assert_eq!(error.context().len(), 1);
    }
}
