//! Declarative schema reconciliation for Postgres.
//!
//! Instead of a sequence of migrations, a deployment is a list of *facts*:
//! "there is a table `individual`", "`individual` has a required `code`
//! column of type `text`", "`visit` links to `individual`". Applying a fact
//! compares it with the live catalog and submits exactly the DDL needed to
//! make it true, and nothing when it already holds. Applying the same facts
//! twice is a no-op.
//!
//! ```ignore
//! let mut driver = Driver::new(PgConnection::connect(url)?);
//! let facts = driver.parse_str(r#"
//! - table: individual
//! - column: individual.code
//!   type: text
//!   unique: true
//! "#)?;
//! driver.begin()?;
//! driver.apply(&facts, None)?;
//! driver.commit()?;
//! ```
//!
//! # Names
//!
//! Every object the engine creates is named after the labels in the facts
//! (see [`names`]), and whatever Postgres cannot store (a label that differs
//! from its name, a title, a default's canonical text, key generators) is
//! kept as JSON in the object's comment (see [`Meta`]). Renaming a label
//! therefore renames every derived object too.
//!
//! # Checking
//!
//! A locked [`Driver`] refuses to change anything: applying facts with
//! `lock: Some(true)` only verifies that the database already satisfies
//! them, and reports the first required change as a state mismatch.

mod connection;
mod domain;
mod driver;
mod error;
mod fact;
mod introspect;
mod memory;
mod meta;
pub mod model;
pub mod names;
mod pg;

pub use connection::{Connection, Row};
pub use domain::{ColumnDefault, ColumnType, Domain, Generator};
pub use driver::Driver;
pub use error::{DbError, Error, ErrorKind, Frame, Result};
pub use fact::{ColumnFact, Fact, IdentityFact, LinkFact, Location, TableFact};
pub use memory::MemoryConnection;
pub use meta::Meta;
pub use pg::PgConnection;

pub use converge_catalog as catalog;
