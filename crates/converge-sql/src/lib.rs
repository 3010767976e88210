//! SQL naming and rendering for converge.
//!
//! Everything in this crate is a pure function from already-resolved
//! names and already-validated values to SQL text. Nothing here talks to a
//! database, and nothing here validates its input: callers are expected to
//! pass mangled identifiers (see [`mangle`]) and domain-checked values.

mod ddl;
pub use ddl::*;

mod dml;
pub use dml::*;

mod mangle;
pub use mangle::*;

mod plpgsql;
pub use plpgsql::*;

mod value;
pub use value::*;

/// A PostgreSQL string literal wrapper.
///
/// Display writes the value quoted with single quotes. Embedded quotes are
/// doubled; if the value contains a backslash, backslashes are doubled too and
/// the literal gets the `E` (extended string) marker.
///
/// # Example
/// ```
/// use converge_sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// assert_eq!(format!("{}", Lit("a\\b")), "E'a\\\\b'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = self.0.as_ref();
        if text.contains('\\') {
            write!(f, "E")?;
        }
        write!(f, "'")?;
        for c in text.chars() {
            match c {
                '\'' => write!(f, "''")?,
                '\\' => write!(f, "\\\\")?,
                c => write!(f, "{}", c)?,
            }
        }
        write!(f, "'")
    }
}

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value escaped and quoted with double quotes.
///
/// # Example
/// ```
/// use converge_sql::Ident;
/// assert_eq!(format!("{}", Ident("user")), "\"user\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}

/// Escape a string literal for SQL.
pub fn escape_string(s: &str) -> String {
    format!("{}", Lit(s))
}

/// Quote a PostgreSQL identifier.
///
/// Always quotes identifiers to avoid issues with reserved keywords like
/// `user`, `order`, `table`, `group`, etc. Doubles any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("{}", Ident(name))
}

/// Quote a list of identifiers and join them with `, `.
///
/// ```
/// assert_eq!(converge_sql::quote_idents(&["a", "b"]), "\"a\", \"b\"");
/// assert_eq!(converge_sql::quote_idents::<&str>(&[]), "");
/// ```
pub fn quote_idents<T: AsRef<str>>(names: &[T]) -> String {
    names
        .iter()
        .map(|name| quote_ident(name.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}
