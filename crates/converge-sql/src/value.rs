use crate::Lit;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::fmt;

/// A value that can be rendered as a SQL literal.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Text(String),
    /// Rendered as a comma-separated sequence of literals.
    List(Vec<SqlValue>),
    /// A SQL expression, rendered verbatim (e.g. `CURRENT_DATE`).
    Expr(String),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(true) => write!(f, "TRUE"),
            SqlValue::Bool(false) => write!(f, "FALSE"),
            SqlValue::Integer(value) => write!(f, "{}", value),
            SqlValue::Float(value) => write!(f, "{:?}", value),
            SqlValue::Decimal(value) => write!(f, "{}", value),
            SqlValue::Date(value) => write!(f, "'{}'", value),
            SqlValue::Time(value) => write!(f, "'{}'", value),
            SqlValue::DateTime(value) => write!(f, "'{}'", value),
            SqlValue::Text(value) => write!(f, "{}", Lit(value)),
            SqlValue::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            SqlValue::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Render a value as a SQL literal.
pub fn sql_value(value: impl Into<SqlValue>) -> String {
    value.into().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_scalar_literals() {
        assert_eq!(sql_value(SqlValue::Null), "NULL");
        assert_eq!(sql_value(true), "TRUE");
        assert_eq!(sql_value(false), "FALSE");
        assert_eq!(sql_value(42i64), "42");
        assert_eq!(sql_value(SqlValue::Float(1.5)), "1.5");
        assert_eq!(sql_value(SqlValue::Float(2.0)), "2.0");
        assert_eq!(
            sql_value(SqlValue::Decimal(Decimal::from_str("3.140").unwrap())),
            "3.140"
        );
        assert_eq!(sql_value(None::<String>), "NULL");
    }

    #[test]
    fn test_temporal_literals() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(sql_value(SqlValue::Date(date)), "'2024-02-29'");
        let time = NaiveTime::from_hms_opt(13, 5, 0).unwrap();
        assert_eq!(sql_value(SqlValue::Time(time)), "'13:05:00'");
        assert_eq!(
            sql_value(SqlValue::DateTime(date.and_time(time))),
            "'2024-02-29 13:05:00'"
        );
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(sql_value("male"), "'male'");
        assert_eq!(sql_value("O'Brien"), "'O''Brien'");
        assert_eq!(sql_value(r"C:\temp"), r"E'C:\\temp'");
        assert_eq!(sql_value(r"it's a \n"), r"E'it''s a \\n'");
    }

    #[test]
    fn test_list_literal() {
        let labels = SqlValue::List(vec!["male".into(), "female".into(), "intersex".into()]);
        assert_eq!(sql_value(labels), "'male', 'female', 'intersex'");
        assert_eq!(sql_value(SqlValue::List(vec![])), "");
    }
}
