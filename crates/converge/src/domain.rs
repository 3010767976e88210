//! Column domains, the cast matrix, and default values.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use converge_sql::SqlValue;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A built-in column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Boolean,
    Integer,
    Decimal,
    Float,
    Text,
    Date,
    Time,
    DateTime,
    Json,
}

impl Domain {
    pub const ALL: [Domain; 9] = [
        Domain::Boolean,
        Domain::Integer,
        Domain::Decimal,
        Domain::Float,
        Domain::Text,
        Domain::Date,
        Domain::Time,
        Domain::DateTime,
        Domain::Json,
    ];

    /// The name used in facts.
    pub fn name(&self) -> &'static str {
        match self {
            Domain::Boolean => "boolean",
            Domain::Integer => "integer",
            Domain::Decimal => "decimal",
            Domain::Float => "float",
            Domain::Text => "text",
            Domain::Date => "date",
            Domain::Time => "time",
            Domain::DateTime => "datetime",
            Domain::Json => "json",
        }
    }

    /// The `pg_catalog` type backing the domain.
    pub fn sql_type(&self) -> &'static str {
        match self {
            Domain::Boolean => "bool",
            Domain::Integer => "int4",
            Domain::Decimal => "numeric",
            Domain::Float => "float8",
            Domain::Text => "text",
            Domain::Date => "date",
            Domain::Time => "time",
            Domain::DateTime => "timestamp",
            Domain::Json => "json",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }

    pub fn from_sql_type(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.sql_type() == name)
    }

    /// Can a column of this domain be converted in place with a cast?
    pub fn can_cast_to(&self, other: Domain) -> bool {
        use Domain::*;
        if *self == other {
            return true;
        }
        let targets: &[Domain] = match self {
            Boolean => &[Integer, Text],
            Integer => &[Boolean, Decimal, Float, Text],
            Decimal => &[Integer, Float, Text],
            Float => &[Integer, Decimal, Text],
            Text => &[Boolean, Integer, Decimal, Float, Date, Time, DateTime, Json],
            Date => &[Text, DateTime],
            Time => &[Text],
            DateTime => &[Text, Date, Time],
            Json => &[Text],
        };
        targets.contains(&other)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The type of a column: a built-in domain or an enumeration of labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Domain(Domain),
    Enum(Vec<String>),
}

impl ColumnType {
    /// Can an existing column of this type be converted to `other`?
    ///
    /// Enumerations convert to and from text, and to any other enumeration.
    pub fn can_convert_to(&self, other: &ColumnType) -> bool {
        match (self, other) {
            (ColumnType::Domain(from), ColumnType::Domain(to)) => from.can_cast_to(*to),
            (ColumnType::Domain(from), ColumnType::Enum(_)) => *from == Domain::Text,
            (ColumnType::Enum(_), ColumnType::Domain(to)) => *to == Domain::Text,
            (ColumnType::Enum(_), ColumnType::Enum(_)) => true,
        }
    }

    pub fn labels(&self) -> Option<&[String]> {
        match self {
            ColumnType::Enum(labels) => Some(labels),
            ColumnType::Domain(_) => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Domain(domain) => write!(f, "{}", domain),
            ColumnType::Enum(labels) => write!(f, "enum({})", labels.join(", ")),
        }
    }
}

/// How an identity field fills itself in on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generator {
    /// One more than the largest value among records sharing the preceding
    /// identity fields.
    Offset,
    /// A random value.
    Random,
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generator::Offset => f.write_str("offset"),
            Generator::Random => f.write_str("random"),
        }
    }
}

const TODAY: &str = "today()";
const NOW: &str = "now()";

/// A validated column default.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefault {
    /// The canonical text, as stored in metadata.
    pub canonical: String,
    pub value: SqlValue,
}

impl ColumnDefault {
    /// Validate a default given in a fact.
    pub fn from_value(ty: &ColumnType, raw: &Value) -> Result<Option<Self>, String> {
        let text = match raw {
            Value::Null => return Ok(None),
            Value::String(text) => text.clone(),
            Value::Bool(flag) => flag.to_string(),
            Value::Number(number) => number.to_string(),
            Value::Array(_) | Value::Object(_) if *ty == ColumnType::Domain(Domain::Json) => {
                raw.to_string()
            }
            _ => return Err(format!("expected a scalar value, got {raw}")),
        };
        Self::parse(ty, &text).map(Some)
    }

    /// Validate a default given as text, canonical or not.
    pub fn parse(ty: &ColumnType, text: &str) -> Result<Self, String> {
        let domain = match ty {
            ColumnType::Enum(labels) => {
                if !labels.iter().any(|label| label == text) {
                    return Err(format!("expected one of {}, got '{text}'", labels.join(", ")));
                }
                return Ok(Self::text(text));
            }
            ColumnType::Domain(domain) => *domain,
        };

        let invalid = || format!("invalid {domain} value '{text}'");
        Ok(match domain {
            Domain::Boolean => {
                let flag = match text {
                    "true" => true,
                    "false" => false,
                    _ => return Err(invalid()),
                };
                Self {
                    canonical: flag.to_string(),
                    value: SqlValue::Bool(flag),
                }
            }
            Domain::Integer => {
                let number = i32::from_str(text).map_err(|_| invalid())?;
                Self {
                    canonical: number.to_string(),
                    value: SqlValue::Integer(number.into()),
                }
            }
            Domain::Decimal => {
                let number = Decimal::from_str(text).map_err(|_| invalid())?;
                Self {
                    canonical: number.to_string(),
                    value: SqlValue::Decimal(number),
                }
            }
            Domain::Float => {
                let number = f64::from_str(text).map_err(|_| invalid())?;
                if !number.is_finite() {
                    return Err(invalid());
                }
                Self {
                    canonical: number.to_string(),
                    value: SqlValue::Float(number),
                }
            }
            Domain::Text => Self::text(text),
            Domain::Date if text == TODAY => Self::expr(TODAY, "CURRENT_DATE"),
            Domain::Date => {
                let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| invalid())?;
                Self {
                    canonical: date.to_string(),
                    value: SqlValue::Date(date),
                }
            }
            Domain::Time => {
                let time = NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
                    .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
                    .map_err(|_| invalid())?;
                Self {
                    canonical: time.to_string(),
                    value: SqlValue::Time(time),
                }
            }
            Domain::DateTime if text == NOW => Self::expr(NOW, "LOCALTIMESTAMP"),
            Domain::DateTime => {
                let datetime = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
                    .iter()
                    .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                    .ok_or_else(invalid)?;
                Self {
                    canonical: datetime.to_string(),
                    value: SqlValue::DateTime(datetime),
                }
            }
            Domain::Json => {
                let document: Value = serde_json::from_str(text).map_err(|_| invalid())?;
                let canonical = document.to_string();
                Self {
                    value: SqlValue::Text(canonical.clone()),
                    canonical,
                }
            }
        })
    }

    /// The default as a SQL expression.
    pub fn to_sql(&self) -> String {
        self.value.to_string()
    }

    fn text(text: &str) -> Self {
        Self {
            canonical: text.to_string(),
            value: SqlValue::Text(text.to_string()),
        }
    }

    fn expr(canonical: &str, sql: &str) -> Self {
        Self {
            canonical: canonical.to_string(),
            value: SqlValue::Expr(sql.to_string()),
        }
    }
}
