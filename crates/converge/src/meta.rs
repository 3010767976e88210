//! Metadata stored in object comments.
//!
//! Every model keeps the attributes Postgres has no place for (the label
//! when it differs from the name, a custom title, the canonical default,
//! identity generators) as a small JSON document in the comment of its
//! primary catalog object. A comment that is not such a document reads as
//! empty metadata; empty metadata is written as `COMMENT ... IS NULL`.
//! Keys this crate does not know are carried through untouched.

use crate::domain::Generator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generators: Option<Vec<Option<Generator>>>,
    /// Keys written by someone else.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Meta {
    /// Decode a comment. Anything unreadable decodes to empty metadata.
    pub fn parse(comment: Option<&str>) -> Self {
        comment
            .and_then(|text| serde_json::from_str(text).ok())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Encode as a comment, or `None` when there is nothing to store.
    pub fn dump(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        serde_json::to_string(self).ok()
    }

    pub fn set_label(&mut self, label: Option<String>) -> bool {
        replace(&mut self.label, label)
    }

    pub fn set_title(&mut self, title: Option<String>) -> bool {
        replace(&mut self.title, title)
    }

    pub fn set_default(&mut self, default: Option<String>) -> bool {
        replace(&mut self.default, default)
    }

    pub fn set_generators(&mut self, generators: Option<Vec<Option<Generator>>>) -> bool {
        replace(&mut self.generators, generators)
    }
}

/// Store `value` into `slot`, reporting whether anything changed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
