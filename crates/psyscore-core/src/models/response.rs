use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Item identifier as printed on the instrument (1-based).
pub type ItemId = u32;

/// The answers submitted for one test application, keyed by item.
///
/// Unanswered items are simply absent. The ordered map keeps every
/// serialization of the set byte-for-byte stable.
pub type ResponseSet = BTreeMap<ItemId, Answer>;

/// A raw stored answer, exactly as the collection form recorded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum Answer {
    Bool(bool),
    Number(f64),
    Label(String),
}

impl Answer {
    pub fn label(label: impl Into<String>) -> Self {
        Self::Label(label.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Answer {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for Answer {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Self::Label(value.to_string())
    }
}
