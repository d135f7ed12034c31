//! Presence check for the caller-supplied crisis identifier.
//!
//! The identifier's type is not part of the contract: anything "truthy" is
//! accepted, matching how loosely the reporting dashboard sends it. Strings
//! and numbers can address a row; the remaining truthy values cannot.

use serde_json::Value;

use crate::error::CoreError;

/// Name of the request field, used in error messages.
pub const CRISIS_ID_FIELD: &str = "crisis_id";

/// A present, usable crisis identifier.
///
/// Keeps the exact JSON value the caller sent so responses can echo it
/// verbatim, alongside the string form used for the primary-key lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CrisisId {
    raw: Value,
    key: String,
}

impl CrisisId {
    /// Interpret an optional request field.
    ///
    /// Returns `Ok(None)` when the field is absent or falsy (`null`, `""`,
    /// `false`, `0`, `[]`, `{}`). Truthy values that are neither strings nor
    /// numbers are rejected with [`CoreError::Validation`].
    pub fn from_json(value: Option<&Value>) -> Result<Option<Self>, CoreError> {
        let Some(value) = value else {
            return Ok(None);
        };

        if !is_truthy(value) {
            return Ok(None);
        }

        let key = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => {
                return Err(CoreError::Validation(format!(
                    "{CRISIS_ID_FIELD} must be a string or number"
                )))
            }
        };

        Ok(Some(Self {
            raw: value.clone(),
            key,
        }))
    }

    /// Like [`from_json`](Self::from_json), but a missing identifier is an error.
    pub fn require(value: Option<&Value>) -> Result<Self, CoreError> {
        Self::from_json(value)?.ok_or(CoreError::MissingParameter(CRISIS_ID_FIELD))
    }

    /// The lookup key for the `incidents.id` column.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// The identifier exactly as the caller sent it.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }
}

impl std::fmt::Display for CrisisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
