//! A single named, versioned configuration value

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// A named JSON value with version tracking
///
/// The version starts at 1 and increases by exactly 1 on every successful
/// replacement; it never decreases or skips.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Configuration {
    pub name: String,
    value: Value,
    version: u64,
    updated_at: DateTime<Utc>,
}

impl Configuration {
    #[must_use]
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            version: 1,
            updated_at: Utc::now(),
        }
    }

    /// Get the current value
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace the value, bumping the version and timestamp
    ///
    /// Fails with a validation error when a field that is currently numeric
    /// would become non-numeric (a `port` must stay coercible to a number).
    /// Validation runs before any mutation, so a rejected value leaves the
    /// value, version and timestamp untouched.
    pub fn set_value(&mut self, new_value: Value) -> Result<()> {
        validate_numeric_fields(&self.value, &new_value)?;

        self.value = new_value;
        self.version += 1;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Check that fields which are currently numeric stay coercible to a number
/// in the replacement value. A JSON number passes, as does a string that
/// parses as one; a field absent from the replacement is not checked.
fn validate_numeric_fields(current: &Value, new_value: &Value) -> Result<()> {
    let (Some(current_map), Some(new_map)) = (current.as_object(), new_value.as_object()) else {
        return Ok(());
    };

    for (key, old) in current_map {
        if !old.is_number() {
            continue;
        }
        if let Some(new) = new_map.get(key) {
            if !is_numeric(new) {
                return Err(Error::Validation(format!(
                    "field '{key}' must stay numeric, got {new}"
                )));
            }
        }
    }

    Ok(())
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}
