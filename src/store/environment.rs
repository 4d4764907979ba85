//! Named collections of configurations

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use super::config::Configuration;
use crate::error::{Error, Result};

/// A named environment holding configurations keyed by configuration name
///
/// Names are unique within one environment; the same configuration name may
/// exist in other environments (that is what cross-environment comparison
/// relies on).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Environment {
    pub name: String,
    configurations: HashMap<String, Configuration>,
}

impl Environment {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            configurations: HashMap::new(),
        }
    }

    /// Add a new configuration at version 1
    pub fn add_configuration(&mut self, name: &str, value: Value) -> Result<()> {
        if self.configurations.contains_key(name) {
            return Err(Error::AlreadyExists(format!(
                "configuration '{}' in environment '{}'",
                name, self.name
            )));
        }

        debug!(
            "Adding configuration '{}' to environment '{}'",
            name, self.name
        );
        self.configurations
            .insert(name.to_string(), Configuration::new(name, value));
        Ok(())
    }

    /// Replace an existing configuration's value
    pub fn update_configuration(&mut self, name: &str, value: Value) -> Result<()> {
        match self.configurations.get_mut(name) {
            Some(config) => config.set_value(value),
            None => Err(Error::NotFound(format!(
                "configuration '{}' in environment '{}'",
                name, self.name
            ))),
        }
    }

    /// Remove a configuration. Terminal: no history is retained.
    pub fn delete_configuration(&mut self, name: &str) -> Result<()> {
        if self.configurations.remove(name).is_none() {
            return Err(self.missing(name));
        }
        debug!(
            "Deleted configuration '{}' from environment '{}'",
            name, self.name
        );
        Ok(())
    }

    /// Look up a configuration by name
    pub fn configuration(&self, name: &str) -> Result<&Configuration> {
        self.configurations
            .get(name)
            .ok_or_else(|| self.missing(name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.configurations.contains_key(name)
    }

    /// Configuration names, in no particular order
    #[must_use]
    pub fn list_configurations(&self) -> Vec<String> {
        self.configurations.keys().cloned().collect()
    }

    /// All configurations, keyed by name
    #[must_use]
    pub fn configurations(&self) -> &HashMap<String, Configuration> {
        &self.configurations
    }

    fn missing(&self, name: &str) -> Error {
        Error::NotFound(format!(
            "configuration '{}' in environment '{}'",
            name, self.name
        ))
    }
}
