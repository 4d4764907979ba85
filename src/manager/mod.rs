//! Environment bookkeeping, comparison and persistence
//!
//! [`EnvironmentManager`] owns the mapping of environment name to
//! [`Environment`] and is the single entry point callers go through: it
//! guards add/remove with existence checks, compares configurations across
//! environments, exports and imports value-only snapshots, and delegates
//! commit/push/pull to an injected [`ConfigRepository`] collaborator.
//!
//! The manager assumes one logical owner per instance; there are no
//! concurrent-mutation guarantees and no rollback for a partially applied
//! import.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::diff::{diff_values, FieldDiff};
use crate::error::{Error, Result};
use crate::repository::ConfigRepository;
use crate::store::{Configuration, Environment};

#[cfg(test)]
mod tests;

/// Value-only snapshot: environment name → configuration name → value
///
/// Version and timestamp metadata is intentionally absent; this is the
/// format written to and read from snapshot files.
pub type Snapshot = BTreeMap<String, BTreeMap<String, Value>>;

/// Result of comparing one configuration across two environments
#[derive(Serialize, Debug, Clone)]
pub struct ComparisonReport {
    pub left_env: String,
    pub left_value: Value,
    pub right_env: String,
    pub right_value: Value,
    pub differences: BTreeMap<String, FieldDiff>,
}

/// Owns all environments and drives persistence
pub struct EnvironmentManager {
    environments: HashMap<String, Environment>,
    repository: Option<Arc<dyn ConfigRepository>>,
    snapshot_path: Option<PathBuf>,
}

impl EnvironmentManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            environments: HashMap::new(),
            repository: None,
            snapshot_path: None,
        }
    }

    /// Attach a repository collaborator
    ///
    /// When `snapshot_path` is set, `commit_changes` writes the current
    /// snapshot there before delegating, so the collaborator always commits
    /// a current snapshot.
    #[must_use]
    pub fn with_repository(
        mut self,
        repository: Arc<dyn ConfigRepository>,
        snapshot_path: Option<PathBuf>,
    ) -> Self {
        self.repository = Some(repository);
        self.snapshot_path = snapshot_path;
        self
    }

    /// Load the full store (metadata included) from disk, or start empty
    /// when the file does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let environments = serde_json::from_str(&contents)?;
            Ok(Self {
                environments,
                repository: None,
                snapshot_path: None,
            })
        } else {
            Ok(Self::new())
        }
    }

    /// Save the full store (metadata included) to disk with an atomic write
    pub fn save_state(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, &self.environments)
    }

    pub fn add_environment(&mut self, name: &str) -> Result<()> {
        if self.environments.contains_key(name) {
            return Err(Error::AlreadyExists(format!("environment '{name}'")));
        }
        debug!("Adding environment '{}'", name);
        self.environments
            .insert(name.to_string(), Environment::new(name));
        Ok(())
    }

    /// Remove an environment and all its configurations
    ///
    /// Removal of a missing name is a not-found error and leaves the other
    /// environments untouched.
    pub fn remove_environment(&mut self, name: &str) -> Result<()> {
        if self.environments.remove(name).is_none() {
            return Err(Error::NotFound(format!("environment '{name}'")));
        }
        debug!("Removed environment '{}'", name);
        Ok(())
    }

    /// Snapshot of current environment names, in no particular order
    #[must_use]
    pub fn list_environments(&self) -> Vec<String> {
        self.environments.keys().cloned().collect()
    }

    pub fn environment(&self, name: &str) -> Result<&Environment> {
        self.environments
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("environment '{name}'")))
    }

    pub fn environment_mut(&mut self, name: &str) -> Result<&mut Environment> {
        match self.environments.get_mut(name) {
            Some(env) => Ok(env),
            None => Err(Error::NotFound(format!("environment '{name}'"))),
        }
    }

    /// Add a configuration to an environment
    pub fn add_configuration(&mut self, env: &str, name: &str, value: Value) -> Result<()> {
        self.environment_mut(env)?.add_configuration(name, value)
    }

    /// Replace an existing configuration's value
    pub fn update_configuration(&mut self, env: &str, name: &str, value: Value) -> Result<()> {
        self.environment_mut(env)?.update_configuration(name, value)
    }

    /// Delete a configuration from an environment
    pub fn delete_configuration(&mut self, env: &str, name: &str) -> Result<()> {
        self.environment_mut(env)?.delete_configuration(name)
    }

    /// Look up a configuration within an environment
    pub fn configuration(&self, env: &str, name: &str) -> Result<&Configuration> {
        self.environment(env)?.configuration(name)
    }

    /// Compare one configuration across two environments
    ///
    /// Fails with a not-found error when either environment or the named
    /// configuration is missing on either side. Mutates neither side.
    pub fn compare_configurations(
        &self,
        left: &str,
        right: &str,
        config_name: &str,
    ) -> Result<ComparisonReport> {
        let left_config = self.environment(left)?.configuration(config_name)?;
        let right_config = self.environment(right)?.configuration(config_name)?;

        Ok(ComparisonReport {
            left_env: left.to_string(),
            left_value: left_config.value().clone(),
            right_env: right.to_string(),
            right_value: right_config.value().clone(),
            differences: diff_values(left_config.value(), right_config.value()),
        })
    }

    /// Produce a value-only snapshot of every environment
    ///
    /// Version and timestamp metadata is dropped; use `save_state` for a
    /// full-fidelity serialization.
    #[must_use]
    pub fn export_snapshot(&self) -> Snapshot {
        self.environments
            .iter()
            .map(|(env_name, env)| {
                let configs = env
                    .configurations()
                    .iter()
                    .map(|(name, config)| (name.clone(), config.value().clone()))
                    .collect();
                (env_name.clone(), configs)
            })
            .collect()
    }

    /// Merge a snapshot into the store, additive-only
    ///
    /// Missing environments are created and missing configurations added at
    /// version 1; a configuration that already exists is never overwritten.
    /// There is no rollback if a caller aborts midway.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        for (env_name, configs) in snapshot {
            let env = self
                .environments
                .entry(env_name.clone())
                .or_insert_with(|| Environment::new(env_name));
            for (config_name, value) in configs {
                if env.contains(&config_name) {
                    debug!(
                        "Configuration '{}' already present in '{}', not overwritten",
                        config_name, env.name
                    );
                    continue;
                }
                env.add_configuration(&config_name, value)?;
            }
        }
        Ok(())
    }

    /// Write the value-only snapshot to a file with an atomic write
    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, &self.export_snapshot())
    }

    /// Read a snapshot file and merge it, additive-only
    pub fn import_from_file(&mut self, path: &Path) -> Result<()> {
        let contents = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&contents)?;
        self.import_snapshot(snapshot)
    }

    /// Capture pending state, then record a commit through the collaborator
    pub async fn commit_changes(&self, message: &str) -> Result<()> {
        let repository = self.repository()?;
        if let Some(path) = &self.snapshot_path {
            self.export_to_file(path)?;
        }
        repository.commit(message).await.map_err(Error::Persistence)
    }

    /// Push a branch through the collaborator
    pub async fn push_changes(&self, remote: &str, branch: &str) -> Result<()> {
        let repository = self.repository()?;
        repository
            .push(remote, branch)
            .await
            .map_err(Error::Persistence)
    }

    /// Pull a branch through the collaborator
    pub async fn pull_changes(&self, remote: &str, branch: &str) -> Result<()> {
        let repository = self.repository()?;
        repository
            .pull(remote, branch)
            .await
            .map_err(Error::Persistence)
    }

    fn repository(&self) -> Result<&Arc<dyn ConfigRepository>> {
        self.repository.as_ref().ok_or_else(|| {
            Error::Persistence(anyhow::anyhow!("no repository collaborator configured"))
        })
    }
}

impl Default for EnvironmentManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize to a temp file, then rename into place
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_file = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&temp_file, json)?;
    fs::rename(temp_file, path)?;

    Ok(())
}
