//! Version-control collaborator abstraction
//!
//! Provides a trait-based abstraction over the version-control backend so
//! the manager can be tested without a real repository.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Trait for version-control side effects
///
/// Calls are blocking from the caller's point of view; there is no built-in
/// timeout or retry. Callers that need either wrap the call themselves.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Record the current working tree as a commit
    async fn commit(&self, message: &str) -> Result<()>;

    /// Push the given branch to a remote
    async fn push(&self, remote: &str, branch: &str) -> Result<()>;

    /// Pull the given branch from a remote
    async fn pull(&self, remote: &str, branch: &str) -> Result<()>;
}

/// Real implementation of [`ConfigRepository`] shelling out to git
pub struct GitRepository {
    workdir: PathBuf,
    /// Mutex for exclusive access to the working tree
    git_mutex: Arc<Mutex<()>>,
}

impl GitRepository {
    /// Create a repository collaborator rooted at the given working tree
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            git_mutex: Arc::new(Mutex::new(())),
        }
    }

    async fn git_command(&self, args: &[&str], description: &str) -> Result<std::process::Output> {
        // Acquire the mutex to ensure exclusive access
        let _guard = self.git_mutex.lock().await;

        let output = tokio::process::Command::new("git")
            .current_dir(&self.workdir)
            .args(args)
            .output()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to execute git {}: {}", description, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!(
                "Git {} failed: {}",
                description,
                stderr.trim()
            ));
        }

        Ok(output)
    }
}

#[async_trait]
impl ConfigRepository for GitRepository {
    async fn commit(&self, message: &str) -> Result<()> {
        self.git_command(&["add", "."], "add").await?;
        self.git_command(&["commit", "-m", message], "commit")
            .await?;
        Ok(())
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.git_command(&["push", remote, branch], "push").await?;
        Ok(())
    }

    async fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.git_command(&["pull", remote, branch], "pull").await?;
        Ok(())
    }
}

/// One recorded call on a [`MockRepository`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryCall {
    Commit { message: String },
    Push { remote: String, branch: String },
    Pull { remote: String, branch: String },
}

/// Mock implementation of [`ConfigRepository`] for testing
///
/// Records every call in order and replays queued failures front-first; an
/// empty failure queue means every call succeeds.
pub struct MockRepository {
    calls: Arc<Mutex<Vec<RepositoryCall>>>,
    failures: Arc<Mutex<Vec<String>>>,
}

impl MockRepository {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a failure for the next call
    pub async fn queue_failure(&self, message: &str) {
        self.failures.lock().await.push(message.to_string());
    }

    /// Get the list of recorded calls for verification
    pub async fn calls(&self) -> Vec<RepositoryCall> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: RepositoryCall) -> Result<()> {
        self.calls.lock().await.push(call);

        let mut failures = self.failures.lock().await;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(anyhow::anyhow!(failures.remove(0)))
        }
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigRepository for MockRepository {
    async fn commit(&self, message: &str) -> Result<()> {
        self.record(RepositoryCall::Commit {
            message: message.to_string(),
        })
        .await
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.record(RepositoryCall::Push {
            remote: remote.to_string(),
            branch: branch.to_string(),
        })
        .await
    }

    async fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.record(RepositoryCall::Pull {
            remote: remote.to_string(),
            branch: branch.to_string(),
        })
        .await
    }
}
