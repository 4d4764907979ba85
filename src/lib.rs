//! # Conftrack
//!
//! Track, version and diff named environment configurations, with
//! git-backed persistence behind an injected repository collaborator.
//!
//! ## Usage
//!
//! ```bash
//! conftrack env add dev
//! conftrack config add dev database '{"url": "localhost", "port": 5432}'
//! conftrack compare dev prod database
//! ```
//!
//! ## Modules
//!
//! - `diff` - Pure field-level comparison of configuration values
//! - `error` - Unified error type for the crate
//! - `manager` - Environment bookkeeping, snapshots and persistence
//! - `repository` - Version-control collaborator trait with real and mock implementations
//! - `store` - Environments and their versioned configurations

pub mod diff;
pub mod error;
pub mod manager;
pub mod repository;
pub mod store;

pub use error::{Error, Result};
pub use manager::EnvironmentManager;
