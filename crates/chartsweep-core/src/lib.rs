//! Chartsweep Core - Core types for GitOps chart update automation
//!
//! This crate provides the foundational types used throughout chartsweep:
//! - `ChartDependency`: one chart reference extracted from a manifest
//! - `VersionUpdate`: a proposed update for a dependency
//! - `UpdateSettings`: the update policy (strategy, ignore rules, credentials)
//!
//! Manifest scanning produces `ChartDependency` records; the resolution
//! engine in `chartsweep-repo` consumes them and emits `VersionUpdate`
//! records for the file updater and pull-request tooling downstream.

pub mod config;
pub mod error;
pub mod manifest;

pub use config::{
    AuthType, IgnoreRule, RegistryCredential, UpdateSettings, UpdateStrategy, UpdateType,
};
pub use error::{CoreError, Result};
pub use manifest::{ChartDependency, RepositoryKind, VersionUpdate};
