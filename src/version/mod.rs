//! Registry layer for resolving package versions
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌─────────────┐
//! │   Factory   │────▶│  RegistryClient  │────▶│ VersionInfo │
//! │ (dispatch)  │     │ (npm,pypi,github)│     │  (result)   │
//! └─────────────┘     └──────────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`registry`]: `RegistryClient` trait and the scoped session guard
//! - [`registries`]: Concrete backends (npm, PyPI, GitHub releases)
//! - [`factory`]: Maps a registry kind to a constructed client
//! - [`error`]: Error types for registry operations
//! - [`types`]: `PackageRegistry`, `VersionInfo`, `UpdateResult`

pub mod error;
pub mod factory;
pub mod registries;
pub mod registry;
pub mod types;
