//! Synchronizing the pinned version/hash pair of the packaging artifact
//!
//! - [`state`]: locating and rewriting the pinned fields
//! - [`artifact`]: read/write access to the artifact
//! - [`updater`]: the check and update workflow

pub mod artifact;
pub mod state;
pub mod updater;

pub use artifact::{FileArtifact, PinnedArtifact};
pub use state::{PinnedField, PinnedState, StateError};
pub use updater::{UpdateError, Updater};
