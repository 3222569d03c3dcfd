pub mod config;
pub mod hashing;
pub mod logging;
pub mod update;
pub mod version;
