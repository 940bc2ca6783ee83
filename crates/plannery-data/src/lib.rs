//! Plannery Data -- loads catalogs and planner configuration from disk.
//!
//! Catalog and config files may be written in RON, JSON or TOML; the format
//! is chosen by file extension. Catalog files are resolved into an immutable
//! [`plannery_core::catalog::Catalog`].

pub mod config;
pub mod loader;
pub mod schema;

pub use config::PlannerConfig;
pub use loader::{DataLoadError, load_catalog};
