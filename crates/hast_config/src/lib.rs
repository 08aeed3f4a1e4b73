//! Parsing and validation of `hast.toml` transformer configuration files.
//!
//! This crate reads the project configuration and produces a strongly-typed
//! [`ProjectConfig`]. [`resolve_member`] answers the per-member questions the
//! invocation protocol asks: how many instances of a member may run in
//! parallel, and how deep its recursion may go.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use resolve::{resolve_member, ResolvedMember};
pub use types::*;
