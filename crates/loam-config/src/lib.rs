//! # Loam Configuration
//!
//! Typed configuration for the note graph and its local plugins.
//!
//! - Multi-format support (TOML, YAML, JSON), detected from the file extension
//! - Every field has a default, so an empty file is a valid configuration
//! - Local plugins stay off unless `experimental.localPlugins.enabled` is `true`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use loam_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::load_from_file("loam.toml").await?;
//!     for folder in config.plugin_folders() {
//!         println!("plugin folder: {}", folder.display());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod loader;

pub use config::*;
pub use loader::*;
