//! BlackDog Core - plugin metadata discovery and caching.
//!
//! This crate scrapes a plugin catalog for plugins, their versions, and
//! per-version metadata, and persists what it learns in a per-plugin cache
//! file. The repository server in `blackdog-server` is built on top of it.
//!
//! # Example
//!
//! ```rust,ignore
//! use blackdog_core::PluginRegistry;
//!
//! #[tokio::main]
//! async fn main() -> blackdog_core::Result<()> {
//!     let registry = PluginRegistry::open("/home/me/.blackdog", "http://dev.bukkit.org")?;
//!
//!     // Cached record, refreshed from the catalog for version 5.6.3
//!     let plugin = registry.resolve("worldedit", "5.6.3").await?;
//!     println!("{:?}", plugin.get_version("5.6.3")?.url);
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod registry;
pub mod store;

// Re-export commonly used types
pub use catalog::{CatalogClient, ScanReport, SearchQuery};
pub use error::{BlackDogError, Result};
pub use models::{normalize_path_name, Plugin, PluginStage, PluginVersion};
pub use network::HttpClient;
pub use registry::{ArchiveDigests, PluginRegistry};
pub use store::MetadataStore;
