//! BlackDog Server - local Maven-style repository for catalog-hosted plugins.
//!
//! Requests of the form `/<group...>/<plugin>/<version>/<file>` are resolved
//! through the [`PluginRegistry`](blackdog_core::PluginRegistry) and answered
//! with a proxied archive, a generated descriptor, or a checksum.

pub mod artifact;
pub mod handler;
pub mod server;
mod stream;

pub use artifact::{ArtifactKind, ArtifactRequest};
pub use server::{router, start_server, AppState};
