//! Centralized configuration for BlackDog.
//!
//! Constants for network behavior, the catalog's URL layout and HTML
//! contract, cache paths, and server defaults.

use crate::models::PluginStage;
use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "BlackDog";
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const USER_AGENT: &'static str = "BlackDog/0.2";
    /// Chunk size used when forwarding archives to the client.
    pub const STREAM_CHUNK_SIZE: usize = 16 * 1024;
}

/// Layout of the remote plugin catalog.
pub struct CatalogConfig;

impl CatalogConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://dev.bukkit.org";
    /// Path segment under which every plugin lives (`/bukkit-plugins/<name>/`).
    pub const PLUGINS_PATH: &'static str = "bukkit-plugins";
    /// Path segment of a plugin's paginated file listing.
    pub const FILES_PATH: &'static str = "files";
    /// Only listing rows whose filename ends with this are considered.
    pub const ARCHIVE_EXTENSION: &'static str = ".jar";
    /// Target version meaning "the first version the listing shows".
    pub const LATEST_VERSION: &'static str = "latest";
    pub const DEFAULT_SCAN_STAGES: [PluginStage; 2] = [PluginStage::Release, PluginStage::Mature];
}

/// CSS selectors describing the catalog's HTML.
///
/// The catalog markup is an external contract that changes over time;
/// every selector the scraper depends on lives here.
pub struct CatalogSelectors;

impl CatalogSelectors {
    /// Rows of a plugin's file listing.
    pub const FILE_ROWS: &'static str = "table.listing tbody tr";
    /// Link to the file detail page; its text is the file description.
    pub const FILE_LINK: &'static str = "td.col-file a";
    pub const FILE_NAME: &'static str = "td.col-filename";

    /// Definition list on a file detail page.
    pub const DETAIL_TERMS: &'static str = "dl dt";
    pub const DETAIL_LIST_ITEMS: &'static str = "li";
    pub const DETAIL_LINK: &'static str = "a";

    /// Result rows of a catalog search, alternating info and summary rows.
    pub const SEARCH_ROWS: &'static str = ".listing-container table tbody tr";
    pub const SEARCH_TITLE: &'static str = "td.col-project h2 a";
    pub const SEARCH_STATUS: &'static str = "td.col-status";
    pub const SEARCH_SUMMARY: &'static str = "td.summary";
}

/// Shared directory and path configurations.
pub struct PathsConfig;

impl PathsConfig {
    /// Data directory created under the user's home directory.
    pub const DATA_DIR_NAME: &'static str = ".blackdog";
    pub const CACHE_FILE_EXTENSION: &'static str = "data";
    /// Section of a cache file that holds the plugin's own fields.
    pub const PLUGIN_SECTION: &'static str = "plugin";
    pub const TEMP_SUFFIX: &'static str = "tmp";
}

/// Repository server defaults.
pub struct ServerConfig;

impl ServerConfig {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 8080;
}
