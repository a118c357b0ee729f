//! Plugin registry: cache-first plugin resolution.
//!
//! Combines the metadata store and the catalog client. Reads that only
//! consult the cache take no lock; every refresh from the catalog runs its
//! load-fill-save sequence under the plugin's write lock.

use crate::catalog::{CatalogClient, ScanReport, SearchQuery};
use crate::models::{Plugin, PluginStage};
use crate::network::HttpClient;
use crate::store::MetadataStore;
use crate::{BlackDogError, Result};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Entry point for plugin lookups.
#[derive(Debug, Clone)]
pub struct PluginRegistry {
    store: MetadataStore,
    catalog: CatalogClient,
}

/// Digests computed while proxying an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveDigests {
    pub sha1: Option<String>,
    pub md5: Option<String>,
}

impl PluginRegistry {
    pub fn new(store: MetadataStore, catalog: CatalogClient) -> Self {
        Self { store, catalog }
    }

    /// Build a registry caching into `cache_dir` and scraping `catalog_url`.
    pub fn open(cache_dir: impl Into<PathBuf>, catalog_url: &str) -> Result<Self> {
        let store = MetadataStore::new(cache_dir);
        let catalog = CatalogClient::new(catalog_url, HttpClient::new()?, store.clone())?;
        Ok(Self::new(store, catalog))
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Load `name` from the cache and, unless `no_query` is set, refresh it
    /// from the catalog for `version` (all versions when `None`).
    pub async fn get_plugin(
        &self,
        name: &str,
        version: Option<&str>,
        no_query: bool,
    ) -> Result<Plugin> {
        if no_query {
            return self.store.load_plugin(name);
        }

        let mut plugin = Plugin::new(name);
        let _guard = self.store.lock(&plugin).await;
        if let Err(e) = self.store.load(&mut plugin) {
            warn!("Ignoring unreadable cache for {}: {}", name, e);
            plugin = Plugin::new(name);
        }
        self.catalog.fill_plugin(&mut plugin, version).await?;
        Ok(plugin)
    }

    /// Resolve `name` at `version` for serving.
    ///
    /// Answers from the cache when the version is known with a download URL,
    /// otherwise refreshes that version from the catalog. Fails with a
    /// not-found error when the plugin or version remains unknown.
    pub async fn resolve(&self, name: &str, version: &str) -> Result<Plugin> {
        let cached = match self.store.load_plugin(name) {
            Ok(plugin) => Some(plugin),
            Err(e) => {
                warn!("Ignoring unreadable cache for {}: {}", name, e);
                None
            }
        };

        let plugin = match cached {
            Some(plugin) if plugin.has_downloadable(version) => plugin,
            _ => {
                debug!("{} {} not cached, querying the catalog", name, version);
                self.get_plugin(name, Some(version), false).await?
            }
        };

        if !plugin.versions.contains_key(version) {
            if plugin.exists == Some(false) {
                return Err(BlackDogError::NoSuchPlugin {
                    name: name.to_string(),
                });
            }
            return Err(BlackDogError::NoSuchPluginVersion {
                version: version.to_string(),
            });
        }
        Ok(plugin)
    }

    /// Persist `plugin` under its write lock.
    pub async fn save(&self, plugin: &Plugin) -> Result<()> {
        let _guard = self.store.lock(plugin).await;
        self.store.save(plugin)
    }

    /// Record digests computed for an archive, keeping any already cached.
    ///
    /// The record is re-read under the lock so that a refresh that finished
    /// while the archive was streaming is not overwritten.
    pub async fn record_archive_digests(
        &self,
        name: &str,
        version: &str,
        digests: ArchiveDigests,
    ) -> Result<()> {
        let mut plugin = Plugin::new(name);
        let _guard = self.store.lock(&plugin).await;
        self.store.load(&mut plugin)?;

        let record = plugin.get_version_mut(version)?;
        if record.sha1.is_none() {
            record.sha1 = digests.sha1;
        }
        if record.md5.is_none() {
            record.md5 = digests.md5;
        }
        self.store.save(&plugin)
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Plugin>> {
        self.catalog.search(query).await
    }

    pub async fn scan(&self, stages: &[PluginStage]) -> ScanReport {
        self.catalog.scan(stages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PluginVersion;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cached_plugin(registry: &PluginRegistry, url: Option<&str>) {
        let mut plugin = Plugin::new("foo");
        let mut version = PluginVersion::new("foo", "1.0").unwrap();
        version.url = url.map(str::to_string);
        plugin.add_version(version);
        registry.store().save(&plugin).unwrap();
    }

    #[tokio::test]
    async fn test_resolve_from_cache_does_not_query() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let registry = PluginRegistry::open(dir.path(), &server.uri()).unwrap();
        cached_plugin(&registry, Some("http://example.com/foo.jar"));

        let plugin = registry.resolve("foo", "1.0").await.unwrap();
        assert!(plugin.has_downloadable("1.0"));
    }

    #[tokio::test]
    async fn test_resolve_unknown_plugin() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let registry = PluginRegistry::open(dir.path(), &server.uri()).unwrap();

        let err = registry.resolve("ghost", "1.0").await.unwrap_err();
        assert!(matches!(err, BlackDogError::NoSuchPlugin { .. }));
    }

    #[tokio::test]
    async fn test_resolve_unknown_version() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/bukkit-plugins/foo/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bukkit-plugins/foo/files/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let registry = PluginRegistry::open(dir.path(), &server.uri()).unwrap();
        cached_plugin(&registry, Some("http://example.com/foo.jar"));

        let err = registry.resolve("foo", "2.0").await.unwrap_err();
        assert!(matches!(err, BlackDogError::NoSuchPluginVersion { .. }));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_resolve_refreshes_version_without_url() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bukkit-plugins/foo/files/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let registry = PluginRegistry::open(dir.path(), &server.uri()).unwrap();
        cached_plugin(&registry, None);

        let plugin = registry.resolve("foo", "1.0").await.unwrap();
        assert!(!plugin.has_downloadable("1.0"));
        assert_eq!(plugin.exists, Some(true));
    }

    #[tokio::test]
    async fn test_record_archive_digests_keeps_existing() {
        let dir = TempDir::new().unwrap();
        let registry = PluginRegistry::open(dir.path(), "http://localhost").unwrap();
        let mut plugin = Plugin::new("foo");
        let mut version = PluginVersion::new("foo", "1.0").unwrap();
        version.md5 = Some("catalog-md5".into());
        plugin.add_version(version);
        registry.save(&plugin).await.unwrap();

        registry
            .record_archive_digests(
                "foo",
                "1.0",
                ArchiveDigests {
                    sha1: Some("computed-sha1".into()),
                    md5: Some("computed-md5".into()),
                },
            )
            .await
            .unwrap();

        let version = registry.store().load_plugin("foo").unwrap();
        let version = version.get_version("1.0").unwrap();
        assert_eq!(version.sha1.as_deref(), Some("computed-sha1"));
        assert_eq!(version.md5.as_deref(), Some("catalog-md5"));
    }

    #[tokio::test]
    async fn test_get_plugin_no_query_reads_cache_only() {
        let dir = TempDir::new().unwrap();
        let registry = PluginRegistry::open(dir.path(), "http://localhost:1").unwrap();
        cached_plugin(&registry, Some("http://example.com/foo.jar"));

        let plugin = registry.get_plugin("foo", None, true).await.unwrap();
        assert_eq!(plugin.versions.len(), 1);
        assert!(plugin.exists.is_none());
    }
}
