//! Client for the remote plugin catalog.
//!
//! Discovers plugins and their versions by scraping the catalog's pages:
//! - existence probe on a plugin's page
//! - paginated file listing, filtered to archive files
//! - per-file detail pages for checksums, dates and game versions
//! - keyword search and stage-wide bulk scans
//!
//! Failures while processing a single row, page or plugin are logged and
//! skipped; they never abort the surrounding loop.

pub mod pages;
mod query;

pub use query::{encode_params, SearchQuery};

use crate::config::CatalogConfig;
use crate::models::{Plugin, PluginStage, PluginVersion};
use crate::network::HttpClient;
use crate::store::MetadataStore;
use crate::{BlackDogError, Result};
use pages::FileRow;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

/// Totals of a bulk scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Non-empty search pages processed.
    pub pages: usize,
    /// Plugins whose metadata was refreshed.
    pub plugins: usize,
    /// Plugins that could not be refreshed.
    pub failures: usize,
}

/// Scraper for the plugin catalog.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: HttpClient,
    base_url: Url,
    store: MetadataStore,
}

impl CatalogClient {
    /// Create a client for the catalog at `base_url`, persisting into `store`.
    pub fn new(base_url: &str, http: HttpClient, store: MetadataStore) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http,
            base_url,
            store,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Canonical page of a plugin: `<base>/bukkit-plugins/<name>/`.
    fn plugin_url(&self, name: &str) -> Result<Url> {
        Ok(self.base_url.join(&format!(
            "{}/{}/",
            CatalogConfig::PLUGINS_PATH,
            urlencoding::encode(name)
        ))?)
    }

    /// One page of a plugin's file listing.
    fn files_url(&self, name: &str, page: u32) -> Result<Url> {
        let mut url = self
            .plugin_url(name)?
            .join(&format!("{}/", CatalogConfig::FILES_PATH))?;
        url.set_query(Some(&encode_params(&[("page", page.to_string())])));
        Ok(url)
    }

    fn search_url(&self, query: &SearchQuery) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("{}/", CatalogConfig::PLUGINS_PATH))?;
        url.set_query(Some(&query.to_query_string()));
        Ok(url)
    }

    /// Whether the catalog has a page for `name`.
    ///
    /// Any failure, including a network error, counts as "does not exist".
    pub async fn plugin_exists(&self, name: &str) -> bool {
        match self.probe(name).await {
            Ok(exists) => exists,
            Err(e) => {
                debug!("Existence probe for {} failed: {}", name, e);
                false
            }
        }
    }

    async fn probe(&self, name: &str) -> Result<bool> {
        let url = self.plugin_url(name)?;
        let response = self.http.head(url.as_str()).await?;
        Ok(response.status().is_success())
    }

    /// Probe the plugin, then collect its versions and persist the record.
    ///
    /// A plugin the catalog answers "not found" for is saved with
    /// `exists = false`. If the probe itself fails, `exists` is left as it
    /// was and no listing is scanned.
    pub async fn fill_plugin(&self, plugin: &mut Plugin, target: Option<&str>) -> Result<()> {
        match self.probe(plugin.name()).await {
            Ok(true) => {
                plugin.exists = Some(true);
                self.enumerate_versions(plugin, target).await
            }
            Ok(false) => {
                info!("Plugin {} does not exist on the catalog", plugin.name());
                plugin.exists = Some(false);
                self.store.save(plugin)
            }
            Err(e) => {
                warn!("Could not probe plugin {}: {}", plugin.name(), e);
                self.store.save(plugin)
            }
        }
    }

    /// Page through the plugin's file listing and attach matching versions.
    ///
    /// With no `target` every archive row of every page is processed. With
    /// `target` set to a version string, scanning stops once a matching row
    /// is fetched; rows that fail are skipped. With `"latest"` it stops after
    /// the first row, fetched or not. The plugin is saved whatever the outcome.
    pub async fn enumerate_versions(&self, plugin: &mut Plugin, target: Option<&str>) -> Result<()> {
        let found = self.scan_file_pages(plugin, target).await;
        let saved = self.store.save(plugin);
        let found = found?;
        debug!("Collected {} versions of {}", found, plugin.name());
        saved
    }

    async fn scan_file_pages(&self, plugin: &mut Plugin, target: Option<&str>) -> Result<usize> {
        let mut found = 0;
        let mut previous: Vec<FileRow> = Vec::new();

        for page in 1.. {
            let url = self.files_url(plugin.name(), page)?;
            let html = match self.http.get_page(url.as_str()).await {
                Ok(Some(html)) => html,
                Ok(None) => break,
                Err(e) => {
                    warn!("Stopping file listing of {} at page {}: {}", plugin.name(), page, e);
                    break;
                }
            };

            let rows = pages::parse_archive_rows(&html);
            // Out-of-range pages may repeat the last page.
            if rows.is_empty() || rows == previous {
                break;
            }

            for row in &rows {
                let version = pages::extract_version(&row.description);
                if version.is_empty() || !target_matches(target, &version) {
                    continue;
                }

                match self.fetch_version(plugin.name(), &url, row, &version).await {
                    Ok(record) => {
                        plugin.merge_version(record);
                        found += 1;
                        if target.is_some() {
                            return Ok(found);
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Skipping file '{}' of {}: {}",
                            row.description,
                            plugin.name(),
                            e
                        );
                        // "latest" means the first listed row, even when it fails
                        if target == Some(CatalogConfig::LATEST_VERSION) {
                            return Ok(found);
                        }
                    }
                }
            }

            previous = rows;
        }

        Ok(found)
    }

    /// Build a version record from a listing row by following its detail link.
    async fn fetch_version(
        &self,
        plugin_name: &str,
        page_url: &Url,
        row: &FileRow,
        version: &str,
    ) -> Result<PluginVersion> {
        let href = row
            .detail_href
            .as_deref()
            .ok_or_else(|| BlackDogError::parse("file row has no detail link"))?;
        let detail_url = page_url.join(href)?;

        let mut record = PluginVersion::new(plugin_name, version)?;
        self.fetch_details(&detail_url, &mut record).await?;
        Ok(record)
    }

    /// Fill `version` from the file detail page at `detail_url`.
    pub async fn fetch_details(&self, detail_url: &Url, version: &mut PluginVersion) -> Result<()> {
        let html = self.http.get_required_page(detail_url.as_str()).await?;
        let details = pages::parse_file_details(&html)?;

        if let Some(href) = details.download_href {
            version.url = Some(detail_url.join(&href)?.to_string());
        }
        if details.md5.is_some() {
            version.md5 = details.md5;
        }
        if details.date.is_some() {
            version.date = details.date;
        }
        if details.stage.is_some() {
            version.stage = details.stage;
        }
        if details.game_versions.is_some() {
            version.game_versions = details.game_versions;
        }
        Ok(())
    }

    /// Run a catalog search and return the listed plugins in page order.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Plugin>> {
        let url = self.search_url(query)?;
        let html = self.http.get_required_page(url.as_str()).await?;
        Ok(pages::parse_search_results(&html))
    }

    /// Refresh every plugin listed under each of `stages`.
    ///
    /// An empty slice scans the default stages (release and mature). Each
    /// stage is paged from 1 until a page lists no plugins or fails.
    pub async fn scan(&self, stages: &[PluginStage]) -> ScanReport {
        let defaults = CatalogConfig::DEFAULT_SCAN_STAGES;
        let stages = if stages.is_empty() {
            &defaults[..]
        } else {
            stages
        };
        let mut report = ScanReport::default();

        for &stage in stages {
            let mut previous: Vec<String> = Vec::new();
            for page in 1.. {
                let query = SearchQuery::default().with_stage(stage).with_page(page);
                let found = match self.search(&query).await {
                    Ok(found) => found,
                    Err(e) => {
                        warn!("Stopping {} scan at page {}: {}", stage, page, e);
                        break;
                    }
                };

                let names: Vec<String> = found.iter().map(|p| p.name().to_string()).collect();
                if names.is_empty() || names == previous {
                    break;
                }
                report.pages += 1;
                info!("Scanning {} plugins, page {} ({} plugins)", stage, page, names.len());

                for listed in found {
                    match self.refresh_listed(listed).await {
                        Ok(()) => report.plugins += 1,
                        Err(e) => {
                            warn!("Failed to refresh plugin: {}", e);
                            report.failures += 1;
                        }
                    }
                }
                previous = names;
            }
        }

        info!(
            "Scan finished: {} pages, {} plugins, {} failures",
            report.pages, report.plugins, report.failures
        );
        report
    }

    /// Merge a search listing into the cached record and fill its versions.
    async fn refresh_listed(&self, listed: Plugin) -> Result<()> {
        let _guard = self.store.lock(&listed).await;

        let mut plugin = Plugin::new(listed.name());
        if let Err(e) = self.store.load(&mut plugin) {
            warn!("Ignoring unreadable cache for {}: {}", listed.name(), e);
            plugin = Plugin::new(listed.name());
        }
        if listed.display_name.is_some() {
            plugin.display_name = listed.display_name;
        }
        if listed.summary.is_some() {
            plugin.summary = listed.summary;
        }
        if listed.stage.is_some() {
            plugin.stage = listed.stage;
        }

        self.fill_plugin(&mut plugin, None).await
    }
}

/// Whether a listing row with `version` satisfies the requested target.
fn target_matches(target: Option<&str>, version: &str) -> bool {
    match target {
        None => true,
        Some(CatalogConfig::LATEST_VERSION) => true,
        Some(target) => target == version,
    }
}
