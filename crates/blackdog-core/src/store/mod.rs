//! On-disk metadata cache.
//!
//! Each plugin is cached in `<cache_dir>/<path_name>.data`, an INI file with
//! a `[plugin]` section for the plugin's own fields and one section per
//! known version, named by the version string.
//!
//! The INI parser trims surrounding whitespace from values, so a value with
//! leading or trailing blanks reloads trimmed, and a list holding only an
//! empty entry reloads as an empty list.

mod atomic;
mod fields;
mod lock;

pub use atomic::{atomic_read, atomic_write};
pub use lock::CacheLocks;

use crate::config::PathsConfig;
use crate::models::{Plugin, PluginVersion};
use crate::{BlackDogError, Result};
use fields::{read_fields, write_fields, Field, PLUGIN_FIELDS, VERSION_FIELDS};
use ini::{EscapePolicy, Ini, ParseOption, Properties, WriteOption};
use std::path::{Path, PathBuf};
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

/// Reads and writes plugin records in the cache directory.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    cache_dir: PathBuf,
    locks: CacheLocks,
}

impl MetadataStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            locks: CacheLocks::new(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the cache file backing `plugin`.
    pub fn cache_path(&self, plugin: &Plugin) -> PathBuf {
        self.cache_dir.join(plugin.cache_file_name())
    }

    /// Take the write lock for `plugin`'s cache file.
    pub async fn lock(&self, plugin: &Plugin) -> OwnedMutexGuard<()> {
        self.locks.acquire(plugin.path_name()).await
    }

    /// Fill `plugin` from its cache file, if one exists.
    ///
    /// Only keys present in the file are applied; fields already set in
    /// memory survive when the file lacks them.
    pub fn load(&self, plugin: &mut Plugin) -> Result<()> {
        let path = self.cache_path(plugin);
        let Some(contents) = atomic_read(&path)? else {
            return Ok(());
        };

        let options = ParseOption {
            enabled_quote: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(&contents, options).map_err(|e| BlackDogError::Cache {
            message: e.to_string(),
            path: path.clone(),
        })?;

        for (section, properties) in ini.iter() {
            match section {
                None => {}
                Some(PathsConfig::PLUGIN_SECTION) => {
                    read_fields(properties, plugin, PLUGIN_FIELDS);
                }
                Some(version) => {
                    if !plugin.versions.contains_key(version) {
                        let record = PluginVersion::new(plugin.name(), version)?;
                        plugin.add_version(record);
                    }
                    let record = plugin.get_version_mut(version)?;
                    read_fields(properties, record, VERSION_FIELDS);
                }
            }
        }

        debug!(
            "Loaded {} with {} cached versions",
            path.display(),
            plugin.versions.len()
        );
        Ok(())
    }

    /// Load a fresh record for `name` from the cache.
    pub fn load_plugin(&self, name: &str) -> Result<Plugin> {
        let mut plugin = Plugin::new(name);
        self.load(&mut plugin)?;
        Ok(plugin)
    }

    /// Write every known field of `plugin` to its cache file.
    ///
    /// The `plugin` section and every version section are always written,
    /// even with no keys, so a version known only by name survives a reload.
    pub fn save(&self, plugin: &Plugin) -> Result<()> {
        let mut ini = Ini::new();
        write_section(&mut ini, PathsConfig::PLUGIN_SECTION, plugin, PLUGIN_FIELDS);

        let mut versions: Vec<&PluginVersion> = plugin.versions.values().collect();
        versions.sort_by(|a, b| a.version().cmp(b.version()));
        for version in versions {
            write_section(&mut ini, version.version(), version, VERSION_FIELDS);
        }

        let mut buffer = Vec::new();
        let options = WriteOption {
            escape_policy: EscapePolicy::Basics,
            ..WriteOption::default()
        };
        ini.write_to_opt(&mut buffer, options)?;

        atomic_write(&self.cache_path(plugin), &buffer)
    }
}

fn write_section<T>(ini: &mut Ini, name: &str, entity: &T, fields: &[Field<T>]) {
    let section = ini
        .entry(Some(name.to_string()))
        .or_insert(Properties::new());
    for (key, value) in write_fields(entity, fields) {
        section.insert(key, value);
    }
}
