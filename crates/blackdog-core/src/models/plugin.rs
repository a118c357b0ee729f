//! Plugin and plugin version records.
//!
//! Every descriptive field is optional: `None` means "never learned", which
//! is distinct from a field the catalog reported as empty or false.

use super::PluginStage;
use crate::config::PathsConfig;
use crate::error::{BlackDogError, Result};
use md5::Md5;
use regex::Regex;
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Characters that may not appear in a cache file stem.
static NON_PATH_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_\-]").expect("path name regex must compile"));

/// Normalize a plugin name into a filesystem-safe stem.
///
/// Every character outside `[a-zA-Z0-9_-]` becomes `_`. Case is kept, so
/// `"My Plugin!"` and `"my_plugin!"` stay distinct.
pub fn normalize_path_name(name: &str) -> String {
    NON_PATH_CHARS.replace_all(name, "_").into_owned()
}

/// A plugin hosted on the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    name: String,
    path_name: String,
    pub summary: Option<String>,
    pub display_name: Option<String>,
    pub stage: Option<PluginStage>,
    /// Whether the catalog knows this plugin; `None` until probed.
    pub exists: Option<bool>,
    pub versions: HashMap<String, PluginVersion>,
}

impl Plugin {
    /// Create an empty record for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let path_name = normalize_path_name(&name);
        Self {
            name,
            path_name,
            summary: None,
            display_name: None,
            stage: None,
            exists: None,
            versions: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filesystem-safe form of the name, used as the cache file stem.
    pub fn path_name(&self) -> &str {
        &self.path_name
    }

    /// Name of this plugin's cache file, e.g. `WorldEdit.data`.
    pub fn cache_file_name(&self) -> String {
        format!("{}.{}", self.path_name, PathsConfig::CACHE_FILE_EXTENSION)
    }

    /// Human readable name, falling back to the catalog name.
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Insert a version, replacing any record with the same version string.
    pub fn add_version(&mut self, version: PluginVersion) {
        self.versions.insert(version.version().to_string(), version);
    }

    /// Merge a freshly scraped version into the record.
    ///
    /// Fields present on `version` win; fields it lacks keep their cached value.
    pub fn merge_version(&mut self, version: PluginVersion) {
        match self.versions.get_mut(version.version()) {
            Some(existing) => existing.merge_from(&version),
            None => self.add_version(version),
        }
    }

    pub fn get_version(&self, version: &str) -> Result<&PluginVersion> {
        self.versions
            .get(version)
            .ok_or_else(|| BlackDogError::NoSuchPluginVersion {
                version: version.to_string(),
            })
    }

    pub fn get_version_mut(&mut self, version: &str) -> Result<&mut PluginVersion> {
        self.versions
            .get_mut(version)
            .ok_or_else(|| BlackDogError::NoSuchPluginVersion {
                version: version.to_string(),
            })
    }

    /// Whether `version` is cached with a known download URL.
    pub fn has_downloadable(&self, version: &str) -> bool {
        self.versions
            .get(version)
            .map(PluginVersion::is_downloadable)
            .unwrap_or(false)
    }
}

/// One released file of a plugin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginVersion {
    plugin_name: String,
    version: String,
    /// Remote location of the archive.
    pub url: Option<String>,
    pub sha1: Option<String>,
    pub md5: Option<String>,
    /// Upload date, as formatted by the catalog.
    pub date: Option<String>,
    pub stage: Option<PluginStage>,
    pub game_versions: Option<Vec<String>>,
}

impl PluginVersion {
    /// Create a version record owned by the plugin named `plugin_name`.
    ///
    /// Fails if either the plugin name or the version string is empty.
    pub fn new(plugin_name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let plugin_name = plugin_name.into();
        let version = version.into();
        if plugin_name.is_empty() || version.is_empty() {
            return Err(BlackDogError::InvalidPluginVersion);
        }
        Ok(Self {
            plugin_name,
            version,
            url: None,
            sha1: None,
            md5: None,
            date: None,
            stage: None,
            game_versions: None,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// A version can be served as an archive only once its URL is known.
    pub fn is_downloadable(&self) -> bool {
        self.url.is_some()
    }

    /// Copy every field that is present on `other` onto `self`.
    pub fn merge_from(&mut self, other: &PluginVersion) {
        if other.url.is_some() {
            self.url.clone_from(&other.url);
        }
        if other.sha1.is_some() {
            self.sha1.clone_from(&other.sha1);
        }
        if other.md5.is_some() {
            self.md5.clone_from(&other.md5);
        }
        if other.date.is_some() {
            self.date.clone_from(&other.date);
        }
        if other.stage.is_some() {
            self.stage = other.stage;
        }
        if other.game_versions.is_some() {
            self.game_versions.clone_from(&other.game_versions);
        }
    }

    /// Render the minimal POM describing this version under `group_id`.
    pub fn descriptor(&self, group_id: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{}</groupId>
  <artifactId>{}</artifactId>
  <version>{}</version>
</project>
"#,
            xml_escape(group_id),
            xml_escape(&self.plugin_name),
            xml_escape(&self.version)
        )
    }

    /// Lowercase hex SHA-1 of [`descriptor`](Self::descriptor).
    pub fn descriptor_sha1(&self, group_id: &str) -> String {
        hex::encode(Sha1::digest(self.descriptor(group_id).as_bytes()))
    }

    /// Lowercase hex MD5 of [`descriptor`](Self::descriptor).
    pub fn descriptor_md5(&self, group_id: &str) -> String {
        hex::encode(Md5::digest(self.descriptor(group_id).as_bytes()))
    }
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_name_normalization() {
        assert_eq!(normalize_path_name("My Plugin!"), "My_Plugin_");
        assert_eq!(normalize_path_name("my_plugin!"), "my_plugin_");
        assert_eq!(normalize_path_name("my-plugin"), "my-plugin");
        assert_eq!(Plugin::new("My Plugin!").path_name(), "My_Plugin_");
    }

    #[test]
    fn test_path_name_is_deterministic() {
        let a = Plugin::new("Essentials X");
        let b = Plugin::new("Essentials X");
        assert_eq!(a.path_name(), b.path_name());
        assert_eq!(a.cache_file_name(), "Essentials_X.data");
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut plugin = Plugin::new("foo");
        plugin.stage = Some(PluginStage::Release);
        let mut version = PluginVersion::new("foo", "1.0").unwrap();
        version.game_versions = Some(vec!["1.7.2".into()]);
        plugin.add_version(version);

        let json = serde_json::to_value(&plugin).unwrap();
        assert_eq!(json["pathName"], "foo");
        assert_eq!(json["stage"], "release");
        assert_eq!(json["versions"]["1.0"]["gameVersions"][0], "1.7.2");
        assert!(json["exists"].is_null());
    }

    #[test]
    fn test_display_falls_back_to_name() {
        let mut plugin = Plugin::new("worldedit");
        assert_eq!(plugin.display(), "worldedit");
        plugin.display_name = Some("WorldEdit".into());
        assert_eq!(plugin.display(), "WorldEdit");
    }

    #[test]
    fn test_version_requires_plugin_and_version() {
        assert!(matches!(
            PluginVersion::new("", "1.0"),
            Err(BlackDogError::InvalidPluginVersion)
        ));
        assert!(matches!(
            PluginVersion::new("foo", ""),
            Err(BlackDogError::InvalidPluginVersion)
        ));
        let version = PluginVersion::new("foo", "1.0").unwrap();
        assert_eq!(version.version(), "1.0");
        assert!(!version.is_downloadable());
    }

    #[test]
    fn test_get_version_unknown() {
        let plugin = Plugin::new("foo");
        let err = plugin.get_version("1.0").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_merge_keeps_fields_missing_from_update() {
        let mut plugin = Plugin::new("foo");
        let mut cached = PluginVersion::new("foo", "1.0").unwrap();
        cached.sha1 = Some("aa".into());
        cached.md5 = Some("old".into());
        plugin.add_version(cached);

        let mut scraped = PluginVersion::new("foo", "1.0").unwrap();
        scraped.md5 = Some("new".into());
        scraped.url = Some("http://example.com/foo.jar".into());
        plugin.merge_version(scraped);

        let merged = plugin.get_version("1.0").unwrap();
        assert_eq!(merged.sha1.as_deref(), Some("aa"));
        assert_eq!(merged.md5.as_deref(), Some("new"));
        assert!(plugin.has_downloadable("1.0"));
    }

    #[test]
    fn test_descriptor_contents() {
        let version = PluginVersion::new("foo", "1.0").unwrap();
        let pom = version.descriptor("org.bukkit");
        assert!(pom.contains("<groupId>org.bukkit</groupId>"));
        assert!(pom.contains("<artifactId>foo</artifactId>"));
        assert!(pom.contains("<version>1.0</version>"));
        assert!(pom.contains("<modelVersion>4.0.0</modelVersion>"));
    }

    #[test]
    fn test_descriptor_escapes_markup() {
        let version = PluginVersion::new("Tom & Jerry", "1.0").unwrap();
        assert!(version
            .descriptor("g")
            .contains("<artifactId>Tom &amp; Jerry</artifactId>"));
    }

    #[test]
    fn test_descriptor_digests() {
        let version = PluginVersion::new("foo", "1.0").unwrap();
        let pom = version.descriptor("org.bukkit");
        assert_eq!(
            version.descriptor_sha1("org.bukkit"),
            hex::encode(Sha1::digest(pom.as_bytes()))
        );
        assert_eq!(version.descriptor_sha1("org.bukkit").len(), 40);
        assert_eq!(version.descriptor_md5("org.bukkit").len(), 32);
        assert_ne!(
            version.descriptor_sha1("org.bukkit"),
            version.descriptor_sha1("com.example")
        );
    }
}
