//! Field tables mapping record attributes to cache file keys.
//!
//! Each entity declares the keys it persists once, and a single pair of
//! routines walks a table to write or read a section. A field whose getter
//! returns `None` is omitted from the section entirely, and a key missing
//! from a section leaves the in-memory field untouched.

use crate::models::{Plugin, PluginStage, PluginVersion};
use ini::Properties;

/// One persisted attribute of `T`.
pub(crate) struct Field<T> {
    pub key: &'static str,
    pub get: fn(&T) -> Option<String>,
    /// Applies a raw cache value; values that do not parse are ignored.
    pub set: fn(&mut T, &str),
}

pub(crate) const PLUGIN_FIELDS: &[Field<Plugin>] = &[
    Field {
        key: "summary",
        get: |p| p.summary.clone(),
        set: |p, v| p.summary = Some(v.to_string()),
    },
    Field {
        key: "display-name",
        get: |p| p.display_name.clone(),
        set: |p, v| p.display_name = Some(v.to_string()),
    },
    Field {
        key: "stage",
        get: |p| p.stage.map(|s| s.name().to_string()),
        set: |p, v| {
            if let Some(stage) = PluginStage::from_name(v) {
                p.stage = Some(stage);
            }
        },
    },
    Field {
        key: "exists",
        get: |p| p.exists.map(|e| e.to_string()),
        set: |p, v| {
            if let Some(exists) = parse_bool(v) {
                p.exists = Some(exists);
            }
        },
    },
];

pub(crate) const VERSION_FIELDS: &[Field<PluginVersion>] = &[
    Field {
        key: "url",
        get: |v| v.url.clone(),
        set: |v, s| v.url = Some(s.to_string()),
    },
    Field {
        key: "sha1",
        get: |v| v.sha1.clone(),
        set: |v, s| v.sha1 = Some(s.to_string()),
    },
    Field {
        key: "md5",
        get: |v| v.md5.clone(),
        set: |v, s| v.md5 = Some(s.to_string()),
    },
    Field {
        key: "date",
        get: |v| v.date.clone(),
        set: |v, s| v.date = Some(s.to_string()),
    },
    Field {
        key: "stage",
        get: |v| v.stage.map(|s| s.name().to_string()),
        set: |v, s| {
            if let Some(stage) = PluginStage::from_name(s) {
                v.stage = Some(stage);
            }
        },
    },
    Field {
        key: "game-versions",
        get: |v| v.game_versions.as_ref().map(|list| list.join(", ")),
        set: |v, s| v.game_versions = Some(split_list(s)),
    },
];

/// Collect the present fields of `entity` as key/value pairs.
pub(crate) fn write_fields<T>(entity: &T, fields: &[Field<T>]) -> Vec<(&'static str, String)> {
    fields
        .iter()
        .filter_map(|field| (field.get)(entity).map(|value| (field.key, value)))
        .collect()
}

/// Apply every key of `section` that `fields` recognizes onto `entity`.
pub(crate) fn read_fields<T>(section: &Properties, entity: &mut T, fields: &[Field<T>]) {
    for field in fields {
        if let Some(value) = section.get(field.key) {
            (field.set)(entity, value);
        }
    }
}

/// Boolean spellings accepted in cache files.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

fn split_list(value: &str) -> Vec<String> {
    if value.trim().is_empty() {
        return Vec::new();
    }
    value.split(',').map(|item| item.trim().to_string()).collect()
}
