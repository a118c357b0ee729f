//! Extraction of plugin data from catalog HTML.
//!
//! Every function here takes a page body and returns owned data, so no
//! parsed document outlives the call.

use crate::config::{CatalogConfig, CatalogSelectors};
use crate::models::{Plugin, PluginStage};
use crate::{BlackDogError, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

/// First dotted numeric token, e.g. `1.7.2` in `Build for MC 1.7.2 (v2)`.
static VERSION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)+").expect("version regex must compile"));

/// Highlight tags the catalog wraps around search matches.
static HIGHLIGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?mark>").expect("highlight regex must compile"));

static FILE_ROWS: LazyLock<Selector> = LazyLock::new(|| selector(CatalogSelectors::FILE_ROWS));
static FILE_LINK: LazyLock<Selector> = LazyLock::new(|| selector(CatalogSelectors::FILE_LINK));
static FILE_NAME: LazyLock<Selector> = LazyLock::new(|| selector(CatalogSelectors::FILE_NAME));
static DETAIL_TERMS: LazyLock<Selector> =
    LazyLock::new(|| selector(CatalogSelectors::DETAIL_TERMS));
static DETAIL_LIST_ITEMS: LazyLock<Selector> =
    LazyLock::new(|| selector(CatalogSelectors::DETAIL_LIST_ITEMS));
static DETAIL_LINK: LazyLock<Selector> = LazyLock::new(|| selector(CatalogSelectors::DETAIL_LINK));
static SEARCH_ROWS: LazyLock<Selector> = LazyLock::new(|| selector(CatalogSelectors::SEARCH_ROWS));
static SEARCH_TITLE: LazyLock<Selector> =
    LazyLock::new(|| selector(CatalogSelectors::SEARCH_TITLE));
static SEARCH_STATUS: LazyLock<Selector> =
    LazyLock::new(|| selector(CatalogSelectors::SEARCH_STATUS));
static SEARCH_SUMMARY: LazyLock<Selector> =
    LazyLock::new(|| selector(CatalogSelectors::SEARCH_SUMMARY));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("catalog selectors must be valid CSS")
}

/// A row of a plugin's file listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    /// Free-text file title, which usually carries the version.
    pub description: String,
    pub filename: String,
    /// Link to the file's detail page, as written in the page.
    pub detail_href: Option<String>,
}

/// Metadata listed on a file's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDetails {
    /// Download link, as written in the page.
    pub download_href: Option<String>,
    pub md5: Option<String>,
    pub date: Option<String>,
    pub stage: Option<PluginStage>,
    pub game_versions: Option<Vec<String>>,
}

/// Extract the version token from a file description.
///
/// Returns an empty string when the text holds no dotted number.
pub fn extract_version(text: &str) -> String {
    VERSION_TOKEN
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Remove search highlight markup from catalog text.
pub fn strip_highlight(text: &str) -> String {
    HIGHLIGHT.replace_all(text, "").into_owned()
}

/// Rows of a file listing page whose filename is an archive.
pub fn parse_archive_rows(html: &str) -> Vec<FileRow> {
    let document = Html::parse_document(html);
    document
        .select(&FILE_ROWS)
        .filter_map(|row| {
            let filename = row.select(&FILE_NAME).next().map(collapsed_text)?;
            if !filename.ends_with(CatalogConfig::ARCHIVE_EXTENSION) {
                return None;
            }
            let link = row.select(&FILE_LINK).next();
            Some(FileRow {
                description: link.map(collapsed_text).unwrap_or_default(),
                filename,
                detail_href: link
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string),
            })
        })
        .collect()
}

/// Parse the labeled definition list of a file detail page.
pub fn parse_file_details(html: &str) -> Result<FileDetails> {
    let document = Html::parse_document(html);
    let mut details = FileDetails::default();
    let mut terms = 0;

    for term in document.select(&DETAIL_TERMS) {
        terms += 1;
        let Some(definition) = next_element(term) else {
            continue;
        };
        if definition.value().name() != "dd" {
            continue;
        }

        let label = collapsed_text(term);
        match label.trim_end_matches(':') {
            "Filename" => {
                details.download_href = definition
                    .select(&DETAIL_LINK)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string);
            }
            "MD5" => details.md5 = non_empty(collapsed_text(definition)),
            "Type" => details.stage = PluginStage::from_name(&collapsed_text(definition)),
            "Uploaded on" => details.date = non_empty(collapsed_text(definition)),
            "Game version" | "Game versions" => {
                let items: Vec<String> = definition
                    .select(&DETAIL_LIST_ITEMS)
                    .map(collapsed_text)
                    .filter(|item| !item.is_empty())
                    .collect();
                details.game_versions = if items.is_empty() {
                    non_empty(collapsed_text(definition)).map(|v| vec![v])
                } else {
                    Some(items)
                };
            }
            other => debug!("Ignoring file detail '{}'", other),
        }
    }

    if terms == 0 {
        return Err(BlackDogError::parse("file detail page has no definition list"));
    }
    Ok(details)
}

/// Plugins listed on a search results page, in page order.
///
/// Rows come in pairs: an info row with the title and status, then a
/// summary row. Pairs without a title link are skipped.
pub fn parse_search_results(html: &str) -> Vec<Plugin> {
    let document = Html::parse_document(html);
    let rows: Vec<ElementRef> = document.select(&SEARCH_ROWS).collect();

    rows.chunks_exact(2)
        .filter_map(|pair| {
            let (info, summary) = (pair[0], pair[1]);
            let title = info.select(&SEARCH_TITLE).next()?;
            let name = plugin_name_from_href(title.value().attr("href")?)?;

            let mut plugin = Plugin::new(name);
            plugin.display_name = non_empty(strip_highlight(&collapsed_text(title)));
            plugin.stage = info
                .select(&SEARCH_STATUS)
                .next()
                .and_then(|status| PluginStage::from_name(&collapsed_text(status)));
            plugin.summary = summary
                .select(&SEARCH_SUMMARY)
                .next()
                .map(|cell| strip_highlight(&collapsed_text(cell)));
            Some(plugin)
        })
        .collect()
}

/// Catalog name of a plugin from its page link, e.g. `/bukkit-plugins/worldedit/`.
pub fn plugin_name_from_href(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let name = match segments
        .iter()
        .position(|s| *s == CatalogConfig::PLUGINS_PATH)
    {
        Some(index) => segments.get(index + 1).copied(),
        None => segments.last().copied(),
    }?;
    Some(urlencoding::decode(name).map(|n| n.into_owned()).unwrap_or_else(|_| name.to_string()))
}

fn next_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// Element text with whitespace runs collapsed to single spaces.
fn collapsed_text(element: ElementRef<'_>) -> String {
    let text: String = element.text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILES_PAGE: &str = r#"
        <html><body>
        <table class="listing">
          <thead><tr><th>Name</th></tr></thead>
          <tbody>
            <tr class="odd">
              <td class="col-file"><a href="/bukkit-plugins/worldedit/files/85-world-edit-5-6-3/">WorldEdit 5.6.3</a></td>
              <td class="col-type">Release</td>
              <td class="col-filename">worldedit-5.6.3.jar</td>
            </tr>
            <tr class="even">
              <td class="col-file"><a href="/bukkit-plugins/worldedit/files/84-sources/">WorldEdit 5.6.3 sources</a></td>
              <td class="col-type">Release</td>
              <td class="col-filename">worldedit-5.6.3-sources.zip</td>
            </tr>
            <tr class="odd">
              <td class="col-file"><a href="/bukkit-plugins/worldedit/files/80-world-edit-5-6/">Build for MC 1.7.2 (v2)</a></td>
              <td class="col-type">Beta</td>
              <td class="col-filename"> worldedit-5.6.jar </td>
            </tr>
          </tbody>
        </table>
        </body></html>
    "#;

    const DETAIL_PAGE: &str = r#"
        <html><body><div class="main-details"><dl>
          <dt>Filename</dt>
          <dd><a href="http://dev.bukkit.org/media/files/800/181/worldedit-5.6.3.jar">worldedit-5.6.3.jar</a></dd>
          <dt>MD5</dt><dd> 0f3e0dd7f0e8f4e0a3c3a6b1f56e3f2b </dd>
          <dt>Type</dt><dd>Release</dd>
          <dt>Uploaded on</dt><dd>Jul 17, 2014</dd>
          <dt>Game version</dt><dd><ul><li>CB 1.7.9-R0.2</li><li>1.7.2</li></ul></dd>
          <dt>Downloads</dt><dd>1,234</dd>
        </dl></div></body></html>
    "#;

    const SEARCH_PAGE: &str = r#"
        <html><body><div id="bd"><div class="listing-container"><div class="listing-container-inner">
        <table class="listing">
          <tbody>
            <tr class="row-joined-to-next">
              <td class="col-project"><h2><a href="/bukkit-plugins/worldedit/"><mark>World</mark>Edit</a></h2></td>
              <td class="col-status">Mature</td>
            </tr>
            <tr><td class="summary">In-game <mark>world</mark> editor</td></tr>
            <tr class="row-joined-to-next">
              <td class="col-project"><h2><a href="/bukkit-plugins/worldguard/">WorldGuard</a></h2></td>
              <td class="col-status">Release</td>
            </tr>
            <tr><td class="summary">Protect regions &lt;mark&gt;of&lt;/mark&gt; the world</td></tr>
          </tbody>
        </table>
        </div></div></div></body></html>
    "#;

    #[test]
    fn test_extract_version() {
        assert_eq!(extract_version("Build for MC 1.7.2 (v2)"), "1.7.2");
        assert_eq!(extract_version("v3.10.1 release"), "3.10.1");
        assert_eq!(extract_version("no version here"), "");
        assert_eq!(extract_version("version 2"), "");
    }

    #[test]
    fn test_parse_archive_rows_filters_non_archives() {
        let rows = parse_archive_rows(FILES_PAGE);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description, "WorldEdit 5.6.3");
        assert_eq!(rows[0].filename, "worldedit-5.6.3.jar");
        assert_eq!(
            rows[0].detail_href.as_deref(),
            Some("/bukkit-plugins/worldedit/files/85-world-edit-5-6-3/")
        );
        assert_eq!(rows[1].filename, "worldedit-5.6.jar");
        assert_eq!(extract_version(&rows[1].description), "1.7.2");
    }

    #[test]
    fn test_parse_archive_rows_empty_page() {
        assert!(parse_archive_rows("<html><body><p>No files</p></body></html>").is_empty());
    }

    #[test]
    fn test_parse_file_details() {
        let details = parse_file_details(DETAIL_PAGE).unwrap();
        assert_eq!(
            details.download_href.as_deref(),
            Some("http://dev.bukkit.org/media/files/800/181/worldedit-5.6.3.jar")
        );
        assert_eq!(
            details.md5.as_deref(),
            Some("0f3e0dd7f0e8f4e0a3c3a6b1f56e3f2b")
        );
        assert_eq!(details.stage, Some(PluginStage::Release));
        assert_eq!(details.date.as_deref(), Some("Jul 17, 2014"));
        assert_eq!(
            details.game_versions,
            Some(vec!["CB 1.7.9-R0.2".to_string(), "1.7.2".to_string()])
        );
    }

    #[test]
    fn test_parse_file_details_without_list_fails() {
        assert!(parse_file_details("<html><body>Not found</body></html>").is_err());
    }

    #[test]
    fn test_parse_search_results() {
        let plugins = parse_search_results(SEARCH_PAGE);
        assert_eq!(plugins.len(), 2);

        assert_eq!(plugins[0].name(), "worldedit");
        assert_eq!(plugins[0].display_name.as_deref(), Some("WorldEdit"));
        assert_eq!(plugins[0].stage, Some(PluginStage::Mature));
        assert_eq!(plugins[0].summary.as_deref(), Some("In-game world editor"));

        assert_eq!(plugins[1].name(), "worldguard");
        assert_eq!(plugins[1].stage, Some(PluginStage::Release));
        assert_eq!(
            plugins[1].summary.as_deref(),
            Some("Protect regions of the world")
        );
    }

    #[test]
    fn test_parse_search_results_keeps_duplicates() {
        let doubled = SEARCH_PAGE.replace("worldguard", "worldedit");
        let plugins = parse_search_results(&doubled);
        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins[0].name(), plugins[1].name());
    }

    #[test]
    fn test_plugin_name_from_href() {
        assert_eq!(
            plugin_name_from_href("/bukkit-plugins/worldedit/").as_deref(),
            Some("worldedit")
        );
        assert_eq!(
            plugin_name_from_href("http://dev.bukkit.org/bukkit-plugins/essentials/?x=1").as_deref(),
            Some("essentials")
        );
        assert_eq!(plugin_name_from_href("/").as_deref(), None);
    }

    #[test]
    fn test_strip_highlight() {
        assert_eq!(strip_highlight("<mark>World</mark>Edit"), "WorldEdit");
        assert_eq!(strip_highlight("plain"), "plain");
    }
}
