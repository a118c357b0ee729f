//! Catalog search parameters.

use crate::models::PluginStage;
use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex must compile"));

/// Parameters of a catalog search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text query; `None` lists every plugin matching the filters.
    pub search: Option<String>,
    /// 1-indexed result page.
    pub page: u32,
    pub category: Option<String>,
    pub stage: Option<PluginStage>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            category: None,
            stage: None,
        }
    }
}

impl SearchQuery {
    /// Search for `text` on the first page, across all categories and stages.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_stage(mut self, stage: PluginStage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Encode as a query string, e.g. `search=world+edit&page=2&stage=r`.
    pub fn to_query_string(&self) -> String {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        params.push(("page", self.page.to_string()));
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if let Some(stage) = self.stage {
            params.push(("stage", stage.code().to_string()));
        }
        encode_params(&params)
    }
}

/// Join key/value pairs as `k=v&k=v`, with each whitespace run in a value
/// collapsed to a single `+` and everything else percent-encoded.
pub fn encode_params(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), encode_value(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_value(value: &str) -> String {
    WHITESPACE_RUN
        .split(value)
        .map(|part| urlencoding::encode(part).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}
