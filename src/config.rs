//! Work item loading.
//!
//! A work item carries the run's parameters:
//!
//! ```json
//! { "search_phrase": "gold", "news_category": "Business", "months": "2" }
//! ```
//!
//! Files ending in `.yaml` or `.yml` are read as YAML, everything else as
//! JSON. Every key is optional. `months` may be a number or numeric text.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

use crate::cli::Cli;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkItem {
    pub search_phrase: String,
    /// Only used for category navigation on the site.
    pub news_category: String,
    #[serde(deserialize_with = "months_from_number_or_text")]
    pub months: u32,
}

impl WorkItem {
    /// Read a work item file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let item = if is_yaml {
            Self::from_yaml(&text)?
        } else {
            Self::from_json(&text)?
        };
        info!(
            search_phrase = %item.search_phrase,
            news_category = %item.news_category,
            months = item.months,
            "Loaded work item"
        );
        Ok(item)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        // An empty YAML document is an empty work item.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load the file named on the command line, if any, then apply flag overrides.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut item = match &cli.work_item {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        if let Some(phrase) = &cli.search_phrase {
            item.search_phrase = phrase.clone();
        }
        if let Some(category) = &cli.news_category {
            item.news_category = category.clone();
        }
        if let Some(months) = &cli.months {
            item.months = parse_months(months)?;
        }
        Ok(item)
    }
}

/// Parse a month count given as text; surrounding whitespace is ignored.
pub fn parse_months(text: &str) -> Result<u32> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| Error::Config(format!("months must be a non-negative integer, got {text:?}")))
}

fn months_from_number_or_text<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Months {
        Number(u32),
        Text(String),
    }

    match Months::deserialize(deserializer)? {
        Months::Number(n) => Ok(n),
        Months::Text(s) => parse_months(&s).map_err(de::Error::custom),
    }
}
