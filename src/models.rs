//! Data models for listing entries and the exported article records.
//!
//! - [`RawArticleFragment`]: one entry as read off the listing page, with
//!   every field the page might fail to provide left optional
//! - [`ArticleRecord`]: the normalized, classified output row
//! - [`ImageRequest`]: a thumbnail to hand to the image collaborator

use chrono::NaiveDate;
use serde::Serialize;

/// A listing entry exactly as the page collaborator found it.
///
/// Sub-elements the page did not contain are `None`; the pipeline decides
/// which absences are fatal for the entry and which get defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArticleFragment {
    /// Headline text.
    pub title: Option<String>,
    /// Publication date, expected as `YYYY-MM-DD`.
    pub published_date: Option<String>,
    /// Teaser paragraph, if the entry had one.
    pub description: Option<String>,
    /// Absolute thumbnail URL.
    pub image_url: Option<String>,
}

#[cfg(test)]
impl RawArticleFragment {
    pub fn new(title: impl Into<String>, published_date: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            published_date: Some(published_date.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// One accepted article, in export column order.
///
/// Field order here is the spreadsheet column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    pub title: String,
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub description: String,
    /// Final path segment of the image URL; empty when there was no image.
    pub image_filename: String,
    pub search_count: usize,
    pub contains_money: bool,
}

/// Column headers for the tabular export, matching [`ArticleRecord`] field order.
pub const RECORD_COLUMNS: [&str; 6] = [
    "title",
    "date",
    "description",
    "image_filename",
    "search_count",
    "contains_money",
];

/// A thumbnail to download for an accepted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRequest {
    pub url: String,
    pub filename: String,
}
