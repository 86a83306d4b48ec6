//! JSON run report.
//!
//! Captures what a run did, beyond the spreadsheet rows: the parameters, the
//! window bound in effect, which listing entries were rejected and why, and
//! how many thumbnails were saved.

use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::config::WorkItem;
use crate::error::Result;
use crate::models::ArticleRecord;
use crate::pipeline::{Extraction, ImageSummary};

#[derive(Debug, Serialize)]
pub struct RejectedEntry {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub run_date: NaiveDate,
    pub search_phrase: &'a str,
    pub news_category: &'a str,
    pub months: u32,
    pub window_start: NaiveDate,
    pub category_applied: bool,
    pub out_of_window: usize,
    pub images_fetched: usize,
    pub images_failed: usize,
    pub rejected: Vec<RejectedEntry>,
    pub records: &'a [ArticleRecord],
}

impl<'a> RunReport<'a> {
    pub fn new(
        run_date: NaiveDate,
        work_item: &'a WorkItem,
        window_start: NaiveDate,
        category_applied: bool,
        extraction: &'a Extraction,
        images: ImageSummary,
    ) -> Self {
        Self {
            run_date,
            search_phrase: &work_item.search_phrase,
            news_category: &work_item.news_category,
            months: work_item.months,
            window_start,
            category_applied,
            out_of_window: extraction.out_of_window,
            images_fetched: images.fetched,
            images_failed: images.failed,
            rejected: extraction
                .rejected
                .iter()
                .map(|r| RejectedEntry {
                    index: r.index,
                    reason: r.error.to_string(),
                })
                .collect(),
            records: &extraction.records,
        }
    }
}

/// Write `report` as pretty-printed JSON to `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_report(report: &RunReport<'_>, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).await?;
    info!(records = report.records.len(), rejected = report.rejected.len(), "Wrote JSON report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawArticleFragment;
    use crate::pipeline::ExtractionPipeline;
    use crate::window::DateWindow;

    #[tokio::test]
    async fn test_report_contents() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let window = DateWindow::new(1, today);
        let work_item = WorkItem {
            search_phrase: "gold".to_string(),
            news_category: "Markets".to_string(),
            months: 1,
        };
        let extraction = ExtractionPipeline::new("gold", window).process(&[
            RawArticleFragment::new("bad", "yesterday"),
            RawArticleFragment::new("Gold at 50 USD", "2024-03-02"),
        ]);
        let report = RunReport::new(
            today,
            &work_item,
            window.lower_bound(),
            false,
            &extraction,
            ImageSummary::default(),
        );

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.json");
        write_report(&report, &path).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["window_start"], "2024-01-31");
        assert_eq!(value["rejected"][0]["index"], 0);
        assert_eq!(value["records"][0]["search_count"], 1);
        assert_eq!(value["records"][0]["contains_money"], true);
        assert_eq!(value["category_applied"], false);
    }
}
