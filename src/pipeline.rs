//! Article extraction pipeline.
//!
//! Turns the listing's raw fragments into classified [`ArticleRecord`]s:
//!
//! 1. Parse the publication date; entries without a usable title or date are
//!    rejected and reported, and processing moves on to the next entry
//! 2. Drop entries older than the [`DateWindow`] (not an error)
//! 3. Count search-phrase hits and flag monetary mentions
//! 4. Derive the image filename and queue an [`ImageRequest`]
//!
//! Output order is listing order. The pass holds no state between runs, so
//! the same fragments and parameters always produce the same records.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::analyzer::PhraseAnalyzer;
use crate::error::FragmentError;
use crate::models::{ArticleRecord, ImageRequest, RawArticleFragment};
use crate::scrapers::ImageFetcher;
use crate::utils::image_basename;
use crate::window::DateWindow;

/// Accepted date format for `published_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A listing entry that could not be turned into a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedFragment {
    /// Position in the listing, starting at 0.
    pub index: usize,
    pub error: FragmentError,
}

/// Everything one pass over the listing produced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Extraction {
    pub records: Vec<ArticleRecord>,
    pub image_requests: Vec<ImageRequest>,
    pub rejected: Vec<RejectedFragment>,
    /// Entries with a valid date that fell before the window.
    pub out_of_window: usize,
}

/// Outcome of dispatching image requests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImageSummary {
    pub fetched: usize,
    pub failed: usize,
}

enum Outcome {
    Accepted(ArticleRecord, Option<ImageRequest>),
    OutOfWindow,
}

#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    analyzer: PhraseAnalyzer,
    window: DateWindow,
}

impl ExtractionPipeline {
    pub fn new(search_phrase: impl Into<String>, window: DateWindow) -> Self {
        Self {
            analyzer: PhraseAnalyzer::new(search_phrase),
            window,
        }
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    /// Run one pass over `fragments`.
    #[instrument(level = "info", skip_all, fields(fragments = fragments.len(), phrase = %self.analyzer.phrase(), lower_bound = %self.window.lower_bound()))]
    pub fn process(&self, fragments: &[RawArticleFragment]) -> Extraction {
        let mut extraction = Extraction::default();

        for (index, fragment) in fragments.iter().enumerate() {
            match self.assemble(fragment) {
                Ok(Outcome::Accepted(record, request)) => {
                    debug!(index, title = %record.title, date = %record.date, "Accepted article");
                    extraction.image_requests.extend(request);
                    extraction.records.push(record);
                }
                Ok(Outcome::OutOfWindow) => {
                    debug!(index, "Article outside date window");
                    extraction.out_of_window += 1;
                }
                Err(error) => {
                    warn!(index, error = %error, "Skipping article");
                    extraction.rejected.push(RejectedFragment { index, error });
                }
            }
        }

        info!(
            accepted = extraction.records.len(),
            out_of_window = extraction.out_of_window,
            rejected = extraction.rejected.len(),
            images = extraction.image_requests.len(),
            "Extraction complete"
        );
        extraction
    }

    fn assemble(&self, fragment: &RawArticleFragment) -> Result<Outcome, FragmentError> {
        let title = fragment.title.as_deref().ok_or(FragmentError::MissingTitle)?;
        let date = parse_published_date(fragment.published_date.as_deref())?;

        if !self.window.contains(date) {
            return Ok(Outcome::OutOfWindow);
        }

        let description = fragment.description.clone().unwrap_or_default();
        let classification = self.analyzer.classify(title, &description);

        let image_url = fragment.image_url.as_deref().filter(|u| !u.is_empty());
        let image_filename = image_url.map(image_basename).unwrap_or_default();
        let request = match image_url {
            Some(url) if !image_filename.is_empty() => Some(ImageRequest {
                url: url.to_string(),
                filename: image_filename.clone(),
            }),
            _ => None,
        };

        let record = ArticleRecord {
            title: title.to_string(),
            date,
            description,
            image_filename,
            search_count: classification.search_count,
            contains_money: classification.contains_money,
        };
        Ok(Outcome::Accepted(record, request))
    }
}

fn parse_published_date(value: Option<&str>) -> Result<NaiveDate, FragmentError> {
    let value = value.ok_or(FragmentError::MissingDate)?;
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| FragmentError::MalformedDate {
        value: value.to_string(),
        source,
    })
}

/// Hand each image request to `fetcher`, one at a time, in listing order.
///
/// Failures are logged and counted; they never touch the records.
#[instrument(level = "info", skip_all, fields(requests = requests.len()))]
pub async fn dispatch_images<F: ImageFetcher>(fetcher: &F, requests: &[ImageRequest]) -> ImageSummary {
    let results: Vec<bool> = stream::iter(requests)
        .then(move |request| async move {
            match fetcher.fetch_image(&request.url, &request.filename).await {
                Ok(path) => {
                    debug!(url = %request.url, path = %path.display(), "Saved image");
                    true
                }
                Err(e) => {
                    warn!(url = %request.url, error = %e, "Image download failed");
                    false
                }
            }
        })
        .collect()
        .await;

    let fetched = results.iter().filter(|ok| **ok).count();
    let summary = ImageSummary {
        fetched,
        failed: results.len() - fetched,
    };
    info!(fetched = summary.fetched, failed = summary.failed, "Image retrieval finished");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pipeline(phrase: &str) -> ExtractionPipeline {
        ExtractionPipeline::new(phrase, DateWindow::new(1, ymd(2024, 3, 15)))
    }

    #[test]
    fn test_malformed_date_does_not_affect_siblings() {
        let fragments = vec![
            RawArticleFragment::new("A", "bad"),
            RawArticleFragment::new("B", "2024-01-10"),
        ];
        let window = DateWindow::new(0, ymd(2024, 1, 15));
        let extraction = ExtractionPipeline::new("", window).process(&fragments);

        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].title, "B");
        assert_eq!(extraction.rejected.len(), 1);
        assert_eq!(extraction.rejected[0].index, 0);
        assert!(matches!(
            extraction.rejected[0].error,
            FragmentError::MalformedDate { ref value, .. } if value == "bad"
        ));
    }

    #[test]
    fn test_window_filters_silently() {
        let fragments = vec![
            RawArticleFragment::new("recent", "2024-02-01"),
            RawArticleFragment::new("old", "2024-01-20"),
        ];
        let extraction = pipeline("").process(&fragments);

        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].title, "recent");
        assert_eq!(extraction.out_of_window, 1);
        assert!(extraction.rejected.is_empty());
    }

    #[test]
    fn test_missing_title_and_date_are_rejected() {
        let fragments = vec![
            RawArticleFragment {
                published_date: Some("2024-03-02".to_string()),
                ..Default::default()
            },
            RawArticleFragment {
                title: Some("no date".to_string()),
                ..Default::default()
            },
        ];
        let extraction = pipeline("").process(&fragments);

        assert!(extraction.records.is_empty());
        assert_eq!(extraction.rejected[0].error, FragmentError::MissingTitle);
        assert_eq!(extraction.rejected[1].error, FragmentError::MissingDate);
    }

    #[test]
    fn test_datetime_with_time_component_is_malformed() {
        let fragments = vec![RawArticleFragment::new("A", "2024-03-02T10:00:00Z")];
        let extraction = pipeline("").process(&fragments);
        assert!(extraction.records.is_empty());
        assert_eq!(extraction.rejected.len(), 1);
    }

    #[test]
    fn test_record_assembly() {
        let fragments = vec![
            RawArticleFragment::new("Gold price rises", "2024-03-02")
                .with_description("gold falls by $5.00")
                .with_image_url("https://site.example/img/photo123.jpg?size=large"),
        ];
        let extraction = pipeline("Gold").process(&fragments);

        assert_eq!(
            extraction.records,
            vec![ArticleRecord {
                title: "Gold price rises".to_string(),
                date: ymd(2024, 3, 2),
                description: "gold falls by $5.00".to_string(),
                image_filename: "photo123.jpg".to_string(),
                search_count: 2,
                contains_money: true,
            }]
        );
        assert_eq!(
            extraction.image_requests,
            vec![ImageRequest {
                url: "https://site.example/img/photo123.jpg?size=large".to_string(),
                filename: "photo123.jpg".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_optional_fields_get_defaults() {
        let fragments = vec![
            RawArticleFragment::new("No extras", "2024-03-02"),
            RawArticleFragment::new("Empty url", "2024-03-02").with_image_url(""),
            RawArticleFragment::new("Dir url", "2024-03-02").with_image_url("https://site.example/img/"),
        ];
        let extraction = pipeline("x").process(&fragments);

        assert_eq!(extraction.records.len(), 3);
        for record in &extraction.records {
            assert_eq!(record.description, "");
            assert_eq!(record.image_filename, "");
        }
        assert!(extraction.image_requests.is_empty());
    }

    #[test]
    fn test_listing_order_is_preserved() {
        let fragments = vec![
            RawArticleFragment::new("third", "2024-03-10"),
            RawArticleFragment::new("first", "2024-02-20"),
            RawArticleFragment::new("second", "2024-03-01"),
            RawArticleFragment::new("first", "2024-02-20"),
        ];
        let titles: Vec<_> = pipeline("")
            .process(&fragments)
            .records
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["third", "first", "second", "first"]);
    }

    #[test]
    fn test_empty_listing_is_valid() {
        let extraction = pipeline("gold").process(&[]);
        assert_eq!(extraction, Extraction::default());
    }

    #[test]
    fn test_process_is_idempotent() {
        let fragments = vec![
            RawArticleFragment::new("Gold $5", "2024-03-02").with_image_url("https://s.example/a.png"),
            RawArticleFragment::new("bad", "03/02/2024"),
            RawArticleFragment::new("old", "2023-01-01"),
        ];
        let p = pipeline("gold");
        assert_eq!(p.process(&fragments), p.process(&fragments));
    }

    #[derive(Default)]
    struct RecordingFetcher {
        calls: Mutex<Vec<(String, String)>>,
        fail_on: Option<&'static str>,
    }

    impl ImageFetcher for RecordingFetcher {
        async fn fetch_image(&self, url: &str, filename_hint: &str) -> Result<PathBuf> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), filename_hint.to_string()));
            if self.fail_on == Some(filename_hint) {
                return Err(Error::Scraping("boom".to_string()));
            }
            Ok(PathBuf::from(filename_hint))
        }
    }

    #[tokio::test]
    async fn test_dispatch_images_in_order_and_tolerates_failures() {
        let fragments = vec![
            RawArticleFragment::new("a", "2024-03-02").with_image_url("https://s.example/1.jpg"),
            RawArticleFragment::new("b", "2024-03-03"),
            RawArticleFragment::new("c", "2024-03-04").with_image_url("https://s.example/3.jpg"),
        ];
        let extraction = pipeline("").process(&fragments);
        let fetcher = RecordingFetcher {
            fail_on: Some("1.jpg"),
            ..Default::default()
        };

        let summary = dispatch_images(&fetcher, &extraction.image_requests).await;

        assert_eq!(summary, ImageSummary { fetched: 1, failed: 1 });
        let calls = fetcher.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                ("https://s.example/1.jpg".to_string(), "1.jpg".to_string()),
                ("https://s.example/3.jpg".to_string(), "3.jpg".to_string()),
            ]
        );
        assert_eq!(extraction.records.len(), 3);
        assert_eq!(extraction.records[0].image_filename, "1.jpg");
    }
}
