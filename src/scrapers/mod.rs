//! Collaborators that talk to the news site.
//!
//! The pipeline only sees two capabilities:
//!
//! - [`NewsPage`]: yields the listing's raw article fragments in page order
//! - [`NewsSession`]: a [`NewsPage`] that can be browsed to the listing and closed
//! - [`ImageFetcher`]: saves one thumbnail under a given file name
//!
//! | Implementation | Module | Notes |
//! |----------------|--------|-------|
//! | [`listing::HtmlNewsSite`] | [`listing`] | Loads the site, submits the search form, follows a category link |
//! | [`images::HttpImageFetcher`] | [`images`] | Writes image bytes into the run's image directory |
//!
//! Both load URLs through [`crate::fetch::RetryFetch`], so transient network
//! errors are retried here and never reach the pipeline.

use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::Result;
use crate::models::RawArticleFragment;

pub mod images;
pub mod listing;

/// Source of the listing's article fragments.
pub trait NewsPage {
    /// Fragments of the currently loaded listing, in page order.
    async fn list_article_fragments(&mut self) -> Result<Vec<RawArticleFragment>>;
}

/// A browsing session that ends on the listing to extract.
pub trait NewsSession: NewsPage {
    async fn open(&mut self, url: &str) -> Result<()>;

    /// Submit `phrase` through the site's search.
    async fn search(&mut self, phrase: &str) -> Result<()>;

    /// Narrow the listing to `category`; `false` when nothing was applied.
    async fn filter_by_category(&mut self, category: &str) -> Result<bool>;

    fn current_url(&self) -> Option<&Url>;

    /// End the session. Called exactly once, on success and on failure.
    fn close(self);
}

/// Retrieval of a single image.
pub trait ImageFetcher {
    /// Fetch `url` and store it as `filename_hint`; returns the written path.
    async fn fetch_image(&self, url: &str, filename_hint: &str) -> Result<PathBuf>;
}

/// HTTP client shared by the site and image collaborators.
pub fn build_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("Mozilla/5.0 (compatible; news_window/", env!("CARGO_PKG_VERSION"), ")"))
        .build()?;
    Ok(client)
}
