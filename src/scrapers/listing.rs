//! HTML news site collaborator.
//!
//! Drives a news site the way a reader would: load the home page, type the
//! search phrase into the first text input and submit its form, optionally
//! click through to a category, then read every `<article>` on the result
//! page.
//!
//! # Fragment Extraction
//!
//! | Field | Source inside `<article>` |
//! |-------|---------------------------|
//! | title | text of the first `h2` |
//! | published date | `datetime` attribute of the first `time` |
//! | description | text of the first `p` |
//! | image URL | `src` of the first `img`, resolved against the page URL |
//!
//! A missing sub-element leaves the field empty; deciding what that means is
//! up to the pipeline.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::fetch::{FetchAsync, HttpGet, RetryFetch, RetryPolicy};
use crate::models::RawArticleFragment;
use crate::scrapers::{NewsPage, NewsSession};

static TEXT_INPUT: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"input[type="text"]"#).unwrap());
static HIDDEN_INPUT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"input[type="hidden"][name]"#).unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Field name used when the search input has no `name`.
const DEFAULT_QUERY_FIELD: &str = "q";

#[derive(Debug)]
struct LoadedPage {
    url: Url,
    html: String,
}

/// A browsing session against one news site.
#[derive(Debug)]
pub struct HtmlNewsSite {
    fetcher: RetryFetch<HttpGet>,
    current: Option<LoadedPage>,
    pages_loaded: usize,
}

impl HtmlNewsSite {
    pub fn new(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self {
            fetcher: RetryFetch::new(HttpGet::new(client), policy),
            current: None,
            pages_loaded: 0,
        }
    }

    fn page(&self) -> Result<&LoadedPage> {
        self.current
            .as_ref()
            .ok_or_else(|| Error::Scraping("no page loaded; call open() first".to_string()))
    }

    async fn load(&mut self, url: Url) -> Result<()> {
        let body = self.fetcher.fetch(&url).await?;
        let html = String::from_utf8_lossy(&body).into_owned();
        self.pages_loaded += 1;
        info!(%url, bytes = html.len(), "Loaded page");
        self.current = Some(LoadedPage { url, html });
        Ok(())
    }
}

impl NewsSession for HtmlNewsSite {
    /// URL of the page currently loaded, if any.
    fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|page| &page.url)
    }

    #[instrument(level = "info", skip(self))]
    async fn open(&mut self, url: &str) -> Result<()> {
        let url = Url::parse(url)?;
        self.load(url).await
    }

    /// Submit `phrase` through the page's search form.
    #[instrument(level = "info", skip(self))]
    async fn search(&mut self, phrase: &str) -> Result<()> {
        let page = self.page()?;
        let target = search_url(&page.html, &page.url, phrase)?;
        self.load(target).await
    }

    /// Follow the link whose text is exactly `category`.
    ///
    /// Returns `false` and leaves the current listing in place when the page
    /// has no such link.
    #[instrument(level = "info", skip(self))]
    async fn filter_by_category(&mut self, category: &str) -> Result<bool> {
        if category.is_empty() {
            debug!("No category requested");
            return Ok(false);
        }
        let page = self.page()?;
        match category_link(&page.html, &page.url, category) {
            Some(target) => {
                self.load(target).await?;
                Ok(true)
            }
            None => {
                warn!(%category, "Category not found, proceeding without filtering.");
                Ok(false)
            }
        }
    }

    /// End the session.
    fn close(self) {
        info!(pages_loaded = self.pages_loaded, "Closed news site session");
    }
}

impl NewsPage for HtmlNewsSite {
    #[instrument(level = "info", skip_all)]
    async fn list_article_fragments(&mut self) -> Result<Vec<RawArticleFragment>> {
        let page = self.page()?;
        let fragments = extract_fragments(&page.html, &page.url);
        info!(count = fragments.len(), url = %page.url, "Extracted article fragments");
        Ok(fragments)
    }
}

/// Build the GET submission of the search form holding the first text input.
pub fn search_url(html: &str, page_url: &Url, phrase: &str) -> Result<Url> {
    let document = Html::parse_document(html);
    let input = document
        .select(&TEXT_INPUT)
        .next()
        .ok_or_else(|| Error::Scraping(format!("no search field on {page_url}")))?;
    let field = input.value().attr("name").unwrap_or(DEFAULT_QUERY_FIELD);

    let form = input
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "form");

    let mut target = match form.and_then(|f| f.value().attr("action")) {
        Some(action) if !action.trim().is_empty() => page_url.join(action.trim())?,
        _ => page_url.clone(),
    };

    let mut pairs = Vec::new();
    if let Some(form) = form {
        for hidden in form.select(&HIDDEN_INPUT) {
            if let Some(name) = hidden.value().attr("name") {
                let value = hidden.value().attr("value").unwrap_or_default();
                pairs.push(format!("{}={}", urlencoding::encode(name), urlencoding::encode(value)));
            }
        }
    }
    pairs.push(format!("{}={}", urlencoding::encode(field), urlencoding::encode(phrase)));

    target.set_query(Some(&pairs.join("&")));
    target.set_fragment(None);
    debug!(%target, "Built search URL");
    Ok(target)
}

/// Resolve the link whose trimmed text equals `category`.
pub fn category_link(html: &str, page_url: &Url, category: &str) -> Option<Url> {
    let document = Html::parse_document(html);
    document
        .select(&LINK)
        .find(|a| element_text(a) == category)
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| page_url.join(href).ok())
}

/// Read every `<article>` on the page, in document order.
pub fn extract_fragments(html: &str, page_url: &Url) -> Vec<RawArticleFragment> {
    let document = Html::parse_document(html);
    document
        .select(&ARTICLE)
        .map(|article| RawArticleFragment {
            title: article.select(&HEADLINE).next().map(|h| element_text(&h)),
            published_date: article
                .select(&TIME)
                .next()
                .and_then(|t| t.value().attr("datetime"))
                .map(str::to_string),
            description: article.select(&PARAGRAPH).next().map(|p| element_text(&p)),
            image_url: article
                .select(&IMAGE)
                .next()
                .and_then(|img| img.value().attr("src"))
                .map(str::trim)
                .filter(|src| !src.is_empty())
                .map(|src| {
                    page_url
                        .join(src)
                        .map(|u| u.to_string())
                        .unwrap_or_else(|_| src.to_string())
                }),
        })
        .collect()
}

/// Visible text with runs of whitespace collapsed.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
