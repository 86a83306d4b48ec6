//! Thumbnail download collaborator.
//!
//! Saves each image into a single flat directory under the file name the
//! pipeline chose for it. Only plain file names are accepted as hints, so a
//! crafted URL can never write outside the directory.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

use crate::error::{Error, Result};
use crate::fetch::{FetchAsync, HttpGet, RetryFetch, RetryPolicy};
use crate::scrapers::ImageFetcher;

#[derive(Debug)]
pub struct HttpImageFetcher {
    fetcher: RetryFetch<HttpGet>,
    dir: PathBuf,
}

impl HttpImageFetcher {
    pub fn new(client: reqwest::Client, policy: RetryPolicy, dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher: RetryFetch::new(HttpGet::new(client), policy),
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ImageFetcher for HttpImageFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch_image(&self, url: &str, filename_hint: &str) -> Result<PathBuf> {
        let path = self.dir.join(safe_file_name(filename_hint)?);
        let url = Url::parse(url)?;
        let bytes = self.fetcher.fetch(&url).await?;
        fs::write(&path, &bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "Wrote image");
        Ok(path)
    }
}

fn safe_file_name(hint: &str) -> Result<&str> {
    match Path::new(hint).file_name().and_then(|n| n.to_str()) {
        Some(name) if name == hint => Ok(name),
        _ => Err(Error::InvalidFilename(hint.to_string())),
    }
}
