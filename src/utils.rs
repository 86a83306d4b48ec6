//! Utility functions for URL basenames, log truncation and file system checks.

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Final path segment of an image URL, without query string or fragment.
///
/// Works for absolute URLs and for bare relative references the page may
/// have left unresolved. Returns an empty string when the path ends in `/`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(image_basename("https://site.example/img/photo123.jpg?size=large"), "photo123.jpg");
/// assert_eq!(image_basename("/img/"), "");
/// ```
pub fn image_basename(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    path.rsplit('/').next().unwrap_or_default().to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at a character boundary at or before `max` bytes with
/// `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
