//! Error types.
//!
//! [`Error`] covers everything that can end a run: configuration, network,
//! scraping and export failures. [`FragmentError`] describes why a single
//! listing entry was rejected; those are collected by the pipeline and never
//! abort a run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Not a plain file name: {0:?}")]
    InvalidFilename(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export to {path} failed: {source}")]
    Export {
        path: String,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a listing entry did not become an article record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FragmentError {
    #[error("article has no title")]
    MissingTitle,

    #[error("article has no publication date")]
    MissingDate,

    #[error("malformed publication date {value:?}: {source}")]
    MalformedDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
