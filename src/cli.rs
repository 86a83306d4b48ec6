//! Command-line interface definitions.
//!
//! Run parameters come from a work item file and can be overridden by flags or
//! environment variables. See [`crate::config::WorkItem`].

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Parameters from a work item
/// news_window --work-item work-item.json
///
/// # Everything on the command line
/// news_window --site-url https://news.example --search-phrase gold --months 2 -o gold.xlsx
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Home page of the news site
    #[arg(long, env = "NEWS_SITE_URL", default_value = "https://example-news-website.com")]
    pub site_url: String,

    /// Work item file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(short, long, env = "WORK_ITEM_PATH")]
    pub work_item: Option<PathBuf>,

    /// Search phrase; overrides the work item
    #[arg(long, env = "SEARCH_PHRASE")]
    pub search_phrase: Option<String>,

    /// Category link to follow after searching; overrides the work item
    #[arg(long, env = "NEWS_CATEGORY")]
    pub news_category: Option<String>,

    /// How many 30-day blocks before the first of this month to accept; overrides the work item
    #[arg(long, env = "MONTHS")]
    pub months: Option<String>,

    /// Spreadsheet (Excel workbook) output file
    #[arg(short, long, default_value = "news_results.xlsx")]
    pub output: PathBuf,

    /// Directory for downloaded thumbnails
    #[arg(short, long, default_value = "images")]
    pub image_dir: String,

    /// Optional JSON run report
    #[arg(short, long)]
    pub json_output: Option<PathBuf>,

    /// Retries per page or image request
    #[arg(long, default_value_t = 3)]
    pub max_retries: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}
