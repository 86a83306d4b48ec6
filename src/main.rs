//! # News Window
//!
//! Pulls the article listing from a news site, keeps the articles published
//! inside a recency window, scores each one for the search phrase and for
//! monetary mentions, and exports the result as a spreadsheet together with
//! the article thumbnails.
//!
//! ## Usage
//!
//! ```sh
//! news_window --work-item work-item.json -o news_results.xlsx -i images
//! ```
//!
//! ## Architecture
//!
//! 1. **Browsing**: open the site, submit the search, follow the category link
//! 2. **Extraction**: read every `<article>` into a raw fragment
//! 3. **Pipeline**: date-window filter, phrase count, money detection
//! 4. **Output**: download thumbnails, write the spreadsheet (and JSON report)

use chrono::{Local, NaiveDate};
use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analyzer;
mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;
mod window;

use cli::Cli;
use config::WorkItem;
use fetch::RetryPolicy;
use outputs::{json, spreadsheet};
use pipeline::{ExtractionPipeline, ImageSummary, dispatch_images};
use scrapers::images::HttpImageFetcher;
use scrapers::listing::HtmlNewsSite;
use scrapers::{ImageFetcher, NewsSession, build_client};
use utils::{ensure_writable_dir, truncate_for_log};
use window::DateWindow;

/// Inputs of a single run.
#[derive(Debug)]
struct RunPlan<'a> {
    site_url: &'a str,
    work_item: &'a WorkItem,
    today: NaiveDate,
    output: &'a Path,
    json_output: Option<&'a Path>,
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct RunSummary {
    records: usize,
    rejected: usize,
    out_of_window: usize,
    images: ImageSummary,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_window starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let work_item = WorkItem::resolve(&args)?;

    if let Err(e) = ensure_writable_dir(&args.image_dir).await {
        error!(
            path = %args.image_dir,
            error = %e,
            "Image directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let client = build_client(Duration::from_secs(args.timeout_secs))?;
    let policy = RetryPolicy::default().with_max_retries(args.max_retries);
    let site = HtmlNewsSite::new(client.clone(), policy);
    let images = HttpImageFetcher::new(client, policy, &args.image_dir);
    info!(image_dir = %images.dir().display(), "Thumbnails will be saved here");

    let plan = RunPlan {
        site_url: &args.site_url,
        work_item: &work_item,
        today: Local::now().date_naive(),
        output: &args.output,
        json_output: args.json_output.as_deref(),
    };

    let summary = match run_session(site, &images, &plan).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %truncate_for_log(&e.to_string(), 500), "Run failed");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        records = summary.records,
        rejected = summary.rejected,
        out_of_window = summary.out_of_window,
        images_fetched = summary.images.fetched,
        images_failed = summary.images.failed,
        output = %args.output.display(),
        "Execution complete"
    );
    Ok(())
}

/// Run against `site` and close it before returning, whatever the outcome.
async fn run_session<S: NewsSession, F: ImageFetcher>(
    mut site: S,
    images: &F,
    plan: &RunPlan<'_>,
) -> error::Result<RunSummary> {
    let outcome = run(&mut site, images, plan).await;
    site.close();
    outcome
}

#[instrument(level = "info", skip_all, fields(site = %plan.site_url, today = %plan.today))]
async fn run<S: NewsSession, F: ImageFetcher>(
    site: &mut S,
    images: &F,
    plan: &RunPlan<'_>,
) -> error::Result<RunSummary> {
    let work_item = plan.work_item;

    site.open(plan.site_url).await?;
    site.search(&work_item.search_phrase).await?;
    let category_applied = site.filter_by_category(&work_item.news_category).await?;
    debug!(url = ?site.current_url().map(|u| u.as_str()), category_applied, "Reading listing");
    let fragments = site.list_article_fragments().await?;

    let pipeline = ExtractionPipeline::new(
        work_item.search_phrase.as_str(),
        DateWindow::new(work_item.months, plan.today),
    );
    let extraction = pipeline.process(&fragments);

    let image_summary = dispatch_images(images, &extraction.image_requests).await;

    spreadsheet::write_spreadsheet(&extraction.records, plan.output).await?;

    if let Some(path) = plan.json_output {
        let report = json::RunReport::new(
            plan.today,
            work_item,
            pipeline.window().lower_bound(),
            category_applied,
            &extraction,
            image_summary,
        );
        if let Err(e) = json::write_report(&report, path).await {
            warn!(path = %path.display(), error = %e, "Failed to write JSON report");
        }
    }

    Ok(RunSummary {
        records: extraction.records.len(),
        rejected: extraction.rejected.len(),
        out_of_window: extraction.out_of_window,
        images: image_summary,
    })
}
