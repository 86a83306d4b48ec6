//! Output generation for a finished run.
//!
//! - [`spreadsheet`]: the article records as an Excel workbook (required)
//! - [`json`]: a JSON run report with parameters and rejected entries (optional)
//!
//! # Output Structure
//!
//! ```text
//! news_results.xlsx  # sheet "Sheet1": date,description,image_filename,search_count,contains_money
//! images/            # one file per downloaded thumbnail, named image_filename
//! report.json        # only with --json-output
//! ```

pub mod json;
pub mod spreadsheet;
