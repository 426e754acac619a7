//! Output sinks for resolved documents and summaries.
//!
//! # Submodules
//!
//! - [`table`]: CSV exports (search results and the resolved content table)
//! - [`summaries`]: the plain-text summary file, one line per document
//! - [`json`]: the JSON run report
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── raw/
//! │   ├── articles.csv                    # search results
//! │   └── articles_with_full_content.csv  # resolved content table
//! ├── summaries/
//! │   └── summaries.txt
//! ├── multi-summaries/                    # --summarize-dir: one file per CSV
//! │   └── floods.txt
//! └── reports/
//!     └── 2025-05-06/
//!         └── 203000.json
//! ```
//!
//! Every sink writes one complete row or line at a time and flushes it, so an
//! interrupted run leaves well-formed files behind.

pub mod json;
pub mod summaries;
pub mod table;
