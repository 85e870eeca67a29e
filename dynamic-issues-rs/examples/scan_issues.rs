//! Scan a directory tree for issues.json files and log what would be raised.
//!
//! ```text
//! cargo run --example scan_issues -- /tmp/codebundle-output
//! ```
//!
//! With no argument the scan directory comes from `CODEBUNDLE_TEMP_DIR`.

use std::path::PathBuf;

use dynamic_issues_rs::{IssueExtractor, LogSink};

fn main() {
    tracing_subscriber::fmt::init();

    let dir = std::env::args().nth(1).map(PathBuf::from);
    let sink = LogSink;
    let extractor = IssueExtractor::new(&sink);

    let created = extractor.process_file_based_issues(dir.as_deref(), None);
    println!("created {} issue(s)", created);
}
