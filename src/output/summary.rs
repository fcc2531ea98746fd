//! Plain-text rendering of a finished tally

use crate::crawler::CrawlSnapshot;
use crate::tally::ReduceMode;
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Everything needed to report one tallied sitemap
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The sitemap the crawl started from
    pub selection: String,

    /// How URLs were reduced
    pub mode: ReduceMode,

    /// The reduced count
    pub count: u64,

    /// Crawl counters, shown in verbose output
    pub stats: CrawlSnapshot,

    /// When the stream closed
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn new(selection: String, mode: ReduceMode, count: u64, stats: CrawlSnapshot) -> Self {
        Self {
            selection,
            mode,
            count,
            stats,
            finished_at: Utc::now(),
        }
    }

    /// The one-line result, worded per mode
    pub fn headline(&self) -> String {
        match &self.mode {
            ReduceMode::Total => format!("Total URLs Summary: {} URLs found.", self.count),
            ReduceMode::PatternMatch(pattern) => format!(
                "Pattern Match Summary: {} matches found for pattern \"{}\".",
                self.count, pattern
            ),
        }
    }

    /// Renders the full report; `verbose` appends the crawl counters
    pub fn render(&self, verbose: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Sitemap Selection: Selected sitemap: {}", self.selection);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.headline());

        if verbose {
            let _ = writeln!(out);
            let _ = writeln!(out, "Crawl Statistics:");
            let _ = writeln!(out, "  Documents fetched: {}", self.stats.documents_fetched);
            let _ = writeln!(out, "  Index documents: {}", self.stats.index_documents);
            let _ = writeln!(out, "  Leaf documents: {}", self.stats.leaf_documents);
            let _ = writeln!(
                out,
                "  Unrecognized documents: {}",
                self.stats.unrecognized_documents
            );
            let _ = writeln!(out, "  Fetch failures: {}", self.stats.fetch_failures);
            let _ = writeln!(out, "  URLs emitted: {}", self.stats.urls_emitted);
            let _ = writeln!(out, "  Peak fetches in flight: {}", self.stats.peak_in_flight);
            let _ = writeln!(
                out,
                "  Finished at: {}",
                self.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }

        out
    }
}
