//! Crawl counters
//!
//! Updated concurrently by crawl tasks and read once the stream has closed.
//! None of these values feed into the tally itself.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Live counters shared by every task of one crawl
#[derive(Debug, Default)]
pub struct CrawlStats {
    documents_fetched: AtomicU64,
    fetch_failures: AtomicU64,
    index_documents: AtomicU64,
    leaf_documents: AtomicU64,
    unrecognized_documents: AtomicU64,
    urls_emitted: AtomicU64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Point-in-time copy of [`CrawlStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSnapshot {
    pub documents_fetched: u64,
    pub fetch_failures: u64,
    pub index_documents: u64,
    pub leaf_documents: u64,
    pub unrecognized_documents: u64,
    pub urls_emitted: u64,
    pub peak_in_flight: usize,
}

impl CrawlStats {
    /// Marks the start of a fetch and returns a guard that marks its end
    pub(crate) fn begin_fetch(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::AcqRel);
        InFlight { stats: self }
    }

    pub(crate) fn record_fetched(&self) {
        self.documents_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index(&self) {
        self.index_documents.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_leaf(&self) {
        self.leaf_documents.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unrecognized(&self) {
        self.unrecognized_documents.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_emitted(&self) {
        self.urls_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values
    pub fn snapshot(&self) -> CrawlSnapshot {
        CrawlSnapshot {
            documents_fetched: self.documents_fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            index_documents: self.index_documents.load(Ordering::Relaxed),
            leaf_documents: self.leaf_documents.load(Ordering::Relaxed),
            unrecognized_documents: self.unrecognized_documents.load(Ordering::Relaxed),
            urls_emitted: self.urls_emitted.load(Ordering::Relaxed),
            peak_in_flight: self.peak_in_flight.load(Ordering::Acquire),
        }
    }
}

/// Guard for one in-flight fetch
pub(crate) struct InFlight<'a> {
    stats: &'a CrawlStats,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.stats.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl fmt::Display for CrawlSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} documents fetched ({} index, {} leaf, {} unrecognized), {} fetch failures, {} URLs emitted, peak {} in flight",
            self.documents_fetched,
            self.index_documents,
            self.leaf_documents,
            self.unrecognized_documents,
            self.fetch_failures,
            self.urls_emitted,
            self.peak_in_flight
        )
    }
}
