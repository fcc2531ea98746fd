//! Crawler module for sitemap fetching and traversal
//!
//! This module contains the core crawling logic:
//! - HTTP fetching of sitemap documents
//! - Classification of bodies into index, leaf or unrecognized documents
//! - Pending-work accounting that decides when the crawl is finished
//! - The recursive, concurrent traversal itself

mod classifier;
mod coordinator;
mod fetcher;
mod pending;
mod stats;

pub use classifier::{classify, ClassifiedDocument, IndexDocument, LeafDocument};
pub use coordinator::{CrawlOptions, Crawler, ResultStream};
pub use fetcher::{build_http_client, fetch_document};
pub use pending::{PendingWork, WorkTicket};
pub use stats::{CrawlSnapshot, CrawlStats};

