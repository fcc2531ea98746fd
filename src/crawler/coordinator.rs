//! Crawler coordinator - recursive sitemap traversal
//!
//! One task is spawned per sitemap reference. Each task fetches its document,
//! classifies it, and then either spawns a task per child reference (index
//! documents) or writes its URLs into the shared result stream (leaf
//! documents). A supervising task closes the stream once the pending-work
//! count drops to zero.
//!
//! Failures are local to a branch: a failed fetch or an unrecognized body ends
//! that branch with no URLs and is only visible in the logs and the
//! [`CrawlStats`] counters. There is no retry and no cycle detection; a sitemap
//! that references itself, directly or through other indexes, never finishes.

use crate::config::{validate, Config, CrawlerConfig, DEFAULT_STREAM_CAPACITY};
use crate::crawler::classifier::{classify, ClassifiedDocument};
use crate::crawler::fetcher::{build_http_client, fetch_document};
use crate::crawler::pending::{PendingWork, WorkTicket};
use crate::crawler::stats::{CrawlSnapshot, CrawlStats};
use crate::TallyError;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Tuning knobs for a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Maximum fetches in flight at once; `None` spawns without limit
    pub max_concurrent_fetches: Option<usize>,

    /// Buffer size of the result stream; producers wait when it is full
    pub stream_capacity: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: None,
            stream_capacity: DEFAULT_STREAM_CAPACITY,
        }
    }
}

impl From<&CrawlerConfig> for CrawlOptions {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_concurrent_fetches: config.max_concurrent_fetches,
            stream_capacity: config.stream_capacity,
        }
    }
}

/// Stream of leaf URLs produced by a running crawl
///
/// Items arrive in no particular order. The stream ends once every task of
/// the crawl has finished.
#[derive(Debug)]
pub struct ResultStream {
    receiver: mpsc::Receiver<String>,
    stats: Arc<CrawlStats>,
}

impl ResultStream {
    pub(crate) fn new(receiver: mpsc::Receiver<String>, stats: Arc<CrawlStats>) -> Self {
        Self { receiver, stats }
    }

    /// Waits for the next URL; `None` once the crawl has completed
    pub async fn next(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Shared handle to the crawl counters, valid after the stream is consumed
    pub fn stats(&self) -> Arc<CrawlStats> {
        Arc::clone(&self.stats)
    }

    /// Current values of the crawl counters
    pub fn snapshot(&self) -> CrawlSnapshot {
        self.stats.snapshot()
    }
}

/// State shared by every task of one crawl
struct CrawlContext {
    client: Client,
    limiter: Option<Arc<Semaphore>>,
    stats: Arc<CrawlStats>,
}

/// Recursive sitemap crawler
#[derive(Debug, Clone)]
pub struct Crawler {
    client: Client,
    options: CrawlOptions,
}

impl Crawler {
    /// Creates a crawler around an existing HTTP client
    pub fn new(client: Client, options: CrawlOptions) -> Self {
        Self { client, options }
    }

    /// Creates a crawler from configuration, building its HTTP client
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to crawl
    /// * `Err(TallyError::Config)` - The configuration failed validation
    /// * `Err(TallyError::Reqwest)` - The HTTP client could not be built
    pub fn from_config(config: &Config) -> Result<Self, TallyError> {
        validate(config)?;
        let client = build_http_client(config)?;
        Ok(Self::new(client, CrawlOptions::from(&config.crawler)))
    }

    /// The HTTP client shared by every fetch of this crawler
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Options this crawler was built with
    pub fn options(&self) -> CrawlOptions {
        self.options
    }

    /// Starts crawling from `start` and returns the stream of discovered URLs
    ///
    /// Must be called from within a tokio runtime. The crawl runs in the
    /// background; the returned stream closes once all transitively spawned
    /// work has finished.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sitemap_tally::config::Config;
    /// use sitemap_tally::crawler::Crawler;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let crawler = Crawler::from_config(&Config::default())?;
    /// let mut stream = crawler.crawl("https://example.com/sitemap.xml");
    /// while let Some(url) = stream.next().await {
    ///     println!("{}", url);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn crawl(&self, start: impl Into<String>) -> ResultStream {
        let start = start.into();
        let (sender, receiver) = mpsc::channel(self.options.stream_capacity.max(1));
        let stats = Arc::new(CrawlStats::default());
        let context = Arc::new(CrawlContext {
            client: self.client.clone(),
            limiter: self
                .options
                .max_concurrent_fetches
                .map(|limit| Arc::new(Semaphore::new(limit.max(1)))),
            stats: Arc::clone(&stats),
        });

        tracing::info!("Starting crawl at {}", start);
        let (_pending, ticket, done) = PendingWork::start();
        spawn_visit(context, start, sender.clone(), ticket);

        let supervisor_stats = Arc::clone(&stats);
        tokio::spawn(async move {
            // Fires once the last ticket drops
            let _ = done.await;
            drop(sender);
            tracing::info!("Crawl complete: {}", supervisor_stats.snapshot());
        });

        ResultStream::new(receiver, stats)
    }
}

fn spawn_visit(
    context: Arc<CrawlContext>,
    reference: String,
    results: mpsc::Sender<String>,
    ticket: WorkTicket,
) {
    tokio::spawn(visit(context, reference, results, ticket));
}

/// Fetch, classify and branch for one reference
///
/// `ticket` is held until this function returns, after every child has
/// received its own ticket.
async fn visit(
    context: Arc<CrawlContext>,
    reference: String,
    results: mpsc::Sender<String>,
    ticket: WorkTicket,
) {
    let document = {
        let _permit = match &context.limiter {
            Some(limiter) => match Arc::clone(limiter).acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => return,
            },
            None => None,
        };
        let _in_flight = context.stats.begin_fetch();

        tracing::debug!("Fetching {}", reference);
        match fetch_document(&context.client, &reference).await {
            Ok(body) => {
                context.stats.record_fetched();
                classify(&body)
            }
            Err(e) => {
                context.stats.record_failure();
                tracing::warn!("Skipping {}: {}", reference, e);
                return;
            }
        }
    };

    tracing::debug!("Classified {} as {}", reference, document.kind());

    match document {
        ClassifiedDocument::Index(index) => {
            context.stats.record_index();
            for child in index.sitemaps {
                spawn_visit(Arc::clone(&context), child, results.clone(), ticket.fork());
            }
        }
        ClassifiedDocument::Leaf(leaf) => {
            context.stats.record_leaf();
            for url in leaf.urls {
                if results.send(url).await.is_err() {
                    tracing::debug!("Result stream dropped, abandoning {}", reference);
                    break;
                }
                context.stats.record_emitted();
            }
        }
        ClassifiedDocument::Unrecognized => {
            context.stats.record_unrecognized();
            tracing::warn!("Unrecognized document at {}", reference);
        }
    }
}
