//! Outstanding-work accounting for the crawl
//!
//! Every fetch-and-classify task owns a [`WorkTicket`]. A task creates its
//! children's tickets with [`WorkTicket::fork`] while its own ticket is still
//! alive, so the pending count cannot reach zero while any descendant is yet
//! to be spawned. When the last ticket is dropped the count goes from one to
//! zero and the completion signal fires, exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Shared pending-work counter with a single-shot completion signal
#[derive(Debug)]
pub struct PendingWork {
    count: AtomicUsize,
    done: Mutex<Option<oneshot::Sender<()>>>,
}

/// Proof that one unit of work is outstanding; dropping it completes the work
#[derive(Debug)]
pub struct WorkTicket {
    pending: Arc<PendingWork>,
}

impl PendingWork {
    /// Creates a counter holding one unit of work (the starting reference)
    ///
    /// # Returns
    ///
    /// The shared counter, the ticket for the first unit, and a receiver
    /// that resolves once every ticket has been dropped.
    pub fn start() -> (Arc<Self>, WorkTicket, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let pending = Arc::new(Self {
            count: AtomicUsize::new(1),
            done: Mutex::new(Some(tx)),
        });
        let ticket = WorkTicket {
            pending: Arc::clone(&pending),
        };
        (pending, ticket, rx)
    }

    /// Number of tickets currently alive
    pub fn outstanding(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    fn complete_one(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            let sender = self
                .done
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .take();
            if let Some(tx) = sender {
                let _ = tx.send(());
            }
        }
    }
}

impl WorkTicket {
    /// Registers one more unit of work before it is handed to a new task
    pub fn fork(&self) -> WorkTicket {
        self.pending.count.fetch_add(1, Ordering::AcqRel);
        WorkTicket {
            pending: Arc::clone(&self.pending),
        }
    }
}

impl Drop for WorkTicket {
    fn drop(&mut self) {
        self.pending.complete_one();
    }
}
