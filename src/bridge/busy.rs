//! Busy tracking - reference count of outstanding request ids
//!
//! Every dispatch holds a [`BusyToken`] for its id until the waiter is done
//! with the result. The app is busy while at least one token is alive, so a
//! second dispatch finishing early no longer clears the flag for the first.
//!
//! The id set lives inside the watch channel; each change is applied and
//! published under the channel's lock, so readers never see a stale count.

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;

use crate::bridge::envelope::RequestId;

/// Set of outstanding request ids, published to monitors
pub struct BusyTracker {
    outstanding_tx: watch::Sender<BTreeSet<RequestId>>,
}

impl BusyTracker {
    pub fn new() -> (Arc<Self>, BusyMonitor) {
        let (outstanding_tx, outstanding_rx) = watch::channel(BTreeSet::new());
        let tracker = Arc::new(BusyTracker { outstanding_tx });
        (tracker, BusyMonitor { outstanding_rx })
    }

    /// Mark `id` outstanding until the returned token is dropped
    pub fn begin(self: &Arc<Self>, id: RequestId) -> BusyToken {
        let mut count = 0;
        self.outstanding_tx.send_modify(|outstanding| {
            outstanding.insert(id);
            count = outstanding.len();
        });
        tracing::debug!(%id, outstanding = count, "Busy");
        BusyToken {
            id,
            tracker: Arc::clone(self),
        }
    }

    fn finish(&self, id: RequestId) {
        let mut count = 0;
        let removed = self.outstanding_tx.send_if_modified(|outstanding| {
            let removed = outstanding.remove(&id);
            count = outstanding.len();
            removed
        });
        if removed {
            tracing::debug!(%id, outstanding = count, "Released");
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding_tx.borrow().len()
    }
}

/// Keeps one request id outstanding while alive
#[derive(Debug)]
pub struct BusyToken {
    id: RequestId,
    tracker: Arc<BusyTracker>,
}

impl BusyToken {
    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl Drop for BusyToken {
    fn drop(&mut self) {
        self.tracker.finish(self.id);
    }
}

impl std::fmt::Debug for BusyTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusyTracker")
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// Read side of the busy state, for components that gate interaction
#[derive(Clone, Debug)]
pub struct BusyMonitor {
    outstanding_rx: watch::Receiver<BTreeSet<RequestId>>,
}

impl BusyMonitor {
    pub fn is_busy(&self) -> bool {
        self.outstanding() > 0
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding_rx.borrow().len()
    }

    /// Wait for the next change of the outstanding set.
    ///
    /// Returns false once the tracker is gone.
    pub async fn changed(&mut self) -> bool {
        self.outstanding_rx.changed().await.is_ok()
    }

    /// Wait until no request is outstanding
    pub async fn wait_idle(&mut self) {
        let _ = self.outstanding_rx.wait_for(|outstanding| outstanding.is_empty()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_brackets_busy_state() {
        let (tracker, monitor) = BusyTracker::new();
        assert!(!monitor.is_busy());

        let token = tracker.begin(RequestId(1));
        assert!(monitor.is_busy());
        assert_eq!(token.id(), RequestId(1));

        drop(token);
        assert!(!monitor.is_busy());
    }

    #[test]
    fn test_overlapping_requests_keep_busy_until_last() {
        let (tracker, monitor) = BusyTracker::new();
        let first = tracker.begin(RequestId(1));
        let second = tracker.begin(RequestId(2));
        assert_eq!(monitor.outstanding(), 2);

        drop(second);
        assert!(monitor.is_busy(), "first request is still outstanding");

        drop(first);
        assert!(!monitor.is_busy());
    }

    #[tokio::test]
    async fn test_wait_idle_resolves_after_release() {
        let (tracker, mut monitor) = BusyTracker::new();
        let token = tracker.begin(RequestId(9));

        let waiter = tokio::spawn(async move {
            monitor.wait_idle().await;
            monitor.is_busy()
        });
        tokio::task::yield_now().await;
        drop(token);

        assert!(!waiter.await.unwrap());
        assert_eq!(tracker.outstanding(), 0);
    }

    #[test]
    fn test_concurrent_churn_never_reports_idle_while_held() {
        let (tracker, monitor) = BusyTracker::new();
        let held = tracker.begin(RequestId(0));

        let workers: Vec<_> = (0..8u64)
            .map(|worker| {
                let tracker = Arc::clone(&tracker);
                let monitor = monitor.clone();
                std::thread::spawn(move || {
                    for round in 0..500u64 {
                        let token = tracker.begin(RequestId(1 + worker * 1000 + round));
                        drop(token);
                        assert!(monitor.is_busy(), "idle while request #0 is outstanding");
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(monitor.outstanding(), 1);
        drop(held);
        assert!(!monitor.is_busy());
    }
}
