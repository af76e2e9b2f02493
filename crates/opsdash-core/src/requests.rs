//! In-flight prediction request tracking.
//!
//! The [`RequestTracker`] keys outstanding prediction requests by the sequence
//! number of the update that issued them. Exactly one party settles each
//! request: the task that ran it, or a newer request cancelling it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::error::Result;
use crate::events::Seq;

/// How a prediction request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    /// The response was merged into the display totals.
    Merged,
    /// The response arrived after a newer update and was dropped.
    Stale,
    /// The request failed; the error was logged and suppressed.
    Failed(String),
    /// A newer request aborted this one.
    Cancelled,
}

/// Handle to an in-flight prediction request.
pub struct PredictionHandle {
    /// Sequence number of the update that issued the request.
    pub seq: Seq,

    /// Receiver for the final outcome.
    pub outcome: oneshot::Receiver<PredictionOutcome>,
}

impl PredictionHandle {
    /// Wait for the request to settle.
    pub async fn wait(self) -> Result<PredictionOutcome> {
        Ok(self.outcome.await?)
    }
}

/// A request taken out of the tracker, ready to be settled.
pub struct PendingRequest {
    started_at: DateTime<Utc>,
    outcome_tx: oneshot::Sender<PredictionOutcome>,
}

impl PendingRequest {
    /// Milliseconds since the request was registered.
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }

    /// Deliver the outcome to the handle, if anyone is still listening.
    pub fn resolve(self, outcome: PredictionOutcome) {
        let _ = self.outcome_tx.send(outcome);
    }
}

struct RequestState {
    started_at: DateTime<Utc>,
    abort: Option<AbortHandle>,
    outcome_tx: oneshot::Sender<PredictionOutcome>,
}

/// Tracks prediction requests that have not settled yet.
pub struct RequestTracker {
    requests: DashMap<Seq, RequestState>,
}

impl RequestTracker {
    /// Create a new request tracker.
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
        }
    }

    /// Create a new tracker wrapped in Arc for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a request and return its handle.
    pub fn register(&self, seq: Seq) -> PredictionHandle {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        self.requests.insert(
            seq,
            RequestState {
                started_at: Utc::now(),
                abort: None,
                outcome_tx,
            },
        );
        PredictionHandle {
            seq,
            outcome: outcome_rx,
        }
    }

    /// Attach the task running a request so it can be aborted.
    ///
    /// Does nothing if the request already settled.
    pub fn attach(&self, seq: Seq, abort: AbortHandle) {
        if let Some(mut state) = self.requests.get_mut(&seq) {
            state.abort = Some(abort);
        }
    }

    /// Take a request out for settling. `None` if it was already cancelled.
    pub fn take(&self, seq: Seq) -> Option<PendingRequest> {
        self.requests.remove(&seq).map(|(_, state)| PendingRequest {
            started_at: state.started_at,
            outcome_tx: state.outcome_tx,
        })
    }

    /// Abort every request older than `seq`. Returns the cancelled sequences.
    pub fn cancel_older(&self, seq: Seq) -> Vec<Seq> {
        let older: Vec<Seq> = self
            .requests
            .iter()
            .map(|r| *r.key())
            .filter(|s| *s < seq)
            .collect();

        let mut cancelled = Vec::with_capacity(older.len());
        for s in older {
            if let Some((_, state)) = self.requests.remove(&s) {
                if let Some(abort) = state.abort {
                    abort.abort();
                }
                let _ = state.outcome_tx.send(PredictionOutcome::Cancelled);
                cancelled.push(s);
            }
        }
        cancelled.sort_unstable();
        cancelled
    }

    /// Get the number of in-flight requests.
    pub fn active_count(&self) -> usize {
        self.requests.len()
    }

    /// List in-flight sequence numbers, oldest first.
    pub fn active_requests(&self) -> Vec<Seq> {
        let mut seqs: Vec<Seq> = self.requests.iter().map(|r| *r.key()).collect();
        seqs.sort_unstable();
        seqs
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_lifecycle() {
        let tracker = RequestTracker::new();
        let handle = tracker.register(1);
        assert_eq!(tracker.active_count(), 1);

        let pending = tracker.take(1).unwrap();
        assert!(pending.elapsed_ms() >= 0);
        pending.resolve(PredictionOutcome::Merged);

        assert_eq!(tracker.active_count(), 0);
        assert_eq!(handle.wait().await.unwrap(), PredictionOutcome::Merged);
    }

    #[tokio::test]
    async fn test_cancel_older() {
        let tracker = RequestTracker::new();
        let first = tracker.register(1);
        let second = tracker.register(2);
        let _third = tracker.register(3);

        assert_eq!(tracker.cancel_older(3), vec![1, 2]);
        assert_eq!(tracker.active_requests(), vec![3]);
        assert_eq!(first.wait().await.unwrap(), PredictionOutcome::Cancelled);
        assert_eq!(second.wait().await.unwrap(), PredictionOutcome::Cancelled);
    }

    #[test]
    fn test_take_after_cancel_is_none() {
        let tracker = RequestTracker::new();
        let _handle = tracker.register(4);
        tracker.cancel_older(5);
        assert!(tracker.take(4).is_none());
    }

    #[tokio::test]
    async fn test_dropped_request_closes_handle() {
        let tracker = RequestTracker::new();
        let handle = tracker.register(9);
        drop(tracker.take(9));
        assert!(handle.wait().await.is_err());
    }
}
