//! Request lifecycle states and an observer hook for them.
//!
//! Every upload moves through a fixed sequence:
//!
//! ```text
//! Received ──▶ Validated ──▶ Decompressed ──▶ TextExtracted ──▶ Answered ──▶ Responded
//!    │             │               │                 │
//!    ▼             ▼               ▼                 ▼
//! Rejected       Failed          Failed            Failed
//! ```
//!
//! `Rejected` means the request itself was invalid (400-class); `Failed`
//! means a processing stage broke (500-class). Both are terminal.
//!
//! Inject an [`Arc<dyn PipelineObserver>`] via
//! [`crate::orchestrate::Pipeline::with_observer`] to watch requests go by,
//! e.g. for metrics or tests.
//!
//! # Example
//!
//! ```rust
//! use pdfqa::{PipelineObserver, RequestState};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FailureCounter(AtomicUsize);
//!
//! impl PipelineObserver for FailureCounter {
//!     fn on_transition(&self, _from: RequestState, to: RequestState) {
//!         if to == RequestState::Failed {
//!             self.0.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let observer: Arc<dyn PipelineObserver> = Arc::new(FailureCounter(AtomicUsize::new(0)));
//! observer.on_transition(RequestState::TextExtracted, RequestState::Failed);
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Where a request is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Received,
    Validated,
    Decompressed,
    TextExtracted,
    Answered,
    Responded,
    Rejected,
    Failed,
}

impl RequestState {
    /// `true` for states a request never leaves.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Responded | RequestState::Rejected | RequestState::Failed
        )
    }

    /// Whether `self → next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: RequestState) -> bool {
        use RequestState::*;
        matches!(
            (self, next),
            (Received, Validated)
                | (Received, Rejected)
                | (Validated, Decompressed)
                | (Validated, Failed)
                | (Decompressed, TextExtracted)
                | (Decompressed, Failed)
                | (TextExtracted, Answered)
                | (TextExtracted, Failed)
                | (Answered, Responded)
        )
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestState::Received => "received",
            RequestState::Validated => "validated",
            RequestState::Decompressed => "decompressed",
            RequestState::TextExtracted => "text_extracted",
            RequestState::Answered => "answered",
            RequestState::Responded => "responded",
            RequestState::Rejected => "rejected",
            RequestState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline on every state change of a request.
///
/// Requests are handled concurrently, so implementations must synchronise
/// shared state themselves. The default method is a no-op.
pub trait PipelineObserver: Send + Sync {
    fn on_transition(&self, from: RequestState, to: RequestState) {
        let _ = (from, to);
    }
}

/// Observer that ignores every event. Used when none is configured.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Shared observer handle as stored by the pipeline.
pub type SharedObserver = Arc<dyn PipelineObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const ALL: [RequestState; 8] = [
        RequestState::Received,
        RequestState::Validated,
        RequestState::Decompressed,
        RequestState::TextExtracted,
        RequestState::Answered,
        RequestState::Responded,
        RequestState::Rejected,
        RequestState::Failed,
    ];

    #[test]
    fn terminal_states_have_no_exits() {
        for from in ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn happy_path_is_a_chain() {
        let path = [
            RequestState::Received,
            RequestState::Validated,
            RequestState::Decompressed,
            RequestState::TextExtracted,
            RequestState::Answered,
            RequestState::Responded,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]));
        }
    }

    #[test]
    fn rejection_only_before_validation() {
        assert!(RequestState::Received.can_transition_to(RequestState::Rejected));
        assert!(!RequestState::Validated.can_transition_to(RequestState::Rejected));
        assert!(!RequestState::Received.can_transition_to(RequestState::Failed));
    }

    #[test]
    fn recording_observer_sees_events() {
        struct Recorder(Mutex<Vec<(RequestState, RequestState)>>);
        impl PipelineObserver for Recorder {
            fn on_transition(&self, from: RequestState, to: RequestState) {
                self.0.lock().unwrap().push((from, to));
            }
        }

        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));
        let shared: SharedObserver = rec.clone();
        shared.on_transition(RequestState::Received, RequestState::Validated);
        NoopObserver.on_transition(RequestState::Received, RequestState::Rejected);
        assert_eq!(
            rec.0.lock().unwrap().as_slice(),
            &[(RequestState::Received, RequestState::Validated)]
        );
    }
}
