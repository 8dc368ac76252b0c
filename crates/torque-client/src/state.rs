//! # Request State
//!
//! The observable state of a [`RequestController`](crate::RequestController).
//!
//! ## Phase Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──execute()──► Loading(1) ──ok──────────────────► Success       │
//! │                          │                                              │
//! │                          ├──client error──────────────► Failed         │
//! │                          │                                              │
//! │                          ├──transient, attempts left──► RetryWait(1)   │
//! │                          │                                  │           │
//! │                          │         Loading(2) ◄──delay──────┘           │
//! │                          │                                              │
//! │                          ├──transient, none left──────► Failed         │
//! │                          │                              (Exhausted)     │
//! │                          └──cancel()──────────────────► Cancelled      │
//! │                                                                         │
//! │   Any phase ──reset()──► Idle                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ErrorInfo;

/// Where a controller is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RequestPhase {
    #[default]
    Idle,

    /// Attempt `attempt` (1-based) is in flight.
    Loading { attempt: u32 },

    /// Attempt `attempt` failed transiently; the next starts after `delay_ms`.
    RetryWait { attempt: u32, delay_ms: u64 },

    Success,
    Failed,
    Cancelled,
}

impl RequestPhase {
    pub fn retry_wait(attempt: u32, delay: Duration) -> Self {
        RequestPhase::RetryWait {
            attempt,
            delay_ms: delay.as_millis() as u64,
        }
    }

    /// Returns true for phases that end a call.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestPhase::Success | RequestPhase::Failed | RequestPhase::Cancelled
        )
    }

    /// Returns true while a call is running, including retry waits.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RequestPhase::Loading { .. } | RequestPhase::RetryWait { .. }
        )
    }
}

impl fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestPhase::Idle => write!(f, "idle"),
            RequestPhase::Loading { attempt } => write!(f, "loading (attempt {})", attempt),
            RequestPhase::RetryWait { attempt, delay_ms } => {
                write!(f, "retry wait after attempt {} ({}ms)", attempt, delay_ms)
            }
            RequestPhase::Success => write!(f, "success"),
            RequestPhase::Failed => write!(f, "failed"),
            RequestPhase::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Snapshot of a controller, as rendered by the frontend.
///
/// `data` survives later failures and cancellations: a screen keeps
/// showing the last good payload next to the new error.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RequestState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<ErrorInfo>,
    pub success: bool,
    pub phase: RequestPhase,
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        RequestState {
            data: None,
            loading: false,
            error: None,
            success: false,
            phase: RequestPhase::Idle,
        }
    }
}

impl<T> RequestState<T> {
    pub(crate) fn begin_attempt(&mut self, attempt: u32) {
        self.loading = true;
        self.error = None;
        self.success = false;
        self.phase = RequestPhase::Loading { attempt };
    }

    pub(crate) fn wait_for_retry(&mut self, attempt: u32, delay: Duration) {
        self.phase = RequestPhase::retry_wait(attempt, delay);
    }

    pub(crate) fn succeed(&mut self, data: T) {
        self.data = Some(data);
        self.loading = false;
        self.error = None;
        self.success = true;
        self.phase = RequestPhase::Success;
    }

    pub(crate) fn fail(&mut self, error: ErrorInfo) {
        self.loading = false;
        self.error = Some(error);
        self.success = false;
        self.phase = RequestPhase::Failed;
    }

    pub(crate) fn cancel(&mut self) {
        self.loading = false;
        self.success = false;
        self.phase = RequestPhase::Cancelled;
    }
}

/// A phase transition, broadcast to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    /// Identifies the `execute()` call that caused the transition.
    pub call_id: Uuid,
    pub phase: RequestPhase,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestError;

    #[test]
    fn test_phase_classification() {
        assert!(!RequestPhase::Idle.is_terminal());
        assert!(RequestPhase::Loading { attempt: 1 }.is_active());
        assert!(RequestPhase::retry_wait(1, Duration::from_millis(250)).is_active());
        assert!(RequestPhase::Success.is_terminal());
        assert!(RequestPhase::Failed.is_terminal());
        assert!(RequestPhase::Cancelled.is_terminal());
        assert!(!RequestPhase::Cancelled.is_active());
    }

    #[test]
    fn test_failure_keeps_previous_data() {
        let mut state: RequestState<u32> = RequestState::default();
        state.begin_attempt(1);
        state.succeed(7);

        state.begin_attempt(1);
        assert!(state.loading);
        assert!(!state.success);
        assert_eq!(state.data, Some(7));

        state.fail(ErrorInfo::from(&RequestError::http(404, "Not found")));
        assert!(!state.loading);
        assert_eq!(state.data, Some(7));
        assert_eq!(state.phase, RequestPhase::Failed);
        assert_eq!(state.error.as_ref().map(|e| e.code.as_str()), Some("HTTP_404"));
    }

    #[test]
    fn test_phase_serializes_tagged() {
        let json = serde_json::to_value(RequestPhase::retry_wait(2, Duration::from_secs(1))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "phase": "retry_wait", "attempt": 2, "delay_ms": 1000 })
        );
    }
}
