//! # torque-client: Async Request Plumbing for Torque
//!
//! Uniform lifecycle for every remote operation the shop frontend performs
//! (customers, vehicles, jobs, estimates, invoices, settings), plus the
//! session's shop settings.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Request Controller Architecture                     │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    RequestController<A, T>                       │  │
//! │  │                                                                  │  │
//! │  │  execute(args) ─► operation(args, AbortSignal) ─► transform      │  │
//! │  │  cancel() / dispose() / reset() / state() / subscribe()          │  │
//! │  └──────┬──────────────────────┬──────────────────────┬────────────┘  │
//! │         ▼                      ▼                      ▼                │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐   │
//! │  │  RetryPolicy   │  │ ResponseCache  │  │ RequestState           │   │
//! │  │                │  │                │  │                        │   │
//! │  │ constant or    │  │ shared TTL     │  │ data / loading /       │   │
//! │  │ exponential    │  │ cache (Arc)    │  │ error / success /      │   │
//! │  │ backoff        │  │                │  │ phase                  │   │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘   │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐   │
//! │  │ ApiTransport   │  │ SettingsStore  │  │ ClientConfig           │   │
//! │  │ (injected)     │  │ GET/PUT        │  │ TOML + TORQUE_* env    │   │
//! │  │                │  │ /api/settings  │  │                        │   │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`controller`] - `RequestController` and its builder
//! - [`state`] - Request phases and observable state
//! - [`retry`] - Retry policy and backoff schedules
//! - [`signal`] - Abort handle and signal
//! - [`cache`] - Shared response cache
//! - [`transport`] - `ApiTransport` seam
//! - [`settings`] - Shop settings store
//! - [`config`] - Client configuration
//! - [`error`] - Request, config and settings errors
//! - [`telemetry`] - Tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use torque_client::{ApiTransport, ClientConfig, SettingsStore};
//!
//! let config = ClientConfig::load_or_default(None);
//! let api: Arc<dyn ApiTransport> = Arc::new(HttpTransport::new(&config.api));
//!
//! let settings = SettingsStore::new(config.pricing.clone())
//!     .with_retry_policy(config.retry_policy());
//! settings.load(api.clone()).await;
//!
//! let totals = job.totals(&settings.snapshot().await);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod retry;
pub mod settings;
pub mod signal;
pub mod state;
pub mod telemetry;
pub mod transport;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::ResponseCache;
pub use config::ClientConfig;
pub use controller::{ControllerBuilder, RequestController};
pub use error::{
    ConfigError, ConfigResult, ErrorInfo, ErrorKind, RequestError, RequestResult, SettingsError,
};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use settings::{SettingsStore, SETTINGS_PATH};
pub use signal::{abort_pair, AbortHandle, AbortSignal};
pub use state::{PhaseChange, RequestPhase, RequestState};
pub use transport::{ApiResponse, ApiTransport, BoxFuture, Method};
