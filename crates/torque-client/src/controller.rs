//! # Request Controller
//!
//! Uniform loading/error/success lifecycle around one remote operation.
//!
//! ## Single-Flight Execution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  execute(a) ──► generation 1 ──► operation(a, signal₁) ─ ─ ─ ─ ─ ┐     │
//! │                                                                   │     │
//! │  execute(b) ──► abort signal₁                                     ▼     │
//! │             ──► generation 2 ──► operation(b, signal₂) ──► Success(b)  │
//! │                                                       (a's late result │
//! │                                                        is discarded)   │
//! │                                                                         │
//! │  Every state write checks:  generation == current && !disposed         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let customers = RequestController::builder(move |(), signal| {
//!     let api = api.clone();
//!     async move { api.get("/api/customers", signal).await.map(|r| r.data) }
//! })
//! .name("customers")
//! .retries(2)
//! .on_error(|err| toast(&err.message))
//! .build();
//!
//! let list: Vec<Customer> = customers.execute(()).await?;
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::cache::ResponseCache;
use crate::error::{ErrorInfo, RequestError, RequestResult};
use crate::retry::RetryPolicy;
use crate::signal::{abort_pair, AbortHandle, AbortSignal};
use crate::state::{PhaseChange, RequestPhase, RequestState};
use crate::transport::BoxFuture;

/// Capacity of the phase-change broadcast channel.
const PHASE_CHANNEL_CAPACITY: usize = 64;

type Operation<A> = Arc<dyn Fn(A, AbortSignal) -> BoxFuture<'static, RequestResult<Value>> + Send + Sync>;
type Transform<T> = Arc<dyn Fn(Value) -> RequestResult<T> + Send + Sync>;
type SuccessCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&ErrorInfo) + Send + Sync>;
type CacheKey<A> = Arc<dyn Fn(&A) -> String + Send + Sync>;

struct CacheBinding<A> {
    cache: Arc<ResponseCache>,
    key: CacheKey<A>,
}

/// Mutable part of a controller, guarded by one mutex.
struct Shared<T> {
    state: RequestState<T>,
    generation: u64,
    abort: Option<AbortHandle>,
    call_id: Option<Uuid>,
    disposed: bool,
    /// Restored by `reset`.
    initial_data: Option<T>,
}

impl<T> Shared<T> {
    fn is_current(&self, generation: u64) -> bool {
        !self.disposed && self.generation == generation
    }

    /// Aborts the in-flight call, if any, and invalidates its generation.
    fn abort_in_flight(&mut self) -> bool {
        self.generation += 1;
        match self.abort.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

struct Inner<A, T> {
    name: String,
    operation: Operation<A>,
    transform: Transform<T>,
    policy: RetryPolicy,
    on_success: Option<SuccessCallback<T>>,
    on_error: Option<ErrorCallback>,
    cache: Option<CacheBinding<A>>,
    shared: Mutex<Shared<T>>,
    events: broadcast::Sender<PhaseChange>,
}

/// Runs an injected async operation with retry, cancellation and
/// observable state.
///
/// `A` is the argument handed to the operation on every attempt; `T` is
/// the transformed result. Cloning shares the same controller.
pub struct RequestController<A, T> {
    inner: Arc<Inner<A, T>>,
}

impl<A, T> Clone for RequestController<A, T> {
    fn clone(&self) -> Self {
        RequestController {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, T> std::fmt::Debug for RequestController<A, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestController")
            .field("name", &self.inner.name)
            .field("policy", &self.inner.policy)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Configures a [`RequestController`].
pub struct ControllerBuilder<A, T> {
    name: String,
    operation: Operation<A>,
    transform: Transform<T>,
    policy: RetryPolicy,
    on_success: Option<SuccessCallback<T>>,
    on_error: Option<ErrorCallback>,
    cache: Option<CacheBinding<A>>,
    initial_data: Option<T>,
}

fn box_operation<A, F, Fut>(operation: F) -> Operation<A>
where
    F: Fn(A, AbortSignal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RequestResult<Value>> + Send + 'static,
{
    Arc::new(move |args, signal| Box::pin(operation(args, signal)))
}

impl<A, T> RequestController<A, T>
where
    A: Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    /// Starts a builder whose payload is decoded into `T` with serde.
    pub fn builder<F, Fut>(operation: F) -> ControllerBuilder<A, T>
    where
        T: DeserializeOwned,
        F: Fn(A, AbortSignal) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RequestResult<Value>> + Send + 'static,
    {
        Self::with_transform(operation, |raw| {
            serde_json::from_value(raw).map_err(RequestError::from)
        })
    }

    /// Starts a builder with an explicit payload transform.
    pub fn with_transform<F, Fut, X>(operation: F, transform: X) -> ControllerBuilder<A, T>
    where
        F: Fn(A, AbortSignal) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RequestResult<Value>> + Send + 'static,
        X: Fn(Value) -> RequestResult<T> + Send + Sync + 'static,
    {
        ControllerBuilder {
            name: "request".to_string(),
            operation: box_operation(operation),
            transform: Arc::new(transform),
            policy: RetryPolicy::default(),
            on_success: None,
            on_error: None,
            cache: None,
            initial_data: None,
        }
    }
}

impl<A, T> ControllerBuilder<A, T>
where
    A: Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    /// Label used in log spans.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.policy.retries = retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.policy.delay = delay;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the payload transform.
    pub fn transform<X>(mut self, transform: X) -> Self
    where
        X: Fn(Value) -> RequestResult<T> + Send + Sync + 'static,
    {
        self.transform = Arc::new(transform);
        self
    }

    /// Called once per successful call, after state is updated.
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    /// Called once per failed call, after state is updated. Never called
    /// for cancellations.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ErrorInfo) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Serves fresh cached payloads and stores successful ones.
    pub fn cache<K>(mut self, cache: Arc<ResponseCache>, key: K) -> Self
    where
        K: Fn(&A) -> String + Send + Sync + 'static,
    {
        self.cache = Some(CacheBinding {
            cache,
            key: Arc::new(key),
        });
        self
    }

    /// Data shown before the first call completes, and restored by
    /// [`reset`](RequestController::reset).
    pub fn initial_data(mut self, data: T) -> Self {
        self.initial_data = Some(data);
        self
    }

    pub fn build(self) -> RequestController<A, T> {
        let (events, _) = broadcast::channel(PHASE_CHANNEL_CAPACITY);
        let state = RequestState {
            data: self.initial_data.clone(),
            ..RequestState::default()
        };

        RequestController {
            inner: Arc::new(Inner {
                name: self.name,
                operation: self.operation,
                transform: self.transform,
                policy: self.policy,
                on_success: self.on_success,
                on_error: self.on_error,
                cache: self.cache,
                shared: Mutex::new(Shared {
                    state,
                    generation: 0,
                    abort: None,
                    call_id: None,
                    disposed: false,
                    initial_data: self.initial_data,
                }),
                events,
            }),
        }
    }
}

// =============================================================================
// Execution
// =============================================================================

impl<A, T> RequestController<A, T>
where
    A: Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    /// Runs the operation, superseding any call still in flight.
    ///
    /// Returns `Err(RequestError::Cancelled)` if this call is cancelled,
    /// superseded, or the controller is disposed.
    pub async fn execute(&self, args: A) -> RequestResult<T> {
        let call_id = Uuid::new_v4();
        let span = info_span!("request", name = %self.inner.name, %call_id);
        self.run(args, call_id).instrument(span).await
    }

    async fn run(&self, args: A, call_id: Uuid) -> RequestResult<T> {
        let (generation, signal) = self.start_call(call_id)?;

        let cache_key = self.inner.cache.as_ref().map(|binding| (binding.key)(&args));
        if let (Some(binding), Some(key)) = (&self.inner.cache, &cache_key) {
            if let Some(raw) = signal.guard(binding.cache.get(key)).await? {
                debug!(key = %key, "Serving cached response");
                return self.finish_success(generation, call_id, raw, None).await;
            }
        }

        let policy = self.inner.policy;
        let max_attempts = policy.max_attempts();
        let mut schedule = policy.schedule();
        let mut attempt = 1;

        loop {
            self.transition(generation, call_id, |state| state.begin_attempt(attempt))?;
            debug!(attempt, max_attempts, "Attempt started");

            let pending = (self.inner.operation)(args.clone(), signal.clone());
            let err = match signal.guard(pending).await.and_then(|outcome| outcome) {
                Ok(raw) => {
                    return self
                        .finish_success(generation, call_id, raw, cache_key)
                        .await;
                }
                Err(err) => err,
            };

            if err.is_cancelled() {
                return Err(self.finish_cancelled(generation, call_id));
            }

            if err.is_retryable() && attempt < max_attempts {
                let delay = schedule.next_backoff().unwrap_or(policy.delay);
                warn!(attempt, ?delay, error = %err, "Transient failure, retrying");

                self.transition(generation, call_id, |state| {
                    state.wait_for_retry(attempt, delay)
                })?;
                signal.guard(tokio::time::sleep(delay)).await?;

                attempt += 1;
                continue;
            }

            // A single-shot call reports its own error; only a call that
            // actually retried is reported as exhausted.
            let err = if err.is_retryable() && max_attempts > 1 {
                RequestError::Exhausted {
                    attempts: attempt,
                    last: Box::new(err),
                }
            } else {
                err
            };
            return Err(self.finish_failure(generation, call_id, err));
        }
    }

    /// Registers a new call and aborts the previous one.
    fn start_call(&self, call_id: Uuid) -> RequestResult<(u64, AbortSignal)> {
        self.with_shared(|shared| {
            if shared.disposed {
                debug!("Controller disposed, rejecting execute");
                return Err(RequestError::Cancelled);
            }

            if shared.abort_in_flight() {
                debug!(previous = ?shared.call_id, "Superseding in-flight call");
            }

            let (handle, signal) = abort_pair();
            shared.abort = Some(handle);
            shared.call_id = Some(call_id);
            Ok((shared.generation, signal))
        })
    }

    /// Applies `update` if `generation` is still the live call.
    fn transition<F>(&self, generation: u64, call_id: Uuid, update: F) -> RequestResult<()>
    where
        F: FnOnce(&mut RequestState<T>),
    {
        self.with_shared(|shared| {
            if !shared.is_current(generation) {
                return Err(RequestError::Cancelled);
            }
            update(&mut shared.state);
            if shared.state.phase.is_terminal() {
                shared.abort = None;
            }
            self.emit(call_id, shared.state.phase);
            Ok(())
        })
    }

    async fn finish_success(
        &self,
        generation: u64,
        call_id: Uuid,
        raw: Value,
        store_as: Option<String>,
    ) -> RequestResult<T> {
        let stored = raw.clone();
        let data = match (self.inner.transform)(raw) {
            Ok(data) => data,
            Err(err) => return Err(self.finish_failure(generation, call_id, err)),
        };

        if let (Some(binding), Some(key)) = (&self.inner.cache, store_as) {
            if self.is_current(generation) {
                binding.cache.insert(key, stored).await;
            }
        }

        let committed = data.clone();
        self.transition(generation, call_id, move |state| state.succeed(committed))?;
        info!("Request succeeded");

        if let Some(callback) = &self.inner.on_success {
            callback(&data);
        }
        Ok(data)
    }

    fn finish_failure(&self, generation: u64, call_id: Uuid, err: RequestError) -> RequestError {
        let info = ErrorInfo::from(&err);
        let committed = info.clone();
        if self
            .transition(generation, call_id, move |state| state.fail(committed))
            .is_err()
        {
            return RequestError::Cancelled;
        }
        warn!(code = %info.code, error = %err, "Request failed");

        if let Some(callback) = &self.inner.on_error {
            callback(&info);
        }
        err
    }

    /// The operation reported cancellation on its own.
    fn finish_cancelled(&self, generation: u64, call_id: Uuid) -> RequestError {
        let _ = self.transition(generation, call_id, RequestState::cancel);
        RequestError::Cancelled
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Aborts the in-flight call. State becomes `Cancelled`; no callbacks
    /// fire and no retry is scheduled. No-op when nothing is in flight.
    pub fn cancel(&self) {
        self.with_shared(|shared| {
            if shared.disposed || shared.abort.is_none() {
                return;
            }
            shared.abort_in_flight();
            shared.state.cancel();
            if let Some(call_id) = shared.call_id {
                self.emit(call_id, shared.state.phase);
            }
            info!(name = %self.inner.name, "Request cancelled");
        });
    }

    /// Aborts any in-flight call and ignores everything after. Further
    /// `execute` calls fail with `RequestError::Cancelled`.
    pub fn dispose(&self) {
        self.with_shared(|shared| {
            if shared.disposed {
                return;
            }
            shared.abort_in_flight();
            shared.disposed = true;
            debug!(name = %self.inner.name, "Controller disposed");
        });
    }

    /// Aborts any in-flight call and returns to `Idle`, keeping only the
    /// builder's initial data.
    pub fn reset(&self) {
        self.with_shared(|shared| {
            shared.abort_in_flight();
            shared.state = RequestState {
                data: shared.initial_data.clone(),
                ..RequestState::default()
            };
            if let Some(call_id) = shared.call_id {
                self.emit(call_id, RequestPhase::Idle);
            }
        });
    }

    /// Overwrites `data` without running the operation, e.g. after a
    /// local edit.
    pub fn set_data(&self, data: T) {
        self.with_shared(|shared| shared.state.data = Some(data));
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Snapshot of the current state.
    pub fn state(&self) -> RequestState<T> {
        self.with_shared(|shared| shared.state.clone())
    }

    pub fn phase(&self) -> RequestPhase {
        self.with_shared(|shared| shared.state.phase)
    }

    pub fn is_loading(&self) -> bool {
        self.with_shared(|shared| shared.state.loading)
    }

    pub fn is_disposed(&self) -> bool {
        self.with_shared(|shared| shared.disposed)
    }

    /// Stream of phase transitions from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PhaseChange> {
        self.inner.events.subscribe()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.policy
    }

    fn is_current(&self, generation: u64) -> bool {
        self.with_shared(|shared| shared.is_current(generation))
    }

    fn emit(&self, call_id: Uuid, phase: RequestPhase) {
        // No subscribers is fine.
        let _ = self.inner.events.send(PhaseChange { call_id, phase });
    }

    fn with_shared<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Shared<T>) -> R,
    {
        let mut shared = self
            .inner
            .shared
            .lock()
            .expect("Request state mutex poisoned");
        f(&mut shared)
    }
}
