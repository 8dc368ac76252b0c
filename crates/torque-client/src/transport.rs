//! # API Transport
//!
//! The seam between request plumbing and the actual HTTP client.
//!
//! ```text
//! ┌──────────────────┐   request(method, path, body, signal)   ┌──────────┐
//! │ RequestController│ ───────────────────────────────────────►│ HTTP     │
//! │ SettingsStore    │ ◄───────────────────────────────────────│ client   │
//! └──────────────────┘   ApiResponse { status, data } / error  └──────────┘
//! ```
//!
//! The application supplies the implementation (auth headers, base URL,
//! timeouts). Implementations map failures onto [`RequestError`]:
//! a response with a non-success status becomes `RequestError::Http`, no
//! response at all becomes `RequestError::Network`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{RequestError, RequestResult};
use crate::signal::AbortSignal;

/// Boxed, sendable future returned by transports.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Patch => write!(f, "PATCH"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        ApiResponse { status: 200, data }
    }

    /// Builds the error for a non-success response, pulling `message` and
    /// `code` out of a JSON error body when present.
    pub fn into_error(self) -> RequestError {
        let message = self
            .data
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {}", self.status));
        let code = self
            .data
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string);

        RequestError::Http {
            status: self.status,
            message,
            code,
        }
    }
}

/// HTTP access injected by the application.
///
/// `signal` fires when the caller no longer wants the response; honouring
/// it is optional since callers also race the returned future against it.
pub trait ApiTransport: Send + Sync {
    fn request<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        body: Option<Value>,
        signal: AbortSignal,
    ) -> BoxFuture<'a, RequestResult<ApiResponse>>;

    fn get<'a>(&'a self, path: &'a str, signal: AbortSignal) -> BoxFuture<'a, RequestResult<ApiResponse>> {
        self.request(Method::Get, path, None, signal)
    }

    fn post<'a>(
        &'a self,
        path: &'a str,
        body: Value,
        signal: AbortSignal,
    ) -> BoxFuture<'a, RequestResult<ApiResponse>> {
        self.request(Method::Post, path, Some(body), signal)
    }

    fn put<'a>(
        &'a self,
        path: &'a str,
        body: Value,
        signal: AbortSignal,
    ) -> BoxFuture<'a, RequestResult<ApiResponse>> {
        self.request(Method::Put, path, Some(body), signal)
    }

    fn patch<'a>(
        &'a self,
        path: &'a str,
        body: Value,
        signal: AbortSignal,
    ) -> BoxFuture<'a, RequestResult<ApiResponse>> {
        self.request(Method::Patch, path, Some(body), signal)
    }

    fn delete<'a>(&'a self, path: &'a str, signal: AbortSignal) -> BoxFuture<'a, RequestResult<ApiResponse>> {
        self.request(Method::Delete, path, None, signal)
    }
}

impl<T: ApiTransport + ?Sized> ApiTransport for Arc<T> {
    fn request<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        body: Option<Value>,
        signal: AbortSignal,
    ) -> BoxFuture<'a, RequestResult<ApiResponse>> {
        (**self).request(method, path, body, signal)
    }
}

// =============================================================================
// Scripted Transport (tests)
// =============================================================================

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// One scripted reply.
    #[derive(Debug, Clone)]
    pub(crate) struct Reply {
        pub delay: Duration,
        pub result: RequestResult<ApiResponse>,
    }

    impl Reply {
        pub fn ok(data: Value) -> Self {
            Reply {
                delay: Duration::ZERO,
                result: Ok(ApiResponse::ok(data)),
            }
        }

        pub fn err(error: RequestError) -> Self {
            Reply {
                delay: Duration::ZERO,
                result: Err(error),
            }
        }

        pub fn after(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct RecordedCall {
        pub method: Method,
        pub path: String,
        pub body: Option<Value>,
    }

    /// Replays queued replies in order, then repeats the last one.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        last: Mutex<Option<Reply>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
            Arc::new(ScriptedTransport {
                replies: Mutex::new(replies.into_iter().collect()),
                ..Default::default()
            })
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn next_reply(&self) -> Reply {
            let mut last = self.last.lock().unwrap();
            if let Some(reply) = self.replies.lock().unwrap().pop_front() {
                *last = Some(reply.clone());
                return reply;
            }
            last.clone()
                .unwrap_or_else(|| Reply::err(RequestError::Network("no scripted reply".into())))
        }
    }

    impl ApiTransport for ScriptedTransport {
        fn request<'a>(
            &'a self,
            method: Method,
            path: &'a str,
            body: Option<Value>,
            _signal: AbortSignal,
        ) -> BoxFuture<'a, RequestResult<ApiResponse>> {
            self.calls.lock().unwrap().push(RecordedCall {
                method,
                path: path.to_string(),
                body,
            });
            let reply = self.next_reply();

            Box::pin(async move {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                reply.result
            })
        }
    }
}
