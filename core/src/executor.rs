//! Route execution in callback and async form.
//!
//! # Design
//! Both entry points run the same pipeline: `build_request`, then the
//! transport, then `classify`. Pre-dispatch failures (base URL, parameter
//! encoding) never reach the transport. Callback mode delivers every outcome
//! through its completion exactly once, including cancellation; async mode
//! returns the same outcome directly. Neither mode retries or keeps state
//! between calls.
//!
//! Callback mode runs on the caller's Tokio runtime when there is one. Plain
//! threads share a single-threaded fallback runtime, started on first use and
//! driven by its own background thread.

use std::sync::Mutex;

use serde::de::DeserializeOwned;
use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, instrument, warn, Instrument};

use crate::client::{build_request, classify};
use crate::error::{RouteError, RouteResult, TransportError};
use crate::route::{Route, Session};
use crate::transport::Transport;

/// Handle to a dispatched callback-mode call.
///
/// Dropping the handle does not cancel the call.
#[derive(Debug)]
pub struct RequestHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RequestHandle {
    /// Abandons the in-flight exchange.
    ///
    /// If the transport has not answered yet, the completion receives
    /// `RouteError::Request(TransportError::Cancelled)`. Otherwise this has
    /// no effect.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Returns `true` once the completion has run.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits until the completion has run.
    ///
    /// A completion that panicked is logged, not propagated.
    pub async fn wait(self) {
        if let Err(err) = self.task.await {
            warn!(error = %err, "route completion did not finish");
        }
    }
}

static FALLBACK_RUNTIME: Mutex<Option<Handle>> = Mutex::new(None);

/// The ambient runtime, or the shared fallback for callers outside one.
fn runtime() -> std::io::Result<Handle> {
    if let Ok(handle) = Handle::try_current() {
        return Ok(handle);
    }

    let mut fallback = FALLBACK_RUNTIME
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(handle) = fallback.as_ref() {
        return Ok(handle.clone());
    }

    let rt = Builder::new_current_thread().enable_all().build()?;
    let handle = rt.handle().clone();
    std::thread::Builder::new()
        .name("route-executor".to_string())
        .spawn(move || rt.block_on(std::future::pending::<()>()))?;
    debug!("started fallback runtime for callback mode");
    *fallback = Some(handle.clone());
    Ok(handle)
}

/// Runs `route` and hands the result to `completion`.
///
/// Pre-dispatch failures invoke `completion` before this function returns
/// and yield `None`. Otherwise the exchange runs on a Tokio task, the
/// completion is invoked from that task, and a [`RequestHandle`] is returned.
///
/// Outside a Tokio runtime the task runs on a shared fallback runtime. If
/// that runtime cannot be started, `completion` receives the I/O error as a
/// `Request` failure and `None` is returned.
pub fn request<R, T, X, F>(route: &R, session: &Session<X>, completion: F) -> Option<RequestHandle>
where
    R: Route + ?Sized,
    T: DeserializeOwned + Send + 'static,
    X: Transport,
    F: FnOnce(RouteResult<T>) + Send + 'static,
{
    let request = match build_request(session.base_url(), route) {
        Ok(request) => request,
        Err(err) => {
            debug!(error = %err, "route failed before dispatch");
            completion(Err(err));
            return None;
        }
    };

    let span = info_span!(
        "route_request",
        http.method = %request.method,
        http.url = %request.url,
    );
    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(err) => {
            warn!(error = %err, "no runtime available for callback mode");
            completion(Err(RouteError::Request(TransportError::Io(err))));
            return None;
        }
    };

    let data_type = route.response_data_type();
    let transport = session.shared_transport();
    let (cancel, cancelled) = oneshot::channel::<()>();

    let task = runtime.spawn(
        async move {
            debug!("dispatching request");
            let outcome = tokio::select! {
                outcome = transport.send(request) => outcome,
                Ok(()) = cancelled => Err(TransportError::Cancelled),
            };
            completion(classify(outcome, data_type));
        }
        .instrument(span),
    );

    Some(RequestHandle {
        cancel: Some(cancel),
        task,
    })
}

/// Runs `route` and returns the decoded value.
///
/// Applies the same checks in the same order as [`request`]; the only
/// suspension point is the transport call.
#[instrument(
    name = "route_fetch",
    skip_all,
    fields(http.method = %route.method(), route.path = %route.path())
)]
pub async fn fetch<R, T, X>(route: &R, session: &Session<X>) -> RouteResult<T>
where
    R: Route + ?Sized,
    T: DeserializeOwned,
    X: Transport,
{
    let request = build_request(session.base_url(), route)?;
    let data_type = route.response_data_type();
    debug!(url = %request.url, "dispatching request");
    let outcome = session.transport().send(request).await;
    classify(outcome, data_type)
}
