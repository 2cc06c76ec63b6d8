//! The transport seam and its default `ureq` implementation.
//!
//! # Design
//! The executor never performs I/O itself. It hands a finished `HttpRequest`
//! to a `Transport` and classifies whatever comes back, so tests can swap in
//! a spy and callers can bring their own client. `UreqTransport` runs the
//! blocking ureq exchange on Tokio's blocking pool.

use std::future::Future;

use tracing::debug;
use ureq::Agent;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// What a transport reports for one exchange.
///
/// `Ok(None)` means the exchange finished without yielding an HTTP response.
pub type TransportOutcome = Result<Option<HttpResponse>, TransportError>;

/// Performs a single HTTP exchange.
///
/// Implementations must hand every status code back as data; rejecting
/// non-2xx responses is the classifier's job.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: HttpRequest) -> impl Future<Output = TransportOutcome> + Send;
}

/// Transport backed by a `ureq::Agent`.
///
/// Response bodies are read in full. There is no size cap unless one is set
/// with [`UreqTransport::with_body_limit`].
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
    body_limit: u64,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self::with_agent(agent)
    }

    /// Wraps a preconfigured agent.
    ///
    /// The agent must be built with `http_status_as_error(false)`, otherwise
    /// 4xx/5xx responses surface as transport errors instead of statuses.
    pub fn with_agent(agent: Agent) -> Self {
        Self {
            agent,
            body_limit: u64::MAX,
        }
    }

    /// Caps the number of response body bytes read per exchange.
    ///
    /// A larger body fails the exchange with a transport error.
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> impl Future<Output = TransportOutcome> + Send {
        let agent = self.agent.clone();
        let body_limit = self.body_limit;
        async move {
            tokio::task::spawn_blocking(move || execute(&agent, request, body_limit))
                .await
                .map_err(|e| TransportError::Other(Box::new(e)))?
        }
    }
}

fn execute(agent: &Agent, request: HttpRequest, body_limit: u64) -> TransportOutcome {
    let HttpRequest {
        method,
        url,
        headers,
        body,
    } = request;
    debug!(%method, %url, "sending request with ureq");

    let result = match method {
        HttpMethod::Get | HttpMethod::Delete => {
            let mut builder = match method {
                HttpMethod::Get => agent.get(&url),
                _ => agent.delete(&url),
            };
            for (name, value) in &headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            match body {
                Some(body) => builder.force_send_body().send(&body[..]),
                None => builder.call(),
            }
        }
        HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => {
            let mut builder = match method {
                HttpMethod::Post => agent.post(&url),
                HttpMethod::Put => agent.put(&url),
                _ => agent.patch(&url),
            };
            for (name, value) in &headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            match body {
                Some(body) => builder.send(&body[..]),
                None => builder.send_empty(),
            }
        }
    };
    let mut response = result.map_err(transport_error)?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response
        .body_mut()
        .with_config()
        .limit(body_limit)
        .read_to_vec()
        .map_err(transport_error)?;

    Ok(Some(HttpResponse {
        status,
        headers,
        body: Some(body),
    }))
}

fn transport_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Io(e) => TransportError::Io(e),
        other => TransportError::Other(Box::new(other)),
    }
}
