//! Declarative routes and the session they run against.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::RouteResult;
use crate::executor::{self, RequestHandle};
use crate::http::HttpMethod;
use crate::transport::{Transport, UreqTransport};
use crate::types::{ParameterSpec, ResponseDataType};

/// One HTTP endpoint described as data.
///
/// An API surface is usually an enum with one variant per endpoint, each
/// accessor being a `match` over the variants:
///
/// ```
/// use route_core::{HttpMethod, ParameterSpec, Parameters, Route};
///
/// enum Users {
///     Single(u32),
///     Page(u32),
/// }
///
/// impl Route for Users {
///     fn path(&self) -> String {
///         match self {
///             Users::Single(id) => format!("api/users/{id}"),
///             Users::Page(_) => "api/users".to_string(),
///         }
///     }
///
///     fn method(&self) -> HttpMethod {
///         HttpMethod::Get
///     }
///
///     fn parameter(&self) -> ParameterSpec {
///         match self {
///             Users::Single(_) => ParameterSpec::None,
///             Users::Page(page) => ParameterSpec::UrlEncoding(Parameters::new().with("page", *page)),
///         }
///     }
/// }
/// ```
pub trait Route {
    /// Path relative to the session's base URL.
    fn path(&self) -> String;

    fn method(&self) -> HttpMethod;

    /// Headers added to every request for this route.
    fn headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn parameter(&self) -> ParameterSpec {
        ParameterSpec::None
    }

    fn response_data_type(&self) -> ResponseDataType {
        ResponseDataType::Json
    }

    /// Executes the route and delivers the result to `completion`.
    ///
    /// See [`executor::request`].
    fn request<T, X, F>(&self, session: &Session<X>, completion: F) -> Option<RequestHandle>
    where
        T: DeserializeOwned + Send + 'static,
        X: Transport,
        F: FnOnce(RouteResult<T>) + Send + 'static,
    {
        executor::request(self, session, completion)
    }

    /// Executes the route and returns the result.
    ///
    /// See [`executor::fetch`].
    fn fetch<T, X>(&self, session: &Session<X>) -> impl Future<Output = RouteResult<T>> + Send
    where
        T: DeserializeOwned + Send,
        X: Transport,
        Self: Sync,
    {
        executor::fetch(self, session)
    }
}

/// A transport paired with the base URL routes are resolved against.
///
/// Cloning is cheap; clones share the transport.
#[derive(Debug)]
pub struct Session<X> {
    transport: Arc<X>,
    base_url: String,
}

impl<X: Transport> Session<X> {
    pub fn new(transport: X, base_url: impl Into<String>) -> Self {
        Self::from_shared(Arc::new(transport), base_url)
    }

    pub fn from_shared(transport: Arc<X>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &X {
        &self.transport
    }

    pub(crate) fn shared_transport(&self) -> Arc<X> {
        Arc::clone(&self.transport)
    }
}

impl Session<UreqTransport> {
    /// Session backed by a default [`UreqTransport`].
    pub fn ureq(base_url: impl Into<String>) -> Self {
        Self::new(UreqTransport::new(), base_url)
    }
}

impl<X> Clone for Session<X> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            base_url: self.base_url.clone(),
        }
    }
}
