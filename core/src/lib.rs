//! Declarative HTTP routes over a pluggable transport.
//!
//! # Overview
//! A `Route` describes one endpoint as data: path, method, headers, how its
//! parameters are encoded and what shape the response has. Executing a route
//! against a `Session` builds an `HttpRequest`, hands it to the session's
//! `Transport`, and classifies the response into a decoded value or a
//! `RouteError`.
//!
//! # Design
//! - Building (`client::build_request`) and classification
//!   (`client::classify`) are pure functions; the executor is the only place
//!   that awaits I/O.
//! - Two execution modes share that pipeline: callback (`Route::request`)
//!   and async (`Route::fetch`).
//! - Parameter values are a closed type (`ParamValue`) so encoding is total.
//! - `UreqTransport` is the default transport; tests substitute their own.

pub mod client;
pub mod encoding;
pub mod error;
pub mod executor;
pub mod http;
pub mod route;
pub mod transport;
pub mod types;

pub use error::{RouteError, RouteResult, TransportError};
pub use executor::RequestHandle;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use route::{Route, Session};
pub use transport::{Transport, TransportOutcome, UreqTransport};
pub use types::{ParamValue, ParameterSpec, Parameters, ResponseDataType};
