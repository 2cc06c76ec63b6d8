//! Request building and response classification.
//!
//! # Design
//! Both halves are pure functions. `build_request` turns a route and a base
//! URL into an `HttpRequest`; `classify` turns a transport outcome into a
//! decoded value or a `RouteError`. The executor's callback and async modes
//! call exactly these two functions, so their check ordering cannot drift
//! apart.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::encoding::{encode, Encoded};
use crate::error::{RouteError, RouteResult};
use crate::http::HttpRequest;
use crate::route::Route;
use crate::transport::TransportOutcome;
use crate::types::ResponseDataType;

/// Builds the concrete request for `route` against `base_url`.
///
/// The base URL is validated before anything else, then the route path is
/// appended as path components and the parameters are encoded.
pub fn build_request<R>(base_url: &str, route: &R) -> Result<HttpRequest, RouteError>
where
    R: Route + ?Sized,
{
    let base = parse_base_url(base_url)?;
    let url = append_path(base, &route.path());
    let Encoded { url, body } = encode(url, &route.parameter())?;

    Ok(HttpRequest {
        method: route.method(),
        url: url.into(),
        headers: route.headers(),
        body,
    })
}

fn parse_base_url(base_url: &str) -> Result<Url, RouteError> {
    let invalid = || RouteError::BaseUrlInvalid {
        base_url: base_url.to_string(),
    };
    let url = Url::parse(base_url).map_err(|_| invalid())?;
    if url.cannot_be_a_base() {
        return Err(invalid());
    }
    Ok(url)
}

/// Appends `path` below the base path, the way a file system path component
/// is appended: `https://h/v1` + `users` is `https://h/v1/users`. An empty
/// path leaves the base untouched.
fn append_path(mut url: Url, path: &str) -> Url {
    if path.is_empty() {
        return url;
    }
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
        if path.ends_with('/') {
            segments.push("");
        }
    }
    url
}

/// Maps a transport outcome to the caller's result.
///
/// Checks run in a fixed order and the first failing one wins: transport
/// error, missing response, status outside 200..=299, missing payload, and
/// finally decoding according to `data_type`.
pub fn classify<T>(outcome: TransportOutcome, data_type: ResponseDataType) -> RouteResult<T>
where
    T: DeserializeOwned,
{
    let response = match outcome {
        Err(err) => {
            warn!(error = %err, "transport reported an error");
            return Err(RouteError::Request(err));
        }
        Ok(None) => return Err(RouteError::ResponseFailed),
        Ok(Some(response)) => response,
    };

    if !response.is_success() {
        warn!(status = response.status, "HTTP status outside the success range");
        return Err(RouteError::HttpStatusCodeInvalid {
            status: response.status,
        });
    }

    let data = match response.body {
        Some(data) if !data.is_empty() => data,
        _ => return Err(RouteError::NoResponseData),
    };

    match data_type {
        ResponseDataType::Json => match serde_json::from_slice(&data) {
            Ok(value) => Ok(value),
            Err(source) => Err(RouteError::DecodingJsonData { data, source }),
        },
        ResponseDataType::Text => {
            debug!(len = data.len(), "response body is plain text");
            Err(RouteError::NotImplemented(ResponseDataType::Text))
        }
        ResponseDataType::Xml => {
            warn!(len = data.len(), "XML response decoding is not supported");
            Err(RouteError::NotImplemented(ResponseDataType::Xml))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use tracing_test::traced_test;

    use super::*;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpResponse};
    use crate::types::{ParameterSpec, Parameters};

    struct TestRoute {
        path: &'static str,
        method: HttpMethod,
        headers: Vec<(String, String)>,
        parameter: ParameterSpec,
    }

    impl TestRoute {
        fn get(path: &'static str) -> Self {
            Self {
                path,
                method: HttpMethod::Get,
                headers: Vec::new(),
                parameter: ParameterSpec::None,
            }
        }
    }

    impl Route for TestRoute {
        fn path(&self) -> String {
            self.path.to_string()
        }

        fn method(&self) -> HttpMethod {
            self.method
        }

        fn headers(&self) -> Vec<(String, String)> {
            self.headers.clone()
        }

        fn parameter(&self) -> ParameterSpec {
            self.parameter.clone()
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Token {
        token: String,
    }

    fn ok(status: u16, body: &str) -> TransportOutcome {
        Ok(Some(HttpResponse {
            status,
            headers: Vec::new(),
            body: Some(body.as_bytes().to_vec()),
        }))
    }

    #[test]
    fn build_without_parameters_joins_base_and_path() {
        let req = build_request("https://reqres.in/", &TestRoute::get("api/users/2")).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://reqres.in/api/users/2");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn path_is_appended_below_base_path() {
        let route = TestRoute::get("users");
        assert_eq!(
            build_request("https://api.example.com/v1", &route).unwrap().url,
            "https://api.example.com/v1/users"
        );
        assert_eq!(
            build_request("https://api.example.com/v1/", &route).unwrap().url,
            "https://api.example.com/v1/users"
        );
        let leading = TestRoute::get("/users/");
        assert_eq!(
            build_request("https://api.example.com/v1", &leading).unwrap().url,
            "https://api.example.com/v1/users/"
        );
    }

    #[test]
    fn empty_path_keeps_base_as_is() {
        let route = TestRoute::get("");
        assert_eq!(
            build_request("https://api.example.com/v1/", &route).unwrap().url,
            "https://api.example.com/v1/"
        );
        assert_eq!(
            build_request("https://api.example.com/v1", &route).unwrap().url,
            "https://api.example.com/v1"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = build_request("not a url", &TestRoute::get("api")).unwrap_err();
        assert!(matches!(err, RouteError::BaseUrlInvalid { ref base_url } if base_url == "not a url"));

        let err = build_request("mailto:eve@reqres.in", &TestRoute::get("api")).unwrap_err();
        assert!(matches!(err, RouteError::BaseUrlInvalid { .. }));
    }

    #[test]
    fn base_url_is_checked_before_parameters() {
        let route = TestRoute {
            parameter: ParameterSpec::PostJson(Parameters::new().with("x", f64::NAN)),
            ..TestRoute::get("api")
        };
        let err = build_request("::", &route).unwrap_err();
        assert!(matches!(err, RouteError::BaseUrlInvalid { .. }));
    }

    #[test]
    fn headers_are_added_not_replaced() {
        let route = TestRoute {
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "text/plain".to_string()),
            ],
            ..TestRoute::get("api")
        };
        let req = build_request("https://reqres.in", &route).unwrap();
        assert_eq!(req.headers.len(), 2);
        assert_eq!(req.header("accept"), Some("application/json"));
    }

    #[test]
    fn url_encoding_lands_in_query() {
        let route = TestRoute {
            parameter: ParameterSpec::UrlEncoding(Parameters::new().with("page", 2)),
            ..TestRoute::get("api/users")
        };
        let req = build_request("https://reqres.in/", &route).unwrap();
        assert_eq!(req.url, "https://reqres.in/api/users?page=2");
        assert!(req.body.is_none());
    }

    #[test]
    fn post_json_lands_in_body() {
        let route = TestRoute {
            method: HttpMethod::Post,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            parameter: ParameterSpec::PostJson(
                Parameters::new()
                    .with("email", "eve.holt@reqres.in")
                    .with("password", "cityslicka"),
            ),
            ..TestRoute::get("api/login")
        };
        let req = build_request("https://reqres.in/", &route).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://reqres.in/api/login");
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["email"], "eve.holt@reqres.in");
        assert_eq!(body["password"], "cityslicka");
    }

    #[test]
    fn classify_success_decodes_json() {
        let token: Token = classify(ok(200, r#"{"token":"abc"}"#), ResponseDataType::Json).unwrap();
        assert_eq!(token, Token { token: "abc".to_string() });
    }

    #[test]
    fn classify_transport_error_wins() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = classify::<Token>(Err(TransportError::Io(io)), ResponseDataType::Json).unwrap_err();
        assert!(matches!(err, RouteError::Request(TransportError::Io(_))));
    }

    #[test]
    fn classify_missing_response() {
        let err = classify::<Token>(Ok(None), ResponseDataType::Json).unwrap_err();
        assert!(matches!(err, RouteError::ResponseFailed));
    }

    #[test]
    #[traced_test]
    fn classify_bad_status_ignores_payload() {
        for status in [100, 199, 301, 404, 500] {
            let err = classify::<Token>(ok(status, r#"{"token":"abc"}"#), ResponseDataType::Json)
                .unwrap_err();
            assert_eq!(err.status(), Some(status));
        }
        assert!(logs_contain("status=404"));
    }

    #[test]
    fn classify_empty_or_missing_payload() {
        let err = classify::<Token>(ok(204, ""), ResponseDataType::Json).unwrap_err();
        assert!(matches!(err, RouteError::NoResponseData));

        let outcome = Ok(Some(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: None,
        }));
        let err = classify::<Token>(outcome, ResponseDataType::Json).unwrap_err();
        assert!(matches!(err, RouteError::NoResponseData));
    }

    #[test]
    fn classify_decode_failure_keeps_payload() {
        let err = classify::<Token>(ok(200, r#"{"id":1}"#), ResponseDataType::Json).unwrap_err();
        match err {
            RouteError::DecodingJsonData { data, .. } => assert_eq!(data, br#"{"id":1}"#),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn classify_text_and_xml_are_not_implemented() {
        let err = classify::<Token>(ok(200, "hello"), ResponseDataType::Text).unwrap_err();
        assert!(matches!(err, RouteError::NotImplemented(ResponseDataType::Text)));

        let err = classify::<Token>(ok(200, "<a/>"), ResponseDataType::Xml).unwrap_err();
        assert!(matches!(err, RouteError::NotImplemented(ResponseDataType::Xml)));
    }
}
