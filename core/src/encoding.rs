//! Parameter encoding: turns a `ParameterSpec` into a query string or a body.

use tracing::warn;
use url::Url;

use crate::error::RouteError;
use crate::types::{ParameterSpec, Parameters};

/// Output of [`encode`]: the (possibly extended) URL and an optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub url: Url,
    pub body: Option<Vec<u8>>,
}

/// Applies `parameter` to `url`.
///
/// Query values use the `Display` form of each value and rely on the URL
/// builder's own escaping. `PostXml` is accepted but produces no body.
pub fn encode(url: Url, parameter: &ParameterSpec) -> Result<Encoded, RouteError> {
    match parameter {
        ParameterSpec::None => Ok(Encoded { url, body: None }),
        ParameterSpec::UrlEncoding(params) => Ok(Encoded {
            url: encode_query(url, params)?,
            body: None,
        }),
        ParameterSpec::PostJson(params) => {
            let body = serde_json::to_vec(params).map_err(|source| RouteError::ParametersEncoding {
                parameters: params.clone(),
                source,
            })?;
            Ok(Encoded {
                url,
                body: Some(body),
            })
        }
        ParameterSpec::PostXml(params) => {
            warn!(parameters = ?params, "XML parameter encoding is not supported, sending without a body");
            Ok(Encoded { url, body: None })
        }
    }
}

fn encode_query(mut url: Url, params: &Parameters) -> Result<Url, RouteError> {
    // query_pairs_mut() on a URL without a query leaves a dangling '?'.
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params.iter() {
            pairs.append_pair(key, &value.to_string());
        }
    }
    Url::parse(url.as_str()).map_err(|_| RouteError::UrlEncoding)
}
