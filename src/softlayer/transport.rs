//! Transport boundary between the SoftLayer client and the REST API.
//!
//! The client only ever sees [`Transport::call`], which returns either a
//! decoded JSON value or a [`TransportError`]. Provider-reported failures are
//! surfaced as [`TransportError::Provider`] so callers can tell them apart from
//! network or decoding problems.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Default SoftLayer REST endpoint.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.softlayer.com/rest/v3";

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP verbs used by the SoftLayer REST API.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    /// Read-only lookups.
    Get,
    /// Object creation and service calls.
    Post,
    /// Object deletion.
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        };
        formatter.write_str(verb)
    }
}

/// Errors raised while talking to the API.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TransportError {
    /// The request could not be sent or the server answered with a failure
    /// status and no error payload.
    #[error("request to {path} failed: {message}")]
    Http {
        /// API path that was requested.
        path: String,
        /// Description of the failure.
        message: String,
    },
    /// SoftLayer reported an error in the response payload.
    #[error("SoftLayer API error ({}): {message}", .code.as_deref().unwrap_or("unknown"))]
    Provider {
        /// Exception class reported by SoftLayer, when present.
        code: Option<String>,
        /// Error message reported by SoftLayer.
        message: String,
    },
    /// The response body was not valid JSON.
    #[error("failed to decode response from {path}: {message}")]
    Decode {
        /// API path that was requested.
        path: String,
        /// Decoder error message.
        message: String,
        /// Raw response body.
        body: String,
    },
}

/// Future returned by [`Transport::call`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Value, TransportError>> + Send + 'a>>;

/// Minimal request/response interface the SoftLayer client is built on.
pub trait Transport: Send + Sync {
    /// Issues `method` against `path` (relative to the API endpoint) with an
    /// optional JSON body.
    fn call<'a>(&'a self, path: &'a str, method: Method, body: Option<Value>)
    -> TransportFuture<'a>;
}

/// Transport backed by `reqwest` and HTTP basic authentication.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
    username: String,
    api_key: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Creates a transport for `endpoint` authenticating as `username`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] when the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let base = endpoint.into().trim_end_matches('/').to_owned();
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| TransportError::Http {
                path: base.clone(),
                message: err.to_string(),
            })?;
        Ok(Self {
            http,
            endpoint: base,
            username: username.into(),
            api_key: api_key.into(),
        })
    }

    async fn send(
        &self,
        path: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let url = format!("{}/{}", self.endpoint, path.trim_start_matches('/'));
        debug!(%method, %url, "sending SoftLayer request");

        let authed = match method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
            Method::Delete => self.http.delete(&url),
        }
        .basic_auth(&self.username, Some(&self.api_key));
        let request = match body {
            Some(payload) => authed.json(&payload),
            None => authed,
        };

        let response = request.send().await.map_err(|err| TransportError::Http {
            path: path.to_owned(),
            message: err.to_string(),
        })?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|err| TransportError::Http {
            path: path.to_owned(),
            message: err.to_string(),
        })?;
        debug!(%status, body = %String::from_utf8_lossy(&bytes), "received SoftLayer response");

        decode_response(path, status, &bytes)
    }
}

impl Transport for HttpTransport {
    fn call<'a>(
        &'a self,
        path: &'a str,
        method: Method,
        body: Option<Value>,
    ) -> TransportFuture<'a> {
        Box::pin(self.send(path, method, body))
    }
}

/// Classifies a raw HTTP reply into a JSON value or a transport error.
pub(crate) fn decode_response(
    path: &str,
    status: StatusCode,
    body: &[u8],
) -> Result<Value, TransportError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        if status.is_success() {
            return Ok(Value::Null);
        }
        return Err(TransportError::Http {
            path: path.to_owned(),
            message: format!("server answered {status} with an empty body"),
        });
    }

    let value: Value = serde_json::from_slice(body).map_err(|err| TransportError::Decode {
        path: path.to_owned(),
        message: err.to_string(),
        body: String::from_utf8_lossy(body).into_owned(),
    })?;

    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(TransportError::Provider {
            code: value.get("code").and_then(Value::as_str).map(str::to_owned),
            message: message.to_owned(),
        });
    }

    if !status.is_success() {
        return Err(TransportError::Http {
            path: path.to_owned(),
            message: format!("server answered {status}: {value}"),
        });
    }

    Ok(value)
}
