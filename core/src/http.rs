//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The core builds `HttpRequest`
//! values and interprets `HttpResponse` values; the host supplies a
//! `Transport` that performs the actual round-trip (ureq in the integration
//! tests). TLS, connection reuse, timeouts, and retries all belong to the
//! transport, which keeps the core deterministic and easy to test.
//!
//! Query parameters are kept as an ordered pair list and encoded with
//! `encode_params`: the save endpoint reads its parameters positionally and
//! does not tolerate reordering.

use crate::error::Error;

/// HTTP method for a request. The service only ever needs these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data. The full URL already carries
/// the encoded query string; POST bodies are always empty because the
/// service reads save parameters from the query.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// An HTTP response described as plain data, produced by a `Transport`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup; first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Executes HTTP round-trips on behalf of the core.
pub trait Transport {
    fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, Error>;
}

/// Form-encode `params` preserving pair order.
pub fn encode_params(params: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
