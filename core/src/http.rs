//! HTTP transport boundary for the data layer.
//!
//! # Design
//! `HttpRequest` and `HttpResponse` describe traffic as plain data; the
//! `HttpTransport` trait is the seam where the host plugs in a real HTTP
//! stack. The core never opens a socket itself — it builds requests, hands
//! them to the transport, and interprets whatever comes back. This keeps the
//! client deterministic under test (a canned-response transport is a few
//! lines) while production hosts wrap reqwest, a platform HTTP API, or
//! anything else that can satisfy the trait.
//!
//! Transport failures are deliberately coarse: the client only needs to
//! distinguish "took too long" from "never reached the server" from
//! "something else" to classify them (see `error`).

use async_trait::async_trait;

/// HTTP method for a request. Only the methods the remote API uses exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

/// An HTTP request described as plain data.
///
/// Built by `ApiClient` and executed by the host's `HttpTransport`
/// implementation.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `HttpRequest`; the
/// client classifies the status and parses the body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Failure modes a transport can report before any HTTP status exists.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete within the transport's deadline.
    #[error("request timed out")]
    Timeout,

    /// A connection to the server could not be established.
    #[error("cannot connect: {0}")]
    CannotConnect(String),

    /// Any other transport-level fault (TLS, protocol, interrupted body).
    #[error("transport failure: {0}")]
    Other(String),
}

/// Executes `HttpRequest` values against the network.
///
/// Implementations must return 4xx/5xx responses as `Ok` — status
/// interpretation belongs to the client, not the transport.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
