//! Closed failure taxonomy for the API client.
//!
//! # Design
//! Every way a remote call can go wrong lands in exactly one `ApiProblem`
//! variant, and the client returns problems as values — nothing is thrown
//! past this boundary. Transport signals map to `Timeout` / `CannotConnect`,
//! HTTP statuses to the middle variants, and a 2xx body that does not fit
//! the expected shape becomes `BadData`. Anything unclassified is `Unknown`
//! so callers never see a raw transport or serde fault.

use crate::http::{HttpResponse, TransportError};

/// A classified request failure returned by `ApiClient` operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiProblem {
    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The server could not be reached at all.
    #[error("cannot connect to the server")]
    CannotConnect,

    /// The server returned a 5xx status.
    #[error("server error (HTTP {status})")]
    Server { status: u16 },

    /// HTTP 401 — the session token is missing, expired, or invalid.
    #[error("unauthorized")]
    Unauthorized,

    /// HTTP 403 — the session is valid but may not do this.
    #[error("forbidden")]
    Forbidden,

    /// HTTP 404 — the resource does not exist.
    #[error("not found")]
    NotFound,

    /// Any other 4xx — the server understood and refused the request.
    #[error("request rejected (HTTP {status})")]
    Rejected { status: u16 },

    /// A 2xx response whose body did not match the expected shape.
    #[error("response payload did not match the expected shape")]
    BadData,

    /// Anything that fits none of the above.
    #[error("unknown failure")]
    Unknown,
}

impl ApiProblem {
    /// Classify a transport-level failure.
    pub(crate) fn from_transport(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => ApiProblem::Timeout,
            TransportError::CannotConnect(_) => ApiProblem::CannotConnect,
            TransportError::Other(_) => ApiProblem::Unknown,
        }
    }

    /// Classify a non-2xx HTTP response.
    ///
    /// Returns `None` for 2xx statuses, which are not problems.
    pub(crate) fn from_status(response: &HttpResponse) -> Option<Self> {
        match response.status {
            200..=299 => None,
            401 => Some(ApiProblem::Unauthorized),
            403 => Some(ApiProblem::Forbidden),
            404 => Some(ApiProblem::NotFound),
            500..=599 => Some(ApiProblem::Server { status: response.status }),
            400..=499 => Some(ApiProblem::Rejected { status: response.status }),
            _ => Some(ApiProblem::Unknown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    #[test]
    fn success_statuses_are_not_problems() {
        assert_eq!(ApiProblem::from_status(&response(200)), None);
        assert_eq!(ApiProblem::from_status(&response(201)), None);
        assert_eq!(ApiProblem::from_status(&response(204)), None);
    }

    #[test]
    fn auth_statuses_get_dedicated_variants() {
        assert_eq!(ApiProblem::from_status(&response(401)), Some(ApiProblem::Unauthorized));
        assert_eq!(ApiProblem::from_status(&response(403)), Some(ApiProblem::Forbidden));
        assert_eq!(ApiProblem::from_status(&response(404)), Some(ApiProblem::NotFound));
    }

    #[test]
    fn server_errors_keep_their_status() {
        assert_eq!(
            ApiProblem::from_status(&response(503)),
            Some(ApiProblem::Server { status: 503 })
        );
    }

    #[test]
    fn other_client_errors_are_rejections() {
        assert_eq!(
            ApiProblem::from_status(&response(422)),
            Some(ApiProblem::Rejected { status: 422 })
        );
    }

    #[test]
    fn redirects_are_unknown() {
        assert_eq!(ApiProblem::from_status(&response(301)), Some(ApiProblem::Unknown));
    }

    #[test]
    fn transport_failures_classify() {
        assert_eq!(
            ApiProblem::from_transport(TransportError::Timeout),
            ApiProblem::Timeout
        );
        assert_eq!(
            ApiProblem::from_transport(TransportError::CannotConnect("refused".into())),
            ApiProblem::CannotConnect
        );
        assert_eq!(
            ApiProblem::from_transport(TransportError::Other("tls".into())),
            ApiProblem::Unknown
        );
    }
}
