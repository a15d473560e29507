//! Unverified decoding of the session token's claims.
//!
//! # Design
//! The token is a compact JWT minted by the same backend this client signs
//! in against, so the store treats it as trusted and only needs the claims
//! out of the payload segment — no signature verification happens here (and
//! none is in scope). Decoding is strictly structural: split on `.`,
//! base64url-decode the middle segment, parse the JSON. Every way that can
//! fail gets its own `TokenError` variant so callers can log something
//! useful, but they all collapse to "no session" at the store.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

/// Claims carried by a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SessionClaims {
    /// Id of the authenticated user.
    pub uid: i64,
    /// Unix timestamp at which the token was issued.
    pub iat: i64,
}

/// Ways a stored token can fail structural decoding.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token does not have the three-segment `header.payload.signature` form.
    #[error("token is not in compact JWT form")]
    MalformedToken,

    /// The payload segment is not valid base64url.
    #[error("token payload is not valid base64url: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    /// The decoded payload is not the expected claims JSON.
    #[error("token claims are not valid JSON: {0}")]
    InvalidClaims(#[from] serde_json::Error),
}

/// Decode the claims out of a compact JWT without verifying its signature.
pub fn decode_session_claims(token: &str) -> Result<SessionClaims, TokenError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(TokenError::MalformedToken),
    };
    let decoded = URL_SAFE_NO_PAD.decode(payload)?;
    let claims = serde_json::from_slice(&decoded)?;
    Ok(claims)
}
