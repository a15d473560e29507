//! Local data layer for the placerate mobile client.
//!
//! # Overview
//! Holds the authenticated session and a small cached domain graph (users,
//! locations, ratings) fetched from the remote service, and exposes async
//! operations that mutate that graph while keeping it consistent. Two parts
//! carry the real invariants: `ApiClient`, which classifies every request
//! failure into a closed taxonomy and normalizes wire payloads into domain
//! shapes, and `Store`, which owns the session graph and mediates all
//! mutation through explicit, observer-notifying operations.
//!
//! # Design
//! - I/O lives behind traits: `HttpTransport` executes requests, and
//!   `TokenStorage` persists the session token. The crate itself never
//!   opens a socket or touches a disk, so the whole layer runs under test
//!   with in-memory collaborators.
//! - Failures are values: `ApiProblem` is returned, never thrown past the
//!   client boundary.
//! - All state transitions happen on one logical task; `Store` methods take
//!   `&mut self`, so flows cannot interleave mid-mutation.

pub mod client;
pub mod error;
pub mod http;
pub mod storage;
pub mod store;
pub mod token;
pub mod types;

pub use client::ApiClient;
pub use error::ApiProblem;
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};
pub use storage::{MemoryStorage, TokenStorage, TOKEN_KEY};
pub use store::Store;
pub use token::{decode_session_claims, SessionClaims, TokenError};
pub use types::{Location, Rating, User};
