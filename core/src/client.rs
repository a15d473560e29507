//! API client: builds requests, classifies outcomes, normalizes payloads.
//!
//! # Design
//! `ApiClient` owns no session state. It holds the base URL plus two
//! collaborators: the `HttpTransport` that executes requests and the
//! `TokenStorage` the bearer token is read from. The token is read from
//! storage immediately before every dispatch rather than cached, so a token
//! saved moments ago by a sign-in is always the one attached.
//!
//! Every operation follows the same contract: classify the transport/HTTP
//! outcome first and return the problem untouched; only a 2xx response gets
//! a normalization attempt, and a body that does not fit the expected shape
//! becomes `ApiProblem::BadData` rather than a raw serde fault.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ApiProblem;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::storage::{TokenStorage, TOKEN_KEY};
use crate::types::{Location, User};

/// Asynchronous client for the placerate API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    storage: Arc<dyn TokenStorage>,
}

#[derive(Serialize)]
struct SignInBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    password_confirmation: &'a str,
}

#[derive(Serialize)]
struct UpdateUserBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    new_password: &'a str,
}

#[derive(Deserialize)]
struct TokenEnvelope {
    token: String,
}

#[derive(Deserialize)]
struct LocationsEnvelope {
    locations: Vec<Location>,
}

/// Wire shape of the user endpoints, which put the username under `name`.
#[derive(Deserialize)]
struct ProfilePayload {
    id: i64,
    name: String,
    email: String,
}

impl From<ProfilePayload> for User {
    fn from(raw: ProfilePayload) -> Self {
        User {
            id: raw.id,
            username: raw.name,
            email: raw.email,
        }
    }
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
        storage: Arc<dyn TokenStorage>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            storage,
        }
    }

    /// Exchange credentials for a session token.
    ///
    /// Persisting the token is the store's responsibility, not this
    /// client's.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String, ApiProblem> {
        let body = to_body(&SignInBody { email, password })?;
        let response = self.dispatch(HttpMethod::Post, "/sign_in", Some(body)).await?;
        let envelope: TokenEnvelope = parse_body(&response)?;
        Ok(envelope.token)
    }

    /// Create an account.
    pub async fn sign_up(
        &self,
        username: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<User, ApiProblem> {
        let body = to_body(&SignUpBody {
            username,
            email,
            password,
            password_confirmation,
        })?;
        let response = self.dispatch(HttpMethod::Post, "/sign_up", Some(body)).await?;
        parse_body(&response)
    }

    /// Fetch a single user by id.
    pub async fn get_user(&self, id: i64) -> Result<User, ApiProblem> {
        let path = format!("/api/v1/users/{id}");
        let response = self.dispatch(HttpMethod::Get, &path, None).await?;
        let profile: ProfilePayload = parse_body(&response)?;
        Ok(profile.into())
    }

    /// Update a user's profile, authorizing the change with the current
    /// password.
    pub async fn update_user(
        &self,
        id: i64,
        username: &str,
        email: &str,
        password: &str,
        new_password: &str,
    ) -> Result<User, ApiProblem> {
        let body = to_body(&UpdateUserBody {
            username,
            email,
            password,
            new_password,
        })?;
        let path = format!("/api/v1/users/{id}");
        let response = self.dispatch(HttpMethod::Put, &path, Some(body)).await?;
        let profile: ProfilePayload = parse_body(&response)?;
        Ok(profile.into())
    }

    /// Fetch one location with its embedded user and ratings.
    pub async fn get_location(&self, id: i64) -> Result<Location, ApiProblem> {
        let path = format!("/api/v1/locations/{id}");
        let response = self.dispatch(HttpMethod::Get, &path, None).await?;
        parse_body(&response)
    }

    /// Fetch all locations (embedded user, no ratings).
    pub async fn get_locations(&self) -> Result<Vec<Location>, ApiProblem> {
        let response = self.dispatch(HttpMethod::Get, "/api/v1/locations", None).await?;
        let envelope: LocationsEnvelope = parse_body(&response)?;
        Ok(envelope.locations)
    }

    /// Build headers, attach the bearer token if one is stored, execute the
    /// request, and classify the outcome. Callers receive only 2xx
    /// responses.
    async fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> Result<HttpResponse, ApiProblem> {
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = self.storage.load_string(TOKEN_KEY).await {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }

        let request = HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers,
            body,
        };

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(ApiProblem::from_transport)?;
        if let Some(problem) = ApiProblem::from_status(&response) {
            return Err(problem);
        }
        Ok(response)
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<String, ApiProblem> {
    // Request bodies are plain structs of strings; failure here means a bug,
    // but it still surfaces as a classified problem rather than a panic.
    serde_json::to_string(value).map_err(|_| ApiProblem::Unknown)
}

fn parse_body<T: for<'de> Deserialize<'de>>(response: &HttpResponse) -> Result<T, ApiProblem> {
    serde_json::from_str(&response.body).map_err(|err| {
        tracing::debug!(status = response.status, error = %err, "payload failed normalization");
        ApiProblem::BadData
    })
}
