//! In-memory implementation of the placerate API for tests and local runs.
//!
//! Mirrors the real backend's surface: `/sign_in` and `/sign_up` are open,
//! everything under `/api/v1` requires a bearer token. Tokens are unsigned
//! compact JWTs (`{"alg":"none"}`) carrying `{uid, iat}` claims — enough for
//! the client's unverified decode. Types here are defined independently from
//! the core crate on purpose; the integration tests catch schema drift.
//!
//! Wire quirk kept from the real backend: the user endpoints return the
//! username under the `name` key, while `/sign_up` uses `username`.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Clone, Debug)]
pub struct Account {
    pub user: User,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Rating {
    pub id: Uuid,
    pub rating: f64,
    pub comment: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Location {
    pub id: i64,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub street: String,
    pub street_number: String,
    pub complement: String,
    pub district: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zipcode: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Vec<Rating>>,
}

#[derive(Debug, Default)]
pub struct Db {
    pub accounts: HashMap<i64, Account>,
    pub locations: Vec<Location>,
    pub next_user_id: i64,
}

pub type SharedDb = Arc<RwLock<Db>>;

#[derive(Deserialize)]
struct SignInBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct SignUpBody {
    username: String,
    email: String,
    password: String,
    password_confirmation: String,
}

#[derive(Deserialize)]
struct UpdateUserBody {
    username: String,
    email: String,
    password: String,
    new_password: String,
}

/// Mint an unsigned compact JWT with `{uid, iat}` claims.
pub fn mint_token(uid: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(
        serde_json::json!({ "uid": uid, "iat": Utc::now().timestamp() }).to_string(),
    );
    format!("{header}.{claims}.")
}

/// Extract the uid from a `Bearer` authorization header, if the token parses.
fn bearer_uid(headers: &HeaderMap) -> Option<i64> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    claims["uid"].as_i64()
}

/// Reject requests whose bearer token is missing or names an unknown user.
async fn authenticate(headers: &HeaderMap, db: &SharedDb) -> Result<i64, StatusCode> {
    let uid = bearer_uid(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    if db.read().await.accounts.contains_key(&uid) {
        Ok(uid)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// User endpoints put the username under `name`.
fn profile_json(user: &User) -> serde_json::Value {
    serde_json::json!({ "id": user.id, "name": user.username, "email": user.email })
}

pub fn app(db: SharedDb) -> Router {
    Router::new()
        .route("/sign_in", post(sign_in))
        .route("/sign_up", post(sign_up))
        .route("/api/v1/users/{id}", get(get_user).put(update_user))
        .route("/api/v1/locations", get(list_locations))
        .route("/api/v1/locations/{id}", get(get_location))
        .with_state(db)
}

/// Fixture data the server starts with: one account and two locations, one
/// of them already rated.
pub fn seeded_db() -> SharedDb {
    let ada = User {
        id: 1,
        username: "ada".to_string(),
        email: "ada@example.com".to_string(),
    };
    let created = Utc.with_ymd_and_hms(2020, 5, 4, 10, 0, 0).unwrap();

    let mut accounts = HashMap::new();
    accounts.insert(
        ada.id,
        Account {
            user: ada.clone(),
            password: "lovelace".to_string(),
        },
    );

    let locations = vec![
        Location {
            id: 1,
            lat: -23.561,
            lng: -46.655,
            name: "Praça do Ciclista".to_string(),
            street: "Avenida Paulista".to_string(),
            street_number: "2439".to_string(),
            complement: String::new(),
            district: "Consolação".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            country: "BR".to_string(),
            zipcode: "01311-300".to_string(),
            created_at: created,
            updated_at: created,
            user: ada.clone(),
            ratings: Some(vec![
                Rating {
                    id: Uuid::new_v4(),
                    rating: 4.0,
                    comment: "boa vista".to_string(),
                },
                Rating {
                    id: Uuid::new_v4(),
                    rating: 5.0,
                    comment: String::new(),
                },
            ]),
        },
        Location {
            id: 2,
            lat: -22.951,
            lng: -43.210,
            name: "Mirante Dona Marta".to_string(),
            street: "Estrada do Mirante".to_string(),
            street_number: "10".to_string(),
            complement: "portão 2".to_string(),
            district: "Santa Teresa".to_string(),
            city: "Rio de Janeiro".to_string(),
            state: "RJ".to_string(),
            country: "BR".to_string(),
            zipcode: "22241-330".to_string(),
            created_at: created,
            updated_at: created,
            user: ada,
            ratings: Some(Vec::new()),
        },
    ];

    Arc::new(RwLock::new(Db {
        accounts,
        locations,
        next_user_id: 2,
    }))
}

pub async fn run(listener: TcpListener, db: SharedDb) -> Result<(), std::io::Error> {
    axum::serve(listener, app(db)).await
}

async fn sign_in(
    State(db): State<SharedDb>,
    Json(body): Json<SignInBody>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let db = db.read().await;
    let account = db
        .accounts
        .values()
        .find(|account| account.user.email == body.email && account.password == body.password)
        .ok_or(StatusCode::UNAUTHORIZED)?;
    Ok(Json(serde_json::json!({ "token": mint_token(account.user.id) })))
}

async fn sign_up(
    State(db): State<SharedDb>,
    Json(body): Json<SignUpBody>,
) -> Result<Json<User>, StatusCode> {
    if body.password != body.password_confirmation {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let mut db = db.write().await;
    if db.accounts.values().any(|account| account.user.email == body.email) {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let id = db.next_user_id;
    db.next_user_id += 1;
    let user = User {
        id,
        username: body.username,
        email: body.email,
    };
    db.accounts.insert(
        id,
        Account {
            user: user.clone(),
            password: body.password,
        },
    );
    Ok(Json(user))
}

async fn get_user(
    State(db): State<SharedDb>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, StatusCode> {
    authenticate(&headers, &db).await?;
    let db = db.read().await;
    let account = db.accounts.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(profile_json(&account.user)))
}

async fn update_user(
    State(db): State<SharedDb>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<UpdateUserBody>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    authenticate(&headers, &db).await?;
    let mut db = db.write().await;
    let account = db.accounts.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if account.password != body.password {
        return Err(StatusCode::FORBIDDEN);
    }
    account.user.username = body.username;
    account.user.email = body.email;
    if !body.new_password.is_empty() {
        account.password = body.new_password;
    }
    Ok(Json(profile_json(&account.user)))
}

async fn list_locations(
    State(db): State<SharedDb>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, StatusCode> {
    authenticate(&headers, &db).await?;
    let db = db.read().await;
    // The list endpoint omits ratings.
    let locations: Vec<Location> = db
        .locations
        .iter()
        .cloned()
        .map(|mut location| {
            location.ratings = None;
            location
        })
        .collect();
    Ok(Json(serde_json::json!({ "locations": locations })))
}

async fn get_location(
    State(db): State<SharedDb>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Location>, StatusCode> {
    authenticate(&headers, &db).await?;
    let db = db.read().await;
    db.locations
        .iter()
        .find(|location| location.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
