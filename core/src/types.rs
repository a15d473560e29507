//! Canonical domain model: users, locations, and their ratings.
//!
//! # Design
//! These structs double as the wire schema for the location endpoints: the
//! remote API speaks snake_case JSON, which is exactly what serde derives
//! here, so normalization is lossless by construction and a malformed
//! payload surfaces as a serde error for the client to classify. Fields the
//! API may omit (`complement`, `ratings`) carry serde defaults instead of
//! `Option` — the domain treats "absent" and "empty" identically.
//!
//! `Location` owns its ratings outright; a `Rating` never exists outside
//! its location's sequence, and `rate` is the only mutation path.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Latency simulated by [`Location::rate`] before the rating commits.
const RATE_LATENCY: Duration = Duration::from_millis(750);

/// An account profile. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// A single rating attached to a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
}

/// A rated place, with its owning user embedded and ratings in insertion
/// order. The list endpoint omits `ratings`; the detail endpoint includes
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub street: String,
    pub street_number: String,
    #[serde(default)]
    pub complement: String,
    pub district: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zipcode: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: User,
    #[serde(default)]
    pub ratings: Vec<Rating>,
}

impl Location {
    /// Arithmetic mean of this location's ratings, or 0 when there are none.
    pub fn avg_rating(&self) -> f64 {
        if self.ratings.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.ratings.iter().map(|r| r.rating).sum();
        sum / self.ratings.len() as f64
    }

    /// Append a new rating by `user_id` after a simulated network delay.
    ///
    /// Fire-and-forget: the caller gets no failure signal. A commit that
    /// goes wrong is logged, never surfaced.
    pub async fn rate(&mut self, user_id: i64, rating: f64, comment: &str) {
        tokio::time::sleep(RATE_LATENCY).await;
        let entry = Rating {
            id: Uuid::new_v4(),
            rating,
            comment: comment.to_string(),
        };
        tracing::debug!(location = self.id, user = user_id, rating, "rating committed");
        self.ratings.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(ratings: Vec<Rating>) -> Location {
        Location {
            id: 1,
            lat: -23.55,
            lng: -46.63,
            name: "Central Park".to_string(),
            street: "Fifth Avenue".to_string(),
            street_number: "10".to_string(),
            complement: String::new(),
            district: "Midtown".to_string(),
            city: "New York".to_string(),
            state: "NY".to_string(),
            country: "US".to_string(),
            zipcode: "10001".to_string(),
            created_at: "2020-05-04T10:00:00Z".parse().unwrap(),
            updated_at: "2020-05-04T10:00:00Z".parse().unwrap(),
            user: User {
                id: 7,
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
            },
            ratings,
        }
    }

    fn rating(value: f64) -> Rating {
        Rating {
            id: Uuid::new_v4(),
            rating: value,
            comment: String::new(),
        }
    }

    #[test]
    fn avg_rating_is_zero_when_empty() {
        assert_eq!(location(Vec::new()).avg_rating(), 0.0);
    }

    #[test]
    fn avg_rating_is_the_mean() {
        let loc = location(vec![rating(2.0), rating(3.0), rating(4.0)]);
        assert_eq!(loc.avg_rating(), 3.0);
    }

    #[test]
    fn avg_rating_single_entry() {
        let loc = location(vec![rating(4.5)]);
        assert_eq!(loc.avg_rating(), 4.5);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_appends_one_rating_per_call() {
        let mut loc = location(vec![rating(1.0)]);
        loc.rate(7, 5.0, "great").await;
        loc.rate(7, 3.0, "").await;
        loc.rate(8, 4.0, "ok").await;

        assert_eq!(loc.ratings.len(), 4);
        assert_eq!(loc.ratings[1].rating, 5.0);
        assert_eq!(loc.ratings[1].comment, "great");

        let mut ids: Vec<Uuid> = loc.ratings.iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4, "rating ids must be unique");
    }

    #[test]
    fn location_deserializes_without_ratings_or_complement() {
        let json = r#"{
            "id": 3, "lat": 1.0, "lng": 2.0, "name": "Pier",
            "street": "Dock Rd", "street_number": "1",
            "district": "Port", "city": "Dover", "state": "KE",
            "country": "UK", "zipcode": "CT16",
            "created_at": "2020-05-04T10:00:00Z",
            "updated_at": "2020-05-04T10:00:00Z",
            "user": {"id": 1, "username": "bob", "email": "bob@example.com"}
        }"#;
        let loc: Location = serde_json::from_str(json).unwrap();
        assert!(loc.ratings.is_empty());
        assert!(loc.complement.is_empty());
        assert_eq!(loc.street_number, "1");
    }

    #[test]
    fn location_rejects_missing_user() {
        let json = r#"{
            "id": 3, "lat": 1.0, "lng": 2.0, "name": "Pier",
            "street": "Dock Rd", "street_number": "1",
            "district": "Port", "city": "Dover", "state": "KE",
            "country": "UK", "zipcode": "CT16",
            "created_at": "2020-05-04T10:00:00Z",
            "updated_at": "2020-05-04T10:00:00Z"
        }"#;
        assert!(serde_json::from_str::<Location>(json).is_err());
    }

    #[test]
    fn location_normalization_is_lossless() {
        let raw = serde_json::json!({
            "id": 9, "lat": -23.55, "lng": -46.63, "name": "Praça",
            "street": "Rua Augusta", "street_number": "1024",
            "complement": "loja 2", "district": "Consolação",
            "city": "São Paulo", "state": "SP", "country": "BR",
            "zipcode": "01304-001",
            "created_at": "2020-05-04T10:00:00Z",
            "updated_at": "2020-06-01T08:30:00Z",
            "user": {"id": 2, "username": "rui", "email": "rui@example.com"},
            "ratings": [
                {"id": "00000000-0000-0000-0000-000000000001", "rating": 4.0, "comment": "bom"}
            ]
        });
        let loc: Location = serde_json::from_value(raw.clone()).unwrap();
        let back = serde_json::to_value(&loc).unwrap();
        assert_eq!(back, raw);
    }
}
