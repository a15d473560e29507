//! Session and domain-graph store.
//!
//! # Design
//! One `Store` exists per running app and owns the whole mutable session
//! graph: the authenticated user, a viewed user, the cached locations, the
//! currently selected location, and the `loading` flag. Fields are private;
//! reads go through accessors and every mutation goes through a named
//! operation that ends with an explicit `publish()` to registered
//! listeners. There is no implicit dependency tracking — a listener gets
//! `&Store` and reads whatever it cares about.
//!
//! The selected location is held as an id, never a copy: `current_location`
//! re-resolves against the cached collection on every call, and replacing
//! the collection clears the id when its target is gone. A dangling
//! selection cannot be observed.
//!
//! Async flows take `&mut self`, so two flows cannot overlap on the same
//! store; ordering within a flow (token save, decode, user fetch) is the
//! sequential await order.

use std::cell::Cell;
use std::sync::Arc;

use crate::client::ApiClient;
use crate::error::ApiProblem;
use crate::storage::{TokenStorage, TOKEN_KEY};
use crate::token::decode_session_claims;
use crate::types::{Location, User};

/// Change listener invoked after every state mutation.
pub type Listener = Box<dyn Fn(&Store)>;

/// The app-wide session/domain state container.
pub struct Store {
    client: ApiClient,
    storage: Arc<dyn TokenStorage>,
    user: Option<User>,
    current_user: Option<User>,
    locations: Vec<Location>,
    current_location: Option<i64>,
    loading: Cell<bool>,
    listeners: Vec<Listener>,
}

/// Holds `loading` true for exactly the scope it lives in; the flag is
/// released on drop no matter how the scope exits.
struct LoadingGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> LoadingGuard<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

impl Store {
    pub fn new(client: ApiClient, storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            client,
            storage,
            user: None,
            current_user: None,
            locations: Vec::new(),
            current_location: None,
            loading: Cell::new(false),
            listeners: Vec::new(),
        }
    }

    /// Register a change listener. Listeners live as long as the store.
    pub fn subscribe(&mut self, listener: impl Fn(&Store) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn publish(&self) {
        for listener in &self.listeners {
            listener(self);
        }
    }

    /// Restore the session persisted by an earlier sign-in, if any.
    ///
    /// A missing token means no session; a token that fails structural
    /// decoding is logged and likewise treated as no session. Only a valid
    /// token triggers a user fetch, whose failure is surfaced.
    pub async fn bootstrap(&mut self) -> Result<(), ApiProblem> {
        let Some(token) = self.storage.load_string(TOKEN_KEY).await else {
            return Ok(());
        };
        match decode_session_claims(&token) {
            Ok(claims) => self.fetch_user(claims.uid).await,
            Err(err) => {
                tracing::warn!(error = %err, "stored session token is malformed, starting signed out");
                Ok(())
            }
        }
    }

    /// Sign in and load the authenticated profile.
    ///
    /// On any failure the session state is left untouched and the problem
    /// is returned for the UI to display. On success the token is persisted
    /// before the profile fetch, so the fetch already authenticates with it.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), ApiProblem> {
        let token = self.client.sign_in(email, password).await?;
        if !self.storage.save_string(TOKEN_KEY, &token).await {
            tracing::warn!("session token could not be persisted");
        }
        let claims = decode_session_claims(&token).map_err(|err| {
            tracing::warn!(error = %err, "sign-in returned an undecodable token");
            ApiProblem::BadData
        })?;
        self.fetch_user(claims.uid).await
    }

    /// Fetch the profile for `id` and install it as the session user.
    ///
    /// `loading` is true for exactly the duration of the remote call — the
    /// guard releases it on every exit path. On failure the previous `user`
    /// is kept.
    pub async fn fetch_user(&mut self, id: i64) -> Result<(), ApiProblem> {
        let result = {
            let _busy = LoadingGuard::engage(&self.loading);
            self.publish();
            self.client.get_user(id).await
        };
        match result {
            Ok(user) => {
                self.user = Some(user);
                self.publish();
                Ok(())
            }
            Err(problem) => {
                self.publish();
                Err(problem)
            }
        }
    }

    pub fn set_user(&mut self, user: User) {
        self.user = Some(user);
        self.publish();
    }

    pub fn set_current_user(&mut self, user: User) {
        self.current_user = Some(user);
        self.publish();
    }

    /// Replace the cached locations wholesale.
    ///
    /// If the selected location's id is absent from the new collection the
    /// selection is cleared rather than left dangling.
    pub fn set_locations(&mut self, locations: Vec<Location>) {
        self.locations = locations;
        if let Some(id) = self.current_location {
            if !self.contains_location(id) {
                self.current_location = None;
            }
        }
        self.publish();
    }

    /// Select a location by id.
    ///
    /// # Panics
    /// Selecting an id that is not in the cached collection is a caller
    /// bug, not a condition the store tolerates.
    pub fn set_current_location(&mut self, id: i64) {
        assert!(
            self.contains_location(id),
            "location {id} is not in the cached collection"
        );
        self.current_location = Some(id);
        self.publish();
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Resolve the selected location against the current collection.
    pub fn current_location(&self) -> Option<&Location> {
        let id = self.current_location?;
        self.locations.iter().find(|location| location.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    fn contains_location(&self, id: i64) -> bool {
        self.locations.iter().any(|location| location.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};

    use crate::http::{HttpRequest, HttpResponse, HttpTransport, TransportError};
    use crate::storage::MemoryStorage;

    /// Transport for tests that never perform a remote call.
    struct NoTransport;

    #[async_trait::async_trait]
    impl HttpTransport for NoTransport {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Other("no transport in this test".into()))
        }
    }

    fn store() -> Store {
        let storage = Arc::new(MemoryStorage::new());
        let client = ApiClient::new("http://localhost", Arc::new(NoTransport), storage.clone());
        Store::new(client, storage)
    }

    fn location(id: i64) -> Location {
        Location {
            id,
            lat: 0.0,
            lng: 0.0,
            name: format!("loc-{id}"),
            street: "Main".to_string(),
            street_number: "1".to_string(),
            complement: String::new(),
            district: "Centre".to_string(),
            city: "Town".to_string(),
            state: "ST".to_string(),
            country: "XX".to_string(),
            zipcode: "00000".to_string(),
            created_at: Utc.with_ymd_and_hms(2020, 5, 4, 10, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2020, 5, 4, 10, 0, 0).unwrap(),
            user: User {
                id: 1,
                username: "owner".to_string(),
                email: "owner@example.com".to_string(),
            },
            ratings: Vec::new(),
        }
    }

    #[test]
    fn current_location_resolves_against_collection() {
        let mut store = store();
        store.set_locations(vec![location(1), location(2)]);
        store.set_current_location(2);
        assert_eq!(store.current_location().unwrap().id, 2);
    }

    #[test]
    fn replacing_locations_keeps_selection_when_id_survives() {
        let mut store = store();
        store.set_locations(vec![location(1), location(2)]);
        store.set_current_location(1);
        store.set_locations(vec![location(1)]);
        assert_eq!(store.current_location().unwrap().id, 1);
    }

    #[test]
    fn replacing_locations_clears_dangling_selection() {
        let mut store = store();
        store.set_locations(vec![location(1), location(2)]);
        store.set_current_location(2);
        store.set_locations(vec![location(1), location(3)]);
        assert!(store.current_location().is_none());
    }

    #[test]
    #[should_panic(expected = "not in the cached collection")]
    fn selecting_unknown_location_panics() {
        let mut store = store();
        store.set_locations(vec![location(1)]);
        store.set_current_location(9);
    }

    #[test]
    fn setters_notify_listeners() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut store = store();
        let notified = Rc::new(Cell::new(0));
        let seen = notified.clone();
        store.subscribe(move |_| seen.set(seen.get() + 1));

        store.set_user(User {
            id: 1,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
        });
        store.set_locations(vec![location(1)]);
        store.set_current_location(1);

        assert_eq!(notified.get(), 3);
    }

    #[test]
    fn set_current_user_does_not_replace_session_user() {
        let mut store = store();
        store.set_user(User {
            id: 1,
            username: "me".to_string(),
            email: "me@example.com".to_string(),
        });
        store.set_current_user(User {
            id: 2,
            username: "them".to_string(),
            email: "them@example.com".to_string(),
        });
        assert_eq!(store.user().unwrap().id, 1);
        assert_eq!(store.current_user().unwrap().id, 2);
    }
}
