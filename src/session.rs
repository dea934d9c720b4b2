use std::{
    collections::VecDeque,
    convert::Infallible,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{extract::FromRequestParts, http::request::Parts};
use dashmap::DashMap;
use uuid::Uuid;

pub const SESSION_HEADER: &str = "x-session-id";
pub const RECENTLY_VIEWED_LIMIT: usize = 5;
pub const SESSION_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);
pub const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);
const MAX_SESSIONS: usize = 50_000;
const MAX_KEY_LEN: usize = 128;

/// Most-recent-first list of product ids, without duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecentlyViewed {
    ids: VecDeque<Uuid>,
}

impl RecentlyViewed {
    pub fn record(&mut self, product_id: Uuid) {
        self.ids.retain(|id| *id != product_id);
        self.ids.push_front(product_id);
        self.ids.truncate(RECENTLY_VIEWED_LIMIT);
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.ids.iter().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    viewed: RecentlyViewed,
    last_seen: Instant,
}

/// Per-session state, keyed by the client's session header.
///
/// Entries idle longer than the TTL are dropped by [`SessionStore::purge_expired`];
/// at capacity the least recently seen session makes room for a new one.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<String, SessionEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(SESSION_TTL, MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn record_view(&self, session: &SessionId, product_id: Uuid) {
        let Some(key) = session.key() else {
            return;
        };
        let now = Instant::now();
        if !self.inner.contains_key(key) && self.inner.len() >= self.capacity {
            self.make_room(now);
        }

        let mut entry = self
            .inner
            .entry(key.to_string())
            .or_insert_with(|| SessionEntry {
                viewed: RecentlyViewed::default(),
                last_seen: now,
            });
        entry.last_seen = now;
        entry.viewed.record(product_id);
    }

    pub fn recently_viewed(&self, session: &SessionId) -> RecentlyViewed {
        let now = Instant::now();
        session
            .key()
            .and_then(|key| {
                self.inner
                    .get(key)
                    .filter(|entry| now.duration_since(entry.last_seen) < self.ttl)
                    .map(|entry| entry.viewed.clone())
            })
            .unwrap_or_default()
    }

    /// Drop sessions idle for longer than the TTL; returns how many went.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.len();
        self.inner
            .retain(|_, entry| now.duration_since(entry.last_seen) < self.ttl);
        before.saturating_sub(self.inner.len())
    }

    fn make_room(&self, now: Instant) {
        self.inner
            .retain(|_, entry| now.duration_since(entry.last_seen) < self.ttl);
        if self.inner.len() < self.capacity {
            return;
        }
        let oldest = self
            .inner
            .iter()
            .min_by_key(|entry| entry.last_seen)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.inner.remove(&key);
        }
    }
}

/// Periodically purge idle sessions; runs until the runtime shuts down.
pub async fn run_cleanup(store: SessionStore, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let removed = store.purge_expired();
        if removed > 0 {
            tracing::debug!(removed, remaining = store.len(), "expired sessions purged");
        }
    }
}

/// Session key taken from the `x-session-id` header, if the client sent one.
#[derive(Debug, Clone, Default)]
pub struct SessionId(pub Option<String>);

impl SessionId {
    pub fn key(&self) -> Option<&str> {
        self.0
            .as_deref()
            .filter(|k| !k.is_empty() && k.len() <= MAX_KEY_LEN)
    }
}

impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_string());
        Ok(SessionId(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recently_viewed_is_bounded_deduplicated_and_most_recent_first() {
        let ids: Vec<Uuid> = (0..7).map(|_| Uuid::new_v4()).collect();
        let mut viewed = RecentlyViewed::default();
        for id in &ids {
            viewed.record(*id);
        }
        assert_eq!(viewed.ids(), vec![ids[6], ids[5], ids[4], ids[3], ids[2]]);

        viewed.record(ids[4]);
        assert_eq!(viewed.ids(), vec![ids[4], ids[6], ids[5], ids[3], ids[2]]);
    }

    #[test]
    fn store_ignores_requests_without_a_session() {
        let store = SessionStore::new();
        let anonymous = SessionId(None);
        store.record_view(&anonymous, Uuid::new_v4());
        assert!(store.recently_viewed(&anonymous).is_empty());

        let session = SessionId(Some("abc".into()));
        let product = Uuid::new_v4();
        store.record_view(&session, product);
        assert_eq!(store.recently_viewed(&session).ids(), vec![product]);
    }

    #[test]
    fn overlong_session_keys_are_ignored() {
        let store = SessionStore::new();
        let session = SessionId(Some("k".repeat(MAX_KEY_LEN + 1)));
        store.record_view(&session, Uuid::new_v4());
        assert!(store.is_empty());
    }

    #[test]
    fn idle_sessions_are_purged() {
        let store = SessionStore::with_limits(Duration::ZERO, 10);
        for n in 0..3 {
            store.record_view(&SessionId(Some(format!("s{n}"))), Uuid::new_v4());
        }
        assert_eq!(store.len(), 3);
        assert!(store.recently_viewed(&SessionId(Some("s0".into()))).is_empty());

        assert_eq!(store.purge_expired(), 3);
        assert!(store.is_empty());
    }

    #[test]
    fn store_stays_within_capacity() {
        let store = SessionStore::with_limits(SESSION_TTL, 2);
        let product = Uuid::new_v4();
        for n in 0..5 {
            store.record_view(&SessionId(Some(format!("s{n}"))), product);
        }
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.recently_viewed(&SessionId(Some("s4".into()))).ids(),
            vec![product]
        );

        store.record_view(&SessionId(Some("s4".into())), Uuid::new_v4());
        assert_eq!(store.len(), 2);
    }
}
