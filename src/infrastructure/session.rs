//! In-process session store backing the home-page visit counter.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const SESSION_COOKIE: &str = "sessionid";

/// Two weeks, the lifetime of a browser session cookie.
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(14 * 24 * 60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Session {
    visits: u64,
    last_seen: Instant,
}

/// Visit counts keyed by session id.
///
/// Bounded: idle sessions expire, and once `max_sessions` is reached the
/// idle ones are swept and then the least recently seen are evicted.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Session>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_IDLE, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Counts a visit for the session, creating one when the id is unknown or expired.
    ///
    /// Returns the session id to hand back to the client and the number of
    /// visits recorded before this one.
    pub fn record_visit(&self, session_id: Option<&str>) -> (String, u64) {
        self.record_visit_at(session_id, Instant::now())
    }

    fn record_visit_at(&self, session_id: Option<&str>, now: Instant) -> (String, u64) {
        if let Some(id) = session_id
            && let Some(mut session) = self.sessions.get_mut(id)
            && !self.is_idle(&session, now)
        {
            let previous = session.visits;
            session.visits += 1;
            session.last_seen = now;
            return (id.to_string(), previous);
        }

        if self.sessions.len() >= self.max_sessions {
            self.evict(now);
        }

        let session_id = uuid::Uuid::new_v4().simple().to_string();
        self.sessions.insert(
            session_id.clone(),
            Session {
                visits: 1,
                last_seen: now,
            },
        );
        (session_id, 0)
    }

    fn is_idle(&self, session: &Session, now: Instant) -> bool {
        now.saturating_duration_since(session.last_seen) >= self.idle_timeout
    }

    /// Drops idle sessions, then the least recently seen until there is room for one more.
    fn evict(&self, now: Instant) {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !self.is_idle(session, now));

        while self.sessions.len() >= self.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.value().last_seen)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(id) => {
                    self.sessions.remove(&id);
                }
                None => break,
            }
        }

        tracing::debug!(
            "Session store evicted {} of {} sessions",
            before.saturating_sub(self.sessions.len()),
            before
        );
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Extracts a cookie value from a raw `Cookie` header.
pub fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
