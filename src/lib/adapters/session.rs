//! Cookie-keyed flash messages.
//!
//! A request without a valid `todo_session` cookie is given a fresh id by
//! [`ensure_session`]; the id is stored in request extensions so handlers can
//! queue or drain messages for it.

use std::collections::{HashMap, VecDeque};

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "todo_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: String,
    pub message: String,
}

impl Flash {
    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: "error".to_string(), message: message.into() }
    }
}

/// Sessions with unread messages kept before the oldest is dropped.
pub const MAX_PENDING_SESSIONS: usize = 10_000;

#[derive(Default)]
struct Queues {
    by_session: HashMap<SessionId, Vec<Flash>>,
    // first-push order, for eviction
    order: VecDeque<SessionId>,
}

/// Consume-once message queues, one per session.
///
/// Bounded: a client that never reads its messages (no cookie, never
/// follows the redirect) costs at most one slot, and the oldest unread
/// session is forgotten once `capacity` is reached.
pub struct FlashStore {
    queues: Mutex<Queues>,
    capacity: usize,
}

impl Default for FlashStore {
    fn default() -> Self {
        Self::with_capacity(MAX_PENDING_SESSIONS)
    }
}

impl FlashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { queues: Mutex::new(Queues::default()), capacity: capacity.max(1) }
    }

    pub async fn push(&self, session: SessionId, flashes: impl IntoIterator<Item = Flash>) {
        let mut queues = self.queues.lock().await;
        if !queues.by_session.contains_key(&session) {
            while queues.by_session.len() >= self.capacity {
                let Some(oldest) = queues.order.pop_front() else { break };
                queues.by_session.remove(&oldest);
                tracing::debug!("Dropped unread flash messages of an idle session");
            }
            queues.order.push_back(session);
        }
        queues.by_session.entry(session).or_default().extend(flashes);
    }

    pub async fn push_errors<I, M>(&self, session: SessionId, messages: I)
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.push(session, messages.into_iter().map(|m| Flash::error(m))).await;
    }

    /// Returns and forgets everything queued for `session`.
    pub async fn take(&self, session: SessionId) -> Vec<Flash> {
        let mut queues = self.queues.lock().await;
        let Some(flashes) = queues.by_session.remove(&session) else {
            return Vec::new();
        };
        queues.order.retain(|queued| *queued != session);
        flashes
    }

    #[cfg(test)]
    async fn pending_sessions(&self) -> usize {
        self.queues.lock().await.by_session.len()
    }
}

fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
        .map(SessionId)
}

pub async fn ensure_session(mut request: Request, next: Next) -> Response {
    let existing = session_from_headers(request.headers());
    let session = existing.unwrap_or_else(|| SessionId(Uuid::new_v4()));
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;
    if existing.is_none() {
        let cookie = format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", session.0);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Could not encode session cookie"),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flashes_are_consumed_once() {
        let store = FlashStore::new();
        let session = SessionId(Uuid::new_v4());
        store.push_errors(session, ["a", "b"]).await;
        store.push(session, [Flash::error("c")]).await;

        let taken = store.take(session).await;
        let messages: Vec<_> = taken.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, ["a", "b", "c"]);
        assert!(store.take(session).await.is_empty());
    }

    #[tokio::test]
    async fn sessions_do_not_share_messages() {
        let store = FlashStore::new();
        let first = SessionId(Uuid::new_v4());
        let second = SessionId(Uuid::new_v4());
        store.push(first, [Flash::error("only first")]).await;
        assert!(store.take(second).await.is_empty());
        assert_eq!(store.take(first).await.len(), 1);
    }

    #[tokio::test]
    async fn unread_sessions_are_bounded() {
        let store = FlashStore::with_capacity(2);
        let sessions: Vec<_> = (0..3).map(|_| SessionId(Uuid::new_v4())).collect();
        for session in &sessions {
            store.push_errors(*session, ["unread"]).await;
        }
        assert_eq!(store.pending_sessions().await, 2);
        // the oldest was evicted, the newest two survive
        assert!(store.take(sessions[0]).await.is_empty());
        assert_eq!(store.take(sessions[1]).await.len(), 1);
        assert_eq!(store.take(sessions[2]).await.len(), 1);
        assert_eq!(store.pending_sessions().await, 0);
    }

    #[tokio::test]
    async fn repeated_pushes_reuse_one_slot() {
        let store = FlashStore::with_capacity(1);
        let session = SessionId(Uuid::new_v4());
        store.push_errors(session, ["a"]).await;
        store.push_errors(session, ["b"]).await;
        assert_eq!(store.pending_sessions().await, 1);
        assert_eq!(store.take(session).await.len(), 2);
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        let cookie = format!("theme=dark; {SESSION_COOKIE}={id}; lang=cs");
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());
        assert_eq!(session_from_headers(&headers), Some(SessionId(id)));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("todo_session=not-a-uuid"));
        assert_eq!(session_from_headers(&headers), None);
    }
}
