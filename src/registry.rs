//! Room code → session store.
//!
//! The registry is plain storage: it neither validates nor emits events.
//! Each session sits behind its own async mutex so that commands for one
//! room are serialized while different rooms proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::session::Session;

/// Shared handle to one room's state.
pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

/// Keyed store of live sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    rooms: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionHandle>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a room by (already normalized) code.
    pub fn get(&self, code: &str) -> Option<SessionHandle> {
        self.lock().get(code).cloned()
    }

    /// Store `session` under `code`, replacing any previous entry.
    pub fn set(&self, code: &str, session: Session) -> SessionHandle {
        let handle = Arc::new(tokio::sync::Mutex::new(session));
        self.lock().insert(code.to_string(), Arc::clone(&handle));
        handle
    }

    /// Store `session` only if `code` is free. Returns the session back if
    /// the code is already taken.
    pub fn try_insert(&self, code: &str, session: Session) -> Result<SessionHandle, Session> {
        let mut rooms = self.lock();
        if rooms.contains_key(code) {
            return Err(session);
        }
        let handle = Arc::new(tokio::sync::Mutex::new(session));
        rooms.insert(code.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Remove a room. Returns `true` if it was present.
    pub fn delete(&self, code: &str) -> bool {
        self.lock().remove(code).is_some()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.lock().contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of every live room, for scans such as disconnect handling.
    pub fn handles(&self) -> Vec<(String, SessionHandle)> {
        self.lock()
            .iter()
            .map(|(code, handle)| (code.clone(), Arc::clone(handle)))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::{Player, Settings};
    use uuid::Uuid;

    fn session(code: &str) -> Session {
        let host = Player::new("host".into(), "Host".into(), Uuid::new_v4());
        Session::new(code.into(), host, Settings::default())
    }

    #[tokio::test]
    async fn set_get_delete() {
        let registry = SessionRegistry::new();
        assert!(registry.get("ABCDEF").is_none());

        registry.set("ABCDEF", session("ABCDEF"));
        let handle = registry.get("ABCDEF").unwrap();
        assert_eq!(handle.lock().await.room_code, "ABCDEF");
        assert_eq!(registry.len(), 1);

        assert!(registry.delete("ABCDEF"));
        assert!(!registry.delete("ABCDEF"));
        assert!(registry.is_empty());
    }

    #[test]
    fn try_insert_refuses_taken_code() {
        let registry = SessionRegistry::new();
        assert!(registry.try_insert("ROOM42", session("ROOM42")).is_ok());
        let rejected = registry.try_insert("ROOM42", session("ROOM42"));
        assert!(rejected.is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn handles_lists_every_room() {
        let registry = SessionRegistry::new();
        registry.set("AAAA", session("AAAA"));
        registry.set("BBBB", session("BBBB"));
        let mut codes: Vec<String> = registry.handles().into_iter().map(|(c, _)| c).collect();
        codes.sort();
        assert_eq!(codes, vec!["AAAA", "BBBB"]);
    }
}
