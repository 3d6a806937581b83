//! Session persistence behind a trait: keyed create/get/save/delete plus an
//! atomic read-modify-write `update`. The whole session is the atomicity
//! unit — the map lock is held for the full mutate-and-write-back cycle, so
//! concurrent submissions for the same session serialize instead of
//! clobbering each other.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::engine::models::RuleContext;
use crate::engine::records::{decode_session, encode_session};
use crate::engine::session::{GameSession, SecretHand};

/// Seconds since the Unix epoch, as the engine's timestamp type.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn new_session_id() -> String {
    format!("{:032x}", rand::thread_rng().gen::<u128>())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Unknown or expired session id.
    NotFound,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "session not found"),
        }
    }
}

/// Store contract consumed by the server. Expiry is entirely the store's
/// concern; callers only ever observe `NotFound`.
pub trait SessionStore: Send + Sync {
    fn store_type(&self) -> &'static str;

    fn create(
        &self,
        context: RuleContext,
        secret: SecretHand,
        attempt_budget: u32,
        now: f64,
    ) -> GameSession;

    fn get(&self, session_id: &str) -> Option<GameSession>;

    fn save(&self, session: &GameSession);

    fn delete(&self, session_id: &str);

    /// Applies `mutator` to the live session and persists the result as one
    /// atomic unit.
    fn update(
        &self,
        session_id: &str,
        mutator: &mut dyn FnMut(&mut GameSession),
    ) -> Result<(), StoreError>;

    fn ping(&self) -> bool {
        true
    }
}

/// Typed convenience over the object-safe [`SessionStore::update`]: returns
/// whatever the mutator produces.
pub fn update_with<T>(
    store: &dyn SessionStore,
    session_id: &str,
    mutate: impl FnOnce(&mut GameSession) -> T,
) -> Result<T, StoreError> {
    let mut mutate = Some(mutate);
    let mut out = None;
    store.update(session_id, &mut |session| {
        if let Some(f) = mutate.take() {
            out = Some(f(session));
        }
    })?;
    out.ok_or(StoreError::NotFound)
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Live sessions in a mutex-guarded map, swept on access once older than the
/// TTL.
pub struct MemoryStore {
    ttl_seconds: u64,
    sessions: Mutex<HashMap<String, GameSession>>,
}

impl MemoryStore {
    pub fn new(ttl_seconds: u64) -> MemoryStore {
        MemoryStore {
            ttl_seconds,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sweep(&self, sessions: &mut HashMap<String, GameSession>) {
        let now = unix_now();
        let ttl = self.ttl_seconds as f64;
        sessions.retain(|_, s| now - s.created_at < ttl);
    }
}

impl SessionStore for MemoryStore {
    fn store_type(&self) -> &'static str {
        "memory"
    }

    fn create(
        &self,
        context: RuleContext,
        secret: SecretHand,
        attempt_budget: u32,
        now: f64,
    ) -> GameSession {
        let session = GameSession::new(new_session_id(), now, attempt_budget, context, secret);
        let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        self.sweep(&mut sessions);
        sessions.insert(session.session_id.clone(), session.clone());
        session
    }

    fn get(&self, session_id: &str) -> Option<GameSession> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        self.sweep(&mut sessions);
        sessions.get(session_id).cloned()
    }

    fn save(&self, session: &GameSession) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        sessions.insert(session.session_id.clone(), session.clone());
    }

    fn delete(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        sessions.remove(session_id);
    }

    fn update(
        &self,
        session_id: &str,
        mutator: &mut dyn FnMut(&mut GameSession),
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        self.sweep(&mut sessions);
        let session = sessions.get_mut(session_id).ok_or(StoreError::NotFound)?;
        mutator(session);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Cache-backed store
// ---------------------------------------------------------------------------

struct CacheSlot {
    expires_at: f64,
    raw: String,
}

/// Sessions as versioned JSON blobs under a prefixed key with per-write
/// expiry — the shape a Redis-style cache would hold, kept in-process. Save
/// refreshes the TTL; decode failures read as absent.
pub struct CacheStore {
    ttl_seconds: u64,
    prefix: String,
    blobs: Mutex<HashMap<String, CacheSlot>>,
}

impl CacheStore {
    pub fn new(ttl_seconds: u64, prefix: impl Into<String>) -> CacheStore {
        CacheStore {
            ttl_seconds,
            prefix: prefix.into(),
            blobs: Mutex::new(HashMap::new()),
        }
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}{}", self.prefix, session_id)
    }

    fn put(&self, blobs: &mut HashMap<String, CacheSlot>, session: &GameSession) {
        match encode_session(session) {
            Ok(raw) => {
                blobs.insert(
                    self.key(&session.session_id),
                    CacheSlot {
                        expires_at: unix_now() + self.ttl_seconds as f64,
                        raw,
                    },
                );
            }
            Err(err) => {
                tracing::warn!(session_id = %session.session_id, %err, "failed to encode session");
            }
        }
    }

    fn live_session(&self, blobs: &HashMap<String, CacheSlot>, session_id: &str) -> Option<GameSession> {
        let slot = blobs.get(&self.key(session_id))?;
        if unix_now() >= slot.expires_at {
            return None;
        }
        match decode_session(&slot.raw) {
            Ok(session) => Some(session),
            Err(err) => {
                tracing::warn!(session_id, %err, "failed to decode session blob");
                None
            }
        }
    }
}

impl SessionStore for CacheStore {
    fn store_type(&self) -> &'static str {
        "cache"
    }

    fn create(
        &self,
        context: RuleContext,
        secret: SecretHand,
        attempt_budget: u32,
        now: f64,
    ) -> GameSession {
        let session = GameSession::new(new_session_id(), now, attempt_budget, context, secret);
        let mut blobs = self.blobs.lock().unwrap_or_else(|p| p.into_inner());
        self.put(&mut blobs, &session);
        session
    }

    fn get(&self, session_id: &str) -> Option<GameSession> {
        let blobs = self.blobs.lock().unwrap_or_else(|p| p.into_inner());
        self.live_session(&blobs, session_id)
    }

    fn save(&self, session: &GameSession) {
        let mut blobs = self.blobs.lock().unwrap_or_else(|p| p.into_inner());
        self.put(&mut blobs, session);
    }

    fn delete(&self, session_id: &str) {
        let mut blobs = self.blobs.lock().unwrap_or_else(|p| p.into_inner());
        blobs.remove(&self.key(session_id));
    }

    fn update(
        &self,
        session_id: &str,
        mutator: &mut dyn FnMut(&mut GameSession),
    ) -> Result<(), StoreError> {
        // Decode, mutate and re-encode under one lock acquisition.
        let mut blobs = self.blobs.lock().unwrap_or_else(|p| p.into_inner());
        let mut session = self
            .live_session(&blobs, session_id)
            .ok_or(StoreError::NotFound)?;
        mutator(&mut session);
        self.put(&mut blobs, &session);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::engine::codec::decode;
    use crate::engine::models::{RuleVariant, Wind};

    fn context() -> RuleContext {
        RuleContext {
            round_wind: Wind::East,
            seat_wind: Wind::East,
            self_draw: false,
            variant: RuleVariant::Riichi,
        }
    }

    fn secret() -> SecretHand {
        SecretHand {
            tiles: decode("123m456p789s111z22z").unwrap(),
            value: 2,
            terms: vec!["seat_wind".into(), "round_wind".into()],
        }
    }

    fn stores() -> Vec<Box<dyn SessionStore>> {
        vec![
            Box::new(MemoryStore::new(3600)),
            Box::new(CacheStore::new(3600, "mh:v1:session:")),
        ]
    }

    #[test]
    fn test_create_get_roundtrip() {
        for store in stores() {
            let session = store.create(context(), secret(), 8, unix_now());
            let loaded = store.get(&session.session_id).unwrap();
            assert_eq!(loaded, session);
            assert!(store.get("missing").is_none());
        }
    }

    #[test]
    fn test_update_persists_mutation() {
        for store in stores() {
            let session = store.create(context(), secret(), 8, unix_now());
            let out = update_with(store.as_ref(), &session.session_id, |s| {
                s.attempt_budget = 3;
                s.attempt_budget
            })
            .unwrap();
            assert_eq!(out, 3);
            assert_eq!(store.get(&session.session_id).unwrap().attempt_budget, 3);
        }
    }

    #[test]
    fn test_update_unknown_session() {
        for store in stores() {
            let err = update_with(store.as_ref(), "missing", |_| ()).unwrap_err();
            assert_eq!(err, StoreError::NotFound);
        }
    }

    #[test]
    fn test_delete_removes_session() {
        for store in stores() {
            let session = store.create(context(), secret(), 8, unix_now());
            store.delete(&session.session_id);
            assert!(store.get(&session.session_id).is_none());
        }
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let stores: Vec<Box<dyn SessionStore>> = vec![
            Box::new(MemoryStore::new(0)),
            Box::new(CacheStore::new(0, "mh:v1:session:")),
        ];
        for store in stores {
            let session = store.create(context(), secret(), 8, unix_now());
            assert!(store.get(&session.session_id).is_none());
            assert_eq!(
                update_with(store.as_ref(), &session.session_id, |_| ()).unwrap_err(),
                StoreError::NotFound
            );
        }
    }

    #[test]
    fn test_concurrent_updates_all_land() {
        for store in stores() {
            let store: Arc<dyn SessionStore> = Arc::from(store);
            let session = store.create(context(), secret(), 0, unix_now());
            let id = session.session_id.clone();

            let mut handles = Vec::new();
            for _ in 0..4 {
                let store = Arc::clone(&store);
                let id = id.clone();
                handles.push(std::thread::spawn(move || {
                    for _ in 0..25 {
                        update_with(store.as_ref(), &id, |s| s.attempt_budget += 1).unwrap();
                    }
                }));
            }
            for handle in handles {
                handle.join().unwrap();
            }
            assert_eq!(store.get(&id).unwrap().attempt_budget, 100);
        }
    }

    #[test]
    fn test_store_types() {
        assert_eq!(MemoryStore::new(1).store_type(), "memory");
        assert_eq!(CacheStore::new(1, "p:").store_type(), "cache");
        assert!(MemoryStore::new(1).ping());
    }
}
