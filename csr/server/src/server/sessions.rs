//! In-memory store of the generated keys and certificate requests.
//!
//! Each generation creates a new immutable [CsrSession] and makes it the
//! latest one. Callers can either issue a certificate for the latest session
//! or name a session explicitly by its [SessionId].

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use dashmap::DashMap;
use openssl::pkey::PKey;
use openssl::pkey::Private;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// A generated key pair and its PEM-armored certificate request.
pub struct CsrSession {
    pub private_key: PKey<Private>,
    pub csr_pem: String,
    created: Instant,
}

impl CsrSession {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created.elapsed() > ttl
    }
}

pub struct CsrSessions {
    sessions: DashMap<SessionId, Arc<CsrSession>>,
    latest: Mutex<Option<SessionId>>,
    ttl: Duration,
}

impl CsrSessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::default(),
            latest: Mutex::default(),
            ttl,
        }
    }

    /// Stores a new session and makes it the latest one.
    pub fn insert(&self, private_key: PKey<Private>, csr_pem: String) -> SessionId {
        self.sessions
            .retain(|_, session| !session.is_expired(self.ttl));

        let id = SessionId::new();
        let session = Arc::new(CsrSession {
            private_key,
            csr_pem,
            created: Instant::now(),
        });
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        self.sessions.insert(id, session);
        *latest = Some(id);
        debug!("Stored session {id}, {} active sessions", self.sessions.len());
        id
    }

    /// Returns the named session, or the latest one.
    ///
    /// Expired sessions are never returned.
    pub fn get(&self, id: Option<SessionId>) -> Option<Arc<CsrSession>> {
        let id = match id {
            Some(id) => id,
            None => (*self.latest.lock().unwrap_or_else(PoisonError::into_inner))?,
        };
        let session = self.sessions.get(&id)?.value().clone();
        if session.is_expired(self.ttl) {
            debug!("Session {id} has expired");
            self.sessions.remove(&id);
            return None;
        }
        Some(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
