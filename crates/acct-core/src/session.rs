//! Login sessions.
//!
//! Sign-up opens a `PendingEnrollment` session and a password check opens a
//! `PendingOtp` one. Only a valid one-time code turns either into an
//! `Authenticated` session, under a fresh token.

use crate::error::AcctError;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::{RwLock, RwLockWriteGuard};
use uuid::Uuid;

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 48;
pub const PENDING_OTP_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    /// Fresh account that has not confirmed its authenticator yet.
    PendingEnrollment,
    /// Password accepted, code still owed.
    PendingOtp,
    Authenticated,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    #[serde(skip_serializing)]
    pub token: String,
    pub user_id: Uuid,
    pub stage: SessionStage,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Process-local session table.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
    pending_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_SESSION_TTL_HOURS))
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_ttls(ttl, Duration::minutes(PENDING_OTP_TTL_MINUTES))
    }

    pub fn with_ttls(ttl: Duration, pending_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            pending_ttl,
        }
    }

    /// Lifetime of an authenticated session.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn start_enrollment(&self, user_id: Uuid) -> Result<Session, AcctError> {
        self.start(user_id, SessionStage::PendingEnrollment)
    }

    pub fn start_pending(&self, user_id: Uuid) -> Result<Session, AcctError> {
        self.start(user_id, SessionStage::PendingOtp)
    }

    /// Exchange a pending session of the given stage for an authenticated
    /// one. The pending token stops working; any other token is left alone.
    pub fn promote(&self, token: &str, stage: SessionStage) -> Result<Session, AcctError> {
        if stage == SessionStage::Authenticated {
            return Err(AcctError::Unauthenticated);
        }
        let mut sessions = self.write()?;
        let usable = sessions
            .get(token)
            .is_some_and(|pending| pending.stage == stage && !pending.is_expired(Utc::now()));
        if !usable {
            return Err(AcctError::Unauthenticated);
        }
        let pending = sessions.remove(token).ok_or(AcctError::Unauthenticated)?;

        let session = self.issue(pending.user_id, SessionStage::Authenticated, self.ttl);
        sessions.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    /// Live session for a token; expired sessions are dropped on sight.
    pub fn get(&self, token: &str) -> Result<Option<Session>, AcctError> {
        let mut sessions = self.write()?;
        let expired = match sessions.get(token) {
            None => return Ok(None),
            Some(session) => session.is_expired(Utc::now()),
        };
        if expired {
            sessions.remove(token);
            return Ok(None);
        }
        Ok(sessions.get(token).cloned())
    }

    pub fn require(&self, token: &str, stage: SessionStage) -> Result<Session, AcctError> {
        self.get(token)?
            .filter(|session| session.stage == stage)
            .ok_or(AcctError::Unauthenticated)
    }

    pub fn revoke(&self, token: &str) -> Result<bool, AcctError> {
        Ok(self.write()?.remove(token).is_some())
    }

    pub fn purge_expired(&self) -> Result<usize, AcctError> {
        let now = Utc::now();
        let mut sessions = self.write()?;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        Ok(before - sessions.len())
    }

    fn start(&self, user_id: Uuid, stage: SessionStage) -> Result<Session, AcctError> {
        let session = self.issue(user_id, stage, self.pending_ttl);
        self.write()?
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }

    fn issue(&self, user_id: Uuid, stage: SessionStage, ttl: Duration) -> Session {
        let now = Utc::now();
        Session {
            token: new_token(),
            user_id,
            stage,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Session>>, AcctError> {
        self.sessions
            .write()
            .map_err(|_| AcctError::Storage("session lock poisoned".to_string()))
    }
}

fn new_token() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(64), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
