//! Session store — single source of truth for the current credentials.
//!
//! State is held in memory behind a mutex and mirrored to a JSON file so
//! tokens, the cached profile, and the fallback-mode flag survive restarts.
//! Disk writes are atomic (temp file + rename) and best-effort: a failed
//! write is logged and the in-memory session stays authoritative, so
//! `clear()` in particular can never fail.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::UserProfile;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub fallback_mode: bool,
}

struct SessionState {
    session: Session,
    /// Bumped on every login and clear. A token refresh captures the epoch
    /// before it starts and only applies its result if the epoch is
    /// unchanged, so a late-arriving refresh cannot mutate state after
    /// logout.
    epoch: u64,
}

pub struct SessionStore {
    state_path: PathBuf,
    state: Mutex<SessionState>,
}

impl SessionStore {
    /// Opens the store, loading any persisted session. A missing or corrupt
    /// state file is treated as no session.
    pub fn open(state_path: &Path) -> Self {
        let session = match std::fs::read(state_path) {
            Ok(bytes) => match serde_json::from_slice::<Session>(&bytes) {
                Ok(session) => session,
                Err(e) => {
                    warn!("Discarding corrupt session state at {state_path:?}: {e}");
                    Session::default()
                }
            },
            Err(_) => Session::default(),
        };
        Self {
            state_path: state_path.to_path_buf(),
            state: Mutex::new(SessionState { session, epoch: 0 }),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.lock().session.access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.lock().session.refresh_token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.lock().session.user.clone()
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    pub fn is_fallback_mode(&self) -> bool {
        self.lock().session.fallback_mode
    }

    /// Sticky mode flag, persisted so a reload stays in the chosen mode.
    pub fn set_fallback_mode(&self, fallback: bool) {
        let snapshot = {
            let mut state = self.lock();
            state.session.fallback_mode = fallback;
            state.session.clone()
        };
        self.persist(&snapshot);
    }

    /// Installs a fresh session after a successful login.
    pub fn begin(&self, access_token: String, refresh_token: String, user: UserProfile) {
        let snapshot = {
            let mut state = self.lock();
            state.epoch += 1;
            state.session.access_token = Some(access_token);
            state.session.refresh_token = Some(refresh_token);
            state.session.user = Some(user);
            state.session.clone()
        };
        self.persist(&snapshot);
    }

    /// Compare-and-set token rotation for the refresh cycle. Returns false
    /// without mutating anything if the session changed (logout or re-login)
    /// since `expected_epoch` was observed.
    pub fn rotate_tokens(
        &self,
        expected_epoch: u64,
        access_token: String,
        refresh_token: Option<String>,
    ) -> bool {
        let snapshot = {
            let mut state = self.lock();
            if state.epoch != expected_epoch {
                debug!("Stale token rotation dropped (epoch moved)");
                return false;
            }
            state.session.access_token = Some(access_token);
            if let Some(refresh) = refresh_token {
                state.session.refresh_token = Some(refresh);
            }
            state.session.clone()
        };
        self.persist(&snapshot);
        true
    }

    /// Clears tokens and the cached profile. Never fails, even with storage
    /// unavailable. The fallback-mode flag is sticky and survives the clear;
    /// only an explicit connectivity re-probe resets it.
    pub fn clear(&self) {
        let snapshot = {
            let mut state = self.lock();
            state.epoch += 1;
            state.session.access_token = None;
            state.session.refresh_token = None;
            state.session.user = None;
            state.session.clone()
        };
        self.persist(&snapshot);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        // Session state is plain data; a poisoned lock still holds it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.try_persist(session) {
            warn!("Failed to persist session state: {e}");
        }
    }

    fn try_persist(&self, session: &Session) -> std::io::Result<()> {
        let bytes = serde_json::to_vec_pretty(session)?;
        let tmp = self.state_path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.state_path)
    }
}
