//! Session context
//!
//! Holds the bearer token shared by the telemetry client and the dashboard.
//! The session is passed around explicitly; nothing reads it from ambient
//! storage.
//!
//! Lifecycle: `Anonymous -> Authenticated -> TornDown`. A torn down session
//! can be authenticated again by logging in.

use std::sync::Arc;

use tokio::sync::watch;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TearDownReason {
    /// The backend rejected the token (HTTP 401)
    Unauthorized,
    /// The user logged out
    Logout,
}

/// Current session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No token has been issued yet
    Anonymous,
    /// Holding a bearer token
    Authenticated {
        /// Bearer token sent with every request
        token: String,
    },
    /// The token was dropped
    TornDown {
        /// What ended the session
        reason: TearDownReason,
    },
}

/// Shared, cloneable session handle
#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<watch::Sender<SessionState>>,
}

impl Session {
    /// A session with no token
    pub fn anonymous() -> Self {
        Self::with_state(SessionState::Anonymous)
    }

    /// A session restored from an existing token
    pub fn authenticated(token: impl Into<String>) -> Self {
        Self::with_state(SessionState::Authenticated {
            token: token.into(),
        })
    }

    fn with_state(state: SessionState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Bearer token, if authenticated
    pub fn token(&self) -> Option<String> {
        match &*self.state.borrow() {
            SessionState::Authenticated { token } => Some(token.clone()),
            _ => None,
        }
    }

    /// Whether a token is held
    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.borrow(), SessionState::Authenticated { .. })
    }

    /// Whether the UI must route to the login screen
    pub fn requires_login(&self) -> bool {
        !self.is_authenticated()
    }

    /// Store a token after a successful login
    pub fn authenticate(&self, token: impl Into<String>) {
        self.state.send_replace(SessionState::Authenticated {
            token: token.into(),
        });
    }

    /// Drop the token and notify subscribers
    ///
    /// Tearing down an already torn down session is a no-op, so concurrent
    /// 401 responses produce a single notification.
    pub fn tear_down(&self, reason: TearDownReason) {
        let changed = self.state.send_if_modified(|state| match state {
            SessionState::TornDown { .. } => false,
            _ => {
                *state = SessionState::TornDown { reason };
                true
            }
        });
        if changed {
            tracing::info!(?reason, "Session torn down");
        }
    }

    /// Tear down only if the session still holds `presented`
    ///
    /// `presented` is the token a rejected request carried, `None` for an
    /// anonymous request. A session that has since logged in again keeps its
    /// new token. Returns whether the session was torn down.
    pub fn tear_down_if_current(&self, presented: Option<&str>, reason: TearDownReason) -> bool {
        let changed = self.state.send_if_modified(|state| {
            let current = match state {
                SessionState::TornDown { .. } => return false,
                SessionState::Anonymous => None,
                SessionState::Authenticated { token } => Some(token.as_str()),
            };
            if current != presented {
                return false;
            }
            *state = SessionState::TornDown { reason };
            true
        });
        if changed {
            tracing::info!(?reason, "Session torn down");
        } else {
            tracing::debug!(?reason, "Ignoring rejection of a replaced token");
        }
        changed
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}
