//! Application state snapshot and shared handle.
//!
//! [`AppState`] is the single source of truth for everything presentation
//! needs: backend connectivity, in-flight status, the last error, and the
//! last successful result. It is mutated only by
//! [`AppController`](super::AppController).
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<AppState>>`: cheap to
//! clone and safe to share across tasks.

use std::sync::{Arc, Mutex};

use crate::api::QueryResult;

// ---------------------------------------------------------------------------
// Connectivity
// ---------------------------------------------------------------------------

/// The client's belief about backend reachability.
///
/// Established once by the startup health probe; a probe failure is
/// authoritative and overrides any stale `Connected` immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// The startup probe has not resolved yet.
    Checking,
    /// The probe succeeded; submissions are allowed.
    Connected,
    /// The probe failed; submissions are blocked until a re-probe succeeds.
    Disconnected,
}

impl Connectivity {
    /// A short human-readable label for the status banner.
    pub fn label(&self) -> &'static str {
        match self {
            Connectivity::Checking => "Connecting to API...",
            Connectivity::Connected => "API Connected",
            Connectivity::Disconnected => "API Disconnected",
        }
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Connectivity::Checking
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Single state snapshot consumed by presentation.
///
/// After any completed submission at most one of `error` / `result` is
/// non-`None`; a new submission clears both before setting `loading`.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Backend reachability as established by the health probe.
    pub connectivity: Connectivity,
    /// Whether a submission is in flight. New submissions are rejected
    /// outright while this is `true`, never queued or superseded.
    pub loading: bool,
    /// Message from the last failed submission.
    pub error: Option<String>,
    /// The last successful query result.
    pub result: Option<QueryResult>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset error and result; connectivity and loading are untouched.
    pub fn clear_results(&mut self) {
        self.error = None;
        self.result = None;
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`AppState`].
///
/// Cheap to clone (`Arc` clone). Lock for a short critical section; do
/// **not** hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<AppState>>;

/// Construct a new [`SharedState`] wrapping a default [`AppState`].
pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(AppState::new()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
