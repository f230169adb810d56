//! Application controller, the sole mutator of [`AppState`].
//!
//! [`AppController`] sequences the health probe, query submission, and
//! result reconciliation:
//!
//! ```text
//! startup ──▶ health probe ──▶ Connected / Disconnected (+ notification)
//!
//! submit_text / submit_voice
//!   ├─ guard: connectivity == Connected, !loading, non-empty input
//!   ├─ loading = true, error = None, result = None   (one lock scope)
//!   ├─ QuerySubmitter::submit (suspension point)
//!   └─ loading = false, exactly one of {result, error} set
//! ```
//!
//! Submissions are never queued or parallelized: while one is in flight,
//! new submit calls return without touching state, and the in-flight call
//! always completes.

use std::sync::Arc;

use crate::api::ApiService;
use crate::notify::{Notifier, Severity};
use crate::query::{QueryInput, QuerySubmitter, SubmitOutcome};

use super::state::{new_shared_state, AppState, Connectivity, SharedState};

// ---------------------------------------------------------------------------
// AppController
// ---------------------------------------------------------------------------

/// Drives the application state machine.
///
/// Holds the [`SharedState`] snapshot, the API client (for the health
/// probe), the [`QuerySubmitter`], and the notification sink.
pub struct AppController {
    state: SharedState,
    api: Arc<dyn ApiService>,
    submitter: QuerySubmitter,
    notifier: Arc<dyn Notifier>,
}

impl AppController {
    pub fn new(api: Arc<dyn ApiService>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: new_shared_state(),
            submitter: QuerySubmitter::new(Arc::clone(&api)),
            api,
            notifier,
        }
    }

    /// Shared handle to the state snapshot (for presentation).
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// A point-in-time copy of the state.
    pub fn snapshot(&self) -> AppState {
        self.state.lock().unwrap().clone()
    }

    // -----------------------------------------------------------------------
    // Health probe
    // -----------------------------------------------------------------------

    /// Probe the backend and settle connectivity.
    ///
    /// A failed probe is authoritative: connectivity becomes `Disconnected`
    /// immediately and a notification is emitted. There is no automatic
    /// retry; the user re-triggers this probe explicitly.
    pub async fn check_health(&self) {
        {
            let mut st = self.state.lock().unwrap();
            st.connectivity = Connectivity::Checking;
        }

        match self.api.health_check().await {
            Ok(()) => {
                log::info!("health probe succeeded");
                let mut st = self.state.lock().unwrap();
                st.connectivity = Connectivity::Connected;
            }
            Err(e) => {
                log::warn!("health probe failed: {e}");
                {
                    let mut st = self.state.lock().unwrap();
                    st.connectivity = Connectivity::Disconnected;
                }
                self.notifier
                    .notify(Severity::Error, "Unable to connect to API server");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Submissions
    // -----------------------------------------------------------------------

    /// Submit a typed question. Returns `true` when a submission actually
    /// ran; empty input and guard rejections are no-ops.
    pub async fn submit_text(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            // Validation failure stays local: no network, no state change.
            log::debug!("submit_text rejected: empty input");
            return false;
        }
        self.run_submission(QueryInput::Text(trimmed.to_string()))
            .await
    }

    /// Submit a finished audio recording. Returns `true` when a submission
    /// actually ran.
    pub async fn submit_voice(&self, audio: Vec<u8>) -> bool {
        if audio.is_empty() {
            log::debug!("submit_voice rejected: empty payload");
            return false;
        }
        self.run_submission(QueryInput::Voice(audio)).await
    }

    /// Submit a raw SQL statement. Returns `true` when a submission ran.
    pub async fn submit_sql(&self, sql: &str) -> bool {
        let trimmed = sql.trim();
        if trimmed.is_empty() {
            log::debug!("submit_sql rejected: empty statement");
            return false;
        }
        self.run_submission(QueryInput::Sql(trimmed.to_string()))
            .await
    }

    /// Reset error and result; connectivity and loading are untouched.
    pub fn clear_results(&self) {
        let mut st = self.state.lock().unwrap();
        st.clear_results();
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn run_submission(&self, input: QueryInput) -> bool {
        if !self.begin_submission() {
            return false;
        }

        match self.submitter.submit(input).await {
            Ok(outcome) => self.finish_submission(outcome),
            Err(e) => {
                // Input was validated before begin_submission; reaching this
                // arm means the guards disagree. Roll the loading flag back.
                log::warn!("submission rejected after guard passed: {e}");
                let mut st = self.state.lock().unwrap();
                st.loading = false;
            }
        }
        true
    }

    /// Apply the submission guards and, if they pass, enter the loading
    /// state in a single lock scope so observers never see `loading == true`
    /// next to a stale result.
    fn begin_submission(&self) -> bool {
        let mut st = self.state.lock().unwrap();
        if st.connectivity != Connectivity::Connected {
            log::debug!("submission rejected: backend not connected");
            return false;
        }
        if st.loading {
            log::debug!("submission rejected: another query is in flight");
            return false;
        }
        st.loading = true;
        st.error = None;
        st.result = None;
        true
    }

    /// Reconcile a completed submission: `loading` drops and exactly one of
    /// `result` / `error` is set.
    fn finish_submission(&self, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Success(result) => {
                if let Some(text) = &result.transcribed_text {
                    self.notifier
                        .notify(Severity::Success, &format!("Voice recognized: \"{text}\""));
                }
                let mut st = self.state.lock().unwrap();
                st.loading = false;
                st.result = Some(result);
            }
            SubmitOutcome::DomainFailure(msg) | SubmitOutcome::TransportFailure(msg) => {
                {
                    let mut st = self.state.lock().unwrap();
                    st.loading = false;
                    st.error = Some(msg.clone());
                }
                self.notifier.notify(Severity::Error, &msg);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
