//! Natural-language database query client.
//!
//! The crate wraps a remote query-interpretation service: the user asks a
//! question about a database by typing or by voice, the service turns it
//! into SQL, runs it, and returns structured results. Three controllers do
//! the client-side work:
//!
//! * [`voice::VoiceCaptureController`]: microphone acquisition and the
//!   recording state machine; produces a finished audio payload.
//! * [`query::QuerySubmitter`]: validates input, dispatches to the API,
//!   and maps every completion into one [`query::SubmitOutcome`].
//! * [`app::AppController`]: owns the [`app::AppState`] snapshot of
//!   connectivity, loading, last error, last result.
//!
//! The remote service is reached through the [`api::ApiService`] trait
//! ([`api::HttpApiClient`] in production); notifications go through the
//! [`notify::Notifier`] seam.

pub mod api;
pub mod app;
pub mod config;
pub mod notify;
pub mod query;
pub mod voice;
