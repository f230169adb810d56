//! Query submission: validation, dispatch, and outcome mapping.
//!
//! [`QuerySubmitter`] accepts either text or a finished audio payload,
//! dispatches to the matching [`ApiService`] method, and collapses the
//! result into exactly one [`SubmitOutcome`]. Invalid input is rejected
//! before any network call is made. No retries happen at this layer.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiService, QueryResult};

// ---------------------------------------------------------------------------
// QueryInput
// ---------------------------------------------------------------------------

/// What the user is submitting.
#[derive(Debug, Clone)]
pub enum QueryInput {
    /// A natural-language question.
    Text(String),
    /// A finished audio recording.
    Voice(Vec<u8>),
    /// A raw SQL statement, executed verbatim by the server.
    Sql(String),
}

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// Input rejected before any network call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("query text is empty")]
    EmptyText,

    #[error("audio payload is empty")]
    EmptyAudio,

    #[error("sql statement is empty")]
    EmptySql,
}

// ---------------------------------------------------------------------------
// SubmitOutcome
// ---------------------------------------------------------------------------

/// The single outcome of a completed submission attempt.
///
/// A [`QueryResult`] with zero rows is still [`SubmitOutcome::Success`];
/// emptiness is data, not an error.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The server answered and the payload validated.
    Success(QueryResult),
    /// The server answered but declared the request unsuccessful, or sent a
    /// success payload missing required fields.
    DomainFailure(String),
    /// The network exchange itself failed (unreachable, timeout, garbage).
    TransportFailure(String),
}

// ---------------------------------------------------------------------------
// QuerySubmitter
// ---------------------------------------------------------------------------

/// Stateless submission controller over an [`ApiService`].
pub struct QuerySubmitter {
    api: Arc<dyn ApiService>,
}

impl QuerySubmitter {
    pub fn new(api: Arc<dyn ApiService>) -> Self {
        Self { api }
    }

    /// Validate `input`, dispatch it, and map the result.
    ///
    /// Returns `Err(ValidationError)` without touching the network for empty
    /// text (after trimming), an empty audio payload, or empty SQL.
    pub async fn submit(&self, input: QueryInput) -> Result<SubmitOutcome, ValidationError> {
        let response = match input {
            QueryInput::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::EmptyText);
                }
                self.api.submit_text_query(trimmed).await
            }
            QueryInput::Voice(audio) => {
                if audio.is_empty() {
                    return Err(ValidationError::EmptyAudio);
                }
                self.api.submit_voice_query(audio).await
            }
            QueryInput::Sql(sql) => {
                let trimmed = sql.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::EmptySql);
                }
                self.api.execute_raw_sql(trimmed).await
            }
        };

        let outcome = match response {
            Ok(resp) => match QueryResult::from_response(resp) {
                Ok(result) => SubmitOutcome::Success(result),
                Err(e) => SubmitOutcome::DomainFailure(e.to_string()),
            },
            Err(e) => SubmitOutcome::TransportFailure(e.to_string()),
        };

        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
