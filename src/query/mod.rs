//! Query submission layer.
//!
//! [`QuerySubmitter`] sits between the application controller and the API
//! client: it validates input, dispatches to the right endpoint, and maps
//! every completion into exactly one [`SubmitOutcome`].

pub mod submit;

pub use submit::{QueryInput, QuerySubmitter, SubmitOutcome, ValidationError};
