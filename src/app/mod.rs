//! Application state machine.
//!
//! [`AppState`] is the single snapshot consumed by presentation;
//! [`AppController`] is its sole mutator, sequencing the health probe,
//! voice capture hand-off, and query submission.

pub mod controller;
pub mod state;

pub use controller::AppController;
pub use state::{new_shared_state, AppState, Connectivity, SharedState};
