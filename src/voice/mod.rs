//! Voice capture: microphone acquisition, chunk buffering, payload assembly.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → capture thread → ChunkMessage (mpsc) → VoiceCaptureController
//!           → finalized payload (ordered chunk concatenation) → submission
//! ```
//!
//! The host audio stack sits behind [`RecorderBackend`] so the state machine
//! is testable without hardware; [`CpalRecorder`] is the production backend.
//! The device handle is scoped to a [`DeviceGuard`] and released on drop,
//! on every exit path, including errors.

pub mod backend;
pub mod capture;
pub mod controller;

pub use backend::{ChunkMessage, ChunkReceiver, ChunkSender, DeviceGuard, RecorderBackend, VoiceError};
pub use capture::CpalRecorder;
pub use controller::{CaptureState, VoiceCaptureController};
