//! Recorder capability seam: [`RecorderBackend`], [`DeviceGuard`] and the
//! chunk channel message type.
//!
//! The backend abstracts the host audio stack behind a small trait so the
//! capture state machine can be driven by a mock in tests and by
//! [`CpalRecorder`](super::CpalRecorder) in production. A host without any
//! input device simply reports `is_supported() == false`.

use std::sync::mpsc;

use thiserror::Error;

// ---------------------------------------------------------------------------
// VoiceError
// ---------------------------------------------------------------------------

/// Failures of the voice capture flow.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VoiceError {
    /// The execution environment has no audio-capture capability at all.
    /// Not retryable; the capability will not appear later.
    #[error("voice recording is not supported in this environment")]
    CapabilityUnsupported,

    /// Device acquisition was denied or the hardware failed. Retryable.
    #[error("microphone unavailable: {0}")]
    DeviceUnavailable(String),

    /// Stop was issued with zero captured bytes.
    #[error("recording captured no audio")]
    EmptyRecording,
}

impl VoiceError {
    /// Whether a new recording attempt may succeed after this failure.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, VoiceError::CapabilityUnsupported)
    }
}

// ---------------------------------------------------------------------------
// ChunkMessage
// ---------------------------------------------------------------------------

/// A message from the capture backend to the controller.
#[derive(Debug, Clone)]
pub enum ChunkMessage {
    /// One buffer of encoded audio bytes, delivered in arrival order.
    Data(Vec<u8>),
    /// A device/runtime error after acquisition. The session must fail and
    /// release the device; no partial payload is emitted.
    Error(String),
}

/// Sender half of the chunk channel handed to [`RecorderBackend::open`].
pub type ChunkSender = mpsc::Sender<ChunkMessage>;

/// Receiver half kept by the capture controller.
pub type ChunkReceiver = mpsc::Receiver<ChunkMessage>;

// ---------------------------------------------------------------------------
// DeviceGuard
// ---------------------------------------------------------------------------

/// Scoped ownership of the capture device.
///
/// Dropping the guard releases the device unconditionally. This is the one
/// resource-safety invariant of the system, so release goes through `Drop`
/// rather than a cleanup method that an error path could skip.
pub struct DeviceGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl DeviceGuard {
    /// Wrap a release action to run exactly once when the guard is dropped.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderBackend trait
// ---------------------------------------------------------------------------

/// Host audio-capture capability.
///
/// `open` acquires the device and begins delivering [`ChunkMessage`]s on
/// `tx`; the returned [`DeviceGuard`] owns the device for the session and
/// releases it on drop. Implementors must be `Send + Sync` so the backend
/// can be shared as `Arc<dyn RecorderBackend>`.
pub trait RecorderBackend: Send + Sync {
    /// Whether this environment can capture audio at all.
    fn is_supported(&self) -> bool;

    /// Acquire the device and start streaming chunks to `tx`.
    fn open(&self, tx: ChunkSender) -> Result<DeviceGuard, VoiceError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn guard_runs_release_exactly_once_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::clone(&count);

        let guard = DeviceGuard::new(move || {
            count2.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);

        drop(guard);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn capability_unsupported_is_not_retryable() {
        assert!(!VoiceError::CapabilityUnsupported.is_retryable());
        assert!(VoiceError::DeviceUnavailable("denied".into()).is_retryable());
        assert!(VoiceError::EmptyRecording.is_retryable());
    }
}
