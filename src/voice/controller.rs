//! Voice capture state machine.
//!
//! [`VoiceCaptureController`] owns one recording session at a time:
//!
//! ```text
//! Idle ──start──▶ RequestingDevice ──grant──▶ Recording
//!                        │                        │
//!                        └──denied──▶ Failed      ├──stop, data──▶ Finalizing ──▶ Idle (payload)
//!                                                 ├──stop, empty─▶ Finalizing ──▶ Failed
//!                                                 └──device error─────────────▶ Failed
//! ```
//!
//! The device handle is held iff the state is `Recording` or `Finalizing`
//! and is released through [`DeviceGuard`]'s drop on every exit path. Start
//! requests while a session is active are ignored, not queued. Stop keeps
//! the audio buffered up to the stop point: it finalizes, never discards.

use std::sync::mpsc;
use std::sync::Arc;

use super::backend::{ChunkMessage, ChunkReceiver, DeviceGuard, RecorderBackend, VoiceError};

// ---------------------------------------------------------------------------
// CaptureState
// ---------------------------------------------------------------------------

/// States of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No session; a start request is accepted.
    Idle,
    /// Waiting for the backend to grant the device.
    RequestingDevice,
    /// Device held; chunks are buffering in arrival order.
    Recording,
    /// Stop issued; buffered chunks are being assembled.
    Finalizing,
    /// The last session ended in an error (see `last_error`).
    Failed,
}

impl CaptureState {
    /// A short human-readable label for status display.
    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::Idle => "Idle",
            CaptureState::RequestingDevice => "Requesting device",
            CaptureState::Recording => "Recording",
            CaptureState::Finalizing => "Finalizing",
            CaptureState::Failed => "Failed",
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceCaptureController
// ---------------------------------------------------------------------------

/// Owns the microphone-acquisition and recording state machine.
pub struct VoiceCaptureController {
    backend: Arc<dyn RecorderBackend>,
    state: CaptureState,
    chunks: Vec<Vec<u8>>,
    chunk_rx: Option<ChunkReceiver>,
    guard: Option<DeviceGuard>,
    last_error: Option<VoiceError>,
}

impl VoiceCaptureController {
    pub fn new(backend: Arc<dyn RecorderBackend>) -> Self {
        Self {
            backend,
            state: CaptureState::Idle,
            chunks: Vec::new(),
            chunk_rx: None,
            guard: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    /// The error that put the controller into `Failed`, if any.
    pub fn last_error(&self) -> Option<&VoiceError> {
        self.last_error.as_ref()
    }

    /// Begin a recording session.
    ///
    /// Ignored (returns `Ok`) while a session is already active. From
    /// `Failed` a new attempt is accepted only when the previous error is
    /// retryable; an unsupported environment stays `Failed` permanently.
    pub fn start(&mut self) -> Result<(), VoiceError> {
        match self.state {
            CaptureState::RequestingDevice
            | CaptureState::Recording
            | CaptureState::Finalizing => {
                log::debug!("voice: start ignored, session already active");
                return Ok(());
            }
            CaptureState::Failed => {
                if let Some(err) = &self.last_error {
                    if !err.is_retryable() {
                        return Err(err.clone());
                    }
                }
            }
            CaptureState::Idle => {}
        }

        if !self.backend.is_supported() {
            let err = VoiceError::CapabilityUnsupported;
            self.state = CaptureState::Failed;
            self.last_error = Some(err.clone());
            return Err(err);
        }

        self.state = CaptureState::RequestingDevice;
        self.chunks.clear();

        let (tx, rx) = mpsc::channel();
        match self.backend.open(tx) {
            Ok(guard) => {
                self.guard = Some(guard);
                self.chunk_rx = Some(rx);
                self.last_error = None;
                self.state = CaptureState::Recording;
                log::info!("voice: recording started");
                Ok(())
            }
            Err(e) => {
                self.state = CaptureState::Failed;
                self.last_error = Some(e.clone());
                log::warn!("voice: device acquisition failed: {e}");
                Err(e)
            }
        }
    }

    /// Drain pending backend messages while recording.
    ///
    /// Returns the error if a device/runtime fault arrived, after failing
    /// the session (handle released, buffer cleared). Callers poll this
    /// between suspension points so a dying device is noticed before stop.
    pub fn poll(&mut self) -> Option<VoiceError> {
        if self.state != CaptureState::Recording {
            return None;
        }
        match self.drain_pending() {
            Ok(()) => None,
            Err(e) => {
                self.fail_session(e.clone());
                Some(e)
            }
        }
    }

    /// Stop the session and assemble the payload.
    ///
    /// Returns `Ok(None)` when nothing was recording. On success the payload
    /// is the buffered chunks concatenated in arrival order and the
    /// controller returns to `Idle`. A zero-byte payload fails the session
    /// with [`VoiceError::EmptyRecording`]. The device is released before
    /// any of those outcomes is decided.
    pub fn stop(&mut self) -> Result<Option<Vec<u8>>, VoiceError> {
        if self.state != CaptureState::Recording {
            log::debug!("voice: stop ignored, not recording");
            return Ok(None);
        }

        self.state = CaptureState::Finalizing;

        // Release the device first: the capture thread drops its sender, so
        // the drain below sees every buffered chunk and then disconnects.
        self.guard = None;

        if let Err(e) = self.drain_pending() {
            self.fail_session(e.clone());
            return Err(e);
        }

        let total: usize = self.chunks.iter().map(Vec::len).sum();
        if total == 0 {
            self.fail_session(VoiceError::EmptyRecording);
            return Err(VoiceError::EmptyRecording);
        }

        let mut payload = Vec::with_capacity(total);
        for chunk in self.chunks.drain(..) {
            payload.extend_from_slice(&chunk);
        }
        self.chunk_rx = None;
        self.state = CaptureState::Idle;
        log::info!("voice: recording finalized ({} bytes)", payload.len());
        Ok(Some(payload))
    }

    /// Pull every available message off the chunk channel, appending data
    /// chunks in arrival order. A backend error message aborts the drain.
    fn drain_pending(&mut self) -> Result<(), VoiceError> {
        let Some(rx) = &self.chunk_rx else {
            return Ok(());
        };
        loop {
            match rx.try_recv() {
                Ok(ChunkMessage::Data(chunk)) => self.chunks.push(chunk),
                Ok(ChunkMessage::Error(msg)) => {
                    return Err(VoiceError::DeviceUnavailable(msg));
                }
                Err(_) => return Ok(()),
            }
        }
    }

    /// Force the session into `Failed`: release the handle, clear the
    /// buffer, retain the error. No partial payload is ever emitted.
    fn fail_session(&mut self, err: VoiceError) {
        self.guard = None;
        self.chunks.clear();
        self.chunk_rx = None;
        self.state = CaptureState::Failed;
        log::warn!("voice: session failed: {err}");
        self.last_error = Some(err);
    }
}

impl Drop for VoiceCaptureController {
    fn drop(&mut self) {
        // Guard drop releases the device if a session was still active.
        self.guard = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::backend::ChunkSender;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted recorder backend: delivers a fixed message sequence at open
    /// time and tracks device release through an `AtomicBool`.
    struct MockRecorder {
        supported: bool,
        grant: AtomicBool,
        script: Mutex<Vec<ChunkMessage>>,
        released: Arc<AtomicBool>,
        opens: AtomicUsize,
    }

    impl MockRecorder {
        fn new(script: Vec<ChunkMessage>) -> Arc<Self> {
            Arc::new(Self {
                supported: true,
                grant: AtomicBool::new(true),
                script: Mutex::new(script),
                released: Arc::new(AtomicBool::new(false)),
                opens: AtomicUsize::new(0),
            })
        }

        fn unsupported() -> Arc<Self> {
            Arc::new(Self {
                supported: false,
                grant: AtomicBool::new(true),
                script: Mutex::new(Vec::new()),
                released: Arc::new(AtomicBool::new(false)),
                opens: AtomicUsize::new(0),
            })
        }

        fn denying(script: Vec<ChunkMessage>) -> Arc<Self> {
            let mock = Self::new(script);
            mock.grant.store(false, Ordering::SeqCst);
            mock
        }

        fn released(&self) -> bool {
            self.released.load(Ordering::SeqCst)
        }
    }

    impl RecorderBackend for MockRecorder {
        fn is_supported(&self) -> bool {
            self.supported
        }

        fn open(&self, tx: ChunkSender) -> Result<DeviceGuard, VoiceError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if !self.grant.load(Ordering::SeqCst) {
                return Err(VoiceError::DeviceUnavailable("permission denied".into()));
            }

            for msg in self.script.lock().unwrap().drain(..) {
                let _ = tx.send(msg);
            }

            self.released.store(false, Ordering::SeqCst);
            let released = Arc::clone(&self.released);
            Ok(DeviceGuard::new(move || {
                released.store(true, Ordering::SeqCst);
            }))
        }
    }

    fn data(bytes: &[u8]) -> ChunkMessage {
        ChunkMessage::Data(bytes.to_vec())
    }

    #[test]
    fn stop_concatenates_chunks_in_arrival_order() {
        let mock = MockRecorder::new(vec![data(b"one"), data(b"two"), data(b"three")]);
        let mut ctrl = VoiceCaptureController::new(Arc::clone(&mock) as Arc<dyn RecorderBackend>);

        ctrl.start().unwrap();
        assert_eq!(ctrl.state(), CaptureState::Recording);

        let payload = ctrl.stop().unwrap().unwrap();
        assert_eq!(payload, b"onetwothree");
        assert_eq!(ctrl.state(), CaptureState::Idle);
        assert!(mock.released());
    }

    /// Swapping two distinct chunks must change the payload.
    #[test]
    fn chunk_order_is_significant() {
        let c1: Vec<u8> = vec![1, 2, 3];
        let c2: Vec<u8> = vec![3, 2, 1];

        let forward = MockRecorder::new(vec![data(&c1), data(&c2)]);
        let mut ctrl = VoiceCaptureController::new(forward as Arc<dyn RecorderBackend>);
        ctrl.start().unwrap();
        let payload_forward = ctrl.stop().unwrap().unwrap();

        let swapped = MockRecorder::new(vec![data(&c2), data(&c1)]);
        let mut ctrl = VoiceCaptureController::new(swapped as Arc<dyn RecorderBackend>);
        ctrl.start().unwrap();
        let payload_swapped = ctrl.stop().unwrap().unwrap();

        assert_ne!(payload_forward, payload_swapped);
    }

    #[test]
    fn unsupported_environment_fails_without_acquisition() {
        let mock = MockRecorder::unsupported();
        let mut ctrl = VoiceCaptureController::new(Arc::clone(&mock) as Arc<dyn RecorderBackend>);

        let err = ctrl.start().unwrap_err();
        assert_eq!(err, VoiceError::CapabilityUnsupported);
        assert_eq!(ctrl.state(), CaptureState::Failed);
        assert_eq!(mock.opens.load(Ordering::SeqCst), 0);

        // Not retryable: a second start stays Failed.
        let err = ctrl.start().unwrap_err();
        assert_eq!(err, VoiceError::CapabilityUnsupported);
        assert_eq!(ctrl.state(), CaptureState::Failed);
        assert_eq!(mock.opens.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn denied_grant_fails_but_is_retryable() {
        let mock = MockRecorder::denying(vec![data(b"later")]);
        let mut ctrl = VoiceCaptureController::new(Arc::clone(&mock) as Arc<dyn RecorderBackend>);

        let err = ctrl.start().unwrap_err();
        assert!(matches!(err, VoiceError::DeviceUnavailable(_)));
        assert_eq!(ctrl.state(), CaptureState::Failed);

        // Permission granted on the retry.
        mock.grant.store(true, Ordering::SeqCst);
        ctrl.start().unwrap();
        assert_eq!(ctrl.state(), CaptureState::Recording);
        let payload = ctrl.stop().unwrap().unwrap();
        assert_eq!(payload, b"later");
    }

    #[test]
    fn stop_with_no_chunks_is_empty_recording() {
        let mock = MockRecorder::new(Vec::new());
        let mut ctrl = VoiceCaptureController::new(Arc::clone(&mock) as Arc<dyn RecorderBackend>);

        ctrl.start().unwrap();
        let err = ctrl.stop().unwrap_err();
        assert_eq!(err, VoiceError::EmptyRecording);
        assert_eq!(ctrl.state(), CaptureState::Failed);
        assert!(mock.released());
    }

    /// Chunks may arrive with zero bytes; only total captured bytes count.
    #[test]
    fn stop_with_only_zero_byte_chunks_is_empty_recording() {
        let mock = MockRecorder::new(vec![data(b""), data(b"")]);
        let mut ctrl = VoiceCaptureController::new(Arc::clone(&mock) as Arc<dyn RecorderBackend>);

        ctrl.start().unwrap();
        let err = ctrl.stop().unwrap_err();
        assert_eq!(err, VoiceError::EmptyRecording);
        assert!(mock.released());
    }

    #[test]
    fn runtime_error_at_stop_fails_session_and_releases() {
        let mock = MockRecorder::new(vec![
            data(b"partial"),
            ChunkMessage::Error("device unplugged".into()),
        ]);
        let mut ctrl = VoiceCaptureController::new(Arc::clone(&mock) as Arc<dyn RecorderBackend>);

        ctrl.start().unwrap();
        let err = ctrl.stop().unwrap_err();
        assert!(matches!(err, VoiceError::DeviceUnavailable(_)));
        assert_eq!(ctrl.state(), CaptureState::Failed);
        // No partial payload survives the failure.
        assert!(ctrl.chunks.is_empty());
        assert!(mock.released());
    }

    #[test]
    fn poll_detects_runtime_error_while_recording() {
        let mock = MockRecorder::new(vec![
            data(b"chunk"),
            ChunkMessage::Error("stream died".into()),
        ]);
        let mut ctrl = VoiceCaptureController::new(Arc::clone(&mock) as Arc<dyn RecorderBackend>);

        ctrl.start().unwrap();
        let err = ctrl.poll().expect("poll must surface the device error");
        assert!(matches!(err, VoiceError::DeviceUnavailable(_)));
        assert_eq!(ctrl.state(), CaptureState::Failed);
        assert!(mock.released());
    }

    #[test]
    fn start_while_recording_is_a_no_op() {
        let mock = MockRecorder::new(vec![data(b"bytes")]);
        let mut ctrl = VoiceCaptureController::new(Arc::clone(&mock) as Arc<dyn RecorderBackend>);

        ctrl.start().unwrap();
        ctrl.start().unwrap();
        assert_eq!(ctrl.state(), CaptureState::Recording);
        assert_eq!(mock.opens.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_while_idle_is_a_no_op() {
        let mock = MockRecorder::new(Vec::new());
        let mut ctrl = VoiceCaptureController::new(mock as Arc<dyn RecorderBackend>);

        assert!(ctrl.stop().unwrap().is_none());
        assert_eq!(ctrl.state(), CaptureState::Idle);
    }
}
