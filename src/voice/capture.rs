//! Microphone capture via `cpal`.
//!
//! [`CpalRecorder`] implements [`RecorderBackend`] with a dedicated capture
//! thread that owns the cpal stream (`cpal::Stream` is not `Send`, so the
//! stream never crosses threads). The thread emits a streaming WAV header
//! followed by 16-bit PCM chunks, then parks until the [`DeviceGuard`] is
//! dropped; the drop stops the thread and with it the hardware stream.

use std::sync::mpsc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::config::AudioConfig;

use super::backend::{ChunkMessage, ChunkSender, DeviceGuard, RecorderBackend, VoiceError};

/// How long `open` waits for the capture thread to acquire the device.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// WAV framing
// ---------------------------------------------------------------------------

/// Build a 44-byte WAV header for a 16-bit PCM stream of unknown length.
///
/// The RIFF and data sizes are set to `0xFFFF_FFFF`, the streaming
/// convention for writers that cannot seek back to patch them.
pub(crate) fn wav_stream_header(sample_rate: u32, channels: u16) -> [u8; 44] {
    let byte_rate = sample_rate * u32::from(channels) * 2;
    let block_align = channels * 2;

    let mut header = [0u8; 44];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&16u16.to_le_bytes()); // bits per sample
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&u32::MAX.to_le_bytes());
    header
}

/// Convert interleaved `f32` samples in `[-1.0, 1.0]` to little-endian
/// 16-bit PCM bytes.
fn f32_to_i16_bytes(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let clamped = s.clamp(-1.0, 1.0);
        let value = (clamped * f32::from(i16::MAX)) as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

// ---------------------------------------------------------------------------
// CpalRecorder
// ---------------------------------------------------------------------------

/// Recorder backend built on the system default audio host.
pub struct CpalRecorder {
    /// Preferred input device name; `None` means the system default.
    device_name: Option<String>,
}

impl CpalRecorder {
    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            device_name: config.device.clone(),
        }
    }
}

impl RecorderBackend for CpalRecorder {
    fn is_supported(&self) -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn open(&self, tx: ChunkSender) -> Result<DeviceGuard, VoiceError> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), VoiceError>>();
        let device_name = self.device_name.clone();

        let join = std::thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || capture_thread(device_name, tx, stop_rx, ready_tx))
            .map_err(|e| VoiceError::DeviceUnavailable(e.to_string()))?;

        match ready_rx.recv_timeout(ACQUIRE_TIMEOUT) {
            Ok(Ok(())) => Ok(DeviceGuard::new(move || {
                let _ = stop_tx.send(());
                let _ = join.join();
            })),
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(_) => {
                // Thread wedged or died before reporting; make sure it stops.
                let _ = stop_tx.send(());
                let _ = join.join();
                Err(VoiceError::DeviceUnavailable(
                    "device acquisition timed out".into(),
                ))
            }
        }
    }
}

/// Body of the capture thread: acquire the device, stream chunks, park
/// until stopped. The cpal stream lives and dies entirely on this thread.
fn capture_thread(
    device_name: Option<String>,
    tx: ChunkSender,
    stop_rx: mpsc::Receiver<()>,
    ready_tx: mpsc::Sender<Result<(), VoiceError>>,
) {
    let host = cpal::default_host();

    let device = match &device_name {
        Some(name) => host
            .input_devices()
            .ok()
            .and_then(|mut devices| {
                devices.find(|d| d.name().map(|n| &n == name).unwrap_or(false))
            }),
        None => host.default_input_device(),
    };

    let device = match device {
        Some(d) => d,
        None => {
            let _ = ready_tx.send(Err(VoiceError::DeviceUnavailable(
                "no matching input device".into(),
            )));
            return;
        }
    };

    let supported = match device.default_input_config() {
        Ok(c) => c,
        Err(e) => {
            let _ = ready_tx.send(Err(VoiceError::DeviceUnavailable(e.to_string())));
            return;
        }
    };

    let channels = supported.channels();
    let sample_rate = supported.sample_rate().0;
    let config: cpal::StreamConfig = supported.into();

    // Header first so the concatenated chunks form a playable WAV stream.
    let _ = tx.send(ChunkMessage::Data(
        wav_stream_header(sample_rate, channels).to_vec(),
    ));

    let data_tx = tx.clone();
    let err_tx = tx;

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // Ignore send errors; the receiver may have been dropped.
            let _ = data_tx.send(ChunkMessage::Data(f32_to_i16_bytes(data)));
        },
        move |err: cpal::StreamError| {
            log::error!("cpal stream error: {err}");
            let _ = err_tx.send(ChunkMessage::Error(err.to_string()));
        },
        None, // no timeout
    );

    let stream = match stream {
        Ok(s) => s,
        Err(e) => {
            let _ = ready_tx.send(Err(VoiceError::DeviceUnavailable(e.to_string())));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(VoiceError::DeviceUnavailable(e.to_string())));
        return;
    }

    let _ = ready_tx.send(Ok(()));
    log::debug!("capture: stream running ({sample_rate} Hz, {channels} ch)");

    // Park until the guard drops (stop signal) or the guard is leaked and
    // the sender disconnects; either way the stream is dropped here.
    let _ = stop_rx.recv();
    log::debug!("capture: stream stopped");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_magic_and_layout() {
        let header = wav_stream_header(44_100, 2);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");

        // channels, sample rate, byte rate, block align, bits per sample
        assert_eq!(u16::from_le_bytes([header[22], header[23]]), 2);
        assert_eq!(
            u32::from_le_bytes([header[24], header[25], header[26], header[27]]),
            44_100
        );
        assert_eq!(
            u32::from_le_bytes([header[28], header[29], header[30], header[31]]),
            44_100 * 2 * 2
        );
        assert_eq!(u16::from_le_bytes([header[32], header[33]]), 4);
        assert_eq!(u16::from_le_bytes([header[34], header[35]]), 16);
    }

    #[test]
    fn f32_conversion_clamps_and_scales() {
        let bytes = f32_to_i16_bytes(&[0.0, 1.0, -1.0, 2.0]);
        assert_eq!(bytes.len(), 8);

        let values: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(values[0], 0);
        assert_eq!(values[1], i16::MAX);
        assert_eq!(values[2], -i16::MAX);
        // Out-of-range input is clamped, not wrapped.
        assert_eq!(values[3], i16::MAX);
    }
}
