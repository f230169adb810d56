//! Fire-and-forget notification sink.
//!
//! Transient user notifications (health-check failure, voice transcription,
//! submission errors) go through [`Notifier`] so the display mechanism stays
//! out of the orchestration core. [`LogNotifier`] is the default sink.

// ---------------------------------------------------------------------------
// Severity / Notifier
// ---------------------------------------------------------------------------

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// A fire-and-forget notification sink.
///
/// Implementors must not block and must not fail: a dropped notification
/// is acceptable, a stalled controller is not.
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// Default sink that forwards notifications to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => log::info!("{message}"),
            Severity::Success => log::info!("{message}"),
            Severity::Error => log::error!("{message}"),
        }
    }
}
