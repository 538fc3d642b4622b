// ============================================================================
// sdrify-core/src/notifications.rs
// ============================================================================
//
// NOTIFICATIONS: User-facing notices raised by the conversion core
//
// Each notice has a severity, a short title and a message. Front ends decide
// how to show them (dialog, inline label, terminal line).
//
// KEY COMPONENTS:
// - NotificationKind: severity
// - Notification: every notice the core can raise

use std::path::PathBuf;

use crate::error::CoreError;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
}

/// Notices shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The request was rejected before anything ran.
    ValidationFailed { message: String },

    /// The input could not be probed.
    ProbeFailed { message: String },

    /// GPU was requested but is unsupported here; continuing on the CPU.
    AccelerationUnavailable { message: String },

    /// The GPU attempt failed with an acceleration error; retrying on the CPU.
    SwitchingToCpu { exit_code: Option<i32> },

    /// ffmpeg could not be started.
    StartFailed { message: String },

    /// Conversion finished and the output was written.
    Succeeded { output: PathBuf },

    /// Conversion ended with a non-zero exit code.
    Failed {
        exit_code: Option<i32>,
        transcript: String,
    },

    /// The user cancelled the conversion.
    Cancelled,
}

impl Notification {
    #[must_use]
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::Succeeded { .. } => NotificationKind::Info,
            Self::ValidationFailed { .. }
            | Self::ProbeFailed { .. }
            | Self::AccelerationUnavailable { .. }
            | Self::SwitchingToCpu { .. }
            | Self::Cancelled => NotificationKind::Warning,
            Self::StartFailed { .. } | Self::Failed { .. } => NotificationKind::Error,
        }
    }

    /// Gets the title for this notification
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::ValidationFailed { .. }
            | Self::ProbeFailed { .. }
            | Self::AccelerationUnavailable { .. }
            | Self::SwitchingToCpu { .. } => "Warning",
            Self::StartFailed { .. } | Self::Failed { .. } => "Error",
            Self::Succeeded { .. } => "Success",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Gets the message for this notification
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::ValidationFailed { message }
            | Self::ProbeFailed { message }
            | Self::AccelerationUnavailable { message }
            | Self::StartFailed { message } => message.clone(),
            Self::SwitchingToCpu { exit_code } => format!(
                "{}. Switching to CPU encoding and retrying.",
                CoreError::TransientAccelerationFailure {
                    exit_code: *exit_code
                }
            ),
            Self::Succeeded { output } => {
                format!("Conversion complete! Output saved to: {}", output.display())
            }
            Self::Failed {
                exit_code,
                transcript,
            } => CoreError::ProcessFailure {
                exit_code: *exit_code,
                transcript: transcript.clone(),
            }
            .to_string(),
            Self::Cancelled => CoreError::CancelledByUser.to_string(),
        }
    }

    /// Whether this notification ends a conversion session.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Failed { .. } | Self::Cancelled
        )
    }

    /// Notification for an error returned by `ConversionManager::start`.
    #[must_use]
    pub fn for_start_error(error: &CoreError) -> Self {
        match error {
            CoreError::Validation(message) => Self::ValidationFailed {
                message: message.clone(),
            },
            CoreError::Probe(_) => Self::ProbeFailed {
                message: error.to_string(),
            },
            other => Self::StartFailed {
                message: other.to_string(),
            },
        }
    }
}
