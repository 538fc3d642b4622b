//! Terminal transition of a conversion session.
//!
//! [`CompletionHandler::complete`] runs exactly once per session, on the UI
//! thread. It raises the single outcome notification, opens the output when
//! requested, and always returns the UI to its idle state.

use crate::encoding::ConversionRequest;
use crate::notifications::Notification;
use crate::ui::UiHandles;

/// How a conversion session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Succeeded,
    Failed {
        exit_code: Option<i32>,
        transcript: String,
    },
    Cancelled,
}

impl Outcome {
    #[must_use]
    pub fn notification(&self, request: &ConversionRequest) -> Notification {
        match self {
            Self::Succeeded => Notification::Succeeded {
                output: request.output.clone(),
            },
            Self::Failed {
                exit_code,
                transcript,
            } => Notification::Failed {
                exit_code: *exit_code,
                transcript: transcript.clone(),
            },
            Self::Cancelled => Notification::Cancelled,
        }
    }
}

/// Drives the UI through the end of a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionHandler;

impl CompletionHandler {
    /// Must be called on the UI thread.
    pub fn complete(ui: &UiHandles, outcome: &Outcome, request: &ConversionRequest) {
        match outcome {
            Outcome::Succeeded => log::info!("Conversion finished: {}", request.output.display()),
            Outcome::Failed { exit_code, .. } => {
                log::error!("Conversion failed with exit code {exit_code:?}");
            }
            Outcome::Cancelled => log::info!("Conversion cancelled"),
        }

        ui.view.notify(&outcome.notification(request));

        if *outcome == Outcome::Succeeded && request.open_after_conversion {
            ui.view.open_output(&request.output);
        }

        ui.set_controls_enabled(true);
        ui.view.set_cancel_visible(false);
    }
}
