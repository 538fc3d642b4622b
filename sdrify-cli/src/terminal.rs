// ============================================================================
// sdrify-cli/src/terminal.rs
// ============================================================================
//
// TERMINAL OUTPUT: The CLI's implementation of the core UI capabilities
//
// The main thread plays the UI thread: ChannelDispatcher queues tasks from
// the conversion worker and the command drains them on main. TerminalView
// renders progress with indicatif and prints notices with owo-colors.
//
// KEY COMPONENTS:
// - styling: symbols and progress bar template
// - ChannelDispatcher: UiDispatcher backed by an mpsc channel
// - TerminalView: ConversionView for the terminal
// - TerminalControl: a control that records its enabled state
//
// AI-ASSISTANT-INFO: Terminal UI components and styling for the CLI

// ---- External crate imports ----
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use owo_colors::OwoColorize;
use sdrify_core::ui::{Control, ConversionView, UiDispatcher, UiTask};
use sdrify_core::{Notification, NotificationKind};

// ---- Standard library imports ----
use std::fmt::Display;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use crate::platform;

// ============================================================================
// STYLING CONSTANTS
// ============================================================================

/// Styling constants for terminal output
pub mod styling {
    pub const SUCCESS_SYMBOL: &str = "✓";
    pub const WARNING_SYMBOL: &str = "!";
    pub const ERROR_SYMBOL: &str = "✗";

    /// Bar length; positions are tenths of a percent.
    pub const PROGRESS_UNITS: u64 = 1000;
    pub const PROGRESS_TEMPLATE: &str =
        "{spinner:.green} Converting [{bar:40.cyan/blue}] {msg} ({elapsed_precise})";
    pub const PROGRESS_CHARS: &str = "█▓▒░ ";
}

// ============================================================================
// DISPATCHER
// ============================================================================

/// Queues UI tasks for the thread that owns the receiver.
pub struct ChannelDispatcher {
    sender: Sender<UiTask>,
}

impl ChannelDispatcher {
    pub fn channel() -> (Self, Receiver<UiTask>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl UiDispatcher for ChannelDispatcher {
    fn dispatch(&self, task: UiTask) {
        if self.sender.send(task).is_err() {
            log::debug!("UI task dropped; the receiving thread has exited");
        }
    }
}

// ============================================================================
// VIEW
// ============================================================================

/// Progress bar plus notices on stderr.
pub struct TerminalView {
    bar: ProgressBar,
    finished: Mutex<Option<Notification>>,
}

impl TerminalView {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(
            Some(styling::PROGRESS_UNITS),
            ProgressDrawTarget::hidden(),
        );
        let style = ProgressStyle::with_template(styling::PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars(styling::PROGRESS_CHARS);
        bar.set_style(style);
        Self {
            bar,
            finished: Mutex::new(None),
        }
    }

    /// The completion notification, once one has been shown.
    pub fn completion(&self) -> Option<Notification> {
        self.finished
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionView for TerminalView {
    fn set_cancel_visible(&self, visible: bool) {
        if visible {
            self.bar.reset();
            self.bar.set_message(format!("{:>5.1}%", 0.0));
            self.bar.set_draw_target(ProgressDrawTarget::stderr());
            self.bar.println(format!("{}", "Press Ctrl-C to cancel".dimmed()));
        } else {
            self.bar.finish_and_clear();
        }
    }

    fn set_progress(&self, percent: f64) {
        let position = (percent.clamp(0.0, 100.0) * 10.0).round() as u64;
        self.bar.set_position(position);
        self.bar.set_message(format!("{percent:>5.1}%"));
    }

    fn notify(&self, notification: &Notification) {
        log::debug!("Notice ({:?}): {}", notification.kind(), notification.title());
        self.bar.suspend(|| print_notification(notification));
        if notification.is_terminal() {
            *self
                .finished
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(notification.clone());
        }
    }

    fn open_output(&self, path: &Path) {
        if let Err(e) = platform::open_path(path) {
            self.bar
                .suspend(|| print_warning(format!("Could not open {}: {e}", path.display())));
        }
    }
}

/// A control whose enabled state is only tracked and logged.
pub struct TerminalControl {
    name: &'static str,
    enabled: AtomicBool,
}

impl TerminalControl {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

impl Control for TerminalControl {
    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        log::debug!(
            "{} {}",
            self.name,
            if enabled { "enabled" } else { "disabled" }
        );
    }
}

// ============================================================================
// PRINT HELPERS
// ============================================================================

/// Prints a notification as `<symbol> <title>: <message>` on stderr.
pub fn print_notification(notification: &Notification) {
    let title = notification.title();
    let message = notification.message();
    match notification.kind() {
        NotificationKind::Info => eprintln!(
            "{} {} {}",
            styling::SUCCESS_SYMBOL.green(),
            format!("{title}:").bold(),
            message
        ),
        NotificationKind::Warning => eprintln!(
            "{} {} {}",
            styling::WARNING_SYMBOL.yellow().bold(),
            format!("{title}:").yellow().bold(),
            message
        ),
        NotificationKind::Error => eprintln!(
            "{} {} {}",
            styling::ERROR_SYMBOL.bright_red().bold(),
            format!("{title}:").bright_red().bold(),
            message
        ),
    }
}

/// Prints a label and value, with the label in cyan.
pub fn print_info<T: Display>(label: &str, value: T) {
    println!("{}: {}", label.bright_cyan(), value);
}

pub fn print_success(message: impl Display) {
    println!("{} {}", styling::SUCCESS_SYMBOL.green(), message);
}

pub fn print_warning(message: impl Display) {
    eprintln!("{} {}", styling::WARNING_SYMBOL.yellow().bold(), message);
}

pub fn print_error(message: impl Display) {
    eprintln!("{} {}", "Error:".bold().bright_red(), message);
}
