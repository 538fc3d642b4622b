//! Implementation of the 'convert' subcommand.
//!
//! Starts one conversion through the core `ConversionManager` and then runs
//! the main thread as the UI thread: tasks posted by the conversion worker
//! are drained from a channel until the completion notice has been shown.
//! Ctrl-C cancels the running conversion. The handler is installed before
//! ffmpeg starts, so an early Ctrl-C is held and applied once the session
//! exists.

use crate::cli::ConvertArgs;
use crate::error::CliResult;
use crate::terminal::{self, ChannelDispatcher, TerminalControl, TerminalView};

use sdrify_core::ui::UiTask;
use sdrify_core::{
    ConversionManager, ConversionRequest, CoreConfig, CoreError, Notification, SidecarSpawner,
    SystemToolRunner, UiHandles, default_output_path, is_supported_input,
};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

/// How a convert invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertStatus {
    Succeeded,
    Failed,
    Cancelled,
    /// Rejected before ffmpeg ran; the reason was already shown.
    NotStarted,
}

impl ConvertStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Succeeded => 0,
            Self::Failed => 1,
            Self::NotStarted => 2,
            Self::Cancelled => 130,
        }
    }

    fn from_completion(notification: Option<&Notification>) -> Self {
        match notification {
            Some(Notification::Succeeded { .. }) => Self::Succeeded,
            Some(Notification::Cancelled) => Self::Cancelled,
            _ => Self::Failed,
        }
    }
}

type CancelFn = Box<dyn Fn() -> bool + Send>;

/// Bridges Ctrl-C to a conversion that may not have started yet.
#[derive(Default)]
pub struct CancelSlot {
    interrupted: AtomicBool,
    cancel: Mutex<Option<CancelFn>>,
}

impl CancelSlot {
    /// Records a Ctrl-C and cancels the armed conversion, if any.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        let cancel = self.cancel.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(cancel) = cancel.as_ref() {
            if cancel() {
                info!("Cancellation requested");
            }
        }
    }

    /// Connects the running conversion. A Ctrl-C seen earlier cancels it
    /// straight away.
    pub fn arm(&self, cancel: impl Fn() -> bool + Send + 'static) {
        let mut slot = self.cancel.lock().unwrap_or_else(|p| p.into_inner());
        if self.interrupted.load(Ordering::SeqCst) && cancel() {
            info!("Cancellation requested before the conversion started");
        }
        *slot = Some(Box::new(cancel));
    }

    pub fn was_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

/// Resolves the output path and applies the overwrite rule.
pub fn resolve_output(args: &ConvertArgs) -> CliResult<PathBuf> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    if output == args.input {
        return Err(CoreError::Validation(
            "The output file must differ from the input file.".to_string(),
        ));
    }
    if output.exists() && !args.force {
        return Err(CoreError::OperationFailed(format!(
            "Output file '{}' already exists; pass --force to overwrite it",
            output.display()
        )));
    }
    Ok(output)
}

/// Builds the core request from the parsed arguments.
pub fn build_request(args: &ConvertArgs, output: &Path) -> ConversionRequest {
    ConversionRequest::new(&args.input, output, args.gamma)
        .with_gpu(args.gpu)
        .with_tone_map(args.tone_map)
        .with_open_after_conversion(args.open)
}

/// Runs the convert command and reports how the conversion ended.
pub fn run_convert(args: ConvertArgs, config: &CoreConfig) -> CliResult<ConvertStatus> {
    if !is_supported_input(&args.input) {
        warn!(
            "{} does not look like an .mp4, .mkv or .mov file",
            args.input.display()
        );
    }
    let output = resolve_output(&args)?;
    let request = build_request(&args, &output);

    let (dispatcher, tasks) = ChannelDispatcher::channel();
    let view = Arc::new(TerminalView::new());
    let control = Arc::new(TerminalControl::new("convert"));
    let ui = UiHandles::new(Arc::new(dispatcher), view.clone()).with_control(control);

    let mut manager = ConversionManager::new(config, SystemToolRunner, SidecarSpawner, ui);

    terminal::print_info("Input", args.input.display());
    terminal::print_info("Output", output.display());
    terminal::print_info(
        "Settings",
        format!(
            "gamma {:.2}, {} tone map, {}",
            args.gamma,
            args.tone_map,
            if args.gpu { "GPU" } else { "CPU" }
        ),
    );

    let slot = Arc::new(CancelSlot::default());
    let handler_slot = Arc::clone(&slot);
    if let Err(e) = ctrlc::set_handler(move || handler_slot.interrupt()) {
        warn!("Ctrl-C will not cancel the conversion: {e}");
    }

    if let Err(e) = manager.start(request) {
        debug!("Conversion rejected: {e}");
        return Ok(ConvertStatus::NotStarted);
    }
    if let Some(handle) = manager.cancel_handle() {
        slot.arm(move || handle.cancel());
    }

    drain_until_complete(&tasks, &view);
    manager.wait();

    if slot.was_interrupted() {
        debug!("Conversion ended after Ctrl-C");
    }
    Ok(ConvertStatus::from_completion(view.completion().as_ref()))
}

/// Runs UI tasks on this thread until the view has shown a completion.
fn drain_until_complete(tasks: &Receiver<UiTask>, view: &TerminalView) {
    while view.completion().is_none() {
        match tasks.recv() {
            Ok(task) => task(),
            Err(_) => break,
        }
    }
}
