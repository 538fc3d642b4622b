// ============================================================================
// sdrify-core/src/conversion.rs
// ============================================================================
//
// CONVERSION MANAGER: Entry point for user-initiated conversions
//
// ConversionManager validates a request, probes the input, builds the
// ffmpeg command, starts the process and hands it to a worker thread that
// sees the session through to exactly one completion. It is owned by the UI
// thread; start, cancel and is_running are called from there.
//
// KEY COMPONENTS:
// - ConversionManager: start / cancel / is_running / wait
// - CancelHandle: cloneable cancellation for signal handlers
//
// AI-ASSISTANT-INFO: Conversion orchestration, one session at a time

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::CoreConfig;
use crate::encoding::{CommandBuilder, ConversionRequest};
use crate::error::{CoreError, CoreResult};
use crate::external::{ToolProcess, ToolRunner, ToolSpawner};
use crate::media::MediaProbe;
use crate::notifications::Notification;
use crate::process::{ConversionSession, ProcessSupervisor, SessionState, SupervisedConversion};
use crate::ui::UiHandles;

/// Name of the conversion worker thread.
pub const WORKER_THREAD_NAME: &str = "sdrify-conversion";

trait Cancellable: Send + Sync {
    fn cancel(&self) -> bool;
}

impl<P: ToolProcess> Cancellable for ConversionSession<P> {
    fn cancel(&self) -> bool {
        ConversionSession::cancel(self)
    }
}

/// Cancels one session from anywhere, e.g. a Ctrl-C handler.
#[derive(Clone)]
pub struct CancelHandle {
    session: Arc<dyn Cancellable>,
}

impl CancelHandle {
    /// Returns whether a cancellation was recorded.
    pub fn cancel(&self) -> bool {
        self.session.cancel()
    }
}

struct ActiveConversion<P: ToolProcess> {
    session: Arc<ConversionSession<P>>,
    worker: Option<JoinHandle<()>>,
}

/// Runs conversions one at a time on behalf of the UI.
pub struct ConversionManager<R: ToolRunner, S: ToolSpawner> {
    probe: MediaProbe<R>,
    builder: CommandBuilder,
    supervisor: Arc<ProcessSupervisor<S>>,
    ui: UiHandles,
    active: Option<ActiveConversion<S::Process>>,
}

impl<R: ToolRunner, S: ToolSpawner> ConversionManager<R, S> {
    pub fn new(config: &CoreConfig, runner: R, spawner: S, ui: UiHandles) -> Self {
        Self {
            probe: MediaProbe::new(runner, config),
            builder: CommandBuilder::new(config),
            supervisor: Arc::new(ProcessSupervisor::new(spawner, &config.ffmpeg_path)),
            ui,
            active: None,
        }
    }

    /// Replaces the command builder, e.g. to target another platform.
    #[must_use]
    pub fn with_builder(mut self, builder: CommandBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Starts a conversion. Must be called on the UI thread.
    ///
    /// Failures before the process is running are reported to the view as
    /// notifications and returned; the controls stay enabled in that case.
    /// Once this returns `Ok`, exactly one completion notification follows
    /// through the dispatcher.
    ///
    /// # Errors
    ///
    /// * `CoreError::SessionActive` - a conversion is already running
    /// * `CoreError::Validation` - missing paths or gamma out of range
    /// * `CoreError::Probe` - the input could not be probed
    /// * `CoreError::DependencyNotFound` / `CommandStart` - ffmpeg did not start
    pub fn start(&mut self, request: ConversionRequest) -> CoreResult<()> {
        if self.is_running() {
            return Err(CoreError::SessionActive);
        }
        self.reap_finished();

        match self.launch(request) {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!("Conversion not started: {e}");
                self.ui.set_controls_enabled(true);
                self.ui.view.set_cancel_visible(false);
                self.ui.view.notify(&Notification::for_start_error(&e));
                Err(e)
            }
        }
    }

    fn launch(&mut self, request: ConversionRequest) -> CoreResult<()> {
        request.validate()?;

        let properties = if request.tone_map.needs_light_level() {
            self.probe.probe_with_light_level(&request.input)?
        } else {
            self.probe.probe(&request.input)?
        };
        if !properties.has_duration() {
            log::warn!(
                "No duration reported for {}; progress will not be shown",
                request.input.display()
            );
        }

        let command = self.builder.build(&request, &properties);
        for warning in &command.warnings {
            self.ui.view.notify(&Notification::AccelerationUnavailable {
                message: warning.to_string(),
            });
        }

        self.ui.set_controls_enabled(false);
        self.ui.view.set_cancel_visible(true);
        self.ui.view.set_progress(0.0);

        let mut process = self.supervisor.spawn(&command.args)?;
        let stderr = process.take_stderr();
        let session = Arc::new(ConversionSession::new(
            process,
            command.accelerated,
            properties.duration_secs,
        ));
        log::info!(
            "Converting {} -> {} ({})",
            request.input.display(),
            request.output.display(),
            if command.accelerated { "GPU" } else { "CPU" }
        );

        let job = SupervisedConversion {
            supervisor: Arc::clone(&self.supervisor),
            session: Arc::clone(&session),
            builder: self.builder.clone(),
            request,
            properties,
            ui: self.ui.clone(),
        };
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || job.run(stderr));

        match worker {
            Ok(worker) => {
                self.active = Some(ActiveConversion {
                    session,
                    worker: Some(worker),
                });
                Ok(())
            }
            Err(e) => {
                session.cancel();
                Err(CoreError::Io(e))
            }
        }
    }

    /// Cancels the running conversion. Returns `false` when nothing was
    /// running.
    pub fn cancel(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| self.supervisor.terminate(&active.session))
    }

    /// Whether a session exists that has not reached a terminal state.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.session.state().is_terminal())
    }

    /// State of the current or most recent session.
    #[must_use]
    pub fn state(&self) -> Option<SessionState> {
        self.active.as_ref().map(|active| active.session.state())
    }

    /// Handle usable from other threads to cancel the current session.
    #[must_use]
    pub fn cancel_handle(&self) -> Option<CancelHandle> {
        self.active.as_ref().map(|active| CancelHandle {
            session: Arc::clone(&active.session) as Arc<dyn Cancellable>,
        })
    }

    /// Blocks until the worker thread of the current session has finished.
    ///
    /// The completion task may still be queued on the dispatcher afterwards.
    pub fn wait(&mut self) {
        if let Some(worker) = self.active.as_mut().and_then(|a| a.worker.take()) {
            if worker.join().is_err() {
                log::error!("Conversion worker panicked");
            }
        }
    }

    fn reap_finished(&mut self) {
        self.wait();
        self.active = None;
    }
}

impl<R: ToolRunner, S: ToolSpawner> Drop for ConversionManager<R, S> {
    fn drop(&mut self) {
        if self.cancel() {
            log::info!("Conversion cancelled on shutdown");
        }
    }
}
