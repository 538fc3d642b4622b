// ============================================================================
// sdrify-core/src/process/supervisor.rs
// ============================================================================
//
// PROCESS SUPERVISOR: Spawning, watching and terminating ffmpeg
//
// ProcessSupervisor starts conversion processes through a ToolSpawner and
// terminates them on request. SupervisedConversion is the body of the
// conversion worker thread: it parses the diagnostic stream, forwards
// progress to the UI thread, applies each exit to the session state machine
// and performs the single CPU retry.
//
// KEY COMPONENTS:
// - ProcessSupervisor: spawn / terminate
// - SupervisedConversion: worker loop for one session

use std::path::PathBuf;
use std::sync::Arc;

use ffmpeg_sidecar::event::FfmpegEvent;
use ffmpeg_sidecar::log_parser::FfmpegLogParser;

use crate::completion::{CompletionHandler, Outcome};
use crate::encoding::{CommandBuilder, ConversionRequest};
use crate::error::CoreResult;
use crate::external::{DiagnosticStream, ToolProcess, ToolSpawner};
use crate::media::MediaProperties;
use crate::notifications::Notification;
use crate::ui::UiHandles;

use super::session::{ConversionSession, SessionState};

/// Starts and stops conversion processes.
#[derive(Debug)]
pub struct ProcessSupervisor<S: ToolSpawner> {
    spawner: S,
    ffmpeg_path: PathBuf,
}

impl<S: ToolSpawner> ProcessSupervisor<S> {
    pub fn new(spawner: S, ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            spawner,
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Spawns ffmpeg with `args`, capturing its streams.
    ///
    /// # Errors
    ///
    /// `DependencyNotFound` when ffmpeg is missing, `CommandStart` for any
    /// other spawn failure.
    pub fn spawn(&self, args: &[String]) -> CoreResult<S::Process> {
        log::debug!("Conversion command: {} {}", self.ffmpeg_path.display(), args.join(" "));
        self.spawner.spawn(&self.ffmpeg_path, args)
    }

    /// Terminates the session's process, if any. Returns whether a
    /// cancellation was recorded.
    pub fn terminate(&self, session: &ConversionSession<S::Process>) -> bool {
        session.cancel()
    }
}

/// Result of starting the CPU retry.
enum Respawn {
    Started(Option<DiagnosticStream>),
    /// The session reached a terminal state instead.
    Ended,
}

/// Everything the worker thread needs to see a session through.
pub struct SupervisedConversion<S: ToolSpawner> {
    pub supervisor: Arc<ProcessSupervisor<S>>,
    pub session: Arc<ConversionSession<S::Process>>,
    pub builder: CommandBuilder,
    pub request: ConversionRequest,
    pub properties: MediaProperties,
    pub ui: UiHandles,
}

impl<S: ToolSpawner> SupervisedConversion<S> {
    /// Runs the session to its terminal state, starting with `stderr` of the
    /// first attempt, then hands the outcome to the UI thread.
    pub fn run(self, stderr: Option<DiagnosticStream>) {
        let mut stderr = stderr;
        loop {
            if let Some(stream) = stderr.take() {
                self.drain(stream);
            }

            let exit = match self.session.reap() {
                Ok(exit) => exit,
                Err(e) => {
                    log::error!("Lost track of conversion process: {e}");
                    None
                }
            };

            match self.session.finish_attempt(exit) {
                SessionState::RetryingOnCpu => {
                    let exit_code = exit.and_then(|e| e.code());
                    log::warn!("GPU conversion failed ({exit_code:?}); retrying on CPU");
                    self.ui
                        .on_ui(move |ui| ui.view.notify(&Notification::SwitchingToCpu { exit_code }));
                    match self.respawn_on_cpu() {
                        Respawn::Started(stream) => stderr = stream,
                        Respawn::Ended => break,
                    }
                }
                _ => break,
            }
        }
        self.complete();
    }

    /// Parses ffmpeg's stderr until the stream closes or the process is
    /// taken away by a cancellation.
    fn drain(&self, stream: DiagnosticStream) {
        let mut parser = FfmpegLogParser::new(stream);
        loop {
            let event = match parser.parse_next_event() {
                Ok(FfmpegEvent::LogEOF) => break,
                Ok(event) => event,
                Err(e) => {
                    log::warn!("Error reading ffmpeg output: {e}");
                    break;
                }
            };
            if self.session.is_cancelled() || !self.session.has_process() {
                log::debug!("Stopped reading ffmpeg output after cancellation");
                break;
            }
            if let Some(percent) = self.session.handle_event(event) {
                self.ui.on_ui(move |ui| ui.view.set_progress(percent));
            }
        }
    }

    /// Starts the CPU retry.
    fn respawn_on_cpu(&self) -> Respawn {
        if self.session.is_cancelled() {
            self.session.mark_cancelled();
            return Respawn::Ended;
        }
        let request = self.request.for_cpu_retry();
        let command = self.builder.build(&request, &self.properties);

        let mut process = match self.supervisor.spawn(&command.args) {
            Ok(process) => process,
            Err(e) => {
                log::error!("Failed to start CPU retry: {e}");
                self.session.fail(None, &e.to_string());
                return Respawn::Ended;
            }
        };
        let stderr = process.take_stderr();

        match self.session.install_retry(process) {
            Ok(()) => Respawn::Started(stderr),
            Err(mut refused) => {
                log::info!("Conversion cancelled before CPU retry started");
                if let Err(e) = refused.kill() {
                    log::warn!("Failed to kill refused retry process: {e}");
                }
                let _ = refused.wait();
                self.session.mark_cancelled();
                Respawn::Ended
            }
        }
    }

    fn complete(self) {
        let outcome = self.session.outcome().unwrap_or_else(|| {
            log::error!("Conversion worker ended in state {:?}", self.session.state());
            Outcome::Failed {
                exit_code: None,
                transcript: self.session.transcript(),
            }
        });
        let request = self.request;
        self.ui
            .on_ui(move |ui| CompletionHandler::complete(ui, &outcome, &request));
    }
}
