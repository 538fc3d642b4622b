//! Shared state of one conversion session.
//!
//! A [`ConversionSession`] is written by two threads: the UI thread (start
//! and cancel) and the conversion worker (progress and exit). The process
//! handle sits behind a mutex so that a cancel request and a natural exit
//! cannot both act on it, and the cancellation flag is checked under that
//! same lock before a retry process is installed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use ffmpeg_sidecar::event::FfmpegEvent;

use crate::completion::Outcome;
use crate::error::CoreResult;
use crate::external::{ProcessExit, ToolProcess};
use crate::progress_reporting::ProgressMonitor;

/// Attempt state of a session.
///
/// ```text
/// Running{accelerated: true} --acceleration error--> RetryingOnCpu --> Running{accelerated: false}
/// Running{..} --exit 0--> Succeeded
/// Running{..} --exit != 0--> Failed
/// any non-terminal --cancel--> Cancelled
/// ```
///
/// `RetryingOnCpu` can only be entered from a GPU attempt, so a session
/// retries at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running { accelerated: bool },
    RetryingOnCpu,
    Succeeded,
    Failed { exit_code: Option<i32> },
    Cancelled,
}

impl SessionState {
    /// State following the exit of the current attempt.
    #[must_use]
    pub fn after_exit(
        self,
        exit: Option<ProcessExit>,
        acceleration_error: bool,
        cancelled: bool,
    ) -> Self {
        if cancelled {
            return Self::Cancelled;
        }
        let exit_code = exit.and_then(|e| e.code());
        match (self, exit) {
            (Self::Running { .. }, Some(exit)) if exit.success() => Self::Succeeded,
            (Self::Running { accelerated: true }, _) if acceleration_error => Self::RetryingOnCpu,
            (Self::Running { .. }, _) => Self::Failed { exit_code },
            (other, _) => other,
        }
    }

    /// State once the CPU retry process has been started.
    #[must_use]
    pub fn after_respawn(self) -> Self {
        match self {
            Self::RetryingOnCpu => Self::Running { accelerated: false },
            other => other,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. } | Self::Cancelled)
    }
}

/// Interval between exit checks while reaping.
const REAP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Exit status of ffmpeg after it received SIGINT or SIGTERM.
const SIGNAL_EXIT_CODE: i32 = 255;

/// How long a signal exit waits for the matching cancel request. A terminal
/// Ctrl-C reaches ffmpeg and the host's handler at the same time, and ffmpeg
/// may be reaped first.
const SIGNAL_CANCEL_GRACE: Duration = Duration::from_millis(250);

/// Process handle, cancellation flag and diagnostic buffer of one session.
pub struct ConversionSession<P: ToolProcess> {
    process: Mutex<Option<P>>,
    cancelled: AtomicBool,
    state: Mutex<SessionState>,
    monitor: Mutex<ProgressMonitor>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<P: ToolProcess> ConversionSession<P> {
    /// Creates a session around an already spawned first attempt.
    pub fn new(process: P, accelerated: bool, duration_secs: f64) -> Self {
        Self {
            process: Mutex::new(Some(process)),
            cancelled: AtomicBool::new(false),
            state: Mutex::new(SessionState::Running { accelerated }),
            monitor: Mutex::new(ProgressMonitor::new(duration_secs)),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether a live process handle is held.
    #[must_use]
    pub fn has_process(&self) -> bool {
        lock(&self.process).is_some()
    }

    /// Feeds one parsed ffmpeg event to the monitor.
    pub fn handle_event(&self, event: FfmpegEvent) -> Option<f64> {
        lock(&self.monitor).handle_event(event)
    }

    /// Every diagnostic line seen so far, across attempts.
    #[must_use]
    pub fn transcript(&self) -> String {
        lock(&self.monitor).transcript()
    }

    /// Waits for the current process to end and clears its slot.
    ///
    /// The handle stays in the slot while waiting so that [`cancel`] can
    /// still kill it. Returns `None` when [`cancel`] took the handle.
    ///
    /// [`cancel`]: ConversionSession::cancel
    pub fn reap(&self) -> CoreResult<Option<ProcessExit>> {
        loop {
            {
                let mut slot = lock(&self.process);
                let Some(process) = slot.as_mut() else {
                    return Ok(None);
                };
                if let Some(exit) = process.try_wait()? {
                    *slot = None;
                    return Ok(Some(exit));
                }
            }
            thread::sleep(REAP_POLL_INTERVAL);
        }
    }

    /// Applies the exit of the current attempt to the state machine.
    pub fn finish_attempt(&self, exit: Option<ProcessExit>) -> SessionState {
        if exit.and_then(|e| e.code()) == Some(SIGNAL_EXIT_CODE) {
            self.await_signal_cancel();
        }
        let acceleration_error = lock(&self.monitor).acceleration_error_seen();
        let mut state = lock(&self.state);
        *state = state.after_exit(exit, acceleration_error, self.is_cancelled());
        log::info!("Conversion attempt ended ({exit:?}): {:?}", *state);
        *state
    }

    fn await_signal_cancel(&self) {
        let deadline = Instant::now() + SIGNAL_CANCEL_GRACE;
        while !self.is_cancelled() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        if self.is_cancelled() {
            log::debug!("Signal exit followed by a cancel request");
        }
    }

    /// Installs the CPU retry process.
    ///
    /// Hands the process back when the session was cancelled in the
    /// meantime; the caller must then kill it.
    pub fn install_retry(&self, process: P) -> Result<(), P> {
        let mut slot = lock(&self.process);
        if self.is_cancelled() {
            return Err(process);
        }
        *slot = Some(process);
        lock(&self.monitor).begin_attempt();
        let mut state = lock(&self.state);
        *state = state.after_respawn();
        Ok(())
    }

    /// Forces a terminal state, used when the retry process cannot start.
    pub fn fail(&self, exit_code: Option<i32>, message: &str) {
        lock(&self.monitor).handle_log(message);
        let mut state = lock(&self.state);
        *state = if self.is_cancelled() {
            SessionState::Cancelled
        } else {
            SessionState::Failed { exit_code }
        };
    }

    /// Marks the session cancelled after the retry was refused.
    pub fn mark_cancelled(&self) {
        *lock(&self.state) = SessionState::Cancelled;
    }

    /// Outcome of a terminal session.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        match self.state() {
            SessionState::Succeeded => Some(Outcome::Succeeded),
            SessionState::Failed { exit_code } => Some(Outcome::Failed {
                exit_code,
                transcript: self.transcript(),
            }),
            SessionState::Cancelled => Some(Outcome::Cancelled),
            SessionState::Running { .. } | SessionState::RetryingOnCpu => None,
        }
    }

    /// Requests cancellation.
    ///
    /// Sets the flag, then kills and reaps the current process if one is
    /// held. Returns `false` when the session had already ended or was
    /// already cancelled.
    pub fn cancel(&self) -> bool {
        if self.state().is_terminal() || self.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }
        let process = lock(&self.process).take();
        if let Some(mut process) = process {
            log::info!("Terminating conversion process");
            if let Err(e) = process.kill() {
                log::warn!("Failed to kill conversion process: {e}");
            }
            if let Err(e) = process.wait() {
                log::warn!("Failed to reap conversion process: {e}");
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::DiagnosticStream;
    use ffmpeg_sidecar::event::LogLevel;
    use std::sync::Arc;

    struct StubProcess {
        exit: i32,
        killed: bool,
    }

    impl ToolProcess for StubProcess {
        fn take_stderr(&mut self) -> Option<DiagnosticStream> {
            None
        }
        fn kill(&mut self) -> CoreResult<()> {
            self.killed = true;
            Ok(())
        }
        fn try_wait(&mut self) -> CoreResult<Option<ProcessExit>> {
            Ok(Some(ProcessExit::from_code(self.exit)))
        }
        fn wait(&mut self) -> CoreResult<ProcessExit> {
            Ok(if self.killed {
                ProcessExit::terminated()
            } else {
                ProcessExit::from_code(self.exit)
            })
        }
    }

    fn stub(exit: i32) -> StubProcess {
        StubProcess { exit, killed: false }
    }

    fn log(message: &str) -> FfmpegEvent {
        FfmpegEvent::Log(LogLevel::Error, message.to_string())
    }

    /// Runs until killed; its stderr has already closed.
    struct HangingProcess {
        killed: Arc<AtomicBool>,
    }

    impl ToolProcess for HangingProcess {
        fn take_stderr(&mut self) -> Option<DiagnosticStream> {
            None
        }
        fn kill(&mut self) -> CoreResult<()> {
            self.killed.store(true, Ordering::SeqCst);
            Ok(())
        }
        fn try_wait(&mut self) -> CoreResult<Option<ProcessExit>> {
            Ok(self
                .killed
                .load(Ordering::SeqCst)
                .then(ProcessExit::terminated))
        }
        fn wait(&mut self) -> CoreResult<ProcessExit> {
            Ok(ProcessExit::terminated())
        }
    }

    #[test]
    fn gpu_failure_with_signature_retries_once() {
        let gpu = SessionState::Running { accelerated: true };
        let exit = Some(ProcessExit::from_code(1));
        assert_eq!(gpu.after_exit(exit, true, false), SessionState::RetryingOnCpu);

        let cpu = SessionState::RetryingOnCpu.after_respawn();
        assert_eq!(cpu, SessionState::Running { accelerated: false });
        assert_eq!(
            cpu.after_exit(exit, true, false),
            SessionState::Failed { exit_code: Some(1) }
        );
    }

    #[test]
    fn exit_classification() {
        let cpu = SessionState::Running { accelerated: false };
        assert_eq!(
            cpu.after_exit(Some(ProcessExit::from_code(0)), false, false),
            SessionState::Succeeded
        );
        assert_eq!(
            SessionState::Running { accelerated: true }.after_exit(
                Some(ProcessExit::from_code(0)),
                true,
                false
            ),
            SessionState::Succeeded
        );
        assert_eq!(
            SessionState::Running { accelerated: true }.after_exit(
                Some(ProcessExit::from_code(1)),
                false,
                false
            ),
            SessionState::Failed { exit_code: Some(1) }
        );
        assert_eq!(
            cpu.after_exit(Some(ProcessExit::from_code(0)), false, true),
            SessionState::Cancelled
        );
    }

    #[test]
    fn cancel_kills_and_clears_handle() {
        let session = ConversionSession::new(stub(0), false, 60.0);
        assert!(session.has_process());
        assert!(session.cancel());
        assert!(!session.has_process());
        assert!(!session.cancel());

        assert_eq!(session.reap().unwrap(), None);
        assert_eq!(session.finish_attempt(None), SessionState::Cancelled);
        assert_eq!(session.outcome(), Some(Outcome::Cancelled));
    }

    #[test]
    fn retry_is_refused_after_cancel() {
        let session = ConversionSession::new(stub(1), true, 60.0);
        session.handle_event(log("No NVENC capable devices found"));
        let exit = session.reap().unwrap();
        assert_eq!(session.finish_attempt(exit), SessionState::RetryingOnCpu);

        session.cancel();
        let refused = session.install_retry(stub(0));
        assert!(refused.is_err());
        session.mark_cancelled();
        assert_eq!(session.outcome(), Some(Outcome::Cancelled));
    }

    #[test]
    fn failure_outcome_carries_transcript() {
        let session = ConversionSession::new(stub(1), false, 60.0);
        session.handle_event(log("Error opening output file"));
        let exit = session.reap().unwrap();
        session.finish_attempt(exit);
        assert_eq!(
            session.outcome(),
            Some(Outcome::Failed {
                exit_code: Some(1),
                transcript: "Error opening output file\n".to_string()
            })
        );
    }

    #[test]
    fn cancel_during_reap_kills_the_process() {
        let killed = Arc::new(AtomicBool::new(false));
        let session = Arc::new(ConversionSession::new(
            HangingProcess {
                killed: Arc::clone(&killed),
            },
            false,
            60.0,
        ));

        let reaper = {
            let session = Arc::clone(&session);
            std::thread::spawn(move || session.reap())
        };
        std::thread::sleep(Duration::from_millis(120));
        assert!(session.has_process());
        assert!(!reaper.is_finished());

        assert!(session.cancel());
        assert!(killed.load(Ordering::SeqCst));

        let exit = reaper.join().unwrap().unwrap();
        assert_eq!(exit, None);
        assert_eq!(session.finish_attempt(exit), SessionState::Cancelled);
    }

    #[test]
    fn reap_clears_the_slot_on_exit() {
        let session = ConversionSession::new(stub(0), false, 60.0);
        assert_eq!(session.reap().unwrap(), Some(ProcessExit::from_code(0)));
        assert!(!session.has_process());
    }

    #[test]
    fn signal_exit_waits_for_pending_cancel() {
        let session = Arc::new(ConversionSession::new(stub(255), false, 60.0));
        let exit = session.reap().unwrap();

        let canceller = {
            let session = Arc::clone(&session);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(30));
                session.cancel()
            })
        };
        assert_eq!(session.finish_attempt(exit), SessionState::Cancelled);
        assert!(canceller.join().unwrap());
        assert_eq!(session.outcome(), Some(Outcome::Cancelled));
    }

    #[test]
    fn signal_exit_without_cancel_is_a_failure() {
        let session = ConversionSession::new(stub(255), false, 60.0);
        let exit = session.reap().unwrap();
        assert_eq!(
            session.finish_attempt(exit),
            SessionState::Failed { exit_code: Some(255) }
        );
    }
}
