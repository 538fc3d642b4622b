// ============================================================================
// sdrify-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// This module encapsulates every interaction with the external command-line
// tools. Short blocking calls (probing, single-frame extraction, version
// checks) go through ToolRunner; the long-running conversion goes through
// ToolSpawner, whose processes expose their diagnostic stream and can be
// killed from another thread.
//
// KEY COMPONENTS:
// - ToolRunner / ToolOutput: run-to-completion invocations
// - ToolSpawner / ToolProcess: supervised long-running invocations
// - ProcessExit: platform independent exit information
// - check_dependency: verifies a tool can be executed
//
// DESIGN PHILOSOPHY:
// Consumers receive the traits, not the concrete implementations, so tests
// can script tool behaviour without ffmpeg installed. The default
// implementations use std::process and the ffmpeg-sidecar crate.

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io::Read;
use std::path::Path;
use std::process::ExitStatus;

// ============================================================================
// SUBMODULES
// ============================================================================

/// Spawning supervised ffmpeg processes through ffmpeg-sidecar
pub mod ffmpeg_executor;

/// Blocking tool invocations through std::process
pub mod runner;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_executor::{SidecarProcess, SidecarSpawner};
pub use runner::SystemToolRunner;

// ============================================================================
// PROCESS RESULTS
// ============================================================================

/// How an external process ended.
///
/// `code` is `None` when the process was terminated by a signal, which is
/// what a cancelled conversion looks like on Unix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    code: Option<i32>,
}

impl ProcessExit {
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Exit without a code (killed by a signal).
    #[must_use]
    pub fn terminated() -> Self {
        Self { code: None }
    }

    #[must_use]
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ProcessExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Captured output of a run-to-completion invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub exit: ProcessExit,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ToolOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit.success()
    }

    /// Lossy UTF-8 view of stdout.
    #[must_use]
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

// ============================================================================
// EXECUTION TRAITS
// ============================================================================

/// Runs an external program to completion, capturing both output streams.
pub trait ToolRunner: Send + Sync {
    /// Runs `program` with `args` and waits for it to exit.
    ///
    /// A non-zero exit is not an error at this level; callers inspect
    /// [`ToolOutput::exit`] and decide which error class applies.
    fn run(&self, program: &Path, args: &[String]) -> CoreResult<ToolOutput>;
}

impl<R: ToolRunner + ?Sized> ToolRunner for &R {
    fn run(&self, program: &Path, args: &[String]) -> CoreResult<ToolOutput> {
        (**self).run(program, args)
    }
}

/// Diagnostic (stderr) stream of a running process.
pub type DiagnosticStream = Box<dyn Read + Send>;

/// An external process started by a [`ToolSpawner`].
pub trait ToolProcess: Send + 'static {
    /// Takes ownership of the diagnostic stream. Returns `None` on the second
    /// call or when the stream was not captured.
    fn take_stderr(&mut self) -> Option<DiagnosticStream>;

    /// Terminates the process.
    fn kill(&mut self) -> CoreResult<()>;

    /// Returns the exit information if the process has already ended.
    fn try_wait(&mut self) -> CoreResult<Option<ProcessExit>>;

    /// Blocks until the process ends.
    fn wait(&mut self) -> CoreResult<ProcessExit>;
}

/// Something that can start a [`ToolProcess`].
pub trait ToolSpawner: Send + Sync + 'static {
    type Process: ToolProcess;

    /// Spawns `program` with `args`, capturing the diagnostic and data
    /// streams and suppressing any console window.
    fn spawn(&self, program: &Path, args: &[String]) -> CoreResult<Self::Process>;
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if an external tool is available and executable.
///
/// Runs the tool with `-version` and returns the first line of its banner
/// (e.g. `ffmpeg version 6.1.1 Copyright ...`).
///
/// # Errors
///
/// * `CoreError::DependencyNotFound` - the program does not exist
/// * `CoreError::CommandFailed` - the program ran but exited non-zero
pub fn check_dependency<R: ToolRunner>(runner: &R, program: &Path) -> CoreResult<String> {
    let tool = program.display().to_string();
    let output = runner.run(program, &["-version".to_string()])?;

    if !output.success() {
        log::warn!("Dependency check for '{tool}' exited with {:?}", output.exit.code());
        return Err(crate::error::command_failed_error(
            tool,
            output.exit.code(),
            output.stderr,
        ));
    }

    let banner = output
        .stdout_text()
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    log::debug!("Found dependency '{tool}': {banner}");
    Ok(banner)
}

/// Maps a spawn failure onto the dependency / start error variants.
pub(crate) fn spawn_error(tool: &str, error: std::io::Error) -> CoreError {
    if error.kind() == std::io::ErrorKind::NotFound {
        log::warn!("Dependency '{tool}' not found.");
        CoreError::DependencyNotFound(tool.to_string())
    } else {
        log::error!("Failed to start '{tool}': {error}");
        crate::error::command_start_error(tool, error)
    }
}
