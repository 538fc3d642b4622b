// ============================================================================
// sdrify-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: Supervised FFmpeg processes
//
// This module provides the production ToolSpawner. Conversions are started
// through ffmpeg-sidecar, which pipes every standard stream and can suppress
// the console window on Windows. The resulting child hands its stderr to the
// progress monitor and stays killable while that stream is being read.
//
// KEY COMPONENTS:
// - SidecarSpawner: ToolSpawner implementation
// - SidecarProcess: ToolProcess wrapper around ffmpeg_sidecar's child

use super::{DiagnosticStream, ProcessExit, ToolProcess, ToolSpawner, spawn_error};
use crate::error::{CoreResult, command_wait_error};
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::path::Path;

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `ToolProcess`.
pub struct SidecarProcess {
    child: FfmpegChild,
    tool: String,
}

impl ToolProcess for SidecarProcess {
    fn take_stderr(&mut self) -> Option<DiagnosticStream> {
        self.child
            .take_stderr()
            .map(|stderr| Box::new(stderr) as DiagnosticStream)
    }

    fn kill(&mut self) -> CoreResult<()> {
        match self.child.kill() {
            Ok(()) => Ok(()),
            // Already exited.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn try_wait(&mut self) -> CoreResult<Option<ProcessExit>> {
        self.child
            .as_inner_mut()
            .try_wait()
            .map(|status| status.map(ProcessExit::from))
            .map_err(|e| command_wait_error(self.tool.clone(), e))
    }

    fn wait(&mut self) -> CoreResult<ProcessExit> {
        self.child
            .wait()
            .map(ProcessExit::from)
            .map_err(|e| command_wait_error(self.tool.clone(), e))
    }
}

/// Concrete implementation of `ToolSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarSpawner;

impl SidecarSpawner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ToolSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, program: &Path, args: &[String]) -> CoreResult<Self::Process> {
        let tool = program.display().to_string();
        log::debug!("Spawning: {} {}", tool, args.join(" "));

        let mut command = FfmpegCommand::new_with_path(program);
        command.args(args).create_no_window();

        command
            .spawn()
            .map(|child| SidecarProcess {
                child,
                tool: tool.clone(),
            })
            .map_err(|e| spawn_error(&tool, e))
    }
}
