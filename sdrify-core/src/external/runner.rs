// ============================================================================
// sdrify-core/src/external/runner.rs
// ============================================================================
//
// TOOL RUNNER: Blocking ffprobe / ffmpeg invocations
//
// Runs an external tool to completion with std::process, capturing stdout as
// raw bytes (preview frames arrive there) and stderr as text. On Windows the
// child is created without a console window.

use super::{ProcessExit, ToolOutput, ToolRunner, spawn_error};
use crate::error::CoreResult;
use std::path::Path;
use std::process::{Command, Stdio};

/// `CREATE_NO_WINDOW` process creation flag.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// [`ToolRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolRunner;

impl SystemToolRunner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for SystemToolRunner {
    fn run(&self, program: &Path, args: &[String]) -> CoreResult<ToolOutput> {
        let tool = program.display().to_string();
        log::debug!("Running: {} {}", tool, args.join(" "));

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let output = command.output().map_err(|e| spawn_error(&tool, e))?;
        let exit = ProcessExit::from(output.status);
        if !exit.success() {
            log::debug!("{tool} exited with {:?}", exit.code());
        }

        Ok(ToolOutput {
            exit,
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
