//! Platform-specific functionality.
//!
//! Opens finished conversions with the desktop's default application.

use sdrify_core::Platform;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Program and leading arguments that open a file with its default
/// application on `platform`.
pub fn opener_command(platform: Platform) -> (&'static str, &'static [&'static str]) {
    match platform {
        // The empty string is the window title `start` expects first.
        Platform::Windows => ("cmd", &["/C", "start", ""]),
        Platform::MacOs => ("open", &[]),
        Platform::Linux | Platform::Other => ("xdg-open", &[]),
    }
}

/// Opens `path` with the default application and waits for the opener to
/// hand it off.
pub fn open_path(path: &Path) -> io::Result<()> {
    let (program, args) = opener_command(Platform::current());
    let status = Command::new(program)
        .args(args)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("{program} exited with {status}")))
    }
}
