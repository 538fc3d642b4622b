// ============================================================================
// sdrify-core/src/temp_files.rs
// ============================================================================
//
// TEMPORARY FILES: Scratch space for preview frames
//
// Preview frames normally stay in memory. UI toolkits that can only display
// images from disk use these helpers to get a file that is removed again when
// the returned handle is dropped.

use crate::error::CoreResult;
use std::path::Path;
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

/// Creates a named temporary file `<prefix>_XXXXXX.<extension>` in `dir`.
pub fn create_temp_file(dir: &Path, prefix: &str, extension: &str) -> CoreResult<NamedTempFile> {
    std::fs::create_dir_all(dir)?;
    let temp_file = TempFileBuilder::new()
        .prefix(&format!("{prefix}_"))
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)?;

    Ok(temp_file)
}
