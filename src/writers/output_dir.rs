use crate::error::{ProcessingError, Result};
use std::fs;
use std::path::Path;

/// Check an output directory before any shard is read.
///
/// It must exist and be a directory; a full rebuild also requires it empty.
pub fn assert_output_dir(path: &Path, require_empty: bool) -> Result<()> {
    if !path.exists() {
        return Err(ProcessingError::OutputMissing {
            path: path.to_path_buf(),
        });
    }

    if !path.is_dir() {
        return Err(ProcessingError::OutputNotDirectory {
            path: path.to_path_buf(),
        });
    }

    if require_empty && fs::read_dir(path)?.next().is_some() {
        return Err(ProcessingError::OutputNotEmpty {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}
