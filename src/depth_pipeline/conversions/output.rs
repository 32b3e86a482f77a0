use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::depth_pipeline::common::error::{DepthError, Result};
use crate::depth_pipeline::raster::types::OutputFormat;

/// Output path for `input`: `<dir>/<stem>.<ext>`, where `dir` is `out_dir` or
/// the input's own directory.
///
/// If that would overwrite the input itself, `_depth` is appended to the stem.
pub fn default_output_path(input: &Path, out_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let dir = out_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new(""));
    let stem = input.file_stem().unwrap_or_default();

    let named = |suffix: &str| {
        let mut name = OsString::from(stem);
        name.push(suffix);
        name.push(".");
        name.push(format.extension());
        dir.join(name)
    };

    let candidate = named("");
    if candidate == input {
        named("_depth")
    } else {
        candidate
    }
}

/// Writes `bytes` to a hidden sibling of `path` and renames it into place.
///
/// Missing parent directories are created. On failure the temporary file is
/// removed and `path` is left untouched.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| DepthError::io(parent, e))?;

    let file_name = path.file_name().ok_or_else(|| {
        DepthError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "destination has no file name"),
        )
    })?;

    let mut tmp_name = OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".partial");
    let tmp = parent.join(tmp_name);

    if let Err(e) = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(DepthError::io(path, e));
    }

    Ok(())
}
