use crate::error::{CodegenError, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Replace `path` with `bytes` through a sibling temp file and a rename.
///
/// Readers see either the previous content or the new one, never a prefix.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| CodegenError::NoParent(path.to_path_buf()))?;
    std::fs::create_dir_all(parent).map_err(|e| CodegenError::io("create dir", parent, e))?;

    let tmp = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("generated"),
        std::process::id()
    ));

    let result = write_and_rename(&tmp, path, bytes);
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn write_and_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    {
        let mut file = File::create(tmp).map_err(|e| CodegenError::io("create tmp", tmp, e))?;
        file.write_all(bytes)
            .map_err(|e| CodegenError::io("write tmp", tmp, e))?;
        file.sync_all()
            .map_err(|e| CodegenError::io("sync tmp", tmp, e))?;
    }
    std::fs::rename(tmp, path).map_err(|e| CodegenError::io("rename tmp", tmp, e))
}

/// Read a file, treating a missing file as `None`
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CodegenError::io("read", path, e)),
    }
}
