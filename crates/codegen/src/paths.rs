use crate::error::{CodegenError, Result};
use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` without touching the filesystem
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `./x` and `../x` point at project files; anything else is a package
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Render a relative path the way an ES module specifier expects it
pub fn to_module_specifier(relative: &Path) -> String {
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        ".".to_string()
    } else if joined.starts_with("../") || joined == ".." {
        joined
    } else {
        format!("./{joined}")
    }
}

/// Re-point a specifier written in `from_dir` so it resolves the same from `to_dir`.
///
/// Package specifiers pass through unchanged.
pub fn rewrite_specifier(specifier: &str, from_dir: &Path, to_dir: &Path) -> String {
    if !is_relative_specifier(specifier) {
        return specifier.to_string();
    }
    let target = normalize_lexically(&from_dir.join(specifier));
    let base = normalize_lexically(to_dir);
    match pathdiff::diff_paths(&target, &base) {
        Some(relative) => to_module_specifier(&relative),
        None => specifier.to_string(),
    }
}

/// Path of `source` relative to `root`, rejecting anything that escapes it
pub fn project_relative(root: &Path, source: &Path) -> Result<PathBuf> {
    let root = normalize_lexically(root);
    let source = if source.is_absolute() {
        normalize_lexically(source)
    } else {
        normalize_lexically(&root.join(source))
    };
    match source.strip_prefix(&root) {
        Ok(relative) if !relative.as_os_str().is_empty() => Ok(relative.to_path_buf()),
        _ => Err(CodegenError::OutsideProject {
            path: source,
            root,
        }),
    }
}
