use anyhow::{Context as AnyhowContext, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Directories never searched for tests
const IGNORED_DIRS: &[&str] = &["node_modules", ".git"];

/// Finds test files under the project root (.gitignore aware)
pub struct TestScanner {
    root: PathBuf,
    output_dir: PathBuf,
    matcher: GlobSet,
}

impl TestScanner {
    pub fn new(root: impl AsRef<Path>, output_dir: impl AsRef<Path>, patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern).with_context(|| format!("invalid glob '{pattern}'"))?);
        }
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            matcher: builder.build().context("build test_match globs")?,
        })
    }

    /// Matching test files, sorted
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let output_dir = self.output_dir.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false);
        builder.filter_entry(move |entry| {
            let path = entry.path();
            if path.starts_with(&output_dir) {
                return false;
            }
            !path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| IGNORED_DIRS.contains(&n))
        });

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    if !entry.file_type().is_some_and(|t| t.is_file()) {
                        continue;
                    }
                    let path = entry.path();
                    if self.matches(path) {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!("Found {} test files", files.len());
        files
    }

    /// Whether `path` (absolute or root-relative) is selected by the globs
    pub fn matches(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        self.matcher.is_match(relative)
    }
}
