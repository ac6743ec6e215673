use crate::config::PipelineConfig;
use crate::scanner::TestScanner;
use anyhow::{Context as AnyhowContext, Result};
use fragment_codegen::{normalize_lexically, WrittenModule, Writer};
use fragment_extract::{Analyzer, FileAnalysis, Transform};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// A file that could not be extracted; other files are unaffected
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Summary of one extraction pass
#[derive(Debug, Default, Serialize)]
pub struct ExtractionReport {
    /// Files whose module was written
    pub written: Vec<PathBuf>,
    /// Test files without bridging calls
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    pub fragments: usize,
    pub duration_ms: u64,
}

impl ExtractionReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// What happened to one file
#[derive(Debug)]
pub enum FileOutcome {
    Written(WrittenModule),
    NoFragments,
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_lexically(path));
    }
    let cwd = std::env::current_dir().context("resolve current directory")?;
    Ok(normalize_lexically(&cwd.join(path)))
}

/// Scan, analyze and write a whole project
pub struct Pipeline {
    config: PipelineConfig,
    analyzer: Analyzer,
    writer: Writer,
    transforms: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    /// A relative `project_root` is anchored at the current directory
    pub fn new(mut config: PipelineConfig) -> Result<Self> {
        config.project_root = absolute(&config.project_root)?;
        let analyzer = Analyzer::new(config.analyzer.clone()).context("create analyzer")?;
        let writer = Writer::new(&config.project_root, config.output_root());
        Ok(Self {
            config,
            analyzer,
            writer,
            transforms: Vec::new(),
        })
    }

    /// Append a pre-analysis transform; transforms run in the order added
    #[must_use]
    pub fn with_transform(mut self, transform: Box<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn writer(&self) -> &Writer {
        &self.writer
    }

    /// Reset the registry, or create it when missing.
    ///
    /// Resetting is only safe while no tests are running against the output.
    pub fn prepare(&self, reset: bool) -> Result<()> {
        if reset {
            self.writer.reset_registry().context("reset registry")?;
        } else if self.writer.ensure_registry().context("create registry")? {
            log::info!(
                "Created registry at {}",
                self.writer.registry_path().display()
            );
        }
        Ok(())
    }

    /// Analyze one file without writing anything
    pub fn inspect(&self, path: &Path) -> Result<FileAnalysis> {
        self.analyzer
            .analyze_file(path, &self.transforms)
            .with_context(|| format!("analyze {}", path.display()))
    }

    /// Analyze and write one file
    pub fn extract_file(&self, path: &Path) -> Result<FileOutcome> {
        let analysis = self.inspect(&absolute(path)?)?;
        if analysis.is_empty() {
            return Ok(FileOutcome::NoFragments);
        }
        let written = self
            .writer
            .write(&analysis)
            .with_context(|| format!("write fragments of {}", path.display()))?;
        Ok(FileOutcome::Written(written))
    }

    /// Every test file under the project root
    pub fn test_files(&self) -> Result<Vec<PathBuf>> {
        let scanner = TestScanner::new(
            &self.config.project_root,
            self.writer.output_dir(),
            &self.config.test_match,
        )?;
        Ok(scanner.scan())
    }

    /// Extract every test file; one failing file does not stop the others
    pub fn extract_all(&self, reset: bool) -> Result<ExtractionReport> {
        let started = Instant::now();
        self.prepare(reset)?;

        let mut report = ExtractionReport::default();
        for path in self.test_files()? {
            match self.extract_file(&path) {
                Ok(FileOutcome::Written(written)) => {
                    log::debug!(
                        "{} -> {} ({} fragment(s))",
                        path.display(),
                        written.module_path.display(),
                        written.fragments
                    );
                    report.fragments += written.fragments;
                    report.written.push(path);
                }
                Ok(FileOutcome::NoFragments) => report.skipped.push(path),
                Err(e) => {
                    log::error!("{e:#}");
                    report.failures.push(FileFailure {
                        path,
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        log::info!(
            "Extracted {} fragment(s) from {} file(s) ({} without fragments, {} failed) in {} ms",
            report.fragments,
            report.written.len(),
            report.skipped.len(),
            report.failures.len(),
            report.duration_ms
        );
        Ok(report)
    }
}
