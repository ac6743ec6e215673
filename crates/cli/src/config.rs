use anyhow::{Context as AnyhowContext, Result};
use fragment_extract::AnalyzerConfig;
use fragment_runner::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the project root
pub const CONFIG_FILE_NAME: &str = "fragments.toml";

const TEST_EXTENSIONS: &str = "{js,jsx,mjs,cjs,ts,tsx,mts,cts}";

/// Pipeline configuration (`fragments.toml`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root every source path is taken relative to
    pub project_root: PathBuf,

    /// Generated modules and `registry.js` (relative to `project_root`)
    pub output_dir: PathBuf,

    /// Globs, relative to `project_root`, selecting test files
    pub test_match: Vec<String>,

    /// Command serving the page fragments run in; passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_server_command: Option<String>,

    /// Bridging-call recognition
    pub analyzer: AnalyzerConfig,

    /// Registry wait used at test time
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            output_dir: PathBuf::from(".fragments"),
            test_match: vec![
                format!("**/*.spec.{TEST_EXTENSIONS}"),
                format!("**/*.test.{TEST_EXTENSIONS}"),
            ],
            web_server_command: None,
            analyzer: AnalyzerConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a config file; relative paths inside it are taken from its directory
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&text).with_context(|| format!("parse config {}", path.display()))?;

        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        config.resolve_paths(&base);
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `explicit` if given, else `<root>/fragments.toml` if present, else defaults at `root`
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Self::load(&candidate);
        }
        let config = Self {
            project_root: root.to_path_buf(),
            ..Self::default()
        };
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid default config: {e}"))?;
        Ok(config)
    }

    /// Anchor a relative `project_root` at `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.project_root.is_relative() {
            self.project_root = base.join(&self.project_root);
        }
    }

    /// Absolute (or root-anchored) output directory
    #[must_use]
    pub fn output_root(&self) -> PathBuf {
        if self.output_dir.is_absolute() {
            self.output_dir.clone()
        } else {
            self.project_root.join(&self.output_dir)
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.output_dir.as_os_str().is_empty() {
            return Err("output_dir must not be empty".to_string());
        }
        if self.test_match.is_empty() {
            return Err("test_match needs at least one glob".to_string());
        }
        for pattern in &self.test_match {
            globset::Glob::new(pattern).map_err(|e| format!("test_match '{pattern}': {e}"))?;
        }
        self.analyzer
            .validate()
            .map_err(|e| format!("analyzer: {e}"))?;
        self.retry.validate().map_err(|e| format!("retry: {e}"))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize config")
    }
}
