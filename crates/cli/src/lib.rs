//! # Fragment CLI
//!
//! Project-level glue around the extraction pipeline:
//!
//! ```text
//! fragments.toml ──> PipelineConfig
//!                        │
//!                        ├──> TestScanner (.gitignore aware, test_match globs)
//!                        │
//!                        └──> Pipeline, per file:
//!                             Analyzer ──> FileAnalysis ──> Writer
//!                                                            ├─> <out>/<path>
//!                                                            └─> <out>/registry.js
//! ```
//!
//! A failing file is recorded in the [`ExtractionReport`] and the pass moves on.
//! Only one pipeline may write to an output directory at a time.

pub mod config;
pub mod pipeline;
pub mod scanner;

pub use config::{PipelineConfig, CONFIG_FILE_NAME};
pub use pipeline::{ExtractionReport, FileFailure, FileOutcome, Pipeline};
pub use scanner::TestScanner;
