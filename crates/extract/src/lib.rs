//! # Fragment Extract
//!
//! Static analysis of component test files: finds every bridging call
//! (`bridge([label,] () => ...)`) and lifts the inline function out of it so it
//! can be bundled and executed inside the browser under test.
//!
//! ## Architecture
//!
//! ```text
//! Test source
//!     │
//!     ├──> content hash (SHA-256 of the authored text, 12 hex chars)
//!     │
//!     ├──> Transforms (left to right, may add imports)
//!     │
//!     ├──> Tree-sitter parse (grammar chosen from the extension)
//!     │
//!     ├──> ScopeResolver: identifier → declaration
//!     │
//!     └──> Analyzer
//!          ├─> find bridging calls (names + fixture aliases)
//!          ├─> validate call shape
//!          ├─> key = label | token fingerprint
//!          └─> collect imports referenced inside the call
//! ```
//!
//! ## Example
//!
//! ```rust
//! use fragment_extract::{Analyzer, AnalyzerConfig};
//!
//! let analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
//! let source = "test('t', async ({ bridge }) => {\n  await bridge('hello', () => 'hi');\n});";
//!
//! let analysis = analyzer.analyze("button.spec.ts", source, &[]).unwrap();
//! assert_eq!(analysis.extracted_functions[0].name(), Some("hello"));
//! assert_eq!(analysis.extracted_functions[0].code, "() => 'hi'");
//! ```

mod analyzer;
mod config;
mod error;
mod hash;
mod language;
mod resolver;
mod tokenizer;
mod transform;
mod types;

pub use analyzer::{check_duplicates, read_imports, Analyzer};
pub use config::AnalyzerConfig;
pub use error::{CallShapeError, ExtractError, Result};
pub use hash::{content_hash, fingerprint, fingerprint_code, CONTENT_HASH_LEN};
pub use language::Language;
pub use resolver::{Declaration, DeclarationResolver, ScopeResolver};
pub use tokenizer::{token_preview, tokenize, FRAGMENT_LANGUAGE};
pub use transform::{apply_transforms, FnTransform, Transform, TransformResult};
pub use types::{
    ExtractedFunction, FileAnalysis, FragmentKey, ImportBinding, ImportedIdentifier, SourceFile,
};
