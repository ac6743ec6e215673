//! # Fragment Codegen
//!
//! Turns a [`FileAnalysis`](fragment_extract::FileAnalysis) into a loadable ES module
//! and keeps the shared entry registry pointing at it.
//!
//! ```text
//! FileAnalysis
//!     │
//!     ├──> check duplicates
//!     ├──> rewrite relative import specifiers for the output location
//!     ├──> merge with imports of the previously generated module
//!     ├──> render `export default { named, anonymous }`
//!     ├──> atomic write  <out>/<project-relative path>
//!     │
//!     └──> registry.js
//!          registry['<contentHash>'] = () => import('./<path>');   (upsert by path)
//! ```
//!
//! Generated files are a cache: [`Writer::reset_registry`] starts over, and a
//! second `write` of the same analysis leaves both files byte-identical.

mod error;
mod fs;
mod module;
mod paths;
mod registry;
mod writer;

pub use error::{CodegenError, Result};
pub use fs::write_atomic;
pub use module::{js_string_literal, render_module, render_record, ModuleImports};
pub use paths::{normalize_lexically, project_relative, rewrite_specifier, to_module_specifier};
pub use registry::{RegistryEntry, RegistryFile, Upsert, REGISTRY_FILE_NAME};
pub use writer::{WrittenModule, Writer};
