use serde::{Deserialize, Serialize};

/// One source file as seen by a single analysis pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path of the file (project-relative or absolute)
    pub path: String,

    /// Full text of the file
    pub content: String,
}

impl SourceFile {
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// How an imported identifier is bound by its import declaration
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportBinding {
    /// `import name from 'module'`
    Default,
    /// `import { imported as name } from 'module'`
    Named { imported: String },
    /// `import * as name from 'module'`
    Namespace,
}

/// An identifier whose declaration traces back to an import statement
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImportedIdentifier {
    /// Local name used in the source
    pub name: String,

    /// Module specifier exactly as written in the import
    pub module: String,

    /// Shape of the binding
    pub binding: ImportBinding,
}

impl ImportedIdentifier {
    /// `import { name } from 'module'`
    #[must_use]
    pub fn named(name: impl Into<String>, module: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            binding: ImportBinding::Named {
                imported: name.clone(),
            },
            name,
            module: module.into(),
        }
    }

    /// `import name from 'module'`
    #[must_use]
    pub fn default_import(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            binding: ImportBinding::Default,
        }
    }

    /// `import * as name from 'module'`
    #[must_use]
    pub fn namespace(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            binding: ImportBinding::Namespace,
        }
    }

    /// Same identifier bound from a different module specifier
    #[must_use]
    pub fn with_module(&self, module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..self.clone()
        }
    }
}

/// Identity of a fragment inside its file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKey {
    /// Explicit label given at the call site
    Named(String),
    /// Token fingerprint of the normalized code
    Anonymous(String),
}

impl FragmentKey {
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Named(label) => Some(label),
            Self::Anonymous(_) => None,
        }
    }

    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        match self {
            Self::Named(_) => None,
            Self::Anonymous(fingerprint) => Some(fingerprint),
        }
    }

    /// The key as it appears in the generated record
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Named(key) | Self::Anonymous(key) => key,
        }
    }
}

/// One inline function lifted out of a bridging call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFunction {
    /// Label or fingerprint
    pub key: FragmentKey,

    /// Verbatim source text of the inline function
    pub code: String,

    /// Line of the bridging call (1-indexed)
    pub line: usize,

    /// Imports referenced from inside the call
    pub imported_identifiers: Vec<ImportedIdentifier>,
}

impl ExtractedFunction {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.key.label()
    }

    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        self.key.fingerprint()
    }
}

/// Everything one analysis pass learned about a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysis {
    /// Path as given to the analyzer
    pub path: String,

    /// Short hash of the authored (pre-transform) content
    pub content_hash: String,

    /// Fragments in source order
    pub extracted_functions: Vec<ExtractedFunction>,

    /// Identifiers introduced by pre-analysis transforms
    pub imported_identifiers: Vec<ImportedIdentifier>,
}

impl FileAnalysis {
    /// Every import the generated module needs, fragment-local ones first
    pub fn all_imports(&self) -> impl Iterator<Item = &ImportedIdentifier> {
        self.extracted_functions
            .iter()
            .flat_map(|f| f.imported_identifiers.iter())
            .chain(self.imported_identifiers.iter())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extracted_functions.is_empty()
    }
}
