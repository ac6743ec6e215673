use thiserror::Error;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that can occur while analyzing a test source
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Failed to parse the source code
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Unsupported language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A bridging call does not have the shape `bridge([label,] inline_fn)`
    #[error("{path}:{line}:{column}: invalid bridging call: {reason}")]
    Analysis {
        path: String,
        line: usize,
        column: usize,
        reason: CallShapeError,
    },

    /// Two or more fragments of one file share a label or a fingerprint
    #[error(
        "duplicate fragments in {path}: {}",
        describe_duplicates(.labels, .fingerprints)
    )]
    DuplicateFragments {
        path: String,
        labels: Vec<String>,
        fingerprints: Vec<String>,
    },

    /// A pre-analysis transform rejected the file
    #[error("Transform '{name}' failed: {message}")]
    Transform { name: String, message: String },
}

/// Why a bridging call was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallShapeError {
    #[error("expected 1 or 2 arguments, found {found}")]
    Arity { found: usize },

    #[error("the label must be a string literal, found `{found}`")]
    NonLiteralLabel { found: String },

    #[error(
        "the last argument must be an inline arrow or function expression, found `{found}`; \
         the source text at the call site is what runs remotely"
    )]
    NonInlineFunction { found: String },
}

impl ExtractError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }

    /// Create a transform error
    pub fn transform(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            name: name.into(),
            message: message.into(),
        }
    }
}

fn describe_duplicates(labels: &[String], fingerprints: &[String]) -> String {
    let mut parts = Vec::new();
    if !labels.is_empty() {
        let quoted: Vec<String> = labels.iter().map(|l| format!("\"{l}\"")).collect();
        parts.push(format!("labels [{}]", quoted.join(", ")));
    }
    if !fingerprints.is_empty() {
        parts.push(format!(
            "anonymous fingerprints [{}] (add distinct labels to tell them apart)",
            fingerprints.join(", ")
        ));
    }
    parts.join("; ")
}
