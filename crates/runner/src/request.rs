use fragment_extract::{fingerprint, token_preview, tokenize};
use serde_json::Value;

/// Tokens shown when a fingerprint lookup misses
const PREVIEW_TOKENS: usize = 32;

/// Which fragment of a generated module to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentTarget {
    /// Explicit label from the call site
    Label(String),
    /// Token fingerprint, with the tokens it was computed from when known
    Fingerprint {
        fingerprint: String,
        tokens: Vec<String>,
    },
}

impl FragmentTarget {
    pub fn label(label: impl Into<String>) -> Self {
        Self::Label(label.into())
    }

    /// Fingerprint the source text of the function the test passed in
    pub fn from_code(code: &str) -> fragment_extract::Result<Self> {
        let tokens = tokenize(code)?;
        Ok(Self::Fingerprint {
            fingerprint: fingerprint(&tokens),
            tokens,
        })
    }

    /// Known fingerprint without its tokens
    pub fn fingerprint(fingerprint: impl Into<String>) -> Self {
        Self::Fingerprint {
            fingerprint: fingerprint.into(),
            tokens: Vec::new(),
        }
    }

    /// Record key looked up remotely
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Label(label) => label,
            Self::Fingerprint { fingerprint, .. } => fingerprint,
        }
    }

    /// Human-readable name of the target for error messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Label(label) => format!("label \"{label}\""),
            Self::Fingerprint { fingerprint, .. } => format!("fingerprint {fingerprint}"),
        }
    }

    #[must_use]
    pub fn preview(&self) -> String {
        match self {
            Self::Label(label) => format!("(matched by label \"{label}\")"),
            Self::Fingerprint { tokens, .. } if tokens.is_empty() => "(unknown)".to_string(),
            Self::Fingerprint { tokens, .. } => token_preview(tokens, PREVIEW_TOKENS),
        }
    }
}

/// One invocation of a fragment
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    /// Registry key of the file the fragment was extracted from
    pub content_hash: String,
    pub target: FragmentTarget,
    /// Argument passed to the fragment; must be JSON-transferable
    pub data: Value,
}

impl RunRequest {
    pub fn new(content_hash: impl Into<String>, target: FragmentTarget, data: Value) -> Self {
        Self {
            content_hash: content_hash.into(),
            target,
            data,
        }
    }
}
