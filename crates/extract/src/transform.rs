use crate::error::{ExtractError, Result};
use crate::types::{ImportedIdentifier, SourceFile};

/// Output of one pre-analysis rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformResult {
    /// Rewritten file content
    pub content: String,

    /// Imports the rewrite relies on (e.g. a helper it introduced)
    pub imported_identifiers: Vec<ImportedIdentifier>,
}

/// A pure source rewrite applied before analysis.
///
/// Implementations must not touch anything but their input; transforms are applied
/// strictly left to right and each sees the previous one's output.
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, file: &SourceFile) -> Result<TransformResult>;
}

/// Transform backed by a closure
pub struct FnTransform<F> {
    name: String,
    f: F,
}

impl<F> FnTransform<F>
where
    F: Fn(&SourceFile) -> Result<TransformResult> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&SourceFile) -> Result<TransformResult> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, file: &SourceFile) -> Result<TransformResult> {
        (self.f)(file)
    }
}

/// Run `transforms` left to right, collecting every introduced import
pub fn apply_transforms(
    file: &SourceFile,
    transforms: &[Box<dyn Transform>],
) -> Result<TransformResult> {
    let mut current = SourceFile::new(file.path.clone(), file.content.clone());
    let mut imported = Vec::new();

    for transform in transforms {
        let result = transform.apply(&current).map_err(|e| match e {
            ExtractError::Transform { .. } => e,
            other => ExtractError::transform(transform.name(), other.to_string()),
        })?;
        log::debug!(
            "{}: transform '{}' added {} import(s)",
            current.path,
            transform.name(),
            result.imported_identifiers.len()
        );
        imported.extend(result.imported_identifiers);
        current.content = result.content;
    }

    Ok(TransformResult {
        content: current.content,
        imported_identifiers: imported,
    })
}
