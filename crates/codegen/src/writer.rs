use crate::error::Result;
use crate::fs::{read_optional, write_atomic};
use crate::module::{render_module, ModuleImports};
use crate::paths::{project_relative, rewrite_specifier, to_module_specifier};
use crate::registry::{RegistryEntry, RegistryFile, Upsert, REGISTRY_FILE_NAME};
use fragment_extract::{check_duplicates, read_imports, FileAnalysis};
use std::path::{Path, PathBuf};

/// Outcome of writing one file's fragments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenModule {
    /// Source path relative to the project root
    pub source: PathBuf,
    /// Generated module on disk
    pub module_path: PathBuf,
    pub content_hash: String,
    /// Specifier the registry uses to load the module
    pub import_path: String,
    pub fragments: usize,
    pub registry: Upsert,
}

/// Materializes analyses under an output directory that mirrors the project tree
#[derive(Debug, Clone)]
pub struct Writer {
    project_root: PathBuf,
    output_dir: PathBuf,
}

impl Writer {
    /// `output_dir` may be relative, in which case it lives under `project_root`
    pub fn new(project_root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let output_dir = output_dir.into();
        let output_dir = if output_dir.is_absolute() {
            output_dir
        } else {
            project_root.join(output_dir)
        };
        Self {
            project_root,
            output_dir,
        }
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        self.output_dir.join(REGISTRY_FILE_NAME)
    }

    /// Where the generated module for `source` lands
    pub fn module_path_for(&self, source: &Path) -> Result<PathBuf> {
        let relative = project_relative(&self.project_root, source)?;
        Ok(self.output_dir.join(relative))
    }

    /// Write the generated module for `analysis` and upsert its registry line
    pub fn write(&self, analysis: &FileAnalysis) -> Result<WrittenModule> {
        check_duplicates(&analysis.path, &analysis.extracted_functions)?;

        let relative = project_relative(&self.project_root, Path::new(&analysis.path))?;
        let module_path = self.output_dir.join(&relative);
        let source_dir = self
            .project_root
            .join(relative.parent().unwrap_or_else(|| Path::new("")));
        let module_dir = module_path
            .parent()
            .map_or_else(|| self.output_dir.clone(), Path::to_path_buf);

        let mut imports = ModuleImports::new();
        for identifier in analysis.all_imports() {
            let module = rewrite_specifier(&identifier.module, &source_dir, &module_dir);
            imports.insert(&identifier.with_module(module));
        }

        let previous = read_optional(&module_path)?;
        if let Some(previous) = &previous {
            let kept = read_imports(&module_path.to_string_lossy(), previous)?;
            imports.extend(&kept);
        }

        let source_label = to_module_specifier(&relative);
        let source_label = source_label.trim_start_matches("./");
        let text = render_module(source_label, &imports, &analysis.extracted_functions);
        if previous.as_deref() == Some(text.as_str()) {
            log::debug!("{}: generated module unchanged", module_path.display());
        } else {
            write_atomic(&module_path, text.as_bytes())?;
        }

        let import_path = to_module_specifier(&relative);
        let mut registry = self.registry()?;
        let outcome = registry.upsert(RegistryEntry::new(&analysis.content_hash, &import_path));
        if outcome != Upsert::Unchanged || !self.registry_path().exists() {
            write_atomic(&self.registry_path(), registry.render().as_bytes())?;
        }

        log::debug!(
            "{}: {} fragment(s), {} import(s), registry {:?}",
            analysis.path,
            analysis.extracted_functions.len(),
            imports.len(),
            outcome
        );

        Ok(WrittenModule {
            source: relative,
            module_path,
            content_hash: analysis.content_hash.clone(),
            import_path,
            fragments: analysis.extracted_functions.len(),
            registry: outcome,
        })
    }

    /// Recreate an empty registry, dropping every entry
    pub fn reset_registry(&self) -> Result<()> {
        log::info!("Resetting registry at {}", self.registry_path().display());
        write_atomic(
            &self.registry_path(),
            RegistryFile::skeleton().render().as_bytes(),
        )
    }

    /// Create the registry skeleton when none exists; returns whether it was created
    pub fn ensure_registry(&self) -> Result<bool> {
        let path = self.registry_path();
        if path.exists() {
            return Ok(false);
        }
        write_atomic(&path, RegistryFile::skeleton().render().as_bytes())?;
        Ok(true)
    }

    /// Current registry contents; a missing file reads as an empty skeleton
    pub fn registry(&self) -> Result<RegistryFile> {
        Ok(read_optional(&self.registry_path())?
            .map(|text| RegistryFile::parse(&text))
            .unwrap_or_else(RegistryFile::skeleton))
    }
}
