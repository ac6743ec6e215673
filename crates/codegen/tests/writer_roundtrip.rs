use fragment_codegen::{Upsert, Writer};
use fragment_extract::{
    read_imports, Analyzer, AnalyzerConfig, FileAnalysis, FnTransform, ImportedIdentifier,
    SourceFile, Transform, TransformResult,
};
use pretty_assertions::assert_eq;
use std::path::Path;

const SPEC: &str = r#"
import { test } from '@playwright/test';
import Button from '../src/Button';
import * as fmt from './fmt';

test('t', async ({ bridge }) => {
  await bridge('render', () => <Button>{fmt.money(1)}</Button>);
  await bridge(() => document.title);
});
"#;

fn analyze(root: &Path, rel: &str, content: &str) -> FileAnalysis {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    Analyzer::new(AnalyzerConfig::default())
        .unwrap()
        .analyze_file(&path, &[])
        .unwrap()
}

#[test]
fn second_write_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let writer = Writer::new(dir.path(), ".fragments");
    let analysis = analyze(dir.path(), "tests/button.spec.tsx", SPEC);

    let first = writer.write(&analysis).unwrap();
    let module = std::fs::read_to_string(&first.module_path).unwrap();
    let registry = std::fs::read_to_string(writer.registry_path()).unwrap();

    let second = writer.write(&analysis).unwrap();
    assert_eq!(second.registry, Upsert::Unchanged);
    assert_eq!(std::fs::read_to_string(&second.module_path).unwrap(), module);
    assert_eq!(std::fs::read_to_string(writer.registry_path()).unwrap(), registry);
    assert_eq!(writer.registry().unwrap().entries().count(), 1);
}

#[test]
fn generated_module_imports_resolve_from_its_own_directory() {
    let dir = tempfile::tempdir().unwrap();
    let writer = Writer::new(dir.path(), ".fragments");
    let analysis = analyze(dir.path(), "tests/button.spec.tsx", SPEC);
    let written = writer.write(&analysis).unwrap();

    let text = std::fs::read_to_string(&written.module_path).unwrap();
    let imports = read_imports(&written.module_path.to_string_lossy(), &text).unwrap();
    assert_eq!(
        imports,
        vec![
            ImportedIdentifier::default_import("Button", "../../src/Button"),
            ImportedIdentifier::namespace("fmt", "../../tests/fmt"),
        ]
    );

    let fingerprint = analysis.extracted_functions[1].fingerprint().unwrap();
    assert!(text.contains(&format!("'{fingerprint}': () => document.title,")));
    assert!(text.contains("'render': () => <Button>{fmt.money(1)}</Button>,"));
}

#[test]
fn edited_source_replaces_its_registry_line_and_keeps_others() {
    let dir = tempfile::tempdir().unwrap();
    let writer = Writer::new(dir.path(), ".fragments");

    let a = analyze(dir.path(), "tests/a.spec.ts", "bridge(() => 1);");
    let b = analyze(dir.path(), "tests/b.spec.ts", "bridge(() => 2);");
    writer.write(&a).unwrap();
    writer.write(&b).unwrap();

    let edited = analyze(dir.path(), "tests/a.spec.ts", "bridge(() => 10);");
    let written = writer.write(&edited).unwrap();
    assert_eq!(written.registry, Upsert::Replaced);

    let registry = writer.registry().unwrap();
    let entries: Vec<_> = registry
        .entries()
        .map(|e| (e.content_hash.clone(), e.import_path.clone()))
        .collect();
    assert_eq!(
        entries,
        vec![
            (edited.content_hash.clone(), "./tests/a.spec.ts".to_string()),
            (b.content_hash.clone(), "./tests/b.spec.ts".to_string()),
        ]
    );
}

#[test]
fn previously_generated_imports_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let writer = Writer::new(dir.path(), ".fragments");

    let first = analyze(
        dir.path(),
        "tests/a.spec.ts",
        "import { one } from './one';\nbridge(() => one());",
    );
    writer.write(&first).unwrap();
    let second = analyze(
        dir.path(),
        "tests/a.spec.ts",
        "import { two } from './two';\nbridge(() => two());",
    );
    let written = writer.write(&second).unwrap();

    let text = std::fs::read_to_string(&written.module_path).unwrap();
    assert!(text.contains("import { one } from '../../tests/one';"));
    assert!(text.contains("import { two } from '../../tests/two';"));
    assert_eq!(text.matches("import ").count(), 2);
}

#[test]
fn reset_and_ensure_registry() {
    let dir = tempfile::tempdir().unwrap();
    let writer = Writer::new(dir.path(), ".fragments");

    assert!(writer.ensure_registry().unwrap());
    assert!(!writer.ensure_registry().unwrap());

    let a = analyze(dir.path(), "a.spec.js", "bridge(() => 1);");
    writer.write(&a).unwrap();
    assert_eq!(writer.registry().unwrap().entries().count(), 1);
    assert!(!writer.ensure_registry().unwrap());
    assert_eq!(writer.registry().unwrap().entries().count(), 1);

    writer.reset_registry().unwrap();
    assert_eq!(writer.registry().unwrap().entries().count(), 0);
}

#[test]
fn sources_outside_the_project_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project");
    let writer = Writer::new(&project, ".fragments");
    let outside = analyze(dir.path(), "elsewhere/a.spec.ts", "bridge(() => 1);");
    assert!(writer.write(&outside).is_err());
}

#[test]
fn transform_imports_are_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let writer = Writer::new(dir.path(), ".fragments");
    let path = dir.path().join("tests/mount.spec.tsx");
    let transforms: Vec<Box<dyn Transform>> = vec![Box::new(FnTransform::new(
        "mount-helper",
        |file: &SourceFile| {
            Ok(TransformResult {
                content: file.content.clone(),
                imported_identifiers: vec![ImportedIdentifier::named("mount", "./helpers")],
            })
        },
    ))];
    let analysis = Analyzer::new(AnalyzerConfig::default())
        .unwrap()
        .analyze(
            &path.to_string_lossy(),
            "bridge('mounted', () => mount());",
            &transforms,
        )
        .unwrap();

    writer.write(&analysis).unwrap();
    let written = writer.write(&analysis).unwrap();

    let text = std::fs::read_to_string(&written.module_path).unwrap();
    assert_eq!(
        text.matches("import { mount } from '../../tests/helpers';")
            .count(),
        1,
        "{text}"
    );
}
