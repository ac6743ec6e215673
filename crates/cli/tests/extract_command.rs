use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn fragments(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fragments").expect("binary");
    cmd.current_dir(root).arg("--quiet");
    cmd
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn setup_project() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write(
        root,
        "tests/button.spec.tsx",
        r#"
import { test } from '@playwright/test';
import { Button } from '../src/Button';

test('renders', async ({ bridge }) => {
  await bridge('mount', () => <Button />);
  await bridge(() => document.title);
});
"#,
    );
    write(root, "tests/plain.spec.ts", "test('x', () => {});\n");
    write(root, "src/Button.tsx", "export const Button = () => null;\n");
    temp
}

#[test]
fn extract_writes_modules_and_registry() {
    let temp = setup_project();
    let root = temp.path();

    let output = fragments(root)
        .args(["extract", "--json"])
        .output()
        .expect("command run");
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(report["fragments"], 2);
    assert_eq!(report["written"].as_array().unwrap().len(), 1);
    assert_eq!(report["skipped"].as_array().unwrap().len(), 1);

    let module = fs::read_to_string(root.join(".fragments/tests/button.spec.tsx")).unwrap();
    assert!(module.contains("import { Button } from '../../src/Button';"));
    assert!(module.contains("'mount': () => <Button />,"));

    let registry = fs::read_to_string(root.join(".fragments/registry.js")).unwrap();
    assert!(registry.contains("export const registry = {};"));
    assert!(registry.contains("() => import('./tests/button.spec.tsx');"));
}

#[test]
fn a_broken_file_fails_the_run_but_not_the_others() {
    let temp = setup_project();
    let root = temp.path();
    write(
        root,
        "tests/broken.spec.ts",
        "const f = () => 1;\nbridge(f);\n",
    );

    fragments(root)
        .arg("extract")
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.spec.ts"));

    assert!(root.join(".fragments/tests/button.spec.tsx").exists());
    assert!(!root.join(".fragments/tests/broken.spec.ts").exists());
}

#[test]
fn reset_drops_registry_entries() {
    let temp = setup_project();
    let root = temp.path();

    fragments(root).arg("extract").assert().success();
    fragments(root).arg("reset").assert().success();

    let registry = fs::read_to_string(root.join(".fragments/registry.js")).unwrap();
    assert!(!registry.contains("import("));
}

#[test]
fn inspect_prints_the_analysis() {
    let temp = setup_project();
    let root = temp.path();

    let output = fragments(root)
        .args(["inspect", "tests/button.spec.tsx"])
        .output()
        .expect("command run");
    assert!(output.status.success());

    let analysis: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let functions = analysis["extracted_functions"].as_array().unwrap();
    assert_eq!(functions.len(), 2);
    assert_eq!(functions[0]["key"]["named"], "mount");
    assert_eq!(functions[0]["imported_identifiers"][0]["name"], "Button");
    assert!(!root.join(".fragments").exists());
}

#[test]
fn config_file_is_honoured() {
    let temp = setup_project();
    let root = temp.path();
    write(
        root,
        "fragments.toml",
        "output_dir = \"generated\"\ntest_match = [\"tests/*.spec.tsx\"]\n",
    );

    fragments(root)
        .arg("show-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("output_dir = \"generated\""));

    fragments(root).arg("extract").assert().success();
    assert!(root.join("generated/registry.js").exists());
    assert!(root.join("generated/tests/button.spec.tsx").exists());
}

#[test]
fn relative_root_is_taken_from_the_working_directory() {
    let temp = tempdir().unwrap();
    let parent = temp.path();
    write(
        parent,
        "web/tests/a.spec.ts",
        r#"
import { helper } from './helper';

test('a', async ({ bridge }) => {
  await bridge(() => helper());
});
"#,
    );
    write(parent, "web/tests/helper.ts", "export const helper = () => 1;\n");

    for _ in 0..2 {
        let output = fragments(parent)
            .args(["--root", "web", "extract", "--json"])
            .output()
            .expect("command run");
        assert!(output.status.success());
        let report: Value = serde_json::from_slice(&output.stdout).expect("valid json");
        assert_eq!(report["written"].as_array().unwrap().len(), 1);
        assert_eq!(report["skipped"].as_array().unwrap().len(), 0);
    }

    let module = fs::read_to_string(parent.join("web/.fragments/tests/a.spec.ts")).unwrap();
    assert!(module.contains("import { helper } from '../../tests/helper';"));
    assert!(parent.join("web/.fragments/registry.js").exists());
    assert!(!parent.join("web/web").exists());
    assert!(!parent.join("web/.fragments/web").exists());
}

#[test]
fn config_in_a_subdirectory_anchors_the_project() {
    let temp = setup_project();
    let parent = temp.path().parent().unwrap().to_path_buf();
    let name = temp.path().file_name().unwrap().to_str().unwrap().to_string();

    write(temp.path(), "fragments.toml", "output_dir = \"out\"\n");
    fragments(&parent)
        .args(["--config", &format!("{name}/fragments.toml"), "extract"])
        .assert()
        .success();
    assert!(temp.path().join("out/tests/button.spec.tsx").exists());
    assert!(!temp.path().join(&name).exists());
}
