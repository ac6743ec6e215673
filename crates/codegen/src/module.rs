use fragment_extract::{ExtractedFunction, FragmentKey, ImportBinding, ImportedIdentifier};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ImportClause {
    defaults: BTreeSet<String>,
    namespaces: BTreeSet<String>,
    /// (imported, local)
    named: BTreeSet<(String, String)>,
}

/// Import declarations of one generated module, grouped by specifier
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModuleImports {
    modules: BTreeMap<String, ImportClause>,
    locals: BTreeSet<String>,
}

impl ModuleImports {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one binding; returns false when its local name is already bound
    pub fn insert(&mut self, identifier: &ImportedIdentifier) -> bool {
        if !self.locals.insert(identifier.name.clone()) {
            return false;
        }
        let clause = self.modules.entry(identifier.module.clone()).or_default();
        match &identifier.binding {
            ImportBinding::Default => {
                clause.defaults.insert(identifier.name.clone());
            }
            ImportBinding::Namespace => {
                clause.namespaces.insert(identifier.name.clone());
            }
            ImportBinding::Named { imported } => {
                clause
                    .named
                    .insert((imported.clone(), identifier.name.clone()));
            }
        }
        true
    }

    pub fn extend<'a>(&mut self, identifiers: impl IntoIterator<Item = &'a ImportedIdentifier>) {
        for identifier in identifiers {
            self.insert(identifier);
        }
    }

    /// Number of bound local names
    #[must_use]
    pub fn len(&self) -> usize {
        self.locals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    /// Import declarations, one module after another in specifier order
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (module, clause) in &self.modules {
            for line in render_clause(module, clause) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }
}

fn render_clause(module: &str, clause: &ImportClause) -> Vec<String> {
    let from = js_string_literal(module);
    let mut lines = Vec::new();
    let mut defaults = clause.defaults.iter();
    let mut namespaces = clause.namespaces.iter();
    let mut named = (!clause.named.is_empty()).then(|| {
        let specifiers: Vec<String> = clause
            .named
            .iter()
            .map(|(imported, local)| {
                if imported == local {
                    local.clone()
                } else if is_identifier(imported) {
                    format!("{imported} as {local}")
                } else {
                    format!("{} as {local}", js_string_literal(imported))
                }
            })
            .collect();
        format!("{{ {} }}", specifiers.join(", "))
    });

    if let Some(default) = defaults.next() {
        if let Some(namespace) = namespaces.next() {
            lines.push(format!("import {default}, * as {namespace} from {from};"));
        } else if let Some(named) = named.take() {
            lines.push(format!("import {default}, {named} from {from};"));
        } else {
            lines.push(format!("import {default} from {from};"));
        }
    }
    for namespace in namespaces {
        lines.push(format!("import * as {namespace} from {from};"));
    }
    if let Some(named) = named {
        lines.push(format!("import {named} from {from};"));
    }
    for default in defaults {
        lines.push(format!("import {default} from {from};"));
    }
    lines
}

/// `export default { named: {...}, anonymous: {...} };`
#[must_use]
pub fn render_record(functions: &[ExtractedFunction]) -> String {
    let mut named = String::new();
    let mut anonymous = String::new();
    for function in functions {
        let section = match function.key {
            FragmentKey::Named(_) => &mut named,
            FragmentKey::Anonymous(_) => &mut anonymous,
        };
        let _ = writeln!(
            section,
            "    {}: {},",
            js_string_literal(function.key.as_str()),
            function.code
        );
    }

    let mut out = String::from("export default {\n");
    for (name, body) in [("named", named), ("anonymous", anonymous)] {
        if body.is_empty() {
            let _ = writeln!(out, "  {name}: {{}},");
        } else {
            let _ = write!(out, "  {name}: {{\n{body}  }},\n");
        }
    }
    out.push_str("};\n");
    out
}

/// Full text of a generated module
#[must_use]
pub fn render_module(source_path: &str, imports: &ModuleImports, functions: &[ExtractedFunction]) -> String {
    let mut out = format!("// Generated from {source_path}. Do not edit.\n");
    if !imports.is_empty() {
        out.push_str(&imports.render());
    }
    out.push('\n');
    out.push_str(&render_record(functions));
    out
}

/// Single-quoted JavaScript string literal
#[must_use]
pub fn js_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' | '\u{2029}' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn function(key: FragmentKey, code: &str) -> ExtractedFunction {
        ExtractedFunction {
            key,
            code: code.to_string(),
            line: 1,
            imported_identifiers: vec![],
        }
    }

    #[test]
    fn renders_grouped_imports() {
        let mut imports = ModuleImports::new();
        imports.extend(&[
            ImportedIdentifier::named("b", "./x"),
            ImportedIdentifier::default_import("X", "./x"),
            ImportedIdentifier::named("a", "./x"),
            ImportedIdentifier::namespace("lib", "lib"),
            ImportedIdentifier {
                name: "local".into(),
                module: "./x".into(),
                binding: ImportBinding::Named {
                    imported: "remote".into(),
                },
            },
        ]);
        assert_eq!(
            imports.render(),
            "import X, { a, b, remote as local } from './x';\nimport * as lib from 'lib';\n"
        );
    }

    #[test]
    fn default_pairs_with_namespace_first() {
        let mut imports = ModuleImports::new();
        imports.extend(&[
            ImportedIdentifier::default_import("D", "m"),
            ImportedIdentifier::namespace("ns", "m"),
            ImportedIdentifier::named("n", "m"),
        ]);
        assert_eq!(
            imports.render(),
            "import D, * as ns from 'm';\nimport { n } from 'm';\n"
        );
    }

    #[test]
    fn first_binding_of_a_local_name_wins() {
        let mut imports = ModuleImports::new();
        assert!(imports.insert(&ImportedIdentifier::named("a", "./new")));
        assert!(!imports.insert(&ImportedIdentifier::named("a", "./old")));
        assert!(!imports.insert(&ImportedIdentifier::named("a", "./new")));
        assert_eq!(imports.len(), 1);
        assert_eq!(imports.render(), "import { a } from './new';\n");
    }

    #[test]
    fn renders_both_record_sections() {
        let record = render_record(&[
            function(FragmentKey::Named("it's".into()), "() => 1"),
            function(FragmentKey::Anonymous("00ff".into()), "async () => {\n  await x();\n}"),
        ]);
        assert_eq!(
            record,
            "export default {\n  named: {\n    'it\\'s': () => 1,\n  },\n  anonymous: {\n    '00ff': async () => {\n  await x();\n},\n  },\n};\n"
        );
    }

    #[test]
    fn empty_sections_render_as_empty_objects() {
        assert_eq!(
            render_record(&[]),
            "export default {\n  named: {},\n  anonymous: {},\n};\n"
        );
    }

    #[test]
    fn escapes_string_literals() {
        assert_eq!(js_string_literal("a\\b'c\nd"), "'a\\\\b\\'c\\nd'");
        assert_eq!(js_string_literal("\u{2028}"), "'\\u2028'");
    }
}
