//! Lexical declaration lookup.
//!
//! The analyzer never asks "is this node an import?" directly; it asks a
//! [`DeclarationResolver`] where an identifier was declared. [`ScopeResolver`] answers
//! from one pass over the syntax tree, honouring shadowing by nested scopes.

use crate::tokenizer::decode_string_literal;
use crate::types::{ImportBinding, ImportedIdentifier};
use std::collections::HashMap;
use tree_sitter::Node;

/// Where an identifier was declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// Bound by an import statement
    Import {
        module: String,
        binding: ImportBinding,
    },
    /// Bound by destructuring a fixture out of a parameter (`({ bridge: run }) => ..`)
    FixtureAlias { fixture: String },
    /// Any other local binding
    Local,
}

/// Resolve identifier nodes to their declarations
pub trait DeclarationResolver {
    fn resolve(&self, identifier: Node<'_>) -> Option<Declaration>;
}

const SCOPE_KINDS: &[&str] = &[
    "program",
    "statement_block",
    "arrow_function",
    "function_expression",
    "function",
    "function_declaration",
    "generator_function",
    "generator_function_declaration",
    "method_definition",
    "for_statement",
    "for_in_statement",
    "catch_clause",
    "class_body",
];

const FUNCTION_KINDS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "function_declaration",
    "generator_function",
    "generator_function_declaration",
    "method_definition",
];

/// Scope table built from a parsed file
pub struct ScopeResolver<'src> {
    source: &'src str,
    fixture_names: Vec<String>,
    scopes: HashMap<usize, HashMap<String, Declaration>>,
    root_id: usize,
}

impl<'src> ScopeResolver<'src> {
    /// Collect every binding under `root`
    pub fn build(root: Node<'_>, source: &'src str, fixture_names: &[String]) -> Self {
        let mut resolver = Self {
            source,
            fixture_names: fixture_names.to_vec(),
            scopes: HashMap::new(),
            root_id: root.id(),
        };
        resolver.collect(root);
        resolver
    }

    fn text(&self, node: Node) -> &'src str {
        &self.source[node.byte_range()]
    }

    fn bind(&mut self, scope: usize, name: &str, declaration: Declaration) {
        self.scopes
            .entry(scope)
            .or_default()
            .insert(name.to_string(), declaration);
    }

    /// Nearest scope containing `node` (inclusive)
    fn enclosing_scope(&self, node: Option<Node>) -> usize {
        let mut current = node;
        while let Some(n) = current {
            if SCOPE_KINDS.contains(&n.kind()) {
                return n.id();
            }
            current = n.parent();
        }
        self.root_id
    }

    /// Nearest function or program containing `node` (`var` hoisting)
    fn function_scope(&self, node: Node) -> usize {
        let mut current = Some(node);
        while let Some(n) = current {
            if FUNCTION_KINDS.contains(&n.kind()) || n.kind() == "program" {
                return n.id();
            }
            current = n.parent();
        }
        self.root_id
    }

    fn collect(&mut self, node: Node) {
        match node.kind() {
            "import_statement" => {
                for import in import_bindings(node, self.source) {
                    self.bind(
                        self.root_id,
                        &import.name,
                        Declaration::Import {
                            module: import.module,
                            binding: import.binding,
                        },
                    );
                }
            }
            "variable_declarator" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let hoisted = node
                        .parent()
                        .is_some_and(|p| p.kind() == "variable_declaration");
                    let scope = if hoisted {
                        self.function_scope(node)
                    } else {
                        self.enclosing_scope(Some(node))
                    };
                    self.bind_pattern(scope, name, false);
                }
            }
            "function_declaration"
            | "generator_function_declaration"
            | "class_declaration"
            | "abstract_class_declaration"
            | "enum_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let scope = self.enclosing_scope(node.parent());
                    let name = self.text(name);
                    self.bind(scope, name, Declaration::Local);
                }
            }
            "function_expression" | "function" | "generator_function" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let name = self.text(name);
                    self.bind(node.id(), name, Declaration::Local);
                }
            }
            "catch_clause" => {
                if let Some(parameter) = node.child_by_field_name("parameter") {
                    self.bind_pattern(node.id(), parameter, false);
                }
            }
            "for_in_statement" => {
                if node.child_by_field_name("kind").is_some() {
                    if let Some(left) = node.child_by_field_name("left") {
                        self.bind_pattern(node.id(), left, false);
                    }
                }
            }
            _ => {}
        }

        if FUNCTION_KINDS.contains(&node.kind()) {
            self.collect_parameters(node);
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            self.collect(child);
        }
    }

    fn collect_parameters(&mut self, function: Node) {
        let scope = function.id();
        if let Some(parameter) = function.child_by_field_name("parameter") {
            self.bind_pattern(scope, parameter, false);
        }
        let Some(parameters) = function.child_by_field_name("parameters") else {
            return;
        };
        let mut cursor = parameters.walk();
        let params: Vec<Node> = parameters.named_children(&mut cursor).collect();
        for param in params {
            self.bind_pattern(scope, param, true);
        }
    }

    /// Bind every identifier introduced by a pattern.
    ///
    /// `fixture_context` is true only for object patterns written directly in a
    /// parameter list; that is where fixtures get destructured.
    fn bind_pattern(&mut self, scope: usize, pattern: Node, fixture_context: bool) {
        match pattern.kind() {
            "identifier" => {
                let name = self.text(pattern);
                self.bind(scope, name, Declaration::Local);
            }
            "shorthand_property_identifier_pattern" => {
                let name = self.text(pattern);
                let declaration = if fixture_context && self.is_fixture(name) {
                    Declaration::FixtureAlias {
                        fixture: name.to_string(),
                    }
                } else {
                    Declaration::Local
                };
                self.bind(scope, name, declaration);
            }
            "pair_pattern" => {
                let key = pattern
                    .child_by_field_name("key")
                    .map(|k| decode_string_literal(self.text(k)));
                let Some(value) = pattern.child_by_field_name("value") else {
                    return;
                };
                let target = if value.kind() == "assignment_pattern" {
                    value.child_by_field_name("left").unwrap_or(value)
                } else {
                    value
                };
                match key {
                    Some(key)
                        if fixture_context
                            && self.is_fixture(&key)
                            && target.kind() == "identifier" =>
                    {
                        let alias = self.text(target);
                        self.bind(scope, alias, Declaration::FixtureAlias { fixture: key });
                    }
                    _ => self.bind_pattern(scope, value, false),
                }
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = pattern.child_by_field_name("left") {
                    self.bind_pattern(scope, left, fixture_context);
                }
            }
            "required_parameter" | "optional_parameter" => {
                if let Some(inner) = pattern.child_by_field_name("pattern") {
                    self.bind_pattern(scope, inner, fixture_context);
                }
            }
            "object_pattern" => {
                let mut cursor = pattern.walk();
                let parts: Vec<Node> = pattern.named_children(&mut cursor).collect();
                for part in parts {
                    self.bind_pattern(scope, part, fixture_context);
                }
            }
            "array_pattern" | "rest_pattern" => {
                let mut cursor = pattern.walk();
                let parts: Vec<Node> = pattern.named_children(&mut cursor).collect();
                for part in parts {
                    self.bind_pattern(scope, part, false);
                }
            }
            _ => {}
        }
    }

    fn is_fixture(&self, name: &str) -> bool {
        self.fixture_names.iter().any(|f| f == name)
    }
}

impl DeclarationResolver for ScopeResolver<'_> {
    fn resolve(&self, identifier: Node<'_>) -> Option<Declaration> {
        let name = self.text(identifier);
        let mut current = Some(identifier);
        while let Some(node) = current {
            if let Some(declaration) = self.scopes.get(&node.id()).and_then(|s| s.get(name)) {
                return Some(declaration.clone());
            }
            current = node.parent();
        }
        None
    }
}

/// Value bindings introduced by one `import_statement` node.
///
/// Type-only imports (`import type ..`, `import { type X }`) bind nothing at run time.
pub(crate) fn import_bindings(node: Node, source: &str) -> Vec<ImportedIdentifier> {
    fn text<'s>(source: &'s str, node: Node) -> &'s str {
        &source[node.byte_range()]
    }

    let mut out = Vec::new();

    if has_token(node, "type") || has_token(node, "typeof") {
        return out;
    }
    let Some(module) = node
        .child_by_field_name("source")
        .map(|s| decode_string_literal(text(source, s)))
    else {
        return out;
    };

    let mut cursor = node.walk();
    let clauses: Vec<Node> = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "import_clause")
        .collect();

    for clause in clauses {
        let mut clause_cursor = clause.walk();
        let parts: Vec<Node> = clause.named_children(&mut clause_cursor).collect();
        for part in parts {
            match part.kind() {
                "identifier" => {
                    out.push(ImportedIdentifier::default_import(text(source, part), &module));
                }
                "namespace_import" => {
                    let mut ns_cursor = part.walk();
                    let local = part
                        .named_children(&mut ns_cursor)
                        .find(|c| c.kind() == "identifier");
                    if let Some(local) = local {
                        out.push(ImportedIdentifier::namespace(text(source, local), &module));
                    }
                }
                "named_imports" => {
                    let mut spec_cursor = part.walk();
                    let specifiers: Vec<Node> = part
                        .named_children(&mut spec_cursor)
                        .filter(|s| s.kind() == "import_specifier")
                        .collect();
                    for specifier in specifiers {
                        if has_token(specifier, "type") || has_token(specifier, "typeof") {
                            continue;
                        }
                        let Some(name) = specifier.child_by_field_name("name") else {
                            continue;
                        };
                        let imported = decode_string_literal(text(source, name));
                        let local = specifier
                            .child_by_field_name("alias")
                            .map(|a| text(source, a).to_string())
                            .unwrap_or_else(|| imported.clone());
                        out.push(ImportedIdentifier {
                            name: local,
                            module: module.clone(),
                            binding: ImportBinding::Named { imported },
                        });
                    }
                }
                _ => {}
            }
        }
    }
    out
}

/// True when `node` has a direct anonymous child token `token`
fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use pretty_assertions::assert_eq;

    fn find_identifiers<'t>(node: Node<'t>, source: &str, name: &str, out: &mut Vec<Node<'t>>) {
        if matches!(node.kind(), "identifier" | "shorthand_property_identifier")
            && &source[node.byte_range()] == name
        {
            out.push(node);
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            find_identifiers(child, source, name, out);
        }
    }

    fn resolve_all(source: &str, name: &str) -> Vec<Option<Declaration>> {
        let mut parser = Language::TypeScript.parser().unwrap();
        let tree = parser.parse(source, None).unwrap();
        let fixtures = vec!["bridge".to_string()];
        let resolver = ScopeResolver::build(tree.root_node(), source, &fixtures);
        let mut nodes = Vec::new();
        find_identifiers(tree.root_node(), source, name, &mut nodes);
        nodes.into_iter().map(|n| resolver.resolve(n)).collect()
    }

    #[test]
    fn resolves_import_bindings() {
        let source = "import Def, { a as b } from './m';\nimport * as ns from 'lib';\nb(); Def(); ns.x;";
        assert_eq!(
            resolve_all(source, "b").last().cloned().flatten(),
            Some(Declaration::Import {
                module: "./m".into(),
                binding: ImportBinding::Named {
                    imported: "a".into()
                },
            })
        );
        assert_eq!(
            resolve_all(source, "Def").last().cloned().flatten(),
            Some(Declaration::Import {
                module: "./m".into(),
                binding: ImportBinding::Default,
            })
        );
        assert_eq!(
            resolve_all(source, "ns").last().cloned().flatten(),
            Some(Declaration::Import {
                module: "lib".into(),
                binding: ImportBinding::Namespace,
            })
        );
    }

    #[test]
    fn local_bindings_shadow_imports() {
        let source = "import { a } from './m';\nfunction f(a) { return a; }\nconst g = () => a;";
        let resolved = resolve_all(source, "a");
        // [import specifier, parameter, return a, arrow body a]
        assert_eq!(resolved[2], Some(Declaration::Local));
        assert!(matches!(
            resolved.last().cloned().flatten(),
            Some(Declaration::Import { .. })
        ));
    }

    #[test]
    fn block_scoped_declarations_do_not_leak() {
        let source = "import { x } from './m';\n{ const x = 1; x; }\nx;";
        let resolved = resolve_all(source, "x");
        assert_eq!(resolved[2], Some(Declaration::Local));
        assert!(matches!(
            resolved.last().cloned().flatten(),
            Some(Declaration::Import { .. })
        ));
    }

    #[test]
    fn fixture_aliases_are_recognized() {
        let source = "test('t', async ({ bridge: run, page }) => { run(() => 1); });";
        let resolved = resolve_all(source, "run");
        assert_eq!(
            resolved.last().cloned().flatten(),
            Some(Declaration::FixtureAlias {
                fixture: "bridge".into()
            })
        );
    }

    #[test]
    fn shorthand_fixture_destructuring() {
        let source = "test('t', async ({ bridge }) => { bridge(() => 1); });";
        let resolved = resolve_all(source, "bridge");
        assert_eq!(
            resolved.last().cloned().flatten(),
            Some(Declaration::FixtureAlias {
                fixture: "bridge".into()
            })
        );
    }

    #[test]
    fn type_only_imports_bind_nothing() {
        let source = "import type { T } from './t';\nimport { type U, v } from './u';\nT; U; v;";
        assert_eq!(resolve_all(source, "T").last().cloned().flatten(), None);
        assert_eq!(resolve_all(source, "U").last().cloned().flatten(), None);
        assert!(resolve_all(source, "v").last().cloned().flatten().is_some());
    }
}
