use crate::config::AnalyzerConfig;
use crate::error::{CallShapeError, ExtractError, Result};
use crate::hash::{content_hash, fingerprint_code};
use crate::language::Language;
use crate::resolver::{import_bindings, Declaration, DeclarationResolver, ScopeResolver};
use crate::tokenizer::decode_string_literal;
use crate::transform::{apply_transforms, Transform};
use crate::types::{ExtractedFunction, FileAnalysis, FragmentKey, ImportedIdentifier, SourceFile};
use std::collections::HashSet;
use std::path::Path;
use tree_sitter::Node;

const INLINE_FUNCTION_KINDS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

/// Longest source excerpt quoted back in a shape error
const EXCERPT_LIMIT: usize = 60;

/// Finds bridging calls in a test file and lifts their inline functions out
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Create a new analyzer with configuration
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate().map_err(ExtractError::invalid_config)?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze a file read from disk
    pub fn analyze_file(
        &self,
        path: impl AsRef<Path>,
        transforms: &[Box<dyn Transform>],
    ) -> Result<FileAnalysis> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        self.analyze(&path.to_string_lossy(), &content, transforms)
    }

    /// Analyze one file.
    ///
    /// `transforms` run first, left to right; the content hash is always taken over
    /// the authored content so it does not depend on which transforms are configured.
    pub fn analyze(
        &self,
        path: &str,
        content: &str,
        transforms: &[Box<dyn Transform>],
    ) -> Result<FileAnalysis> {
        let transformed = apply_transforms(&SourceFile::new(path, content), transforms)?;
        let content_hash = content_hash(content.as_bytes());

        let language = Language::from_path(path);
        let mut parser = language.parser()?;
        let tree = parser
            .parse(&transformed.content, None)
            .ok_or_else(|| ExtractError::parse(format!("Failed to parse {path}")))?;
        let root = tree.root_node();
        if root.has_error() {
            log::warn!("{path}: source has syntax errors, extraction may be incomplete");
        }

        let resolver = ScopeResolver::build(root, &transformed.content, &self.config.fixture_names);
        let extracted_functions =
            self.extract_fragments(path, &transformed.content, root, &resolver)?;
        check_duplicates(path, &extracted_functions)?;

        log::debug!(
            "{path}: {} fragment(s), content hash {content_hash}",
            extracted_functions.len()
        );

        Ok(FileAnalysis {
            path: path.to_string(),
            content_hash,
            extracted_functions,
            imported_identifiers: transformed.imported_identifiers,
        })
    }

    /// Extract every bridging call under `root`, in source order
    pub fn extract_fragments(
        &self,
        path: &str,
        source: &str,
        root: Node<'_>,
        resolver: &dyn DeclarationResolver,
    ) -> Result<Vec<ExtractedFunction>> {
        let mut calls = Vec::new();
        self.find_bridge_calls(root, source, resolver, &mut calls);

        calls
            .into_iter()
            .map(|call| self.extract_call(path, source, call, resolver))
            .collect()
    }

    fn find_bridge_calls<'t>(
        &self,
        node: Node<'t>,
        source: &str,
        resolver: &dyn DeclarationResolver,
        calls: &mut Vec<Node<'t>>,
    ) {
        if node.kind() == "call_expression" {
            if let Some(callee) = node.child_by_field_name("function") {
                if self.is_bridge_callee(callee, source, resolver) {
                    calls.push(node);
                }
            }
        }

        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
        for child in children {
            self.find_bridge_calls(child, source, resolver, calls);
        }
    }

    fn is_bridge_callee(
        &self,
        callee: Node,
        source: &str,
        resolver: &dyn DeclarationResolver,
    ) -> bool {
        if callee.kind() != "identifier" {
            return false;
        }
        let name = &source[callee.byte_range()];
        match resolver.resolve(callee) {
            Some(Declaration::FixtureAlias { fixture }) => {
                self.config.fixture_names.contains(&fixture)
            }
            Some(Declaration::Local) => false,
            Some(Declaration::Import { .. }) | None => {
                self.config.bridge_names.iter().any(|b| b == name)
            }
        }
    }

    fn extract_call(
        &self,
        path: &str,
        source: &str,
        call: Node,
        resolver: &dyn DeclarationResolver,
    ) -> Result<ExtractedFunction> {
        let shape_error = |node: Node, reason: CallShapeError| ExtractError::Analysis {
            path: path.to_string(),
            line: node.start_position().row + 1,
            column: node.start_position().column + 1,
            reason,
        };

        let args: Vec<Node> = match call.child_by_field_name("arguments") {
            Some(arguments) if arguments.kind() == "arguments" => {
                let mut cursor = arguments.walk();
                let collected = arguments
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() != "comment")
                    .collect();
                collected
            }
            _ => Vec::new(),
        };

        if !(1..=2).contains(&args.len()) {
            return Err(shape_error(call, CallShapeError::Arity { found: args.len() }));
        }

        let label = if args.len() == 2 {
            let label_node = args[0];
            match literal_label(label_node, source) {
                Some(label) => Some(label),
                None => {
                    return Err(shape_error(
                        label_node,
                        CallShapeError::NonLiteralLabel {
                            found: excerpt(&source[label_node.byte_range()]),
                        },
                    ))
                }
            }
        } else {
            None
        };

        let function_arg = args[args.len() - 1];
        let function = unwrap_parentheses(function_arg);
        if !INLINE_FUNCTION_KINDS.contains(&function.kind()) {
            return Err(shape_error(
                function_arg,
                CallShapeError::NonInlineFunction {
                    found: excerpt(&source[function_arg.byte_range()]),
                },
            ));
        }

        let code = source[function.byte_range()].to_string();
        let key = match label {
            Some(label) => FragmentKey::Named(label),
            None => FragmentKey::Anonymous(fingerprint_code(&code)?),
        };

        let callee_id = call.child_by_field_name("function").map(|c| c.id());
        let mut imported_identifiers = Vec::new();
        let mut seen = HashSet::new();
        collect_imports(
            call,
            callee_id,
            source,
            resolver,
            &mut seen,
            &mut imported_identifiers,
        );

        Ok(ExtractedFunction {
            key,
            code,
            line: call.start_position().row + 1,
            imported_identifiers,
        })
    }
}

/// Import bindings declared in a module, in declaration order
pub fn read_imports(path: &str, content: &str) -> Result<Vec<ImportedIdentifier>> {
    let mut parser = Language::from_path(path).parser()?;
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| ExtractError::parse(format!("Failed to parse {path}")))?;
    let root = tree.root_node();

    let mut cursor = root.walk();
    let imports = root
        .children(&mut cursor)
        .filter(|n| n.kind() == "import_statement")
        .flat_map(|n| import_bindings(n, content))
        .collect();
    Ok(imports)
}

/// Reject files where two fragments would land under the same record key.
///
/// Every offending key is reported once, so one error covers all duplicates.
pub fn check_duplicates(path: &str, fragments: &[ExtractedFunction]) -> Result<()> {
    let mut seen = HashSet::new();
    let mut labels: Vec<String> = Vec::new();
    let mut fingerprints: Vec<String> = Vec::new();

    for fragment in fragments {
        if seen.insert(&fragment.key) {
            continue;
        }
        let (bucket, key) = match &fragment.key {
            FragmentKey::Named(label) => (&mut labels, label),
            FragmentKey::Anonymous(fingerprint) => (&mut fingerprints, fingerprint),
        };
        if !bucket.contains(key) {
            bucket.push(key.clone());
        }
    }

    if labels.is_empty() && fingerprints.is_empty() {
        return Ok(());
    }
    Err(ExtractError::DuplicateFragments {
        path: path.to_string(),
        labels,
        fingerprints,
    })
}

fn literal_label(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "string" => Some(decode_string_literal(&source[node.byte_range()])),
        "template_string" => {
            let mut cursor = node.walk();
            let has_substitution = node
                .named_children(&mut cursor)
                .any(|c| c.kind() == "template_substitution");
            (!has_substitution).then(|| decode_string_literal(&source[node.byte_range()]))
        }
        _ => None,
    }
}

fn unwrap_parentheses(mut node: Node) -> Node {
    while node.kind() == "parenthesized_expression" {
        let mut cursor = node.walk();
        let inner = node
            .named_children(&mut cursor)
            .find(|c| c.kind() != "comment");
        match inner {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn collect_imports(
    node: Node,
    skip: Option<usize>,
    source: &str,
    resolver: &dyn DeclarationResolver,
    seen: &mut HashSet<String>,
    out: &mut Vec<ImportedIdentifier>,
) {
    if Some(node.id()) == skip {
        return;
    }
    if matches!(node.kind(), "identifier" | "shorthand_property_identifier") {
        if let Some(Declaration::Import { module, binding }) = resolver.resolve(node) {
            let name = &source[node.byte_range()];
            if seen.insert(name.to_string()) {
                out.push(ImportedIdentifier {
                    name: name.to_string(),
                    module,
                    binding,
                });
            }
        }
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    for child in children {
        collect_imports(child, skip, source, resolver, seen, out);
    }
}

fn excerpt(text: &str) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= EXCERPT_LIMIT {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(EXCERPT_LIMIT).collect();
    cut.push('…');
    cut
}
