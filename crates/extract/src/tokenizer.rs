//! Canonical token streams for code fragments.
//!
//! A fragment written in a test file and the same fragment re-stringified from a
//! compiled function value must produce identical tokens. The walker therefore drops
//! everything a compiler is free to change: trivia, type-only syntax, quote style,
//! numeric spelling, statement terminators and trailing commas.

use crate::error::{ExtractError, Result};
use crate::language::Language;
use tree_sitter::Node;

/// Grammar used for every fragment, whatever file it came from
pub const FRAGMENT_LANGUAGE: Language = Language::Tsx;

const TYPE_ONLY_KINDS: &[&str] = &[
    "type_annotation",
    "type_arguments",
    "type_parameters",
    "type_predicate_annotation",
    "asserts_annotation",
    "opting_type_annotation",
    "omitting_type_annotation",
    "adding_type_annotation",
    "interface_declaration",
    "type_alias_declaration",
    "ambient_declaration",
    "abstract_method_signature",
    "index_signature",
    "accessibility_modifier",
    "override_modifier",
];

/// Tokenize a code fragment into its canonical token sequence
pub fn tokenize(code: &str) -> Result<Vec<String>> {
    let mut parser = FRAGMENT_LANGUAGE.parser()?;
    let tree = parser
        .parse(code, None)
        .ok_or_else(|| ExtractError::parse("Failed to parse fragment"))?;

    let mut walker = TokenWalker {
        source: code,
        tokens: Vec::new(),
    };
    walker.visit(tree.root_node());
    Ok(walker.tokens)
}

/// Short human-readable rendering of a token stream
pub fn token_preview(tokens: &[String], limit: usize) -> String {
    let shown: Vec<&str> = tokens.iter().take(limit).map(String::as_str).collect();
    let mut preview = shown.join(" ");
    if tokens.len() > limit {
        preview.push_str(" …");
    }
    preview
}

struct TokenWalker<'a> {
    source: &'a str,
    tokens: Vec<String>,
}

impl<'a> TokenWalker<'a> {
    fn text(&self, node: Node) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn visit(&mut self, node: Node) {
        let kind = node.kind();
        if TYPE_ONLY_KINDS.contains(&kind) {
            return;
        }

        match kind {
            "comment" | "html_comment" => {}
            "string" => {
                let decoded = decode_string_literal(self.text(node));
                self.tokens.push(format!("{decoded:?}"));
            }
            "number" => {
                let canonical = canonical_number(self.text(node));
                self.tokens.push(canonical);
            }
            "jsx_text" => {
                let collapsed = self.text(node).split_whitespace().collect::<Vec<_>>().join(" ");
                if !collapsed.is_empty() {
                    self.tokens.push(collapsed);
                }
            }
            // `x as T`, `x satisfies T`, `x!`: only the expression survives compilation
            "as_expression" | "satisfies_expression" | "non_null_expression" => {
                if let Some(expression) = node.named_child(0) {
                    self.visit(expression);
                }
            }
            "arrow_function" => self.visit_arrow(node),
            _ if node.child_count() == 0 => self.push_leaf(node),
            _ => self.visit_children(node),
        }
    }

    /// `x => x` and `(x) => x` are the same function
    fn visit_arrow(&mut self, node: Node) {
        let bare_parameter = node.child_by_field_name("parameter").map(|p| p.id());
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            if Some(child.id()) == bare_parameter {
                self.tokens.push("(".to_string());
                self.visit(child);
                self.tokens.push(")".to_string());
            } else {
                self.visit(child);
            }
        }
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        let optional_parameter = node.kind() == "optional_parameter";

        for (idx, child) in children.iter().enumerate() {
            let kind = child.kind();
            if optional_parameter && kind == "?" {
                continue;
            }
            if kind == "," && Self::closes_list(&children[idx + 1..]) {
                continue;
            }
            self.visit(*child);
        }
    }

    /// True when the remaining siblings start with a closing bracket
    fn closes_list(rest: &[Node]) -> bool {
        rest.iter()
            .find(|n| n.kind() != "comment")
            .map_or(true, |n| matches!(n.kind(), ")" | "]" | "}"))
    }

    fn push_leaf(&mut self, node: Node) {
        if node.is_missing() {
            return;
        }
        let text = self.text(node);
        let in_template = node
            .parent()
            .is_some_and(|p| p.kind() == "template_string");
        if text.is_empty() || (!in_template && (text.trim().is_empty() || text == ";")) {
            return;
        }
        self.tokens.push(text.to_string());
    }
}

/// Decode a quoted string literal to its runtime value
pub(crate) fn decode_string_literal(raw: &str) -> String {
    let inner = strip_quotes(raw);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            None => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') if !chars.peek().is_some_and(char::is_ascii_digit) => out.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('x');
                        out.push_str(&hex);
                    }
                }
            }
            Some('u') => {
                let unit = read_unicode_escape(&mut chars);
                match unit {
                    Some(high @ 0xD800..=0xDBFF) => {
                        let low = read_low_surrogate(&mut chars);
                        let combined = low.map(|low| 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00));
                        out.push(combined.and_then(char::from_u32).unwrap_or('\u{FFFD}'));
                    }
                    Some(code) => out.push(char::from_u32(code).unwrap_or('\u{FFFD}')),
                    None => out.push('u'),
                }
            }
            // line continuation
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('\n' | '\u{2028}' | '\u{2029}') => {}
            Some(other) => out.push(other),
        }
    }
    out
}

fn strip_quotes(raw: &str) -> &str {
    let mut chars = raw.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if open == close && matches!(open, '\'' | '"' | '`') => {
            &raw[1..raw.len() - 1]
        }
        _ => raw,
    }
}

fn read_unicode_escape(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<u32> {
    let hex: String = if chars.peek() == Some(&'{') {
        chars.next();
        chars.by_ref().take_while(|c| *c != '}').collect()
    } else {
        chars.by_ref().take(4).collect()
    };
    u32::from_str_radix(&hex, 16).ok()
}

fn read_low_surrogate(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<u32> {
    let mut lookahead = chars.clone();
    if lookahead.next() != Some('\\') || lookahead.next() != Some('u') {
        return None;
    }
    let low = read_unicode_escape(&mut lookahead)?;
    if !(0xDC00..=0xDFFF).contains(&low) {
        return None;
    }
    *chars = lookahead;
    Some(low)
}

/// Canonical spelling of a numeric literal
pub(crate) fn canonical_number(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| *c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();

    if let Some(digits) = lower.strip_suffix('n') {
        return match parse_integer(digits) {
            Some(value) => format!("{value}n"),
            None => format!("{digits}n"),
        };
    }
    if let Some(value) = parse_prefixed_integer(&lower) {
        return format!("{}", value as f64);
    }
    match lower.parse::<f64>() {
        Ok(value) => format!("{value}"),
        Err(_) => cleaned,
    }
}

fn parse_integer(digits: &str) -> Option<u128> {
    parse_prefixed_integer(digits).or_else(|| digits.parse::<u128>().ok())
}

fn parse_prefixed_integer(lower: &str) -> Option<u128> {
    let (radix, digits) = if let Some(d) = lower.strip_prefix("0x") {
        (16, d)
    } else if let Some(d) = lower.strip_prefix("0o") {
        (8, d)
    } else if let Some(d) = lower.strip_prefix("0b") {
        (2, d)
    } else {
        return None;
    };
    u128::from_str_radix(digits, radix).ok()
}
