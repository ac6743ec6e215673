use crate::module::js_string_literal;
use once_cell::sync::Lazy;
use regex::Regex;

/// File name of the registry inside the output root
pub const REGISTRY_FILE_NAME: &str = "registry.js";

const HEADER: &str = "// Generated by fragments. Maps content hashes to generated modules.\n\
                      // Do not edit; `fragments reset` recreates this file.\n";

const DECLARATION: &str = "export const registry = {};";

static ENTRY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^registry\['([0-9A-Za-z_-]+)'\] = \(\) => import\('((?:[^'\\]|\\.)*)'\);\s*$")
        .expect("registry entry pattern should compile")
});

/// One `registry['<hash>'] = () => import('<path>');` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub content_hash: String,
    /// Module specifier relative to the registry file (`./tests/a.spec.ts`)
    pub import_path: String,
}

impl RegistryEntry {
    pub fn new(content_hash: impl Into<String>, import_path: impl Into<String>) -> Self {
        Self {
            content_hash: content_hash.into(),
            import_path: import_path.into(),
        }
    }

    fn render(&self) -> String {
        format!(
            "registry[{}] = () => import({});",
            js_string_literal(&self.content_hash),
            js_string_literal(&self.import_path)
        )
    }
}

/// What an upsert did to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Appended,
    Replaced,
    Unchanged,
}

/// In-memory view of the line-oriented registry file.
///
/// Lines that are not entries (header, declaration, anything hand-added) are kept
/// as they are, so an upsert only ever rewrites the one affected line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryFile {
    lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry(RegistryEntry),
    Other(String),
}

impl RegistryFile {
    /// Header and an empty registry declaration
    #[must_use]
    pub fn skeleton() -> Self {
        let lines = HEADER
            .lines()
            .chain(std::iter::once(DECLARATION))
            .map(|l| Line::Other(l.to_string()))
            .collect();
        Self { lines }
    }

    #[must_use]
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|line| match ENTRY_LINE.captures(line) {
                Some(caps) => Line::Entry(RegistryEntry::new(&caps[1], unescape(&caps[2]))),
                None => Line::Other(line.to_string()),
            })
            .collect();
        Self { lines }
    }

    /// Entries in file order
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry(entry) => Some(entry),
            Line::Other(_) => None,
        })
    }

    #[must_use]
    pub fn get(&self, content_hash: &str) -> Option<&RegistryEntry> {
        self.entries().find(|e| e.content_hash == content_hash)
    }

    /// Replace the entry for the same generated module in place, or append
    pub fn upsert(&mut self, entry: RegistryEntry) -> Upsert {
        for line in &mut self.lines {
            if let Line::Entry(existing) = line {
                if existing.import_path == entry.import_path {
                    if *existing == entry {
                        return Upsert::Unchanged;
                    }
                    *existing = entry;
                    return Upsert::Replaced;
                }
            }
        }
        self.lines.push(Line::Entry(entry));
        Upsert::Appended
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry(entry) => out.push_str(&entry.render()),
                Line::Other(text) => out.push_str(text),
            }
            out.push('\n');
        }
        out
    }
}

fn unescape(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
