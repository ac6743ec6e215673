use crate::request::FragmentTarget;
use fragment_extract::fingerprint_code;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Longest function source shown per candidate in error messages
const SOURCE_PREVIEW_CHARS: usize = 80;

/// Partition of the generated record a fragment lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Named,
    Anonymous,
}

impl Section {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Named => "named",
            Self::Anonymous => "anonymous",
        }
    }
}

/// Where a target resolved to inside the record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFragment {
    pub section: Section,
    pub key: String,
}

/// Description of a loaded module's record: key to function source, per section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(default)]
    pub named: BTreeMap<String, String>,
    #[serde(default)]
    pub anonymous: BTreeMap<String, String>,
}

impl CandidateRecord {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.anonymous.is_empty()
    }

    /// Look `target` up in its section.
    ///
    /// A fingerprint that is not a key is retried against the fingerprints of the
    /// record's own sources, which covers modules generated by an older tokenizer.
    #[must_use]
    pub fn resolve(&self, target: &FragmentTarget) -> Option<ResolvedFragment> {
        match target {
            FragmentTarget::Label(label) => {
                self.named.contains_key(label).then(|| ResolvedFragment {
                    section: Section::Named,
                    key: label.clone(),
                })
            }
            FragmentTarget::Fingerprint { fingerprint, .. } => {
                if self.anonymous.contains_key(fingerprint) {
                    return Some(ResolvedFragment {
                        section: Section::Anonymous,
                        key: fingerprint.clone(),
                    });
                }
                self.anonymous
                    .iter()
                    .find(|(_, source)| {
                        fingerprint_code(source).is_ok_and(|fp| &fp == fingerprint)
                    })
                    .map(|(key, _)| ResolvedFragment {
                        section: Section::Anonymous,
                        key: key.clone(),
                    })
            }
        }
    }
}

impl fmt::Display for CandidateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "    (module exports no fragments)");
        }
        let mut first = true;
        for (section, entries) in [("named", &self.named), ("anonymous", &self.anonymous)] {
            for (key, source) in entries {
                if !first {
                    writeln!(f)?;
                }
                first = false;
                write!(f, "    {section} '{key}': {}", shorten(source))?;
            }
        }
        Ok(())
    }
}

fn shorten(source: &str) -> String {
    let single_line = source.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= SOURCE_PREVIEW_CHARS {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(SOURCE_PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record() -> CandidateRecord {
        serde_json::from_value(serde_json::json!({
            "named": { "greet": "() => 'hi'" },
            "anonymous": { "0000000000000000": "(n) => n + 1" }
        }))
        .unwrap()
    }

    #[test]
    fn labels_resolve_in_the_named_section() {
        assert_eq!(
            record().resolve(&FragmentTarget::label("greet")),
            Some(ResolvedFragment {
                section: Section::Named,
                key: "greet".into()
            })
        );
        assert_eq!(record().resolve(&FragmentTarget::label("hello")), None);
    }

    #[test]
    fn fingerprints_fall_back_to_the_sources() {
        let target = FragmentTarget::from_code("n => n + 1").unwrap();
        assert_eq!(
            record().resolve(&target),
            Some(ResolvedFragment {
                section: Section::Anonymous,
                key: "0000000000000000".into()
            })
        );
        let exact = FragmentTarget::fingerprint("0000000000000000");
        assert!(record().resolve(&exact).is_some());
        assert_eq!(record().resolve(&FragmentTarget::fingerprint("ffff")), None);
    }

    #[test]
    fn display_lists_every_candidate() {
        let text = record().to_string();
        assert!(text.contains("named 'greet': () => 'hi'"));
        assert!(text.contains("anonymous '0000000000000000': (n) => n + 1"));
        assert!(CandidateRecord::default().to_string().contains("no fragments"));
    }

    #[test]
    fn missing_sections_deserialize_empty() {
        let record: CandidateRecord = serde_json::from_str(r#"{"named": {}}"#).unwrap();
        assert!(record.is_empty());
    }
}
