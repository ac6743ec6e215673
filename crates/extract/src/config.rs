use serde::{Deserialize, Serialize};

/// Configuration for bridging-call recognition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Callee names recognized directly (`bridge(() => ...)`)
    pub bridge_names: Vec<String>,

    /// Fixture names whose destructured aliases are recognized
    /// (`({ bridge: run }) => run(() => ...)`)
    pub fixture_names: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            bridge_names: vec!["bridge".to_string()],
            fixture_names: vec!["bridge".to_string()],
        }
    }
}

impl AnalyzerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.bridge_names.is_empty() && self.fixture_names.is_empty() {
            return Err("at least one bridge or fixture name is required".to_string());
        }

        for name in self.bridge_names.iter().chain(&self.fixture_names) {
            if !is_identifier(name) {
                return Err(format!("'{name}' is not a valid identifier"));
            }
        }

        Ok(())
    }
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
