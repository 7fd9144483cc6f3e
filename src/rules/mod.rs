//! Rewrite rules for dabcat
//!
//! Defines the placeholder token patterns rewritten in connector text and the
//! literal substitution table applied to dummy-data documents.

pub mod substitution;
pub mod tokens;

/// A placeholder token rewrite rule
#[derive(Debug, Clone)]
pub struct TokenRule {
    /// Unique identifier for this rule
    pub id: &'static str,

    /// Regex pattern to match; captures `key` and optionally `q` (quote)
    pub pattern: &'static str,

    /// Replacement template; `{param}` is bound to the parameter binding name
    pub replacement: &'static str,

    /// Human-readable description of the rewrite
    pub description: &'static str,
}

impl TokenRule {
    /// Create a new rule
    pub const fn new(
        id: &'static str,
        pattern: &'static str,
        replacement: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            id,
            pattern,
            replacement,
            description,
        }
    }

    /// Replacement template with the parameter binding filled in
    pub fn replacement_for(&self, param_binding: &str) -> String {
        self.replacement.replace("{param}", param_binding)
    }
}
