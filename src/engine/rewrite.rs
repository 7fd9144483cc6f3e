//! Placeholder token rewriting
//!
//! Applies the token rules, in order, over the whole text. The pass is
//! global: matching delimiter shapes anywhere in the connector are rewritten,
//! not only those inside the generated block.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::rules::tokens::{DELIMITERS, TOKEN_RULES};
use crate::rules::TokenRule;

static COMPILED_RULES: Lazy<Vec<(&'static TokenRule, Regex)>> = Lazy::new(|| {
    TOKEN_RULES
        .iter()
        .map(|rule| (rule, Regex::new(rule.pattern).unwrap()))
        .collect()
});

/// Token rewriter bound to a parameter binding name
#[derive(Debug, Clone)]
pub struct TokenRewriter {
    passes: Vec<(&'static str, Regex, String)>,
}

impl TokenRewriter {
    pub fn new(param_binding: &str) -> Self {
        let passes = COMPILED_RULES
            .iter()
            .map(|(rule, regex)| (rule.id, regex.clone(), rule.replacement_for(param_binding)))
            .collect();
        Self { passes }
    }

    /// Rewrite every placeholder token in `text`
    pub fn rewrite(&self, text: &str) -> String {
        let mut result = text.to_string();

        for (_, regex, replacement) in &self.passes {
            if let std::borrow::Cow::Owned(rewritten) =
                regex.replace_all(&result, replacement.as_str())
            {
                result = rewritten;
            }
        }

        result
    }

    /// Count matches per rule, applying each pass before counting the next
    pub fn count_matches(&self, text: &str) -> Vec<(&'static str, usize)> {
        let mut current = text.to_string();
        let mut counts = Vec::with_capacity(self.passes.len());

        for (id, regex, replacement) in &self.passes {
            counts.push((*id, regex.find_iter(&current).count()));
            current = regex.replace_all(&current, replacement.as_str()).into_owned();
        }

        counts
    }
}

impl Default for TokenRewriter {
    fn default() -> Self {
        Self::new("param")
    }
}

/// First delimiter sequence present in `text`
pub fn residual_delimiter(text: &str) -> Option<&'static str> {
    DELIMITERS.iter().copied().find(|d| text.contains(d))
}
