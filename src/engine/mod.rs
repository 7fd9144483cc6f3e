//! Patch engine for dabcat
//!
//! Locates the anchor, compiles the rule list into a dispatch block, splices
//! it in and rewrites placeholder tokens across the result.

pub mod anchor;
pub mod common;
pub mod compiler;
pub mod rewrite;
pub mod splice;

use crate::config::{Config, PatchConfig};
use crate::error::{PatchError, Result};
use crate::input::DummyRule;

use anchor::{AnchorInfo, AnchorLocator};
use compiler::{Branch, CodegenOptions, SkippedRule, PREAMBLE_MARKER};
use rewrite::TokenRewriter;

/// Outcome of a successful synthesis
#[derive(Debug, Clone)]
pub struct Patch {
    /// Fully assembled and rewritten connector text
    pub text: String,
    pub anchor: AnchorInfo,
    pub branches: Vec<Branch>,
    pub skipped: Vec<SkippedRule>,
    pub rejected: Vec<PatchError>,
    /// The source already carried a generated block before this run
    pub already_patched: bool,
}

/// The patch synthesizer
pub struct PatchEngine {
    config: PatchConfig,
    anchor: AnchorLocator,
    rewriter: TokenRewriter,
}

impl PatchEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: &Config) -> Self {
        let config = config.patch.clone();
        let anchor = AnchorLocator::new(&config.anchor_entry);
        let rewriter = TokenRewriter::new(&config.param_binding);

        Self {
            config,
            anchor,
            rewriter,
        }
    }

    /// Main entry point: patch `source` with `rules`
    ///
    /// Anchor and splice failures abort; rule failures are collected in the
    /// returned `Patch`.
    pub fn synthesize(&self, source: &str, rules: &[DummyRule]) -> Result<Patch> {
        let anchor = self.anchor.locate(source, self.config.strict_anchor)?;

        let options = CodegenOptions {
            param_binding: &self.config.param_binding,
            action_binding: &self.config.action_binding,
            line_ending: &anchor.line_ending,
            collisions: self
                .config
                .detect_collisions
                .then_some(&self.rewriter),
        };
        let block = compiler::compile(rules, &anchor.indent_unit, &options);

        let spliced = splice::splice(source, anchor.insertion_offset, &block.text)?;
        let text = self.rewriter.rewrite(&spliced);

        Ok(Patch {
            text,
            anchor,
            branches: block.branches,
            skipped: block.skipped,
            rejected: block.rejected,
            already_patched: source.contains(PREAMBLE_MARKER),
        })
    }

    /// Run only the token rewrite pass
    pub fn rewrite(&self, text: &str) -> String {
        self.rewriter.rewrite(text)
    }

    /// Get the patch configuration
    pub fn config(&self) -> &PatchConfig {
        &self.config
    }
}

impl Default for PatchEngine {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
