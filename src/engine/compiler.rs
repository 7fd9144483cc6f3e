//! Rule compilation
//!
//! Turns an ordered rule list into the conditional-dispatch block inserted
//! after the anchor. Branch order is first-seen rule order; a later rule for
//! an action that already has a branch is skipped, not treated as an error.

use serde::Serialize;
use std::collections::HashSet;

use crate::engine::common::{escape_non_ascii, find_collision, render_literal};
use crate::engine::rewrite::TokenRewriter;
use crate::error::PatchError;
use crate::input::DummyRule;

const MARKER_RULE: &str = "#####################################";

/// Text identifying a block this tool generated
pub const PREAMBLE_MARKER: &str = "#### start DABCAT generated code ####";
pub const POSTAMBLE_MARKER: &str = "#### stop DABCAT generated code #####";

/// Nesting depth of the dispatch lines, in indent units
const DISPATCH_DEPTH: usize = 2;
/// Nesting depth of branch bodies
const BODY_DEPTH: usize = 3;

/// Code generation settings
#[derive(Debug, Clone, Copy)]
pub struct CodegenOptions<'a> {
    pub param_binding: &'a str,
    pub action_binding: &'a str,
    /// Terminator for every generated line
    pub line_ending: &'a str,
    /// When set, rules whose payload would collide with the rewriter are rejected
    pub collisions: Option<&'a TokenRewriter>,
}

impl Default for CodegenOptions<'_> {
    fn default() -> Self {
        Self {
            param_binding: "param",
            action_binding: "action",
            line_ending: "\n",
            collisions: None,
        }
    }
}

/// A branch emitted into the block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    /// Position of the source rule in the input list
    pub index: usize,
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A rule dropped because its action already had a branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRule {
    pub index: usize,
    pub action_id: String,
    /// Index of the rule whose branch was kept
    pub kept_index: usize,
}

/// Result of compiling a rule list
#[derive(Debug, Clone, Default)]
pub struct CompiledBlock {
    pub text: String,
    pub branches: Vec<Branch>,
    pub skipped: Vec<SkippedRule>,
    /// Per-rule errors; compilation continues past them
    pub rejected: Vec<PatchError>,
}

/// Indentation and line terminator shared by every generated line
#[derive(Debug, Clone, Copy)]
struct Layout<'a> {
    indent_unit: &'a str,
    line_ending: &'a str,
}

impl Layout<'_> {
    fn line(&self, out: &mut String, depth: usize, code: &str) {
        for _ in 0..depth {
            out.push_str(self.indent_unit);
        }
        out.push_str(code);
        out.push_str(self.line_ending);
    }

    fn markers(&self, out: &mut String, marker: &str) {
        self.line(out, DISPATCH_DEPTH, MARKER_RULE);
        self.line(out, DISPATCH_DEPTH, marker);
        self.line(out, DISPATCH_DEPTH, MARKER_RULE);
    }
}

/// Opening marker lines
pub fn preamble(indent_unit: &str, line_ending: &str) -> String {
    let mut out = String::new();
    Layout {
        indent_unit,
        line_ending,
    }
    .markers(&mut out, PREAMBLE_MARKER);
    out
}

/// Closing marker lines
pub fn postamble(indent_unit: &str, line_ending: &str) -> String {
    let mut out = String::new();
    Layout {
        indent_unit,
        line_ending,
    }
    .markers(&mut out, POSTAMBLE_MARKER);
    out
}

/// Compile `rules` into a dispatch block indented from `indent_unit`
pub fn compile(rules: &[DummyRule], indent_unit: &str, options: &CodegenOptions) -> CompiledBlock {
    let layout = Layout {
        indent_unit,
        line_ending: options.line_ending,
    };
    let mut block = CompiledBlock {
        text: preamble(indent_unit, options.line_ending),
        ..Default::default()
    };
    layout.line(
        &mut block.text,
        DISPATCH_DEPTH,
        &format!("{} = self.get_action_identifier()", options.action_binding),
    );

    let mut seen: HashSet<&str> = HashSet::new();

    for (index, rule) in rules.iter().enumerate() {
        if seen.contains(rule.action_id.as_str()) {
            let kept_index = block
                .branches
                .iter()
                .find(|b| b.action_id == rule.action_id)
                .map(|b| b.index)
                .unwrap_or(index);
            block.skipped.push(SkippedRule {
                index,
                action_id: rule.action_id.clone(),
                kept_index,
            });
            continue;
        }

        let guard = match rule.guard(index) {
            Ok(guard) => guard,
            Err(e) => {
                block.rejected.push(e);
                continue;
            }
        };

        if let Some(rewriter) = options.collisions {
            if let Some(e) = find_collision(index, rule, rewriter) {
                block.rejected.push(e);
                continue;
            }
        }

        let condition = match guard {
            Some(g) => format!(
                " and {}.get('{}', '') == '{}'",
                options.param_binding, g.parameter, g.value
            ),
            None => String::new(),
        };

        emit_branch(&mut block.text, &layout, options, rule, &condition);

        seen.insert(rule.action_id.as_str());
        block.branches.push(Branch {
            index,
            action_id: rule.action_id.clone(),
            parameter: guard.map(|g| g.parameter.to_string()),
            value: guard.map(|g| g.value.to_string()),
        });
    }

    block.text.push_str(&postamble(indent_unit, options.line_ending));
    block
}

fn emit_branch(
    out: &mut String,
    layout: &Layout<'_>,
    options: &CodegenOptions,
    rule: &DummyRule,
    condition: &str,
) {
    let payload = &rule.payload;

    layout.line(
        out,
        DISPATCH_DEPTH,
        &format!(
            "if {} == '{}'{}:",
            options.action_binding, rule.action_id, condition
        ),
    );
    layout.line(
        out,
        BODY_DEPTH,
        &format!(
            "action_result = self.add_action_result(ActionResult(dict({})))",
            options.param_binding
        ),
    );
    layout.line(
        out,
        BODY_DEPTH,
        &format!(
            "action_result.update_summary({})",
            render_literal(&payload.summary)
        ),
    );

    if payload.data.is_empty() {
        layout.line(out, BODY_DEPTH, "action_result.add_data([])");
    } else {
        for item in &payload.data {
            layout.line(
                out,
                BODY_DEPTH,
                &format!("action_result.add_data({})", render_literal(item)),
            );
        }
    }

    // raw between quotes; non-ASCII needs a unicode literal to stay importable
    let message = if payload.message.is_ascii() {
        format!("'{}'", payload.message)
    } else {
        format!("u'{}'", escape_non_ascii(&payload.message))
    };
    layout.line(
        out,
        BODY_DEPTH,
        &format!(
            "return action_result.set_status(phantom.APP_SUCCESS, {})",
            message
        ),
    );
}
