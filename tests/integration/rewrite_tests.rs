//! Integration tests for placeholder token rewriting

use dabcat::engine::rewrite::TokenRewriter;
use dabcat::PatchEngine;

fn rewrite(text: &str) -> String {
    TokenRewriter::default().rewrite(text)
}

// ============================================================================
// One rule at a time
// ============================================================================

#[test]
fn test_wholesale_double_quoted() {
    assert_eq!(rewrite(r#"target = "***url***""#), "target = param['url']");
}

#[test]
fn test_wholesale_unicode_prefix() {
    assert_eq!(
        rewrite("{u'url': u'***url***'}"),
        "{u'url': param['url']}"
    );
}

#[test]
fn test_left_append_example() {
    let rewritten = rewrite("'***name***, age is <<<age<<<'and more'");
    assert_eq!(rewritten, "'***name***, age is ' + param['age']and more'");
}

#[test]
fn test_right_append() {
    assert_eq!(
        rewrite("msg = '>>>user>>> logged in'"),
        "msg = param['user'] + ' logged in'"
    );
}

#[test]
fn test_insert() {
    assert_eq!(rewrite("x = '<<<ip>>>'"), "x = ' + param['ip'] + '");
}

#[test]
fn test_key_taken_verbatim() {
    assert_eq!(rewrite("'*** spaced key ***'"), "param[' spaced key ']");
}

// ============================================================================
// Precedence and scope
// ============================================================================

#[test]
fn test_all_rules_in_one_text() {
    let text = "a = '***a***'\nb = 'pre <<<b<<<'\nc = '>>>c>>> post'\nd = '<<<d>>>'\n";
    let expected = "a = param['a']\nb = 'pre ' + param['b']\nc = param['c'] + ' post'\nd = ' + param['d'] + '\n";
    assert_eq!(rewrite(text), expected);
}

#[test]
fn test_rewrites_outside_generated_block() {
    let source = "class A:\n    URL = '***url***'\n    def handle_action(self, param):\n        pass\n";
    let patch = PatchEngine::default().synthesize(source, &[]).unwrap();
    assert!(patch.text.contains("    URL = param['url']\n"));
}

#[test]
fn test_unbalanced_markers_left_alone() {
    let text = "'a <<< b' and 'c >>> d' and '** e **'";
    assert_eq!(rewrite(text), text);
}

// ============================================================================
// Idempotence after one pass
// ============================================================================

#[test]
fn test_second_pass_is_noop() {
    let samples = [
        "x = '***a***'",
        "y = 'pre <<<b<<<'",
        "z = '>>>c>>> post'",
        "w = '<<<d>>>'",
        "v = {'k': u'***k***', 'j': 'text <<<j<<<'}",
        "nothing to see here",
    ];

    for sample in samples {
        let once = rewrite(sample);
        let twice = rewrite(&once);
        assert_eq!(once, twice, "second pass changed {:?}", sample);
    }
}
