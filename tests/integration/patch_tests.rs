//! Integration tests for patch synthesis

use dabcat::engine::compiler::PREAMBLE_MARKER;
use dabcat::{Config, DummyPayload, DummyRule, PatchEngine, PatchError};
use serde_json::json;

const CONNECTOR: &str = r#"import phantom.app as phantom
from phantom.action_result import ActionResult


class UrlScanConnector(BaseConnector):

    def __init__(self):
        super(UrlScanConnector, self).__init__()

    def handle_action(self, param):
        ret_val = phantom.APP_SUCCESS
        action_id = self.get_action_identifier()
        return ret_val
"#;

fn engine() -> PatchEngine {
    PatchEngine::new(&Config::default())
}

fn payload(summary: serde_json::Value, message: &str) -> DummyPayload {
    DummyPayload::new(summary, message, vec![])
}

fn count_branches(text: &str) -> usize {
    text.lines()
        .filter(|l| l.trim_start().starts_with("if action == '"))
        .count()
}

// ============================================================================
// End-to-end shape
// ============================================================================

#[test]
fn test_single_rule_end_to_end() {
    let rules = [DummyRule::for_all(
        "get url reputation",
        payload(json!({"ok": 1}), "done"),
    )];
    let patch = engine().synthesize(CONNECTOR, &rules).unwrap();

    let expected_block = "    def handle_action(self, param):\n\
        \x20       #####################################\n\
        \x20       #### start DABCAT generated code ####\n\
        \x20       #####################################\n\
        \x20       action = self.get_action_identifier()\n\
        \x20       if action == 'get url reputation':\n\
        \x20           action_result = self.add_action_result(ActionResult(dict(param)))\n\
        \x20           action_result.update_summary({'ok': 1})\n\
        \x20           action_result.add_data([])\n\
        \x20           return action_result.set_status(phantom.APP_SUCCESS, 'done')\n\
        \x20       #####################################\n\
        \x20       #### stop DABCAT generated code #####\n\
        \x20       #####################################\n\
        \x20       ret_val = phantom.APP_SUCCESS\n";

    assert!(
        patch.text.contains(expected_block),
        "unexpected patch:\n{}",
        patch.text
    );
    assert_eq!(patch.anchor.indent_unit, "    ");
}

#[test]
fn test_empty_rule_list_only_touches_insertion_point() {
    let patch = engine().synthesize(CONNECTOR, &[]).unwrap();
    let offset = patch.anchor.insertion_offset;

    assert!(patch.text.starts_with(&CONNECTOR[..offset]));
    assert!(patch.text.ends_with(&CONNECTOR[offset..]));

    let inserted = &patch.text[offset..patch.text.len() - (CONNECTOR.len() - offset)];
    assert_eq!(inserted.lines().count(), 7);
    assert!(inserted.contains(PREAMBLE_MARKER));
    assert!(inserted.contains("action = self.get_action_identifier()"));
    assert_eq!(count_branches(inserted), 0);
}

#[test]
fn test_anchor_offset_inside_text() {
    let patch = engine().synthesize(CONNECTOR, &[]).unwrap();
    assert!(patch.anchor.insertion_offset > 0);
    assert!(patch.anchor.insertion_offset < CONNECTOR.len());
    assert_eq!(patch.anchor.line, 10);
}

// ============================================================================
// Branch ordering and dedup
// ============================================================================

#[test]
fn test_distinct_actions_keep_input_order() {
    let rules = [
        DummyRule::for_all("whois domain", payload(json!({}), "w")),
        DummyRule::guarded("lookup ip", "ip", "8.8.8.8", payload(json!({}), "ip")),
        DummyRule::for_all("get url reputation", payload(json!({}), "u")),
    ];
    let patch = engine().synthesize(CONNECTOR, &rules).unwrap();

    assert_eq!(count_branches(&patch.text), 3);
    let whois = patch.text.find("'whois domain'").unwrap();
    let ip = patch.text.find("'lookup ip'").unwrap();
    let url = patch.text.find("'get url reputation'").unwrap();
    assert!(whois < ip && ip < url);
}

#[test]
fn test_duplicate_actions_first_occurrence_wins() {
    let rules = [
        DummyRule::guarded("lookup ip", "ip", "8.8.8.8", payload(json!({"n": 1}), "first")),
        DummyRule::guarded("lookup ip", "ip", "1.1.1.1", payload(json!({"n": 2}), "second")),
        DummyRule::for_all("lookup ip", payload(json!({"n": 3}), "third")),
    ];
    let patch = engine().synthesize(CONNECTOR, &rules).unwrap();

    assert_eq!(count_branches(&patch.text), 1);
    assert!(patch
        .text
        .contains("if action == 'lookup ip' and param.get('ip', '') == '8.8.8.8':"));
    assert!(patch.text.contains("update_summary({'n': 1})"));
    assert!(!patch.text.contains("'second'"));
    assert!(!patch.text.contains("'third'"));
    assert_eq!(patch.skipped.len(), 2);
    assert!(patch.rejected.is_empty());
}

#[test]
fn test_malformed_rule_reported_not_fatal() {
    let mut broken = DummyRule::for_all("whois domain", payload(json!({}), "w"));
    broken.use_for_all = false;
    let rules = [broken, DummyRule::for_all("lookup ip", payload(json!({}), "ok"))];

    let patch = engine().synthesize(CONNECTOR, &rules).unwrap();
    assert_eq!(count_branches(&patch.text), 1);
    assert!(matches!(
        patch.rejected.as_slice(),
        [PatchError::MalformedRule { index: 0, .. }]
    ));
}

// ============================================================================
// Payload rendering
// ============================================================================

#[test]
fn test_data_items_rendered_as_literals() {
    let rules = [DummyRule::for_all(
        "list devices",
        DummyPayload::new(
            json!({"total": 2, "more": false}),
            "2 devices",
            vec![
                json!({"name": "fw-1", "tags": ["edge", null]}),
                json!({"name": "fw-2", "weight": 0.5}),
            ],
        ),
    )];
    let patch = engine().synthesize(CONNECTOR, &rules).unwrap();

    assert!(patch
        .text
        .contains("action_result.update_summary({'total': 2, 'more': False})"));
    assert!(patch
        .text
        .contains("action_result.add_data({'name': 'fw-1', 'tags': ['edge', None]})"));
    assert!(patch
        .text
        .contains("action_result.add_data({'name': 'fw-2', 'weight': 0.5})"));
    assert!(!patch.text.contains("add_data([])"));
}

#[test]
fn test_placeholders_become_parameter_lookups() {
    let rules = [DummyRule::for_all(
        "get url reputation",
        DummyPayload::new(
            json!({"url": "***url***"}),
            "done",
            vec![json!({"note": "checked <<<url<<<", "other": ">>>url>>> ok"})],
        ),
    )];
    let patch = engine().synthesize(CONNECTOR, &rules).unwrap();

    assert!(patch.text.contains("update_summary({'url': param['url']})"));
    assert!(patch
        .text
        .contains("add_data({'note': 'checked ' + param['url'], 'other': param['url'] + ' ok'})"));
}

#[test]
fn test_non_ascii_payload_rendered_as_escaped_unicode() {
    let rules = [DummyRule::for_all(
        "lookup city",
        DummyPayload::new(
            json!({"city": "Z\u{fc}rich"}),
            "trouv\u{e9}",
            vec![json!({"note": ">>>city>>> caf\u{e9}"})],
        ),
    )];
    let patch = engine().synthesize(CONNECTOR, &rules).unwrap();

    assert!(patch.text.is_ascii());
    assert!(patch
        .text
        .contains("action_result.update_summary({'city': u'Z\\xfcrich'})"));
    assert!(patch
        .text
        .contains("action_result.add_data({'note': param['city'] + u' caf\\xe9'})"));
    assert!(patch
        .text
        .contains("set_status(phantom.APP_SUCCESS, u'trouv\\xe9')"));
}

#[test]
fn test_crlf_connector_keeps_crlf() {
    let source = CONNECTOR.replace('\n', "\r\n");
    let rules = [DummyRule::for_all("lookup ip", payload(json!({}), "ok"))];
    let patch = engine().synthesize(&source, &rules).unwrap();

    assert_eq!(patch.anchor.line_ending, "\r\n");
    assert!(patch.text.contains("\r\n        if action == 'lookup ip':\r\n"));
    assert!(!patch.text.replace("\r\n", "").contains('\n'));
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn test_no_anchor_is_fatal() {
    let source = "def handle_action(self, param):\n    pass\n";
    let err = engine().synthesize(source, &[]).unwrap_err();
    match err {
        PatchError::AnchorNotFound { hint, .. } => assert!(hint.contains("line 1")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_multiple_anchors_first_wins_by_default() {
    let source = format!("{}\nclass Other:\n  def handle_action(self, p):\n    pass\n", CONNECTOR);
    let patch = engine().synthesize(&source, &[]).unwrap();
    assert_eq!(patch.anchor.line, 10);
    assert_eq!(patch.anchor.indent_unit, "    ");
}

#[test]
fn test_multiple_anchors_fail_in_strict_mode() {
    let source = format!("{}\nclass Other:\n  def handle_action(self, p):\n    pass\n", CONNECTOR);
    let engine = PatchEngine::new(&Config::default().strict());
    assert!(matches!(
        engine.synthesize(&source, &[]),
        Err(PatchError::AmbiguousAnchor { count: 2, .. })
    ));
}

#[test]
fn test_repatch_is_not_detected_as_replacement() {
    let rules = [DummyRule::for_all("lookup ip", payload(json!({}), "ok"))];
    let first = engine().synthesize(CONNECTOR, &rules).unwrap();
    let second = engine().synthesize(&first.text, &rules).unwrap();

    assert!(!first.already_patched);
    assert!(second.already_patched);
    assert_eq!(second.text.matches(PREAMBLE_MARKER).count(), 2);
    assert_eq!(count_branches(&second.text), 2);
}
