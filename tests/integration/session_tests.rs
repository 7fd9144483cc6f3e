//! Integration tests for a full run: discovery, rule loading, patching and packaging

use std::fs;
use std::path::Path;

use dabcat::config::DiscoveryConfig;
use dabcat::discovery::discover;
use dabcat::package::{write_package, AppIdentity, PackageContents};
use dabcat::{Config, LoadError, PatchEngine, Session};
use serde_json::json;
use tempfile::TempDir;

const CONNECTOR: &str = "class IpConnector(BaseConnector):\n\n    def handle_action(self, param):\n        return phantom.APP_SUCCESS\n";

const METADATA: &str = r#"{
    "appid": "prod-appid",
    "name": "IP Intel",
    "product_name": "IP Intel Cloud",
    "actions": [
        {"identifier": "lookup ip", "parameters": {"ip": {"data_type": "string"}}},
        {"identifier": "test connectivity", "parameters": {}}
    ]
}"#;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ipintel_connector.py", CONNECTOR);
    write(dir.path(), "ipintel.json", METADATA);
    write(
        dir.path(),
        "replacerizer.json",
        r#"{"203.0.113.9": "***ip***"}"#,
    );
    write(
        dir.path(),
        "dummy/ip.json",
        r#"[{"summary": {"address": "203.0.113.9"}, "data": [{"score": 90}], "message": "found"}]"#,
    );
    write(
        dir.path(),
        "dummy/conn.json",
        r#"{"summary": {}, "data": [], "message": "connected"}"#,
    );
    write(dir.path(), "dummy/broken.json", r#"{"data": []}"#);
    dir
}

fn open_session(root: &Path) -> Session {
    let files = discover(root, &DiscoveryConfig::default()).unwrap();
    Session::open(files).unwrap()
}

#[test]
fn test_discovery_and_open() {
    let dir = project();
    let session = open_session(dir.path());

    assert_eq!(session.connector_source(), CONNECTOR);
    assert_eq!(session.catalog().len(), 2);
    assert_eq!(session.substitutions().map(|t| t.len()), Some(1));
}

#[test]
fn test_rule_file_with_per_rule_failures() {
    let dir = project();
    write(
        dir.path(),
        "dummy/rules.toml",
        r#"
[[rule]]
action = "lookup ip"
data_file = "ip.json"
parameter = "ip"
value = "203.0.113.9"

[[rule]]
action = "test connectivity"
data_file = "broken.json"

[[rule]]
action = "no such action"
data_file = "conn.json"

[[rule]]
action = "test connectivity"
data_file = "conn.json"
"#,
    );

    let mut session = open_session(dir.path());
    let accepted = session
        .load_rule_file(&dir.path().join("dummy/rules.toml"))
        .unwrap();

    assert_eq!(accepted, 2);
    assert_eq!(session.failures().len(), 2);
    assert!(matches!(
        session.failures()[0].error,
        LoadError::MissingField { .. }
    ));
    assert_eq!(session.failures()[0].index, 1);
    assert!(matches!(
        session.failures()[1].error,
        LoadError::UnknownAction(_)
    ));

    let patch = PatchEngine::new(&Config::default())
        .synthesize(session.connector_source(), session.rules())
        .unwrap();

    // the substitution table turned the literal address into a placeholder,
    // which the rewriter turned into a parameter lookup
    assert!(patch
        .text
        .contains("action_result.update_summary({'address': param['ip']})"));
    assert!(patch
        .text
        .contains("if action == 'lookup ip' and param.get('ip', '') == '203.0.113.9':"));
    assert!(patch.text.contains("if action == 'test connectivity':"));
    assert_eq!(patch.branches.len(), 2);
}

#[test]
fn test_missing_rule_file_is_fatal() {
    let dir = project();
    let mut session = open_session(dir.path());
    let err = session
        .load_rule_file(&dir.path().join("nope.toml"))
        .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn test_package_written() {
    let dir = project();
    let out = TempDir::new().unwrap();
    let mut session = open_session(dir.path());

    let patch = PatchEngine::default()
        .synthesize(session.connector_source(), session.rules())
        .unwrap();

    let identity = AppIdentity::derive(session.metadata(), None, None, Some("dummy-id".to_string()));
    identity.apply(session.metadata_mut());
    let target = out.path().join(identity.dir_name("dummy"));

    let files = session.files();
    let contents = PackageContents {
        connector: (files.connector_path().unwrap(), &patch.text),
        metadata: (files.metadata_path().unwrap(), session.metadata()),
    };
    write_package(dir.path(), &target, &contents, &[]).unwrap();

    assert!(target.ends_with("ip_intel_dev_dummy"));
    let connector = fs::read_to_string(target.join("ipintel_connector.py")).unwrap();
    assert!(connector.contains("start DABCAT generated code"));

    let metadata: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(target.join("ipintel.json")).unwrap()).unwrap();
    assert_eq!(metadata["name"], json!("IP Intel DEV"));
    assert_eq!(metadata["product_name"], json!("IP Intel Cloud DEV"));
    assert_eq!(metadata["appid"], json!("dummy-id"));
    assert_eq!(metadata["actions"].as_array().map(Vec::len), Some(2));

    assert!(target.join("dummy/ip.json").exists());
    // the original project is untouched
    assert_eq!(
        fs::read_to_string(dir.path().join("ipintel_connector.py")).unwrap(),
        CONNECTOR
    );
}
