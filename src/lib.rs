//! dabcat - Dummy App Builder for Code And Transforms
//!
//! This library patches a connector module with canned responses for chosen
//! actions, so a dummy copy of the app can be installed next to production.
//!
//! # Features
//!
//! - **Anchor location**: finds the handler-entry line with a regex, no parser
//! - **Rule compilation**: one conditional branch per action, optionally
//!   gated on a parameter value
//! - **Token rewriting**: quoted `***key***`, `<<<key<<<`, `>>>key>>>` and
//!   `<<<key>>>` markers become parameter lookups
//! - **Substitution tables**: literal find/replace over dummy-data documents
//! - **Packaging**: renamed metadata and a patched copy of the project tree
//! - **Audit logging**: JSONL log of every run
//!
//! # Example
//!
//! ```
//! use dabcat::{DummyPayload, DummyRule, PatchEngine};
//! use serde_json::json;
//!
//! let source = "class C:\n    def handle_action(self, param):\n        pass\n";
//! let rules = [DummyRule::for_all(
//!     "get url reputation",
//!     DummyPayload::new(json!({"ok": 1}), "done", vec![]),
//! )];
//!
//! let patch = PatchEngine::default().synthesize(source, &rules).unwrap();
//! assert!(patch.text.contains("        if action == 'get url reputation':\n"));
//! ```

pub mod audit;
pub mod catalog;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod input;
pub mod output;
pub mod package;
pub mod rules;
pub mod session;

// Re-exports for convenience
pub use config::Config;
pub use engine::{Patch, PatchEngine};
pub use error::{LoadError, PatchError};
pub use input::{DummyPayload, DummyRule};
pub use output::PatchReport;
pub use session::Session;
