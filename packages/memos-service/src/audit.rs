//! Bounded, human-readable trace of the steps an operation took.

use serde::Serialize;
use serde_json::{Map, Value};

pub const TRUNCATION_MARKER: &str = "...";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuditTrace {
	pub trace_id: String,
	pub steps: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub metrics: Option<Map<String, Value>>,
}

/// Steps and metrics collected during one invocation.
#[derive(Clone, Debug, Default)]
pub struct AuditTrail {
	steps: Vec<String>,
	metrics: Map<String, Value>,
}
impl AuditTrail {
	pub fn step(&mut self, step: impl Into<String>) {
		self.steps.push(step.into());
	}

	pub fn metric(&mut self, key: &str, value: impl Into<Value>) {
		self.metrics.insert(key.to_string(), value.into());
	}

	pub fn build(&self, cfg: &memos_config::Audit, trace_id: &str) -> Option<AuditTrace> {
		build_audit(cfg, trace_id, &self.steps, Some(self.metrics.clone()))
	}
}

/// Returns `None` when auditing is disabled.
pub fn build_audit(
	cfg: &memos_config::Audit,
	trace_id: &str,
	steps: &[String],
	metrics: Option<Map<String, Value>>,
) -> Option<AuditTrace> {
	if !cfg.enabled {
		return None;
	}

	Some(AuditTrace {
		trace_id: trace_id.to_string(),
		steps: truncate_chars(&steps.join("\n"), cfg.max_chars()),
		metrics: metrics.filter(|metrics| !metrics.is_empty()),
	})
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
	match text.char_indices().nth(max_chars) {
		Some((idx, _)) => format!("{}{TRUNCATION_MARKER}", &text[..idx]),
		None => text.to_string(),
	}
}
