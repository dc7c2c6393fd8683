//! Capability gate: caller identity resolution and allow-list authorization.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

pub const REASON_DISABLED: &str = "authorization_disabled";
pub const REASON_ALLOWED: &str = "uid_allowed";
pub const REASON_EMPTY_ALLOW_LIST: &str = "allowed_uids_empty";

/// One way of learning who is calling. Returning `None` means "not resolved here".
pub trait CallerSource
where
	Self: Send + Sync,
{
	fn resolve_caller_id(&self) -> Option<String>;
}

/// Resolves nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCaller;
impl CallerSource for NoCaller {
	fn resolve_caller_id(&self) -> Option<String> {
		None
	}
}

/// An identity the host has already established.
#[derive(Clone, Debug)]
pub struct KnownCaller(pub String);
impl CallerSource for KnownCaller {
	fn resolve_caller_id(&self) -> Option<String> {
		Some(self.0.clone())
	}
}

/// Reads a string or integer at a key path inside a JSON object.
///
/// A single key addresses a direct sender field; longer paths walk nested context wrappers.
#[derive(Clone, Copy, Debug)]
pub struct JsonPathCaller<'a> {
	root: &'a Map<String, Value>,
	path: &'a [&'a str],
}
impl<'a> JsonPathCaller<'a> {
	pub fn new(root: &'a Map<String, Value>, path: &'a [&'a str]) -> Self {
		Self { root, path }
	}
}
impl CallerSource for JsonPathCaller<'_> {
	fn resolve_caller_id(&self) -> Option<String> {
		let (last, parents) = self.path.split_last()?;
		let mut current = self.root;

		for key in parents {
			current = current.get(*key)?.as_object()?;
		}

		match current.get(*last)? {
			Value::String(text) => Some(text.clone()),
			Value::Number(number) if number.is_u64() || number.is_i64() => Some(number.to_string()),
			_ => None,
		}
	}
}

/// Ordered fallback over several sources. The first non-blank identifier wins.
#[derive(Default)]
pub struct CallerChain<'a> {
	sources: Vec<Box<dyn CallerSource + 'a>>,
}
impl<'a> CallerChain<'a> {
	pub fn new() -> Self {
		Self { sources: Vec::new() }
	}

	pub fn with(mut self, source: impl CallerSource + 'a) -> Self {
		self.sources.push(Box::new(source));

		self
	}
}
impl CallerSource for CallerChain<'_> {
	fn resolve_caller_id(&self) -> Option<String> {
		self.sources.iter().find_map(|source| normalize_caller_id(source.resolve_caller_id()))
	}
}

/// Outcome of the gate. `reason` and `uid` are for logs only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthDecision {
	pub allowed: bool,
	pub reason: String,
	pub uid: Option<String>,
}
impl AuthDecision {
	fn allow(reason: &str, uid: Option<String>) -> Self {
		Self { allowed: true, reason: reason.to_string(), uid }
	}

	fn deny(reason: impl Into<String>, uid: Option<String>) -> Self {
		Self { allowed: false, reason: reason.into(), uid }
	}
}

/// Comma-separated list; entries that are not purely ASCII digits are dropped.
pub fn parse_allowed_uids(raw: &str) -> BTreeSet<String> {
	raw.split(',')
		.map(str::trim)
		.filter(|entry| !entry.is_empty() && entry.chars().all(|ch| ch.is_ascii_digit()))
		.map(str::to_string)
		.collect()
}

pub fn authorize(
	cfg: &memos_config::Authorization,
	caller: &dyn CallerSource,
	tool: &str,
) -> AuthDecision {
	if !cfg.enabled {
		return AuthDecision::allow(REASON_DISABLED, None);
	}

	let Some(uid) = normalize_caller_id(caller.resolve_caller_id()) else {
		return AuthDecision::deny(format!("uid_missing_for_tool_{tool}"), None);
	};
	let allowed = parse_allowed_uids(&cfg.allowed_uids);

	if allowed.is_empty() {
		return AuthDecision::deny(REASON_EMPTY_ALLOW_LIST, Some(uid));
	}
	if !allowed.contains(&uid) {
		return AuthDecision::deny(format!("uid_not_allowed_for_tool_{tool}"), Some(uid));
	}

	AuthDecision::allow(REASON_ALLOWED, Some(uid))
}

fn normalize_caller_id(raw: Option<String>) -> Option<String> {
	let trimmed = raw?.trim().to_string();

	if trimmed.is_empty() { None } else { Some(trimmed) }
}
