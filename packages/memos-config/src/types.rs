use serde::Deserialize;
use time::{UtcOffset, macros::format_description};

pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_SEARCH_MAX_COUNT: u32 = 50;
pub const DEFAULT_AUDIT_MAX_CHARS: u32 = 2_000;
pub const DEFAULT_VISIBILITY_LABEL: &str = "workspace";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub remote: Remote,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub audit: Audit,
	#[serde(default)]
	pub authorization: Authorization,
	#[serde(default)]
	pub tools: Tools,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub mcp_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
	/// Optional. Fixed offset such as "+08:00" used for date-only bounds and naive timestamps.
	/// When unset the process-local offset is used.
	pub utc_offset: Option<String>,
}
impl Service {
	pub fn utc_offset(&self) -> Option<UtcOffset> {
		self.utc_offset.as_deref().and_then(|raw| parse_utc_offset(raw).ok())
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Remote {
	pub base_url: String,
	pub token: String,
	#[serde(default)]
	pub timeout_ms: i64,
	#[serde(default = "default_visibility")]
	pub default_visibility: String,
}
impl Remote {
	pub fn timeout_ms(&self) -> u64 {
		positive_or(self.timeout_ms, DEFAULT_TIMEOUT_MS)
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Search {
	pub max_count: i64,
}
impl Search {
	pub fn max_count(&self) -> u32 {
		positive_or(self.max_count, DEFAULT_SEARCH_MAX_COUNT)
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Audit {
	pub enabled: bool,
	pub max_chars: i64,
}
impl Audit {
	pub fn max_chars(&self) -> usize {
		positive_or(self.max_chars, DEFAULT_AUDIT_MAX_CHARS as usize)
	}
}
impl Default for Audit {
	fn default() -> Self {
		Self { enabled: true, max_chars: i64::from(DEFAULT_AUDIT_MAX_CHARS) }
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Authorization {
	pub enabled: bool,
	/// Comma-separated numeric caller ids.
	pub allowed_uids: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Tools {
	pub enable_delete: bool,
}

/// Reads a numeric setting, falling back to `default` for zero, negative, or out-of-range
/// values.
pub fn positive_or<T>(raw: i64, default: T) -> T
where
	T: TryFrom<i64>,
{
	if raw <= 0 {
		return default;
	}

	T::try_from(raw).unwrap_or(default)
}

pub(crate) fn parse_utc_offset(raw: &str) -> Result<UtcOffset, time::error::Parse> {
	UtcOffset::parse(
		raw.trim(),
		format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
	)
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_visibility() -> String {
	DEFAULT_VISIBILITY_LABEL.to_string()
}
