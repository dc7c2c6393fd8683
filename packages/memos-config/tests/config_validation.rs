use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use memos_config::{ConfigSource, FileSource};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let table = root
		.as_table_mut()
		.expect("Template config must be a table.")
		.get_mut(section)
		.and_then(Value::as_table_mut)
		.unwrap_or_else(|| panic!("Template config must include [{section}]."));

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn sample_toml_without(section: &str) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

	root.as_table_mut().expect("Template config must be a table.").remove(section);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("memos_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

#[test]
fn sample_config_loads() {
	let path = write_temp_config(SAMPLE_CONFIG_TEMPLATE_TOML.to_string());
	let result = memos_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected sample config to load.");

	assert_eq!(cfg.search.max_count(), 50);
	assert_eq!(cfg.audit.max_chars(), 2_000);
	assert_eq!(cfg.service.utc_offset().map(|offset| offset.whole_hours()), Some(8));
	assert!(!cfg.authorization.enabled);
	assert!(!cfg.tools.enable_delete);
}

#[test]
fn empty_token_is_rejected() {
	let payload = sample_toml_with("remote", "token", Value::String("  ".to_string()));
	let err = memos_config::parse(&payload).expect_err("Expected token validation error.");

	assert!(
		err.to_string().contains("remote.token must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn base_url_requires_http_scheme() {
	let payload =
		sample_toml_with("remote", "base_url", Value::String("memos.example.com".to_string()));
	let err = memos_config::parse(&payload).expect_err("Expected base_url validation error.");

	assert!(
		err.to_string().contains("remote.base_url must start with"),
		"Unexpected error: {err}"
	);
}

#[test]
fn malformed_utc_offset_is_rejected() {
	let payload = sample_toml_with("service", "utc_offset", Value::String("UTC+8".to_string()));
	let err = memos_config::parse(&payload).expect_err("Expected utc_offset validation error.");

	assert!(err.to_string().contains("service.utc_offset"), "Unexpected error: {err}");
}

#[test]
fn blank_utc_offset_normalizes_to_unset() {
	let payload = sample_toml_with("service", "utc_offset", Value::String(" ".to_string()));
	let cfg = memos_config::parse(&payload).expect("Expected blank offset to be accepted.");

	assert!(cfg.service.utc_offset.is_none());
}

#[test]
fn non_positive_numbers_fall_back_to_defaults() {
	let payload = sample_toml_with("search", "max_count", Value::Integer(0));
	let cfg = memos_config::parse(&payload).expect("Expected config to parse.");

	assert_eq!(cfg.search.max_count(), memos_config::DEFAULT_SEARCH_MAX_COUNT);

	let payload = sample_toml_with("audit", "max_chars", Value::Integer(-10));
	let cfg = memos_config::parse(&payload).expect("Expected config to parse.");

	assert_eq!(cfg.audit.max_chars(), memos_config::DEFAULT_AUDIT_MAX_CHARS as usize);
}

#[test]
fn optional_sections_use_documented_defaults() {
	let payload = {
		let mut root: Value =
			toml::from_str(&sample_toml_without("audit")).expect("Failed to parse config.");
		let table = root.as_table_mut().expect("Config must be a table.");

		table.remove("authorization");
		table.remove("tools");
		table.remove("search");

		toml::to_string(&root).expect("Failed to render config.")
	};

	let cfg = memos_config::parse(&payload).expect("Expected config to parse.");

	assert!(cfg.audit.enabled);
	assert_eq!(cfg.audit.max_chars(), 2_000);
	assert!(!cfg.authorization.enabled);
	assert!(cfg.authorization.allowed_uids.is_empty());
	assert!(!cfg.tools.enable_delete);
	assert_eq!(cfg.search.max_count(), 50);
}

#[test]
fn file_source_rereads_on_every_snapshot() {
	let path = write_temp_config(SAMPLE_CONFIG_TEMPLATE_TOML.to_string());
	let source = FileSource::new(&path);
	let first = source.snapshot().expect("Expected first snapshot.");

	fs::write(&path, sample_toml_with("search", "max_count", Value::Integer(7)))
		.expect("Failed to rewrite test config.");

	let second = source.snapshot();

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert_eq!(first.search.max_count(), 50);
	assert_eq!(second.expect("Expected second snapshot.").search.max_count(), 7);
}

#[test]
fn missing_file_reports_path() {
	let source = FileSource::new("/nonexistent/memos/config.toml");
	let err = source.snapshot().expect_err("Expected read error.");

	assert!(err.to_string().contains("Failed to read config file"), "Unexpected error: {err}");
}
