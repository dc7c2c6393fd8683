mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Audit, Authorization, Config, DEFAULT_AUDIT_MAX_CHARS, DEFAULT_SEARCH_MAX_COUNT,
	DEFAULT_TIMEOUT_MS, DEFAULT_VISIBILITY_LABEL, Remote, Search, Service, Tools, positive_or,
};

use std::{
	fs,
	path::{Path, PathBuf},
};

/// Where an operation reads its configuration from.
///
/// Operations take a fresh snapshot on every invocation, so a file-backed source picks up
/// edits on the next call without a restart.
pub trait ConfigSource
where
	Self: Send + Sync,
{
	fn snapshot(&self) -> Result<Config>;
}
impl ConfigSource for Config {
	fn snapshot(&self) -> Result<Config> {
		Ok(self.clone())
	}
}

/// Re-reads and re-validates a TOML file on every snapshot.
#[derive(Clone, Debug)]
pub struct FileSource {
	path: PathBuf,
}
impl FileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}
impl ConfigSource for FileSource {
	fn snapshot(&self) -> Result<Config> {
		load(&self.path)
	}
}

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);
	validate(&cfg)?;

	Ok(cfg)
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw).map_err(|err| Error::ParseInline { source: err })?;

	normalize(&mut cfg);
	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.mcp_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.mcp_bind must be non-empty.".to_string(),
		});
	}

	let base_url = cfg.remote.base_url.trim();

	if base_url.is_empty() {
		return Err(Error::Validation {
			message: "remote.base_url must be non-empty.".to_string(),
		});
	}
	if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
		return Err(Error::Validation {
			message: "remote.base_url must start with http:// or https://.".to_string(),
		});
	}
	if cfg.remote.token.trim().is_empty() {
		return Err(Error::Validation { message: "remote.token must be non-empty.".to_string() });
	}

	if let Some(raw) = cfg.service.utc_offset.as_deref()
		&& types::parse_utc_offset(raw).is_err()
	{
		return Err(Error::Validation {
			message: format!("service.utc_offset must look like +08:00, got {raw:?}."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.utc_offset.as_deref().map(|raw| raw.trim().is_empty()).unwrap_or(false) {
		cfg.service.utc_offset = None;
	}
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
