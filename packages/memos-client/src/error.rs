pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("Failed to build HTTP client.")]
	BuildClient { source: reqwest::Error },
	#[error("request timeout: {method} {path}")]
	Timeout { method: String, path: String },
	#[error("network error: {method} {path}: {source}")]
	Network { method: String, path: String, source: reqwest::Error },
	#[error("memos api error {status} on {method} {path}: {message}")]
	Status { status: u16, method: String, path: String, message: String },
	#[error("{message} on {method} {path}")]
	InvalidResponse { method: String, path: String, message: String },
	#[error("memo name must look like memos/<id>, got {name:?}")]
	InvalidName { name: String },
}
