mod error;
mod models;

pub use error::{Error, Result};
pub use models::{ListPageRequest, Memo, MemoPage, MemoPatch, MemoState, Visibility};

use std::time::Duration as StdDuration;

use reqwest::{
	Client, Method,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde_json::{Map, Value};

use crate::models::RawMemo;

const API_PREFIX: &str = "/api/v1";
const MEMO_NAME_PREFIX: &str = "memos/";
const SORT_FIELD: &str = "display_time";
const SORT_DIRECTION: &str = "DESC";

/// Thin client for the remote memo service.
///
/// Cheap to build. Operations construct one per invocation from the current configuration
/// snapshot instead of keeping a pool around.
#[derive(Clone, Debug)]
pub struct MemosClient {
	base_url: String,
	http: Client,
}
impl MemosClient {
	pub fn new(cfg: &memos_config::Remote) -> Result<Self> {
		let base_url = normalize_base_url(&cfg.base_url);

		if base_url.is_empty() {
			return Err(Error::InvalidConfig { message: "remote.base_url is empty.".to_string() });
		}

		let token = cfg.token.trim();

		if token.is_empty() {
			return Err(Error::InvalidConfig { message: "remote.token is empty.".to_string() });
		}

		let http = Client::builder()
			.timeout(StdDuration::from_millis(cfg.timeout_ms()))
			.default_headers(auth_headers(token)?)
			.build()
			.map_err(|source| Error::BuildClient { source })?;

		Ok(Self { base_url, http })
	}

	pub async fn list_memos_page(&self, req: &ListPageRequest) -> Result<MemoPage> {
		let mut query = vec![
			("pageSize", req.page_size.max(1).to_string()),
			("state", req.state.as_str().to_string()),
			("sort", SORT_FIELD.to_string()),
			("direction", SORT_DIRECTION.to_string()),
		];

		if let Some(token) = req.page_token.as_deref().filter(|token| !token.is_empty()) {
			query.push(("pageToken", token.to_string()));
		}
		if let Some(filter) = req.old_filter.as_deref().filter(|filter| !filter.is_empty()) {
			query.push(("oldFilter", filter.to_string()));
		}

		let data = self.request(Method::GET, "/memos", &query, None).await?;

		parse_memo_page(data).map_err(|message| invalid_response(&Method::GET, "/memos", message))
	}

	pub async fn create_memo(&self, content: &str, visibility: Visibility) -> Result<Memo> {
		let body = serde_json::json!({ "content": content, "visibility": visibility });
		let data = self.request(Method::POST, "/memos", &[], Some(&body)).await?;

		parse_memo(&Method::POST, "/memos", data)
	}

	pub async fn update_memo(&self, name: &str, patch: &MemoPatch) -> Result<Memo> {
		validate_memo_name(name)?;

		let path = format!("/{name}");
		let query = [("updateMask", patch.update_mask().join(","))];
		let mut body = serde_json::to_value(patch)?;

		if let Value::Object(map) = &mut body {
			map.insert("name".to_string(), Value::String(name.to_string()));
		}

		let data = self.request(Method::PATCH, &path, &query, Some(&body)).await?;

		parse_memo(&Method::PATCH, &path, data)
	}

	pub async fn delete_memo(&self, name: &str) -> Result<()> {
		validate_memo_name(name)?;

		let path = format!("/{name}");

		self.request(Method::DELETE, &path, &[], None).await?;

		Ok(())
	}

	async fn request(
		&self,
		method: Method,
		path: &str,
		query: &[(&str, String)],
		body: Option<&Value>,
	) -> Result<Value> {
		let url = format!("{}{}", self.base_url, path);
		let mut builder = self.http.request(method.clone(), url).query(query);

		if let Some(body) = body {
			builder = builder.json(body);
		}

		tracing::debug!(method = %method, path, "Sending memos API request.");

		let response = builder.send().await.map_err(|err| transport_error(&method, path, err))?;
		let status = response.status();
		let bytes = response.bytes().await.map_err(|err| transport_error(&method, path, err))?;

		if !status.is_success() {
			return Err(Error::Status {
				status: status.as_u16(),
				method: method.to_string(),
				path: path.to_string(),
				message: error_message(&bytes),
			});
		}
		if bytes.is_empty() {
			return Ok(Value::Object(Map::new()));
		}

		let parsed: Value = serde_json::from_slice(&bytes)
			.map_err(|_| invalid_response(&method, path, "invalid json response"))?;

		if !parsed.is_object() {
			return Err(invalid_response(&method, path, "unexpected response shape"));
		}

		Ok(parsed)
	}
}

pub fn auth_headers(token: &str) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {token}").parse()?);
	headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

	Ok(headers)
}

/// Appends `/api/v1` unless the configured URL already ends with it.
pub fn normalize_base_url(raw: &str) -> String {
	let trimmed = raw.trim().trim_end_matches('/');

	if trimmed.is_empty() {
		return String::new();
	}
	if trimmed.ends_with(API_PREFIX) {
		return trimmed.to_string();
	}

	format!("{trimmed}{API_PREFIX}")
}

/// Memo resource names look like `memos/<id>` with a single non-empty id segment.
pub fn validate_memo_name(name: &str) -> Result<()> {
	let valid = name
		.strip_prefix(MEMO_NAME_PREFIX)
		.map(|id| !id.trim().is_empty() && !id.contains('/'))
		.unwrap_or(false);

	if valid { Ok(()) } else { Err(Error::InvalidName { name: name.to_string() }) }
}

fn parse_memo_page(data: Value) -> std::result::Result<MemoPage, String> {
	let Value::Object(mut map) = data else {
		return Err("unexpected response shape".to_string());
	};
	let items = match map.remove("memos") {
		None | Some(Value::Null) => Vec::new(),
		Some(Value::Array(items)) => items,
		Some(_) => return Err("invalid memos list".to_string()),
	};
	let mut memos = Vec::with_capacity(items.len());

	for item in items {
		if !item.is_object() {
			continue;
		}

		let raw: RawMemo =
			serde_json::from_value(item).map_err(|err| format!("invalid memo record: {err}"))?;

		memos.push(Memo::from(raw));
	}

	let next_page_token = map
		.get("nextPageToken")
		.and_then(Value::as_str)
		.filter(|token| !token.is_empty())
		.map(str::to_string);

	Ok(MemoPage { memos, next_page_token })
}

fn parse_memo(method: &Method, path: &str, data: Value) -> Result<Memo> {
	serde_json::from_value::<RawMemo>(data)
		.map(Memo::from)
		.map_err(|err| invalid_response(method, path, format!("invalid memo record: {err}")))
}

fn error_message(bytes: &[u8]) -> String {
	let raw = String::from_utf8_lossy(bytes).to_string();

	serde_json::from_slice::<Value>(bytes)
		.ok()
		.and_then(|payload| payload.get("message").and_then(Value::as_str).map(str::to_string))
		.unwrap_or(raw)
}

fn transport_error(method: &Method, path: &str, err: reqwest::Error) -> Error {
	if err.is_timeout() {
		Error::Timeout { method: method.to_string(), path: path.to_string() }
	} else {
		Error::Network { method: method.to_string(), path: path.to_string(), source: err }
	}
}

fn invalid_response(method: &Method, path: &str, message: impl Into<String>) -> Error {
	Error::InvalidResponse {
		method: method.to_string(),
		path: path.to_string(),
		message: message.into(),
	}
}
