use std::{net::SocketAddr, sync::Arc};

use axum::{Router, http::request::Parts};
use color_eyre::Result;
use rmcp::{
	ErrorData, RoleServer, ServerHandler,
	handler::server::router::tool::ToolRouter,
	model::{CallToolResult, JsonObject, ServerCapabilities, ServerInfo},
	service::RequestContext,
	transport::streamable_http_server::{
		StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
	},
};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;

use memos_service::{
	ArchiveListRequest, ArchiveRequest, CallerChain, CallerSource, CreateRequest, DeleteRequest,
	JsonPathCaller, MemosService, OperationResult, SearchRequest, UpdateRequest,
};

pub const HEADER_SENDER_ID: &str = "X-Memos-Sender-Id";

const META_SENDER_ID: &[&str] = &["sender_id"];
const META_CONTEXT_SENDER_ID: &[&str] = &["context", "sender", "id"];

/// Sender id forwarded by a gateway as an HTTP header on the MCP request.
struct HeaderCaller<'a> {
	parts: Option<&'a Parts>,
}
impl CallerSource for HeaderCaller<'_> {
	fn resolve_caller_id(&self) -> Option<String> {
		let value = self.parts?.headers.get(HEADER_SENDER_ID)?;

		value.to_str().ok().map(str::to_string)
	}
}

#[derive(Clone)]
pub struct MemosMcp {
	service: MemosService,
	tool_router: ToolRouter<Self>,
}
impl MemosMcp {
	pub fn new(service: MemosService) -> Self {
		Self { service, tool_router: Self::tool_router() }
	}
}

#[rmcp::tool_router]
impl MemosMcp {
	#[rmcp::tool(
		name = "memos_search",
		description = "Search memos by keyword and optional date range. Without a query the most recent memos are returned.",
		input_schema = search_schema()
	)]
	async fn memos_search(
		&self,
		mut params: JsonObject,
		context: RequestContext<RoleServer>,
	) -> Result<CallToolResult, ErrorData> {
		let req = SearchRequest {
			query: take_optional_string(&mut params, "query")?,
			include_archived: take_optional_bool(&mut params, "include_archived")?
				.unwrap_or(false),
			start_date: take_optional_string(&mut params, "start_date")?,
			end_date: take_optional_string(&mut params, "end_date")?,
			date_field: take_optional_string(&mut params, "date_field")?,
		};
		let caller = caller_chain(&context.meta, context.extensions.get::<Parts>());

		envelope_result(&self.service.search(&caller, req).await)
	}

	#[rmcp::tool(
		name = "memos_create",
		description = "Create a memo. visibility is one of private, workspace or public.",
		input_schema = create_schema()
	)]
	async fn memos_create(
		&self,
		mut params: JsonObject,
		context: RequestContext<RoleServer>,
	) -> Result<CallToolResult, ErrorData> {
		let req = CreateRequest {
			content: take_optional_string(&mut params, "content")?.unwrap_or_default(),
			visibility: take_optional_string(&mut params, "visibility")?,
		};
		let caller = caller_chain(&context.meta, context.extensions.get::<Parts>());

		envelope_result(&self.service.create(&caller, req).await)
	}

	#[rmcp::tool(
		name = "memos_update",
		description = "Update a memo by name (memos/<id>). Only provided fields are changed.",
		input_schema = update_schema()
	)]
	async fn memos_update(
		&self,
		mut params: JsonObject,
		context: RequestContext<RoleServer>,
	) -> Result<CallToolResult, ErrorData> {
		let req = UpdateRequest {
			name: take_optional_string(&mut params, "name")?.unwrap_or_default(),
			content: take_optional_string(&mut params, "content")?,
			visibility: take_optional_string(&mut params, "visibility")?,
			pinned: take_optional_bool(&mut params, "pinned")?,
		};
		let caller = caller_chain(&context.meta, context.extensions.get::<Parts>());

		envelope_result(&self.service.update(&caller, req).await)
	}

	#[rmcp::tool(
		name = "memos_delete",
		description = "Permanently delete a memo by name (memos/<id>). Disabled unless the server enables it.",
		input_schema = name_schema()
	)]
	async fn memos_delete(
		&self,
		mut params: JsonObject,
		context: RequestContext<RoleServer>,
	) -> Result<CallToolResult, ErrorData> {
		let req =
			DeleteRequest { name: take_optional_string(&mut params, "name")?.unwrap_or_default() };
		let caller = caller_chain(&context.meta, context.extensions.get::<Parts>());

		envelope_result(&self.service.delete(&caller, req).await)
	}

	#[rmcp::tool(
		name = "memos_archive",
		description = "Archive a memo by name (memos/<id>), or restore it with archived=false.",
		input_schema = archive_schema()
	)]
	async fn memos_archive(
		&self,
		mut params: JsonObject,
		context: RequestContext<RoleServer>,
	) -> Result<CallToolResult, ErrorData> {
		let req = ArchiveRequest {
			name: take_optional_string(&mut params, "name")?.unwrap_or_default(),
			archived: take_optional_bool(&mut params, "archived")?,
		};
		let caller = caller_chain(&context.meta, context.extensions.get::<Parts>());

		envelope_result(&self.service.archive(&caller, req).await)
	}

	#[rmcp::tool(
		name = "memos_archive_list",
		description = "List archived memos with the same filters as memos_search, capped by limit (default 20).",
		input_schema = archive_list_schema()
	)]
	async fn memos_archive_list(
		&self,
		mut params: JsonObject,
		context: RequestContext<RoleServer>,
	) -> Result<CallToolResult, ErrorData> {
		let req = ArchiveListRequest {
			query: take_optional_string(&mut params, "query")?,
			start_date: take_optional_string(&mut params, "start_date")?,
			end_date: take_optional_string(&mut params, "end_date")?,
			date_field: take_optional_string(&mut params, "date_field")?,
			limit: take_optional_integer(&mut params, "limit")?,
		};
		let caller = caller_chain(&context.meta, context.extensions.get::<Parts>());

		envelope_result(&self.service.archive_list(&caller, req).await)
	}
}

#[rmcp::tool_handler]
impl ServerHandler for MemosMcp {
	fn get_info(&self) -> ServerInfo {
		ServerInfo {
			instructions: Some(
				"Search, create, update, archive and delete memos in the configured memo service."
					.to_string(),
			),
			capabilities: ServerCapabilities::builder().enable_tools().build(),
			..Default::default()
		}
	}
}

pub async fn serve_mcp(bind_addr: &str, service: MemosService) -> Result<()> {
	let bind_addr: SocketAddr = bind_addr.parse()?;
	let session_manager: Arc<LocalSessionManager> = Default::default();
	let mcp_service = StreamableHttpService::new(
		move || Ok(MemosMcp::new(service.clone())),
		session_manager,
		StreamableHttpServerConfig::default(),
	);
	let router = Router::new().fallback_service(mcp_service);
	let listener = TcpListener::bind(bind_addr).await?;

	tracing::info!(%bind_addr, "MCP server listening.");

	axum::serve(listener, router).await?;

	Ok(())
}

/// Identity sources in priority order: `_meta.sender_id`, `_meta.context.sender.id`, then the
/// `X-Memos-Sender-Id` header.
fn caller_chain<'a>(meta: &'a JsonObject, parts: Option<&'a Parts>) -> CallerChain<'a> {
	CallerChain::new()
		.with(JsonPathCaller::new(meta, META_SENDER_ID))
		.with(JsonPathCaller::new(meta, META_CONTEXT_SENDER_ID))
		.with(HeaderCaller { parts })
}

fn envelope_result<T>(result: &OperationResult<T>) -> Result<CallToolResult, ErrorData>
where
	T: Serialize,
{
	let value = serde_json::to_value(result).map_err(|err| {
		ErrorData::internal_error(format!("Failed to encode tool result: {err}"), None)
	})?;

	if result.is_ok() {
		Ok(CallToolResult::structured(value))
	} else {
		Ok(CallToolResult::structured_error(value))
	}
}

fn take_optional_string(params: &mut JsonObject, key: &str) -> Result<Option<String>, ErrorData> {
	match params.remove(key) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(text)) => Ok(Some(text)),
		Some(_) => Err(ErrorData::invalid_params(format!("{key} must be a string."), None)),
	}
}

fn take_optional_bool(params: &mut JsonObject, key: &str) -> Result<Option<bool>, ErrorData> {
	match params.remove(key) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Bool(flag)) => Ok(Some(flag)),
		Some(_) => Err(ErrorData::invalid_params(format!("{key} must be a boolean."), None)),
	}
}

fn take_optional_integer(params: &mut JsonObject, key: &str) -> Result<Option<i64>, ErrorData> {
	match params.remove(key) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Number(number)) => number
			.as_i64()
			.map(Some)
			.ok_or_else(|| ErrorData::invalid_params(format!("{key} must be an integer."), None)),
		Some(_) => Err(ErrorData::invalid_params(format!("{key} must be an integer."), None)),
	}
}

fn search_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"properties": {
			"query": { "type": ["string", "null"] },
			"include_archived": { "type": ["boolean", "null"] },
			"start_date": { "type": ["string", "null"], "description": "YYYY-MM-DD or ISO-8601 timestamp." },
			"end_date": { "type": ["string", "null"], "description": "YYYY-MM-DD or ISO-8601 timestamp." },
			"date_field": {
				"type": ["string", "null"],
				"enum": ["display_time", "create_time", "update_time", null]
			}
		}
	}))
}

fn create_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["content"],
		"properties": {
			"content": { "type": "string" },
			"visibility": {
				"type": ["string", "null"],
				"enum": ["private", "workspace", "public", null]
			}
		}
	}))
}

fn update_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["name"],
		"properties": {
			"name": { "type": "string" },
			"content": { "type": ["string", "null"] },
			"visibility": {
				"type": ["string", "null"],
				"enum": ["private", "workspace", "public", null]
			},
			"pinned": { "type": ["boolean", "null"] }
		}
	}))
}

fn name_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["name"],
		"properties": {
			"name": { "type": "string" }
		}
	}))
}

fn archive_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["name"],
		"properties": {
			"name": { "type": "string" },
			"archived": { "type": ["boolean", "null"] }
		}
	}))
}

fn archive_list_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"properties": {
			"query": { "type": ["string", "null"] },
			"start_date": { "type": ["string", "null"] },
			"end_date": { "type": ["string", "null"] },
			"date_field": {
				"type": ["string", "null"],
				"enum": ["display_time", "create_time", "update_time", null]
			},
			"limit": { "type": ["integer", "null"], "minimum": 1 }
		}
	}))
}
