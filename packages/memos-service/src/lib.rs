pub mod archive;
pub mod audit;
pub mod create;
pub mod dates;
pub mod delete;
pub mod envelope;
pub mod gate;
pub mod keyword;
pub mod search;
pub mod update;
pub mod visibility;

mod error;
mod invocation;

pub use archive::{ArchiveListRequest, ArchiveRequest, DEFAULT_ARCHIVE_LIST_LIMIT};
pub use audit::{AuditTrace, AuditTrail};
pub use create::CreateRequest;
pub use delete::{DeleteRequest, DeleteResponse};
pub use envelope::{OperationResult, Outcome};
pub use error::{Error, ErrorKind, Result};
pub use gate::{AuthDecision, CallerChain, CallerSource, JsonPathCaller, KnownCaller, NoCaller};
pub use search::{DateField, QueryMode, SearchRequest, SearchResponse, StopReason};
pub use update::UpdateRequest;
pub use visibility::VisibilityLabel;

use std::{future::Future, pin::Pin, sync::Arc};

use serde::Serialize;

use memos_client::{ListPageRequest, Memo, MemoPage, MemoPatch, MemosClient, Visibility};
use memos_config::{ConfigSource, Remote};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub const TOOL_SEARCH: &str = "memos_search";
pub const TOOL_CREATE: &str = "memos_create";
pub const TOOL_UPDATE: &str = "memos_update";
pub const TOOL_DELETE: &str = "memos_delete";
pub const TOOL_ARCHIVE: &str = "memos_archive";
pub const TOOL_ARCHIVE_LIST: &str = "memos_archive_list";

/// Remote note-service calls the operations depend on.
///
/// Every call receives the remote settings from the snapshot taken at the start of the
/// invocation.
pub trait NoteApi
where
	Self: Send + Sync,
{
	fn list_page<'a>(
		&'a self,
		cfg: &'a Remote,
		req: &'a ListPageRequest,
	) -> BoxFuture<'a, memos_client::Result<MemoPage>>;

	fn create<'a>(
		&'a self,
		cfg: &'a Remote,
		content: &'a str,
		visibility: Visibility,
	) -> BoxFuture<'a, memos_client::Result<Memo>>;

	fn update<'a>(
		&'a self,
		cfg: &'a Remote,
		name: &'a str,
		patch: &'a MemoPatch,
	) -> BoxFuture<'a, memos_client::Result<Memo>>;

	fn delete<'a>(
		&'a self,
		cfg: &'a Remote,
		name: &'a str,
	) -> BoxFuture<'a, memos_client::Result<()>>;
}

/// Payload of operations that return a single memo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemoResponse {
	pub memo: Memo,
}

#[derive(Clone)]
pub struct MemosService {
	config: Arc<dyn ConfigSource>,
	api: Arc<dyn NoteApi>,
}
impl MemosService {
	pub fn new(config: Arc<dyn ConfigSource>) -> Self {
		Self { config, api: Arc::new(HttpNoteApi) }
	}

	pub fn with_api(config: Arc<dyn ConfigSource>, api: Arc<dyn NoteApi>) -> Self {
		Self { config, api }
	}
}

struct HttpNoteApi;
impl NoteApi for HttpNoteApi {
	fn list_page<'a>(
		&'a self,
		cfg: &'a Remote,
		req: &'a ListPageRequest,
	) -> BoxFuture<'a, memos_client::Result<MemoPage>> {
		Box::pin(async move { MemosClient::new(cfg)?.list_memos_page(req).await })
	}

	fn create<'a>(
		&'a self,
		cfg: &'a Remote,
		content: &'a str,
		visibility: Visibility,
	) -> BoxFuture<'a, memos_client::Result<Memo>> {
		Box::pin(async move { MemosClient::new(cfg)?.create_memo(content, visibility).await })
	}

	fn update<'a>(
		&'a self,
		cfg: &'a Remote,
		name: &'a str,
		patch: &'a MemoPatch,
	) -> BoxFuture<'a, memos_client::Result<Memo>> {
		Box::pin(async move { MemosClient::new(cfg)?.update_memo(name, patch).await })
	}

	fn delete<'a>(
		&'a self,
		cfg: &'a Remote,
		name: &'a str,
	) -> BoxFuture<'a, memos_client::Result<()>> {
		Box::pin(async move { MemosClient::new(cfg)?.delete_memo(name).await })
	}
}

/// Trims a memo resource name and checks it looks like `memos/<id>`.
pub(crate) fn validated_name(raw: &str) -> Result<&str> {
	let name = raw.trim();

	if name.is_empty() {
		return Err(Error::validation("name is required"));
	}

	memos_client::validate_memo_name(name)
		.map_err(|_| Error::validation(format!("name must look like memos/<id>, got {name:?}")))?;

	Ok(name)
}
