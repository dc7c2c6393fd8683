use serde::{Deserialize, Serialize};

use memos_client::{MemoPatch, MemoState};

use crate::{
	MemoResponse, MemosService, OperationResult, Result, TOOL_ARCHIVE, TOOL_ARCHIVE_LIST,
	gate::CallerSource,
	invocation::Invocation,
	search::{QueryMode, SearchRequest, SearchResponse},
};

pub const DEFAULT_ARCHIVE_LIST_LIMIT: u32 = 20;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveRequest {
	pub name: String,
	/// Defaults to `true`; `false` restores the memo.
	pub archived: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArchiveListRequest {
	pub query: Option<String>,
	pub start_date: Option<String>,
	pub end_date: Option<String>,
	pub date_field: Option<String>,
	pub limit: Option<i64>,
}

impl MemosService {
	pub async fn archive(
		&self,
		caller: &dyn CallerSource,
		req: ArchiveRequest,
	) -> OperationResult<MemoResponse> {
		let mut inv = match self.begin(TOOL_ARCHIVE, caller) {
			Ok(inv) => inv,
			Err(denied) => return denied,
		};
		let result = self.run_archive(&mut inv, &req).await;

		inv.finish(result)
	}

	/// Archived-only search, clamped to `min(limit, search cap)`.
	pub async fn archive_list(
		&self,
		caller: &dyn CallerSource,
		req: ArchiveListRequest,
	) -> OperationResult<SearchResponse> {
		let mut inv = match self.begin(TOOL_ARCHIVE_LIST, caller) {
			Ok(inv) => inv,
			Err(denied) => return denied,
		};
		let search = SearchRequest {
			query: req.query,
			include_archived: true,
			start_date: req.start_date,
			end_date: req.end_date,
			date_field: req.date_field,
		};
		let result = match self.run_search_pipeline(&mut inv, &search).await {
			Ok(mut response) => {
				let requested =
					memos_config::positive_or(req.limit.unwrap_or(0), DEFAULT_ARCHIVE_LIST_LIMIT);
				let limit = requested.min(response.search_max_count);

				response.memos.truncate(limit as usize);
				response.matched_count = response.memos.len();
				response.query_mode = QueryMode::ArchiveList;

				inv.trail.step(format!(
					"archive_list_limit requested={requested} applied={limit} returned={}",
					response.matched_count
				));
				inv.trail.metric("query_mode", QueryMode::ArchiveList.as_str());
				inv.trail.metric("archive_list_limit", limit);
				inv.trail.metric("matched_count", response.matched_count);

				Ok(response)
			},
			Err(err) => Err(err),
		};

		inv.finish(result)
	}

	async fn run_archive(&self, inv: &mut Invocation, req: &ArchiveRequest) -> Result<MemoResponse> {
		let name = crate::validated_name(&req.name)?;
		let state = if req.archived.unwrap_or(true) { MemoState::Archived } else { MemoState::Normal };

		inv.trail.step(format!(
			"start {} trace={} name={name} state={}",
			inv.tool,
			inv.trace_id,
			state.as_str()
		));

		let patch = MemoPatch { state: Some(state), ..Default::default() };
		let memo = self.api.update(&inv.cfg.remote, name, &patch).await?;

		inv.trail.step(format!("archive_done memo={} state={}", memo.name, memo.state.as_str()));

		Ok(MemoResponse { memo })
	}
}
