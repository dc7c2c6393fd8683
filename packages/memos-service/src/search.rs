//! Pagination-driven search over the remote note service.
//!
//! Date bounds on `display_time` are pushed down to the server as a legacy filter; bounds on
//! any other field are applied locally after each page arrives. Pages are drained until the
//! result cap is reached or the server runs out of records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::UtcOffset;

use memos_client::{ListPageRequest, Memo, MemoState};

use crate::{
	MemosService, OperationResult, Result, TOOL_SEARCH,
	dates::{self, BoundEdge, DateBound},
	gate::CallerSource,
	invocation::Invocation,
	keyword,
};

pub const PAGE_SIZE: u32 = 100;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: Option<String>,
	#[serde(default)]
	pub include_archived: bool,
	pub start_date: Option<String>,
	pub end_date: Option<String>,
	pub date_field: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
	#[default]
	DisplayTime,
	CreateTime,
	UpdateTime,
}
impl DateField {
	/// Trimmed, case-insensitive. Anything unrecognized selects `display_time`.
	pub fn select(raw: Option<&str>) -> Self {
		match raw.map(|raw| raw.trim().to_lowercase()).as_deref() {
			Some("create_time") => Self::CreateTime,
			Some("update_time") => Self::UpdateTime,
			_ => Self::DisplayTime,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::DisplayTime => "display_time",
			Self::CreateTime => "create_time",
			Self::UpdateTime => "update_time",
		}
	}

	fn value(self, memo: &Memo) -> Option<&str> {
		match self {
			Self::DisplayTime => memo.display_time.as_deref(),
			Self::CreateTime => memo.create_time.as_deref(),
			Self::UpdateTime => memo.update_time.as_deref(),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
	Keyword,
	Recent,
	ArchiveList,
}
impl QueryMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Keyword => "keyword",
			Self::Recent => "recent",
			Self::ArchiveList => "archive_list",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum StopReason {
	#[serde(rename = "reach_search_max_count")]
	ReachedMaxCount,
	#[serde(rename = "empty_page")]
	EmptyPage,
	#[serde(rename = "no_more_pages")]
	NoMorePages,
}
impl StopReason {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::ReachedMaxCount => "reach_search_max_count",
			Self::EmptyPage => "empty_page",
			Self::NoMorePages => "no_more_pages",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchResponse {
	pub query_mode: QueryMode,
	pub search_max_count: u32,
	pub matched_count: usize,
	pub memos: Vec<Memo>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Counters {
	pages: u32,
	scanned: usize,
	date_kept: usize,
	keyword_kept: usize,
}

impl MemosService {
	pub async fn search(
		&self,
		caller: &dyn CallerSource,
		req: SearchRequest,
	) -> OperationResult<SearchResponse> {
		let mut inv = match self.begin(TOOL_SEARCH, caller) {
			Ok(inv) => inv,
			Err(denied) => return denied,
		};
		let result = self.run_search_pipeline(&mut inv, &req).await;

		inv.finish(result)
	}

	pub(crate) async fn run_search_pipeline(
		&self,
		inv: &mut Invocation,
		req: &SearchRequest,
	) -> Result<SearchResponse> {
		let max_count = inv.cfg.search.max_count();
		let date_field = DateField::select(req.date_field.as_deref());
		let query_text = req.query.as_deref().map(str::trim).unwrap_or_default();

		inv.trail.step(format!(
			"start {} trace={} query_present={} include_archived={} search_max_count={max_count} \
			 start_date={:?} end_date={:?} date_field={}",
			inv.tool,
			inv.trace_id,
			!query_text.is_empty(),
			req.include_archived,
			req.start_date,
			req.end_date,
			date_field.as_str(),
		));

		let start = dates::resolve_bound(req.start_date.as_deref(), BoundEdge::Start, inv.offset)?;
		let end = dates::resolve_bound(req.end_date.as_deref(), BoundEdge::End, inv.offset)?;

		dates::check_range(start.as_ref(), end.as_ref())?;

		let old_filter = match date_field {
			DateField::DisplayTime => display_time_filter(start.as_ref(), end.as_ref()),
			_ => None,
		};

		match &old_filter {
			Some(filter) => inv.trail.step(format!("server_date_filter {filter}")),
			None if date_field != DateField::DisplayTime =>
				inv.trail.step(format!("local_date_filter field={}", date_field.as_str())),
			None => {},
		}

		let query_mode = if query_text.is_empty() { QueryMode::Recent } else { QueryMode::Keyword };
		let state = if req.include_archived { MemoState::Archived } else { MemoState::Normal };
		let mut counters = Counters::default();
		let mut memos = Vec::new();
		let mut page_token = None;
		let stop_reason = loop {
			counters.pages += 1;

			let page_req = ListPageRequest {
				page_size: PAGE_SIZE,
				page_token: page_token.take(),
				state,
				old_filter: old_filter.clone(),
			};
			let page = self.api.list_page(&inv.cfg.remote, &page_req).await?;

			if page.memos.is_empty() {
				inv.trail.step(format!("page={} fetched=0", counters.pages));

				break StopReason::EmptyPage;
			}

			let fetched = page.memos.len();
			let date_kept: Vec<Memo> = match date_field {
				DateField::DisplayTime => page.memos,
				_ => page
					.memos
					.into_iter()
					.filter(|memo| {
						within_bounds(
							date_field.value(memo),
							start.as_ref(),
							end.as_ref(),
							inv.offset,
						)
					})
					.collect(),
			};
			let date_kept_len = date_kept.len();
			let keyword_kept: Vec<Memo> = if query_text.is_empty() {
				date_kept
			} else {
				date_kept.into_iter().filter(|memo| keyword::memo_matches(memo, query_text)).collect()
			};

			counters.scanned += fetched;
			counters.date_kept += date_kept_len;
			counters.keyword_kept += keyword_kept.len();

			inv.trail.step(format!(
				"page={} fetched={fetched} date_kept={date_kept_len} keyword_kept={}",
				counters.pages,
				keyword_kept.len()
			));

			for memo in keyword_kept {
				memos.push(memo);

				if memos.len() >= max_count as usize {
					break;
				}
			}

			if memos.len() >= max_count as usize {
				break StopReason::ReachedMaxCount;
			}

			match page.next_page_token {
				Some(token) => page_token = Some(token),
				None => break StopReason::NoMorePages,
			}
		};

		inv.trail.step(format!("stop_reason={}", stop_reason.as_str()));

		if query_text.is_empty() {
			inv.trail.step("keyword_filter_skipped query_empty=true");
		} else {
			inv.trail.step(format!("keyword_filter_applied query={query_text:?}"));
		}

		inv.trail.step(format!(
			"pipeline_done pages={} scanned={} date_kept={} keyword_kept={} final={}",
			counters.pages,
			counters.scanned,
			counters.date_kept,
			counters.keyword_kept,
			memos.len()
		));
		inv.trail.metric("query_mode", query_mode.as_str());
		inv.trail.metric("final_return_limit", max_count);
		inv.trail.metric("selected_date_field", date_field.as_str());
		inv.trail.metric("start_date", optional_text(req.start_date.as_deref()));
		inv.trail.metric("end_date", optional_text(req.end_date.as_deref()));
		inv.trail.metric("pages", counters.pages);
		inv.trail.metric("scanned_count", counters.scanned);
		inv.trail.metric("date_filtered_count", counters.date_kept);
		inv.trail.metric("keyword_filtered_count", counters.keyword_kept);
		inv.trail.metric("matched_count", memos.len());
		inv.trail.metric("stop_reason", stop_reason.as_str());

		tracing::info!(
			trace_id = %inv.trace_id,
			tool = inv.tool,
			pages = counters.pages,
			scanned = counters.scanned,
			returned = memos.len(),
			stop_reason = stop_reason.as_str(),
			"Search pipeline finished."
		);

		Ok(SearchResponse {
			query_mode,
			search_max_count: max_count,
			matched_count: memos.len(),
			memos,
		})
	}
}

/// Legacy server filter for `display_time` bounds, e.g.
/// `display_time_after == 1704038400 && display_time_before == 1704124799`.
pub fn display_time_filter(start: Option<&DateBound>, end: Option<&DateBound>) -> Option<String> {
	let mut parts = Vec::with_capacity(2);

	if let Some(start) = start {
		parts.push(format!("display_time_after == {}", start.unix_seconds()));
	}
	if let Some(end) = end {
		parts.push(format!("display_time_before == {}", end.unix_seconds()));
	}

	if parts.is_empty() { None } else { Some(parts.join(" && ")) }
}

/// Records whose timestamp is missing or unparsable never pass, bounds or not.
fn within_bounds(
	raw: Option<&str>,
	start: Option<&DateBound>,
	end: Option<&DateBound>,
	offset: UtcOffset,
) -> bool {
	let Some(at) = raw.and_then(|raw| dates::parse_timestamp(raw, offset)) else {
		return false;
	};

	if start.is_some_and(|start| at < start.at) {
		return false;
	}
	if end.is_some_and(|end| at > end.at) {
		return false;
	}

	true
}

fn optional_text(raw: Option<&str>) -> Value {
	raw.map(|text| Value::String(text.to_string())).unwrap_or(Value::Null)
}
