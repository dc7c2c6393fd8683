use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// API-level visibility of a memo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
	Private,
	Protected,
	Public,
	#[default]
	#[serde(other)]
	Unspecified,
}
impl Visibility {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Private => "PRIVATE",
			Self::Protected => "PROTECTED",
			Self::Public => "PUBLIC",
			Self::Unspecified => "UNSPECIFIED",
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoState {
	Normal,
	Archived,
	#[default]
	#[serde(other)]
	Unspecified,
}
impl MemoState {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Normal => "NORMAL",
			Self::Archived => "ARCHIVED",
			Self::Unspecified => "UNSPECIFIED",
		}
	}
}

/// Read-only view of a remote memo.
///
/// Timestamps keep the raw ISO-8601 text the server sent; callers parse them when they need
/// an instant, so one malformed value never fails a whole page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
	pub name: String,
	pub content: String,
	pub visibility: Visibility,
	pub tags: Vec<String>,
	pub create_time: Option<String>,
	pub update_time: Option<String>,
	pub display_time: Option<String>,
	pub pinned: bool,
	pub snippet: String,
	pub creator: String,
	pub state: MemoState,
}

/// Wire form of a memo. Every field is lenient: a `null` or mistyped value falls back to its
/// default instead of rejecting the record.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawMemo {
	#[serde(deserialize_with = "lenient")]
	name: String,
	#[serde(deserialize_with = "lenient")]
	content: String,
	#[serde(deserialize_with = "lenient")]
	visibility: Visibility,
	#[serde(deserialize_with = "lenient")]
	tags: Vec<String>,
	#[serde(deserialize_with = "lenient")]
	create_time: Option<String>,
	#[serde(deserialize_with = "lenient")]
	update_time: Option<String>,
	#[serde(deserialize_with = "lenient")]
	display_time: Option<String>,
	#[serde(deserialize_with = "lenient")]
	pinned: bool,
	#[serde(deserialize_with = "lenient")]
	snippet: String,
	#[serde(deserialize_with = "lenient")]
	creator: String,
	#[serde(deserialize_with = "lenient")]
	state: MemoState,
}
impl From<RawMemo> for Memo {
	fn from(raw: RawMemo) -> Self {
		Self {
			name: raw.name,
			content: raw.content,
			visibility: raw.visibility,
			tags: raw.tags,
			create_time: non_empty(raw.create_time),
			update_time: non_empty(raw.update_time),
			display_time: non_empty(raw.display_time),
			pinned: raw.pinned,
			snippet: raw.snippet,
			creator: raw.creator,
			state: raw.state,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoPage {
	pub memos: Vec<Memo>,
	/// Absent when the server has no further pages.
	pub next_page_token: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListPageRequest {
	pub page_size: u32,
	pub page_token: Option<String>,
	pub state: MemoState,
	/// Legacy filter expression evaluated by the server, e.g.
	/// `display_time_after == 1704038400`.
	pub old_filter: Option<String>,
}

/// Partial update. Only the fields that are set end up in the body and the update mask.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemoPatch {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub visibility: Option<Visibility>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pinned: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub state: Option<MemoState>,
}
impl MemoPatch {
	pub fn update_mask(&self) -> Vec<&'static str> {
		let mut mask = Vec::with_capacity(4);

		if self.content.is_some() {
			mask.push("content");
		}
		if self.visibility.is_some() {
			mask.push("visibility");
		}
		if self.pinned.is_some() {
			mask.push("pinned");
		}
		if self.state.is_some() {
			mask.push("state");
		}

		mask
	}

	pub fn is_empty(&self) -> bool {
		self.update_mask().is_empty()
	}
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + DeserializeOwned,
{
	let value = Value::deserialize(deserializer)?;

	Ok(T::deserialize(value).unwrap_or_default())
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|text| !text.trim().is_empty())
}
