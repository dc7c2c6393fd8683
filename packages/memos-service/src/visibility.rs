use serde::Serialize;

use memos_client::Visibility;

/// Caller-facing visibility label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityLabel {
	Private,
	#[default]
	Workspace,
	Public,
}
impl VisibilityLabel {
	/// Trims and lower-cases; anything unrecognized becomes `workspace`.
	pub fn normalize(raw: Option<&str>) -> Self {
		match raw.map(|raw| raw.trim().to_lowercase()).as_deref() {
			Some("private") => Self::Private,
			Some("public") => Self::Public,
			_ => Self::Workspace,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Private => "private",
			Self::Workspace => "workspace",
			Self::Public => "public",
		}
	}

	pub fn to_api(self) -> Visibility {
		match self {
			Self::Private => Visibility::Private,
			Self::Workspace => Visibility::Protected,
			Self::Public => Visibility::Public,
		}
	}
}
