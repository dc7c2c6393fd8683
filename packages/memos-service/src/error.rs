use serde::Serialize;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid date format: {raw}")]
	InvalidDateFormat { raw: String },
	#[error("start_date must be earlier than or equal to end_date")]
	InvalidDateRange,
	#[error("{message}")]
	Validation { message: String },
	#[error(transparent)]
	Remote(#[from] memos_client::Error),
	#[error("not authorized")]
	AuthorizationDenied,
	#[error("{tool} is disabled by configuration")]
	ToolDisabled { tool: String },
	#[error("unexpected error: {message}")]
	Unexpected { message: String },
}
impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::InvalidDateFormat { .. } => ErrorKind::InvalidDateFormat,
			Self::InvalidDateRange => ErrorKind::InvalidDateRange,
			Self::Validation { .. } => ErrorKind::ValidationError,
			Self::Remote(_) => ErrorKind::RemoteCollaboratorError,
			Self::AuthorizationDenied => ErrorKind::AuthorizationDenied,
			Self::ToolDisabled { .. } => ErrorKind::ToolDisabled,
			Self::Unexpected { .. } => ErrorKind::UnexpectedError,
		}
	}

	pub(crate) fn validation(message: impl Into<String>) -> Self {
		Self::Validation { message: message.into() }
	}
}
impl From<memos_config::Error> for Error {
	fn from(_: memos_config::Error) -> Self {
		// Config errors carry file paths; those stay in the logs.
		Self::Unexpected { message: "configuration unavailable".to_string() }
	}
}

/// Caller-visible failure category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	InvalidDateFormat,
	InvalidDateRange,
	ValidationError,
	RemoteCollaboratorError,
	AuthorizationDenied,
	ToolDisabled,
	UnexpectedError,
}
impl ErrorKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::InvalidDateFormat => "invalid_date_format",
			Self::InvalidDateRange => "invalid_date_range",
			Self::ValidationError => "validation_error",
			Self::RemoteCollaboratorError => "remote_collaborator_error",
			Self::AuthorizationDenied => "authorization_denied",
			Self::ToolDisabled => "tool_disabled",
			Self::UnexpectedError => "unexpected_error",
		}
	}

	/// Failures detected before any network access.
	pub fn is_local(self) -> bool {
		matches!(
			self,
			Self::InvalidDateFormat
				| Self::InvalidDateRange
				| Self::ValidationError
				| Self::AuthorizationDenied
				| Self::ToolDisabled
		)
	}
}
