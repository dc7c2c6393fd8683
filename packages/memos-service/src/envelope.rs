//! Uniform result envelope returned by every operation.

use serde::{Serialize, Serializer, ser::SerializeStruct};
use uuid::Uuid;

use crate::{Error, ErrorKind, audit::AuditTrace};

const TRACE_ID_LEN: usize = 10;

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
	Success(T),
	Failure { kind: ErrorKind, messages: Vec<String> },
}

/// Built once per invocation. Serializes as
/// `{ ok, trace_id, result, audit?, errors, error_kind? }`.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationResult<T> {
	pub trace_id: String,
	pub outcome: Outcome<T>,
	pub audit: Option<AuditTrace>,
}
impl<T> OperationResult<T> {
	pub fn success(trace_id: String, payload: T, audit: Option<AuditTrace>) -> Self {
		Self { trace_id, outcome: Outcome::Success(payload), audit }
	}

	pub fn failure(trace_id: String, err: Error, audit: Option<AuditTrace>) -> Self {
		Self {
			trace_id,
			outcome: Outcome::Failure { kind: err.kind(), messages: vec![err.to_string()] },
			audit,
		}
	}

	pub fn is_ok(&self) -> bool {
		matches!(self.outcome, Outcome::Success(_))
	}

	pub fn payload(&self) -> Option<&T> {
		match &self.outcome {
			Outcome::Success(payload) => Some(payload),
			Outcome::Failure { .. } => None,
		}
	}

	pub fn errors(&self) -> &[String] {
		match &self.outcome {
			Outcome::Success(_) => &[],
			Outcome::Failure { messages, .. } => messages,
		}
	}

	pub fn error_kind(&self) -> Option<ErrorKind> {
		match &self.outcome {
			Outcome::Success(_) => None,
			Outcome::Failure { kind, .. } => Some(*kind),
		}
	}
}
impl<T> Serialize for OperationResult<T>
where
	T: Serialize,
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut state = serializer.serialize_struct("OperationResult", 6)?;

		state.serialize_field("ok", &self.is_ok())?;
		state.serialize_field("trace_id", &self.trace_id)?;

		match &self.outcome {
			Outcome::Success(payload) => state.serialize_field("result", payload)?,
			Outcome::Failure { .. } => state.serialize_field("result", &EmptyObject {})?,
		}
		match &self.audit {
			Some(audit) => state.serialize_field("audit", audit)?,
			None => state.skip_field("audit")?,
		}

		state.serialize_field("errors", self.errors())?;

		match self.error_kind() {
			Some(kind) => state.serialize_field("error_kind", &kind)?,
			None => state.skip_field("error_kind")?,
		}

		state.end()
	}
}

#[derive(Serialize)]
struct EmptyObject {}

/// Short correlation id: the first ten hex characters of a random v4 UUID.
pub fn new_trace_id() -> String {
	let mut id = Uuid::new_v4().simple().to_string();

	id.truncate(TRACE_ID_LEN);

	id
}
