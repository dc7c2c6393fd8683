use serde::{Deserialize, Serialize};

use crate::{
	Error, MemoResponse, MemosService, OperationResult, Result, TOOL_CREATE,
	gate::CallerSource,
	invocation::Invocation,
	visibility::VisibilityLabel,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateRequest {
	pub content: String,
	/// `private`, `workspace` or `public`. Falls back to the configured default label.
	pub visibility: Option<String>,
}

impl MemosService {
	pub async fn create(
		&self,
		caller: &dyn CallerSource,
		req: CreateRequest,
	) -> OperationResult<MemoResponse> {
		let mut inv = match self.begin(TOOL_CREATE, caller) {
			Ok(inv) => inv,
			Err(denied) => return denied,
		};
		let result = self.run_create(&mut inv, &req).await;

		inv.finish(result)
	}

	async fn run_create(&self, inv: &mut Invocation, req: &CreateRequest) -> Result<MemoResponse> {
		if req.content.trim().is_empty() {
			return Err(Error::validation("content is required"));
		}

		let label = match req.visibility.as_deref().filter(|raw| !raw.trim().is_empty()) {
			Some(raw) => VisibilityLabel::normalize(Some(raw)),
			None => VisibilityLabel::normalize(Some(&inv.cfg.remote.default_visibility)),
		};
		let visibility = label.to_api();

		inv.trail.step(format!(
			"start {} trace={} visibility_label={} visibility_api={}",
			inv.tool,
			inv.trace_id,
			label.as_str(),
			visibility.as_str()
		));

		let memo = self.api.create(&inv.cfg.remote, &req.content, visibility).await?;

		inv.trail.step(format!("create_done memo={}", memo.name));

		Ok(MemoResponse { memo })
	}
}
