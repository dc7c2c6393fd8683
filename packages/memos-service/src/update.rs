use serde::{Deserialize, Serialize};

use memos_client::MemoPatch;

use crate::{
	Error, MemoResponse, MemosService, OperationResult, Result, TOOL_UPDATE,
	gate::CallerSource,
	invocation::Invocation,
	visibility::VisibilityLabel,
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
	pub name: String,
	pub content: Option<String>,
	pub visibility: Option<String>,
	pub pinned: Option<bool>,
}

impl MemosService {
	pub async fn update(
		&self,
		caller: &dyn CallerSource,
		req: UpdateRequest,
	) -> OperationResult<MemoResponse> {
		let mut inv = match self.begin(TOOL_UPDATE, caller) {
			Ok(inv) => inv,
			Err(denied) => return denied,
		};
		let result = self.run_update(&mut inv, req).await;

		inv.finish(result)
	}

	async fn run_update(&self, inv: &mut Invocation, req: UpdateRequest) -> Result<MemoResponse> {
		let patch = MemoPatch {
			content: req.content,
			visibility: req
				.visibility
				.as_deref()
				.map(|raw| VisibilityLabel::normalize(Some(raw)).to_api()),
			pinned: req.pinned,
			state: None,
		};

		if patch.is_empty() {
			inv.trail.step("no_update_fields_provided");

			return Err(Error::validation("at least one of content/visibility/pinned is required"));
		}

		let name = crate::validated_name(&req.name)?;

		inv.trail.step(format!(
			"start {} trace={} name={name} fields={}",
			inv.tool,
			inv.trace_id,
			patch.update_mask().join(",")
		));

		let memo = self.api.update(&inv.cfg.remote, name, &patch).await?;

		inv.trail.step(format!("update_done memo={}", memo.name));

		Ok(MemoResponse { memo })
	}
}
