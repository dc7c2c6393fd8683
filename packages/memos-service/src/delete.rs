use serde::{Deserialize, Serialize};

use crate::{
	Error, MemosService, OperationResult, Result, TOOL_DELETE, gate::CallerSource,
	invocation::Invocation,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteRequest {
	pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
	pub deleted: String,
}

impl MemosService {
	/// Permanently removes a memo. Off unless `tools.enable_delete` is set.
	pub async fn delete(
		&self,
		caller: &dyn CallerSource,
		req: DeleteRequest,
	) -> OperationResult<DeleteResponse> {
		let mut inv = match self.begin(TOOL_DELETE, caller) {
			Ok(inv) => inv,
			Err(denied) => return denied,
		};
		let result = self.run_delete(&mut inv, &req).await;

		inv.finish(result)
	}

	async fn run_delete(&self, inv: &mut Invocation, req: &DeleteRequest) -> Result<DeleteResponse> {
		if !inv.cfg.tools.enable_delete {
			return Err(Error::ToolDisabled { tool: inv.tool.to_string() });
		}

		let name = crate::validated_name(&req.name)?;

		inv.trail.step(format!("start {} trace={} name={name}", inv.tool, inv.trace_id));

		self.api.delete(&inv.cfg.remote, name).await?;

		inv.trail.step(format!("delete_done memo={name}"));

		Ok(DeleteResponse { deleted: name.to_string() })
	}
}
