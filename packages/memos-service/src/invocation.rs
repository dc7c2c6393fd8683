use time::UtcOffset;

use memos_config::Config;

use crate::{
	Error, MemosService, Result,
	audit::AuditTrail,
	dates,
	envelope::{self, OperationResult},
	gate::{self, CallerSource},
};

/// Per-call state: the configuration snapshot, the resolved local offset and the audit trail.
pub(crate) struct Invocation {
	pub(crate) tool: &'static str,
	pub(crate) trace_id: String,
	pub(crate) cfg: Config,
	pub(crate) offset: UtcOffset,
	pub(crate) trail: AuditTrail,
}
impl Invocation {
	pub(crate) fn finish<T>(mut self, result: Result<T>) -> OperationResult<T> {
		match result {
			Ok(payload) => {
				tracing::info!(trace_id = %self.trace_id, tool = self.tool, "Operation succeeded.");

				let audit = self.trail.build(&self.cfg.audit, &self.trace_id);

				OperationResult::success(self.trace_id, payload, audit)
			},
			Err(err) => {
				let kind = err.kind();

				if kind.is_local() {
					tracing::warn!(
						trace_id = %self.trace_id,
						tool = self.tool,
						kind = kind.as_str(),
						error = %err,
						"Operation rejected."
					);
				} else {
					tracing::error!(
						trace_id = %self.trace_id,
						tool = self.tool,
						kind = kind.as_str(),
						error = %err,
						"Operation failed."
					);
				}

				self.trail.step(format!("error type={} message={err}", kind.as_str()));

				let audit = self.trail.build(&self.cfg.audit, &self.trace_id);

				OperationResult::failure(self.trace_id, err, audit)
			},
		}
	}
}

impl MemosService {
	/// Takes a configuration snapshot and runs the capability gate.
	///
	/// A denial comes back as a finished result whose trace holds no caller data.
	pub(crate) fn begin<T>(
		&self,
		tool: &'static str,
		caller: &dyn CallerSource,
	) -> std::result::Result<Invocation, OperationResult<T>> {
		let trace_id = envelope::new_trace_id();
		let cfg = match self.config.snapshot() {
			Ok(cfg) => cfg,
			Err(err) => {
				tracing::error!(
					trace_id = %trace_id,
					tool,
					error = %err,
					"Failed to load configuration."
				);

				return Err(OperationResult::failure(trace_id, Error::from(err), None));
			},
		};
		let decision = gate::authorize(&cfg.authorization, caller, tool);

		if !decision.allowed {
			tracing::warn!(
				trace_id = %trace_id,
				tool,
				reason = %decision.reason,
				"Authorization denied."
			);

			let mut trail = AuditTrail::default();

			trail.step(format!("start {tool} trace={trace_id}"));
			trail.step("authorization_denied");

			let audit = trail.build(&cfg.audit, &trace_id);

			return Err(OperationResult::failure(trace_id, Error::AuthorizationDenied, audit));
		}

		tracing::debug!(
			trace_id = %trace_id,
			tool,
			reason = %decision.reason,
			"Authorization passed."
		);

		let offset = dates::local_offset(cfg.service.utc_offset());

		Ok(Invocation { tool, trace_id, cfg, offset, trail: AuditTrail::default() })
	}
}
