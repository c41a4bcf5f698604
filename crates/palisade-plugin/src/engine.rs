// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The seams the plugin facade composes: policy engine, context enrichers,
//! and audit sinks.
//!
//! Decisions are synchronous and in-memory; everything that talks to the
//! network (policy download, grant/revoke delivery) lives behind async traits
//! elsewhere. An engine implementation must tolerate concurrent `decide`
//! calls while `update_policies` swaps the policy set underneath them.

use std::sync::Arc;

use palisade_model::{AccessRequest, AccessResult, ServicePolicies, ServiceTypeDef};

use crate::error::AuditError;

/// Access type used for the synthetic check that accompanies grant/revoke
/// auditing.
pub const ADMIN_ACCESS: &str = "admin";

/// Mutates a request in place before the decision runs, typically by writing
/// derived attributes into `request.context`. Enrichers run in registration
/// order; later enrichers may read what earlier ones wrote.
pub trait ContextEnricher: Send + Sync {
	fn name(&self) -> &str;

	fn enrich(&self, request: &mut AccessRequest);
}

/// Receives decision records flagged for audit. Implementations must not
/// block for long; they run inline on the decision path.
pub trait AuditHandler: Send + Sync {
	fn log_audit(&self, request: &AccessRequest, result: &AccessResult)
		-> Result<(), AuditError>;
}

/// Evaluates access requests against the currently-loaded policy set.
///
/// `audit_handler: None` means "do not audit this call" — the facade resolves
/// the engine's default handler before delegating, so engines never fall back
/// on their own.
pub trait PolicyEngine: Send + Sync {
	fn decide(
		&self,
		request: &AccessRequest,
		audit_handler: Option<&dyn AuditHandler>,
	) -> AccessResult;

	fn decide_batch(
		&self,
		requests: &[AccessRequest],
		audit_handler: Option<&dyn AuditHandler>,
	) -> Vec<AccessResult> {
		requests
			.iter()
			.map(|request| self.decide(request, audit_handler))
			.collect()
	}

	/// Builds a result shaped for `request` without evaluating or auditing.
	fn create_result(&self, request: &AccessRequest) -> AccessResult;

	/// Enrichers to apply before decisions, in application order.
	fn context_enrichers(&self) -> Vec<Arc<dyn ContextEnricher>>;

	fn service_def(&self) -> Option<ServiceTypeDef>;

	/// Atomically replaces the engine's policy set. Called by the refresher;
	/// in-flight `decide` calls see either the old set or the new one.
	fn update_policies(&self, policies: ServicePolicies);

	fn set_default_audit_handler(&self, handler: Option<Arc<dyn AuditHandler>>);

	fn default_audit_handler(&self) -> Option<Arc<dyn AuditHandler>>;
}
