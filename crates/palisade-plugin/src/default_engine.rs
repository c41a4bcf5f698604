// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Built-in policy engine: a linear scan over the loaded policy set.
//!
//! Suitable for the policy-set sizes a single service instance carries.
//! Embedders with heavier needs can supply their own [`PolicyEngine`].

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use palisade_model::{AccessRequest, AccessResult, Policy, ServicePolicies, ServiceTypeDef};
use palisade_search::wildcard_match;

use crate::engine::{AuditHandler, ContextEnricher, PolicyEngine};

pub struct DefaultPolicyEngine {
	policies: RwLock<Option<ServicePolicies>>,
	enrichers: Vec<Arc<dyn ContextEnricher>>,
	default_audit: RwLock<Option<Arc<dyn AuditHandler>>>,
}

impl DefaultPolicyEngine {
	pub fn new() -> Self {
		Self {
			policies: RwLock::new(None),
			enrichers: Vec::new(),
			default_audit: RwLock::new(None),
		}
	}

	/// Appends an enricher. Enrichers run in the order they were added.
	pub fn with_enricher(mut self, enricher: Arc<dyn ContextEnricher>) -> Self {
		self.enrichers.push(enricher);
		self
	}

	pub fn policy_version(&self) -> Option<i64> {
		let guard = self.policies.read().expect("policy set lock poisoned");
		guard.as_ref().map(|p| p.version)
	}

	/// A policy applies when every resource level it names matches the
	/// request, and the request names no level the policy lacks.
	fn resources_match(policy: &Policy, request: &AccessRequest) -> bool {
		if policy.resources.is_empty() {
			return false;
		}

		request.resource.iter().all(|(name, value)| {
			policy.resources.get(name).is_some_and(|spec| {
				spec.values
					.iter()
					.any(|pattern| wildcard_match(pattern, value))
			})
		}) && policy.resources.keys().all(|name| request.resource.contains_key(name))
	}

	fn items_allow(policy: &Policy, request: &AccessRequest) -> bool {
		policy.items.iter().any(|item| {
			let subject_matches = item.users.contains(&request.user)
				|| request.user_groups.iter().any(|g| item.groups.contains(g));

			subject_matches && item.accesses.iter().any(|a| a == &request.access_type)
		})
	}

	fn evaluate(&self, request: &AccessRequest) -> AccessResult {
		let guard = self.policies.read().expect("policy set lock poisoned");
		let Some(policies) = guard.as_ref() else {
			debug!(user = %request.user, "no policies loaded, denying");
			return AccessResult::default();
		};

		let mut result = AccessResult::default();
		for policy in &policies.policies {
			if !policy.base.is_enabled || !Self::resources_match(policy, request) {
				continue;
			}

			// Any applicable policy makes the decision auditable, even when
			// it ends in a deny.
			result.is_audited = true;
			if result.policy_id.is_none() {
				result.policy_id = policy.base.id;
			}

			if Self::items_allow(policy, request) {
				result.is_allowed = true;
				result.policy_id = policy.base.id;
				break;
			}
		}

		result
	}
}

impl Default for DefaultPolicyEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl PolicyEngine for DefaultPolicyEngine {
	fn decide(
		&self,
		request: &AccessRequest,
		audit_handler: Option<&dyn AuditHandler>,
	) -> AccessResult {
		let result = self.evaluate(request);

		if result.is_audited {
			if let Some(handler) = audit_handler {
				if let Err(error) = handler.log_audit(request, &result) {
					warn!(%error, user = %request.user, "audit handler failed");
				}
			}
		}

		result
	}

	fn create_result(&self, _request: &AccessRequest) -> AccessResult {
		AccessResult::default()
	}

	fn context_enrichers(&self) -> Vec<Arc<dyn ContextEnricher>> {
		self.enrichers.clone()
	}

	fn service_def(&self) -> Option<ServiceTypeDef> {
		let guard = self.policies.read().expect("policy set lock poisoned");
		guard.as_ref().and_then(|p| p.service_def.clone())
	}

	fn update_policies(&self, policies: ServicePolicies) {
		debug!(
			service = %policies.service_name,
			version = policies.version,
			count = policies.policies.len(),
			"installing policy set"
		);
		let mut guard = self.policies.write().expect("policy set lock poisoned");
		*guard = Some(policies);
	}

	fn set_default_audit_handler(&self, handler: Option<Arc<dyn AuditHandler>>) {
		let mut guard = self
			.default_audit
			.write()
			.expect("audit handler lock poisoned");
		*guard = handler;
	}

	fn default_audit_handler(&self) -> Option<Arc<dyn AuditHandler>> {
		let guard = self
			.default_audit
			.read()
			.expect("audit handler lock poisoned");
		guard.clone()
	}
}
