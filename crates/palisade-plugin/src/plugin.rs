// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The plugin facade embedding services call into.
//!
//! Lifecycle (init, re-init, cleanup) is serialized behind an async mutex;
//! the hot path reads the current state through a lock-free snapshot, so a
//! decision in flight keeps the generation it started with even while a
//! re-init swaps in a new one.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use palisade_admin::{AdminClient, AdminClientRegistry};
use palisade_model::{
	AccessRequest, AccessResult, AdminAction, GrantRevokeRequest, ServiceTypeDef,
};

use crate::config::PluginConfig;
use crate::default_engine::DefaultPolicyEngine;
use crate::engine::{AuditHandler, PolicyEngine, ADMIN_ACCESS};
use crate::error::{PluginError, Result};
use crate::refresher::{PolicyRefresher, Refresher};

/// One initialized generation: engine, identity, and the refresher feeding it.
struct PluginState {
	engine: Arc<dyn PolicyEngine>,
	service_name: String,
	refresher: Arc<dyn Refresher>,
}

pub struct PolicyPlugin {
	service_type: String,
	app_id: String,
	registry: AdminClientRegistry,
	state: ArcSwapOption<PluginState>,
	lifecycle: Mutex<()>,
}

impl PolicyPlugin {
	pub fn new(service_type: impl Into<String>, app_id: impl Into<String>) -> Self {
		Self {
			service_type: service_type.into(),
			app_id: app_id.into(),
			registry: AdminClientRegistry::new(),
			state: ArcSwapOption::const_empty(),
			lifecycle: Mutex::new(()),
		}
	}

	/// Registers an admin-client constructor selectable via
	/// `PluginConfig::policy_source`. Must be called before `init`.
	pub fn register_policy_source(
		&mut self,
		name: impl Into<String>,
		builder: impl Fn(&palisade_admin::AdminClientConfig) -> Arc<dyn AdminClient>
			+ Send
			+ Sync
			+ 'static,
	) {
		self.registry.register(name, builder);
	}

	pub fn service_type(&self) -> &str {
		&self.service_type
	}

	pub fn app_id(&self) -> &str {
		&self.app_id
	}

	/// Initializes with the built-in policy engine.
	pub async fn init(&self, config: PluginConfig) -> Result<()> {
		self.init_with_engine(Arc::new(DefaultPolicyEngine::new()), config)
			.await
	}

	/// Initializes (or re-initializes) with a caller-supplied engine. The new
	/// generation is published atomically; readers see the old state or the
	/// new one, never a half-built mix. The previous generation's refresher
	/// is stopped after the swap.
	#[instrument(skip(self, engine, config), fields(service = %config.service_name, app_id = %self.app_id))]
	pub async fn init_with_engine(
		&self,
		engine: Arc<dyn PolicyEngine>,
		config: PluginConfig,
	) -> Result<()> {
		if config.service_name.is_empty() {
			return Err(PluginError::Config("service_name must be set".to_string()));
		}

		let _guard = self.lifecycle.lock().await;

		let admin = self
			.registry
			.create(config.policy_source.as_deref(), &config.admin_client_config());
		let refresher: Arc<dyn Refresher> =
			Arc::new(PolicyRefresher::new(Arc::clone(&engine), admin, &config));
		refresher.start().await;

		let previous = self.state.swap(Some(Arc::new(PluginState {
			engine,
			service_name: config.service_name.clone(),
			refresher,
		})));

		if let Some(previous) = previous {
			previous.refresher.stop().await;
		}

		info!(service_type = %self.service_type, "plugin initialized");
		Ok(())
	}

	/// Tears down the current generation. Idempotent; decisions in flight
	/// finish against the state they snapshotted.
	#[instrument(skip(self), fields(app_id = %self.app_id))]
	pub async fn cleanup(&self) {
		let _guard = self.lifecycle.lock().await;

		if let Some(previous) = self.state.swap(None) {
			previous.refresher.stop().await;
			info!(service = %previous.service_name, "plugin cleaned up");
		}
	}

	pub fn current_engine(&self) -> Option<Arc<dyn PolicyEngine>> {
		self.state.load().as_ref().map(|s| Arc::clone(&s.engine))
	}

	pub fn service_name(&self) -> Option<String> {
		self.state.load().as_ref().map(|s| s.service_name.clone())
	}

	pub fn get_service_def(&self) -> Option<ServiceTypeDef> {
		self.state.load().as_ref().and_then(|s| s.engine.service_def())
	}

	pub fn set_default_audit_handler(&self, handler: Option<Arc<dyn AuditHandler>>) {
		if let Some(state) = self.state.load().as_ref() {
			state.engine.set_default_audit_handler(handler);
		}
	}

	pub fn default_audit_handler(&self) -> Option<Arc<dyn AuditHandler>> {
		self.state
			.load()
			.as_ref()
			.and_then(|s| s.engine.default_audit_handler())
	}

	/// Runs the engine's enrichers over `request`. No-op when uninitialized.
	pub fn enrich_request(&self, request: &mut AccessRequest) {
		if let Some(state) = self.state.load_full() {
			Self::enrich_with(&state.engine, std::slice::from_mut(request));
		}
	}

	/// Runs the engine's enrichers over the whole batch. No-op when the batch
	/// is empty or the plugin is uninitialized.
	pub fn enrich_batch(&self, requests: &mut [AccessRequest]) {
		if let Some(state) = self.state.load_full() {
			Self::enrich_with(&state.engine, requests);
		}
	}

	// Enricher-major order: each enricher sees the whole batch before the
	// next enricher runs, so an enricher that accumulates batch-wide state
	// has finished before its successors read it.
	fn enrich_with(engine: &Arc<dyn PolicyEngine>, requests: &mut [AccessRequest]) {
		if requests.is_empty() {
			return;
		}

		for enricher in engine.context_enrichers() {
			for request in requests.iter_mut() {
				enricher.enrich(request);
			}
		}
	}

	fn decide_resolved(
		engine: &Arc<dyn PolicyEngine>,
		request: &AccessRequest,
		audit_handler: Option<&dyn AuditHandler>,
	) -> AccessResult {
		match audit_handler {
			Some(handler) => engine.decide(request, Some(handler)),
			None => {
				let default = engine.default_audit_handler();
				engine.decide(request, default.as_deref())
			}
		}
	}

	/// Enriches and evaluates one request. `None` means the plugin holds no
	/// engine (uninitialized or cleaned up), which is distinct from a deny.
	/// An explicit `audit_handler` overrides the engine's default.
	pub fn is_access_allowed(
		&self,
		request: &mut AccessRequest,
		audit_handler: Option<&dyn AuditHandler>,
	) -> Option<AccessResult> {
		let state = self.state.load_full()?;
		Self::enrich_with(&state.engine, std::slice::from_mut(request));
		Some(Self::decide_resolved(&state.engine, request, audit_handler))
	}

	/// Batch form of [`is_access_allowed`]: one enrichment pass over the
	/// whole batch, then one decision per request, in order.
	///
	/// [`is_access_allowed`]: PolicyPlugin::is_access_allowed
	pub fn is_access_allowed_batch(
		&self,
		requests: &mut [AccessRequest],
		audit_handler: Option<&dyn AuditHandler>,
	) -> Option<Vec<AccessResult>> {
		let state = self.state.load_full()?;
		Self::enrich_with(&state.engine, requests);

		Some(match audit_handler {
			Some(handler) => state.engine.decide_batch(requests, Some(handler)),
			None => {
				let default = state.engine.default_audit_handler();
				state.engine.decide_batch(requests, default.as_deref())
			}
		})
	}

	/// Builds a result shaped for `request` without evaluating policies.
	pub fn create_access_result(&self, request: &AccessRequest) -> Option<AccessResult> {
		let state = self.state.load_full()?;
		Some(state.engine.create_result(request))
	}

	/// Delivers a grant to the admin service. The attempt is audited whether
	/// it succeeds or fails, and the underlying error (if any) surfaces to
	/// the caller unchanged.
	pub async fn grant_access(
		&self,
		request: &GrantRevokeRequest,
		audit_handler: &dyn AuditHandler,
	) -> Result<()> {
		self.admin_action(request, AdminAction::Grant, audit_handler)
			.await
	}

	/// Delivers a revoke to the admin service. Same audit contract as
	/// [`grant_access`].
	///
	/// [`grant_access`]: PolicyPlugin::grant_access
	pub async fn revoke_access(
		&self,
		request: &GrantRevokeRequest,
		audit_handler: &dyn AuditHandler,
	) -> Result<()> {
		self.admin_action(request, AdminAction::Revoke, audit_handler)
			.await
	}

	async fn admin_action(
		&self,
		request: &GrantRevokeRequest,
		action: AdminAction,
		audit_handler: &dyn AuditHandler,
	) -> Result<()> {
		let state = self.state.load_full();
		let admin = state.as_ref().and_then(|s| s.refresher.admin_client());

		let outcome = match admin {
			Some(admin) => match action {
				AdminAction::Grant => admin.grant(request).await,
				AdminAction::Revoke => admin.revoke(request).await,
			}
			.map_err(PluginError::from),
			None => Err(PluginError::AdminUnavailable),
		};

		// The audit happens on every path before the outcome surfaces.
		if let Some(state) = state.as_deref() {
			Self::audit_admin_action(state, request, action, outcome.is_ok(), audit_handler);
		}

		outcome
	}

	/// Shapes an audit record for a grant/revoke by running a synthetic
	/// `admin` access check, then logs it with `is_allowed` reflecting the
	/// real delivery outcome. Enrichment is skipped; the check exists only to
	/// decide auditability and attribute a policy.
	fn audit_admin_action(
		state: &PluginState,
		request: &GrantRevokeRequest,
		action: AdminAction,
		succeeded: bool,
		audit_handler: &dyn AuditHandler,
	) {
		let access_request = AccessRequest {
			resource: request.resource.clone(),
			user: request.grantor.clone(),
			user_groups: BTreeSet::new(),
			access_type: ADMIN_ACCESS.to_string(),
			action: action.as_str().to_string(),
			context: BTreeMap::new(),
		};

		let mut result = state.engine.decide(&access_request, None);
		if !result.is_audited {
			return;
		}

		result.is_allowed = succeeded;
		if let Err(error) = audit_handler.log_audit(&access_request, &result) {
			warn!(%error, action = action.as_str(), "grant/revoke audit failed");
		}
	}

	#[cfg(test)]
	fn install_state(
		&self,
		engine: Arc<dyn PolicyEngine>,
		service_name: &str,
		refresher: Arc<dyn Refresher>,
	) {
		self.state.store(Some(Arc::new(PluginState {
			engine,
			service_name: service_name.to_string(),
			refresher,
		})));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
	use std::sync::Mutex as StdMutex;
	use std::time::Duration;

	use async_trait::async_trait;

	use palisade_admin::error::Result as AdminResult;
	use palisade_admin::AdminError;
	use palisade_model::{
		ObjectBase, Policy, PolicyItem, ResourceMatchSpec, ServicePolicies,
	};

	use crate::engine::ContextEnricher;
	use crate::error::AuditError;

	struct RecordingAudit {
		calls: AtomicUsize,
		last: StdMutex<Option<(AccessRequest, AccessResult)>>,
	}

	impl RecordingAudit {
		fn new() -> Arc<Self> {
			Arc::new(Self {
				calls: AtomicUsize::new(0),
				last: StdMutex::new(None),
			})
		}
	}

	impl AuditHandler for RecordingAudit {
		fn log_audit(
			&self,
			request: &AccessRequest,
			result: &AccessResult,
		) -> std::result::Result<(), AuditError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			*self.last.lock().unwrap() = Some((request.clone(), result.clone()));
			Ok(())
		}
	}

	/// Engine that marks every decision with a fixed policy id.
	struct MarkerEngine {
		marker: i64,
		audited: bool,
	}

	impl PolicyEngine for MarkerEngine {
		fn decide(
			&self,
			request: &AccessRequest,
			audit_handler: Option<&dyn AuditHandler>,
		) -> AccessResult {
			let result = AccessResult {
				is_allowed: true,
				is_audited: self.audited,
				policy_id: Some(self.marker),
				reason: None,
			};
			if result.is_audited {
				if let Some(handler) = audit_handler {
					let _ = handler.log_audit(request, &result);
				}
			}
			result
		}

		fn create_result(&self, _request: &AccessRequest) -> AccessResult {
			AccessResult {
				policy_id: Some(self.marker),
				..Default::default()
			}
		}

		fn context_enrichers(&self) -> Vec<Arc<dyn ContextEnricher>> {
			Vec::new()
		}

		fn service_def(&self) -> Option<ServiceTypeDef> {
			None
		}

		fn update_policies(&self, _policies: ServicePolicies) {}

		fn set_default_audit_handler(&self, _handler: Option<Arc<dyn AuditHandler>>) {}

		fn default_audit_handler(&self) -> Option<Arc<dyn AuditHandler>> {
			None
		}
	}

	struct StubRefresher {
		admin: Option<Arc<dyn AdminClient>>,
		stopped: AtomicBool,
	}

	impl StubRefresher {
		fn new(admin: Option<Arc<dyn AdminClient>>) -> Arc<Self> {
			Arc::new(Self {
				admin,
				stopped: AtomicBool::new(false),
			})
		}
	}

	#[async_trait]
	impl Refresher for StubRefresher {
		async fn start(&self) {}

		async fn stop(&self) {
			self.stopped.store(true, Ordering::SeqCst);
		}

		fn admin_client(&self) -> Option<Arc<dyn AdminClient>> {
			self.admin.clone()
		}
	}

	struct StubAdmin {
		fail_grants: bool,
		grants: AtomicUsize,
		policies: Vec<Policy>,
	}

	impl StubAdmin {
		fn succeeding() -> Arc<Self> {
			Arc::new(Self {
				fail_grants: false,
				grants: AtomicUsize::new(0),
				policies: Vec::new(),
			})
		}

		fn failing() -> Arc<Self> {
			Arc::new(Self {
				fail_grants: true,
				grants: AtomicUsize::new(0),
				policies: Vec::new(),
			})
		}
	}

	#[async_trait]
	impl AdminClient for StubAdmin {
		async fn grant(&self, _request: &GrantRevokeRequest) -> AdminResult<()> {
			self.grants.fetch_add(1, Ordering::SeqCst);
			if self.fail_grants {
				Err(AdminError::Api {
					status: 502,
					message: "upstream unavailable".to_string(),
				})
			} else {
				Ok(())
			}
		}

		async fn revoke(&self, _request: &GrantRevokeRequest) -> AdminResult<()> {
			if self.fail_grants {
				Err(AdminError::Api {
					status: 502,
					message: "upstream unavailable".to_string(),
				})
			} else {
				Ok(())
			}
		}

		async fn get_policies_if_updated(
			&self,
			last_known_version: i64,
		) -> AdminResult<Option<ServicePolicies>> {
			if last_known_version >= 1 {
				return Ok(None);
			}
			Ok(Some(ServicePolicies {
				service_name: "warehouse".to_string(),
				service_def: None,
				version: 1,
				policies: self.policies.clone(),
			}))
		}
	}

	fn config() -> PluginConfig {
		let mut config = PluginConfig::new("sql", "node-1");
		config.service_name = "warehouse".to_string();
		config.admin_url = "https://admin.example.com".to_string();
		config.policy_source = Some("stub".to_string());
		config.poll_interval_ms = 10;
		config
	}

	fn select_policy() -> Policy {
		let mut resources = BTreeMap::new();
		resources.insert(
			"table".to_string(),
			ResourceMatchSpec::new(vec!["sales*".to_string()]),
		);
		Policy {
			base: ObjectBase {
				id: Some(1),
				is_enabled: true,
				..Default::default()
			},
			service: "warehouse".to_string(),
			name: "sales-read".to_string(),
			resources,
			resource_signature: None,
			items: vec![PolicyItem {
				users: BTreeSet::from(["alice".to_string()]),
				groups: BTreeSet::new(),
				accesses: vec!["select".to_string()],
			}],
		}
	}

	#[test]
	fn uninitialized_plugin_has_no_engine() {
		let plugin = PolicyPlugin::new("sql", "node-1");
		let mut request = AccessRequest::new("alice", "select");

		assert!(plugin.is_access_allowed(&mut request, None).is_none());
		assert!(plugin.create_access_result(&request).is_none());
		assert!(plugin.service_name().is_none());
		assert!(plugin.current_engine().is_none());
		assert!(plugin.get_service_def().is_none());
	}

	#[tokio::test]
	async fn init_downloads_policies_and_decides() {
		let mut plugin = PolicyPlugin::new("sql", "node-1");
		let admin = Arc::new(StubAdmin {
			fail_grants: false,
			grants: AtomicUsize::new(0),
			policies: vec![select_policy()],
		});
		let admin_for_builder = Arc::clone(&admin);
		plugin.register_policy_source("stub", move |_config| {
			Arc::clone(&admin_for_builder) as Arc<dyn AdminClient>
		});

		plugin.init(config()).await.unwrap();
		tokio::time::sleep(Duration::from_millis(50)).await;

		let mut request = AccessRequest::new("alice", "select").with_resource("table", "sales_q1");
		let result = plugin.is_access_allowed(&mut request, None).unwrap();
		assert!(result.is_allowed);
		assert_eq!(result.policy_id, Some(1));

		assert_eq!(plugin.service_name().as_deref(), Some("warehouse"));
		plugin.cleanup().await;
	}

	#[tokio::test]
	async fn init_rejects_missing_service_name() {
		let plugin = PolicyPlugin::new("sql", "node-1");
		let config = PluginConfig::new("sql", "node-1");

		let error = plugin.init(config).await.unwrap_err();
		assert!(matches!(error, PluginError::Config(_)));
		assert!(plugin.current_engine().is_none());
	}

	#[tokio::test]
	async fn reinit_swaps_generations_atomically() {
		let mut plugin = PolicyPlugin::new("sql", "node-1");
		let admin = StubAdmin::succeeding();
		let admin_for_builder = Arc::clone(&admin);
		plugin.register_policy_source("stub", move |_config| {
			Arc::clone(&admin_for_builder) as Arc<dyn AdminClient>
		});
		let plugin = Arc::new(plugin);

		let refresher_a = StubRefresher::new(None);
		plugin.install_state(
			Arc::new(MarkerEngine {
				marker: 1,
				audited: false,
			}),
			"warehouse",
			refresher_a.clone(),
		);

		let mut readers = Vec::new();
		for _ in 0..50 {
			let plugin = Arc::clone(&plugin);
			readers.push(tokio::spawn(async move {
				for _ in 0..100 {
					let mut request = AccessRequest::new("alice", "select");
					let result = plugin
						.is_access_allowed(&mut request, None)
						.expect("state must never be torn down during re-init");
					assert!(matches!(result.policy_id, Some(1) | Some(2)));
					tokio::task::yield_now().await;
				}
			}));
		}

		plugin
			.init_with_engine(
				Arc::new(MarkerEngine {
					marker: 2,
					audited: false,
				}),
				config(),
			)
			.await
			.unwrap();

		for reader in readers {
			reader.await.unwrap();
		}

		assert!(refresher_a.stopped.load(Ordering::SeqCst));
		let mut request = AccessRequest::new("alice", "select");
		let result = plugin.is_access_allowed(&mut request, None).unwrap();
		assert_eq!(result.policy_id, Some(2));
		plugin.cleanup().await;
	}

	#[tokio::test]
	async fn cleanup_is_idempotent_and_stops_refresher() {
		let plugin = PolicyPlugin::new("sql", "node-1");
		let refresher = StubRefresher::new(None);
		plugin.install_state(
			Arc::new(MarkerEngine {
				marker: 1,
				audited: false,
			}),
			"warehouse",
			refresher.clone(),
		);

		plugin.cleanup().await;
		assert!(refresher.stopped.load(Ordering::SeqCst));
		assert!(plugin.service_name().is_none());

		plugin.cleanup().await;
	}

	#[tokio::test]
	async fn grant_failure_audits_once_and_preserves_error() {
		let plugin = PolicyPlugin::new("sql", "node-1");
		let admin = StubAdmin::failing();
		plugin.install_state(
			Arc::new(MarkerEngine {
				marker: 7,
				audited: true,
			}),
			"warehouse",
			StubRefresher::new(Some(admin.clone() as Arc<dyn AdminClient>)),
		);

		let audit = RecordingAudit::new();
		let request = GrantRevokeRequest {
			grantor: "admin-user".to_string(),
			..Default::default()
		};

		let error = plugin.grant_access(&request, audit.as_ref()).await.unwrap_err();
		match error {
			PluginError::Admin(AdminError::Api { status, .. }) => assert_eq!(status, 502),
			other => panic!("expected the admin API error to pass through, got: {other:?}"),
		}

		assert_eq!(admin.grants.load(Ordering::SeqCst), 1);
		assert_eq!(audit.calls.load(Ordering::SeqCst), 1);

		let last = audit.last.lock().unwrap();
		let (logged_request, logged_result) = last.as_ref().unwrap();
		assert!(!logged_result.is_allowed);
		assert_eq!(logged_request.access_type, ADMIN_ACCESS);
		assert_eq!(logged_request.action, "grant");
		assert_eq!(logged_request.user, "admin-user");
	}

	#[tokio::test]
	async fn grant_success_audits_allowed_outcome() {
		let plugin = PolicyPlugin::new("sql", "node-1");
		let admin = StubAdmin::succeeding();
		plugin.install_state(
			Arc::new(MarkerEngine {
				marker: 7,
				audited: true,
			}),
			"warehouse",
			StubRefresher::new(Some(admin as Arc<dyn AdminClient>)),
		);

		let audit = RecordingAudit::new();
		let request = GrantRevokeRequest {
			grantor: "admin-user".to_string(),
			..Default::default()
		};

		plugin.revoke_access(&request, audit.as_ref()).await.unwrap();

		assert_eq!(audit.calls.load(Ordering::SeqCst), 1);
		let last = audit.last.lock().unwrap();
		let (logged_request, logged_result) = last.as_ref().unwrap();
		assert!(logged_result.is_allowed);
		assert_eq!(logged_request.action, "revoke");
	}

	#[tokio::test]
	async fn grant_without_admin_client_fails_and_still_audits() {
		let plugin = PolicyPlugin::new("sql", "node-1");
		plugin.install_state(
			Arc::new(MarkerEngine {
				marker: 7,
				audited: true,
			}),
			"warehouse",
			StubRefresher::new(None),
		);

		let audit = RecordingAudit::new();
		let request = GrantRevokeRequest::default();

		let error = plugin.grant_access(&request, audit.as_ref()).await.unwrap_err();
		assert!(matches!(error, PluginError::AdminUnavailable));
		assert_eq!(audit.calls.load(Ordering::SeqCst), 1);
		assert!(!audit.last.lock().unwrap().as_ref().unwrap().1.is_allowed);
	}

	#[tokio::test]
	async fn grant_on_uninitialized_plugin_fails_without_audit() {
		let plugin = PolicyPlugin::new("sql", "node-1");
		let audit = RecordingAudit::new();

		let error = plugin
			.grant_access(&GrantRevokeRequest::default(), audit.as_ref())
			.await
			.unwrap_err();
		assert!(matches!(error, PluginError::AdminUnavailable));
		assert_eq!(audit.calls.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn explicit_audit_handler_overrides_default() {
		let plugin = PolicyPlugin::new("sql", "node-1");
		let engine = DefaultPolicyEngine::new();
		engine.update_policies(ServicePolicies {
			service_name: "warehouse".to_string(),
			service_def: None,
			version: 1,
			policies: vec![select_policy()],
		});
		plugin.install_state(Arc::new(engine), "warehouse", StubRefresher::new(None));

		let default_audit = RecordingAudit::new();
		plugin.set_default_audit_handler(Some(default_audit.clone() as Arc<dyn AuditHandler>));

		let mut request = AccessRequest::new("alice", "select").with_resource("table", "sales_q1");
		plugin.is_access_allowed(&mut request, None).unwrap();
		assert_eq!(default_audit.calls.load(Ordering::SeqCst), 1);

		let explicit = RecordingAudit::new();
		plugin
			.is_access_allowed(&mut request, Some(explicit.as_ref()))
			.unwrap();
		assert_eq!(explicit.calls.load(Ordering::SeqCst), 1);
		assert_eq!(default_audit.calls.load(Ordering::SeqCst), 1);
	}

	/// Counts requests as it sees them; later enrichers read the count.
	struct CountingEnricher {
		seen: Arc<AtomicUsize>,
	}

	impl ContextEnricher for CountingEnricher {
		fn name(&self) -> &str {
			"counting"
		}

		fn enrich(&self, request: &mut AccessRequest) {
			let seen = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
			request
				.context
				.insert("seen_index".to_string(), serde_json::json!(seen));
		}
	}

	/// Snapshots the counter populated by [`CountingEnricher`].
	struct SnapshotEnricher {
		seen: Arc<AtomicUsize>,
	}

	impl ContextEnricher for SnapshotEnricher {
		fn name(&self) -> &str {
			"snapshot"
		}

		fn enrich(&self, request: &mut AccessRequest) {
			request.context.insert(
				"batch_seen".to_string(),
				serde_json::json!(self.seen.load(Ordering::SeqCst)),
			);
		}
	}

	#[test]
	fn batch_enrichment_runs_enricher_major() {
		let seen = Arc::new(AtomicUsize::new(0));
		let counting = Arc::new(CountingEnricher { seen: seen.clone() });
		let snapshot = Arc::new(SnapshotEnricher { seen: seen.clone() });

		let plugin = PolicyPlugin::new("sql", "node-1");
		let engine = DefaultPolicyEngine::new()
			.with_enricher(counting)
			.with_enricher(snapshot);
		plugin.install_state(Arc::new(engine), "warehouse", StubRefresher::new(None));

		let mut requests = vec![
			AccessRequest::new("a", "select"),
			AccessRequest::new("b", "select"),
			AccessRequest::new("c", "select"),
		];
		plugin.is_access_allowed_batch(&mut requests, None).unwrap();

		// The first enricher finished the whole batch before the second ran,
		// so every request sees the full count.
		for request in &requests {
			assert_eq!(request.context.get("batch_seen"), Some(&serde_json::json!(3)));
		}
	}

	#[test]
	fn request_major_order_would_leak_partial_counts() {
		let seen = Arc::new(AtomicUsize::new(0));
		let counting = CountingEnricher { seen: seen.clone() };
		let snapshot = SnapshotEnricher { seen: seen.clone() };

		let mut requests = vec![
			AccessRequest::new("a", "select"),
			AccessRequest::new("b", "select"),
			AccessRequest::new("c", "select"),
		];

		// Nest the loops the other way round and each request snapshots a
		// partial count, which is exactly what the facade must not do.
		for request in requests.iter_mut() {
			counting.enrich(request);
			snapshot.enrich(request);
		}

		let snapshots: Vec<_> = requests
			.iter()
			.map(|r| r.context.get("batch_seen").cloned().unwrap())
			.collect();
		assert_eq!(
			snapshots,
			vec![
				serde_json::json!(1),
				serde_json::json!(2),
				serde_json::json!(3)
			]
		);
	}

	#[test]
	fn empty_batch_is_a_no_op() {
		let plugin = PolicyPlugin::new("sql", "node-1");
		plugin.install_state(
			Arc::new(MarkerEngine {
				marker: 1,
				audited: false,
			}),
			"warehouse",
			StubRefresher::new(None),
		);

		let mut requests: Vec<AccessRequest> = Vec::new();
		let results = plugin.is_access_allowed_batch(&mut requests, None).unwrap();
		assert!(results.is_empty());
		plugin.enrich_batch(&mut requests);
	}
}
