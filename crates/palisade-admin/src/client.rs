// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The admin-client seam and its REST implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use palisade_model::{GrantRevokeRequest, ServicePolicies};

use crate::error::{AdminError, Result};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the policy-administration service on behalf of one plugin
/// instance. Implementations must be safe to share across threads; the
/// refresher and the decision facade hold the same instance.
#[async_trait]
pub trait AdminClient: Send + Sync {
	/// Submits a grant request. A transport or protocol failure surfaces to
	/// the caller; the audit obligation around it is the plugin's concern.
	async fn grant(&self, request: &GrantRevokeRequest) -> Result<()>;

	/// Submits a revoke request. Same failure contract as [`grant`].
	///
	/// [`grant`]: AdminClient::grant
	async fn revoke(&self, request: &GrantRevokeRequest) -> Result<()>;

	/// Polls for a newer policy set. `Ok(None)` means the server has nothing
	/// newer than `last_known_version`.
	async fn get_policies_if_updated(
		&self,
		last_known_version: i64,
	) -> Result<Option<ServicePolicies>>;
}

/// Connection settings for the built-in REST client.
#[derive(Debug, Clone)]
pub struct AdminClientConfig {
	pub base_url: String,
	pub service_name: String,
	pub app_id: String,
	pub request_timeout: Duration,
}

impl AdminClientConfig {
	pub fn new(
		base_url: impl Into<String>,
		service_name: impl Into<String>,
		app_id: impl Into<String>,
	) -> Self {
		Self {
			base_url: base_url.into(),
			service_name: service_name.into(),
			app_id: app_id.into(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}
}

/// Default HTTP implementation of [`AdminClient`].
pub struct RestAdminClient {
	client: Client,
	base_url: String,
	service_name: String,
	app_id: String,
}

impl RestAdminClient {
	pub fn new(config: &AdminClientConfig) -> Self {
		let client = Client::builder()
			.user_agent(format!("palisade/{}", env!("CARGO_PKG_VERSION")))
			.timeout(config.request_timeout)
			.build()
			.expect("failed to build HTTP client");

		Self {
			client,
			base_url: config.base_url.trim_end_matches('/').to_string(),
			service_name: config.service_name.clone(),
			app_id: config.app_id.clone(),
		}
	}

	fn action_url(&self, action: &str) -> String {
		format!(
			"{}/api/plugins/services/{}/{}",
			self.base_url, self.service_name, action
		)
	}

	fn download_url(&self) -> String {
		format!(
			"{}/api/plugins/policies/download/{}",
			self.base_url, self.service_name
		)
	}

	async fn post_action(&self, action: &str, request: &GrantRevokeRequest) -> Result<()> {
		let response = self
			.client
			.post(self.action_url(action))
			.query(&[("pluginId", self.app_id.as_str())])
			.json(request)
			.send()
			.await?;

		let status = response.status();
		if status.is_success() {
			Ok(())
		} else {
			let message = response.text().await.unwrap_or_default();
			Err(AdminError::Api {
				status: status.as_u16(),
				message,
			})
		}
	}
}

#[async_trait]
impl AdminClient for RestAdminClient {
	#[instrument(skip(self, request), fields(grantor = %request.grantor))]
	async fn grant(&self, request: &GrantRevokeRequest) -> Result<()> {
		self.post_action("grant", request).await
	}

	#[instrument(skip(self, request), fields(grantor = %request.grantor))]
	async fn revoke(&self, request: &GrantRevokeRequest) -> Result<()> {
		self.post_action("revoke", request).await
	}

	#[instrument(skip(self))]
	async fn get_policies_if_updated(
		&self,
		last_known_version: i64,
	) -> Result<Option<ServicePolicies>> {
		let response = self
			.client
			.get(self.download_url())
			.query(&[
				("lastKnownVersion", last_known_version.to_string()),
				("pluginId", self.app_id.clone()),
			])
			.send()
			.await?;

		match response.status() {
			StatusCode::NOT_MODIFIED => {
				debug!(last_known_version, "no newer policies");
				Ok(None)
			}
			status if status.is_success() => {
				let policies: ServicePolicies = response.json().await?;
				debug!(version = policies.version, "downloaded policies");
				Ok(Some(policies))
			}
			status => {
				let message = response.text().await.unwrap_or_default();
				Err(AdminError::Api {
					status: status.as_u16(),
					message,
				})
			}
		}
	}
}
