// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Plugin configuration, layered defaults < TOML file < `PALISADE_*`
//! environment variables.
//!
//! `service_type` and `app_id` are fixed at construction by the embedding
//! component; file and environment fill in deployment-specific settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use palisade_admin::AdminClientConfig;

use crate::error::Result;

const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
	/// Service type this plugin enforces for, e.g. `"sql"`.
	pub service_type: String,
	/// Identifier this instance reports to the admin service.
	pub app_id: String,
	/// Service instance whose policies are downloaded and enforced.
	pub service_name: String,
	/// Base URL of the policy-administration service.
	pub admin_url: String,
	/// Named admin-client constructor; unset selects the REST client.
	pub policy_source: Option<String>,
	pub poll_interval_ms: u64,
	pub request_timeout_ms: u64,
	/// Directory for the on-disk policy cache. Unset disables caching.
	pub cache_dir: Option<PathBuf>,
}

impl Default for PluginConfig {
	fn default() -> Self {
		Self {
			service_type: String::new(),
			app_id: String::new(),
			service_name: String::new(),
			admin_url: String::new(),
			policy_source: None,
			poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
			request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
			cache_dir: None,
		}
	}
}

impl PluginConfig {
	pub fn new(service_type: impl Into<String>, app_id: impl Into<String>) -> Self {
		Self {
			service_type: service_type.into(),
			app_id: app_id.into(),
			..Default::default()
		}
	}

	/// Loads settings in layers: `self` as defaults, then the TOML file at
	/// `path` (if given), then `PALISADE_*` environment variables.
	pub fn load(mut self, path: Option<&Path>) -> Result<Self> {
		if let Some(path) = path {
			debug!(path = %path.display(), "loading plugin configuration file");
			let text = std::fs::read_to_string(path)?;
			self.merge_file(&text)?;
		}

		self.apply_overrides(|name| std::env::var(name).ok());
		Ok(self)
	}

	fn merge_file(&mut self, text: &str) -> Result<()> {
		let file: PluginConfig = toml::from_str(text)?;

		// service_type and app_id stay as constructed.
		if !file.service_name.is_empty() {
			self.service_name = file.service_name;
		}
		if !file.admin_url.is_empty() {
			self.admin_url = file.admin_url;
		}
		if file.policy_source.is_some() {
			self.policy_source = file.policy_source;
		}
		if file.cache_dir.is_some() {
			self.cache_dir = file.cache_dir;
		}
		self.poll_interval_ms = file.poll_interval_ms;
		self.request_timeout_ms = file.request_timeout_ms;
		Ok(())
	}

	/// Applies `PALISADE_*` overrides read through `lookup`.
	pub(crate) fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
		if let Some(value) = lookup("PALISADE_SERVICE_NAME") {
			self.service_name = value;
		}
		if let Some(value) = lookup("PALISADE_ADMIN_URL") {
			self.admin_url = value;
		}
		if let Some(value) = lookup("PALISADE_POLICY_SOURCE") {
			self.policy_source = Some(value);
		}
		if let Some(value) = lookup("PALISADE_CACHE_DIR") {
			self.cache_dir = Some(PathBuf::from(value));
		}
		if let Some(value) = lookup("PALISADE_POLL_INTERVAL_MS") {
			if let Ok(ms) = value.parse() {
				self.poll_interval_ms = ms;
			}
		}
		if let Some(value) = lookup("PALISADE_REQUEST_TIMEOUT_MS") {
			if let Ok(ms) = value.parse() {
				self.request_timeout_ms = ms;
			}
		}
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}

	pub(crate) fn admin_client_config(&self) -> AdminClientConfig {
		AdminClientConfig::new(&self.admin_url, &self.service_name, &self.app_id)
			.with_request_timeout(self.request_timeout())
	}
}
