// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Explicit name-to-constructor registry for admin clients.
//!
//! The policy source is selected by a configuration string. An unset or
//! unresolvable name logs a warning and falls back to the built-in REST
//! client — configuration problems here are recovered locally and never
//! surface to the embedding server.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::{AdminClient, AdminClientConfig, RestAdminClient};

type Builder = Arc<dyn Fn(&AdminClientConfig) -> Arc<dyn AdminClient> + Send + Sync>;

pub struct AdminClientRegistry {
	builders: HashMap<String, Builder>,
}

impl AdminClientRegistry {
	pub fn new() -> Self {
		Self {
			builders: HashMap::new(),
		}
	}

	/// Registers a constructor under `name`, replacing any prior entry.
	pub fn register(
		&mut self,
		name: impl Into<String>,
		builder: impl Fn(&AdminClientConfig) -> Arc<dyn AdminClient> + Send + Sync + 'static,
	) {
		self.builders.insert(name.into(), Arc::new(builder));
	}

	/// Builds the client for `source`. `None` or an unknown name selects the
	/// REST client.
	pub fn create(&self, source: Option<&str>, config: &AdminClientConfig) -> Arc<dyn AdminClient> {
		match source.filter(|s| !s.is_empty()) {
			None => {
				debug!("no policy source configured, using REST admin client");
				Arc::new(RestAdminClient::new(config))
			}
			Some(name) => match self.builders.get(name) {
				Some(builder) => {
					debug!(source = name, "using registered admin client");
					builder(config)
				}
				None => {
					warn!(
						source = name,
						"unknown policy source, falling back to REST admin client"
					);
					Arc::new(RestAdminClient::new(config))
				}
			},
		}
	}
}

impl Default for AdminClientRegistry {
	fn default() -> Self {
		Self::new()
	}
}
