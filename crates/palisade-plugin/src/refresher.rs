// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background policy refresh.
//!
//! [`PolicyRefresher`] polls the admin service for newer policy sets and
//! installs deltas into the engine. A JSON cache file lets a restarted
//! plugin enforce the last-known policies before the first poll completes.

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use palisade_admin::AdminClient;
use palisade_model::ServicePolicies;

use crate::config::PluginConfig;
use crate::engine::PolicyEngine;

/// Lifecycle seam between the plugin facade and the refresh machinery. The
/// facade stops whatever refresher the current state holds; tests substitute
/// their own.
#[async_trait]
pub trait Refresher: Send + Sync {
	async fn start(&self);

	/// Stops the background task and waits for it to exit. Idempotent.
	async fn stop(&self);

	/// The admin client this refresher polls through, shared with the
	/// grant/revoke path. `None` when the refresher has no remote source.
	fn admin_client(&self) -> Option<Arc<dyn AdminClient>>;
}

pub struct PolicyRefresher {
	engine: Arc<dyn PolicyEngine>,
	admin: Arc<dyn AdminClient>,
	service_name: String,
	poll_interval: Duration,
	cache_path: Option<PathBuf>,
	last_version: Arc<AtomicI64>,
	shutdown_tx: broadcast::Sender<()>,
	handle: Mutex<Option<JoinHandle<()>>>,
}

impl PolicyRefresher {
	pub fn new(
		engine: Arc<dyn PolicyEngine>,
		admin: Arc<dyn AdminClient>,
		config: &PluginConfig,
	) -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		let cache_path = config
			.cache_dir
			.as_ref()
			.map(|dir| dir.join(format!("{}.policycache.json", config.service_name)));

		Self {
			engine,
			admin,
			service_name: config.service_name.clone(),
			poll_interval: config.poll_interval(),
			cache_path,
			last_version: Arc::new(AtomicI64::new(-1)),
			shutdown_tx,
			handle: Mutex::new(None),
		}
	}

	pub fn last_version(&self) -> i64 {
		self.last_version.load(Ordering::SeqCst)
	}

	async fn load_cache(&self) {
		let Some(path) = &self.cache_path else {
			return;
		};

		match tokio::fs::read(path).await {
			Ok(bytes) => match serde_json::from_slice::<ServicePolicies>(&bytes) {
				Ok(policies) => {
					info!(
						service = %self.service_name,
						version = policies.version,
						"loaded cached policies"
					);
					self.last_version.store(policies.version, Ordering::SeqCst);
					self.engine.update_policies(policies);
				}
				Err(error) => {
					warn!(path = %path.display(), %error, "discarding unreadable policy cache");
				}
			},
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
			Err(error) => {
				warn!(path = %path.display(), %error, "failed to read policy cache");
			}
		}
	}

	async fn save_cache(cache_path: &Option<PathBuf>, policies: &ServicePolicies) {
		let Some(path) = cache_path else {
			return;
		};

		match serde_json::to_vec(policies) {
			Ok(bytes) => {
				if let Err(error) = tokio::fs::write(path, bytes).await {
					warn!(path = %path.display(), %error, "failed to write policy cache");
				}
			}
			Err(error) => {
				warn!(%error, "failed to serialize policy cache");
			}
		}
	}

	async fn poll_once(
		engine: &Arc<dyn PolicyEngine>,
		admin: &Arc<dyn AdminClient>,
		service_name: &str,
		cache_path: &Option<PathBuf>,
		last_version: &AtomicI64,
	) {
		let known = last_version.load(Ordering::SeqCst);
		match admin.get_policies_if_updated(known).await {
			Ok(Some(policies)) => {
				info!(
					service = %service_name,
					from = known,
					to = policies.version,
					"policy update received"
				);
				last_version.store(policies.version, Ordering::SeqCst);
				Self::save_cache(cache_path, &policies).await;
				engine.update_policies(policies);
			}
			Ok(None) => {
				debug!(service = %service_name, version = known, "policies unchanged");
			}
			Err(error) => {
				// Keep enforcing the last-known set; the next tick retries.
				warn!(service = %service_name, %error, "policy poll failed");
			}
		}
	}
}

#[async_trait]
impl Refresher for PolicyRefresher {
	#[instrument(skip(self), fields(service = %self.service_name))]
	async fn start(&self) {
		let mut handle = self.handle.lock().await;
		if handle.is_some() {
			return;
		}

		self.load_cache().await;

		let engine = Arc::clone(&self.engine);
		let admin = Arc::clone(&self.admin);
		let service_name = self.service_name.clone();
		let cache_path = self.cache_path.clone();
		let last_version = Arc::clone(&self.last_version);
		let poll_interval = self.poll_interval;
		let mut shutdown_rx = self.shutdown_tx.subscribe();

		*handle = Some(tokio::spawn(async move {
			loop {
				Self::poll_once(&engine, &admin, &service_name, &cache_path, &last_version).await;

				tokio::select! {
					_ = tokio::time::sleep(poll_interval) => {}
					_ = shutdown_rx.recv() => {
						info!(service = %service_name, "stopping policy refresher");
						break;
					}
				}
			}
		}));
	}

	#[instrument(skip(self), fields(service = %self.service_name))]
	async fn stop(&self) {
		let _ = self.shutdown_tx.send(());

		let mut handle = self.handle.lock().await;
		if let Some(handle) = handle.take() {
			let _ = handle.await;
		}
	}

	fn admin_client(&self) -> Option<Arc<dyn AdminClient>> {
		Some(Arc::clone(&self.admin))
	}
}
