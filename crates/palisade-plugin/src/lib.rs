// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Embeddable authorization runtime.
//!
//! A service embeds one [`PolicyPlugin`] per protected service instance. The
//! plugin downloads policies from the admin service in the background, keeps
//! them in a pluggable [`PolicyEngine`], and answers access checks on a
//! lock-free read path. Grant/revoke requests are forwarded to the admin
//! service with an unconditional audit around each attempt.
//!
//! ```no_run
//! use palisade_plugin::{PluginConfig, PolicyPlugin};
//! use palisade_model::AccessRequest;
//!
//! # async fn example() -> palisade_plugin::Result<()> {
//! let plugin = PolicyPlugin::new("sql", "warehouse-node-1");
//! let config = PluginConfig::new("sql", "warehouse-node-1").load(None)?;
//! plugin.init(config).await?;
//!
//! let mut request = AccessRequest::new("alice", "select").with_resource("table", "sales_q1");
//! if let Some(result) = plugin.is_access_allowed(&mut request, None) {
//!     println!("allowed: {}", result.is_allowed);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod default_engine;
pub mod engine;
pub mod error;
pub mod plugin;
pub mod refresher;

pub use config::PluginConfig;
pub use default_engine::DefaultPolicyEngine;
pub use engine::{AuditHandler, ContextEnricher, PolicyEngine, ADMIN_ACCESS};
pub use error::{AuditError, PluginError, Result};
pub use plugin::PolicyPlugin;
pub use refresher::{PolicyRefresher, Refresher};
