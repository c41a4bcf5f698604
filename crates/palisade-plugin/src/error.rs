// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PluginError>;

#[derive(Error, Debug)]
pub enum PluginError {
	/// Grant/revoke was attempted before the plugin was initialized or after
	/// it was cleaned up, so no admin client exists to deliver it.
	#[error("admin client is not available; plugin is not initialized")]
	AdminUnavailable,

	/// Admin-service failures pass through unchanged so callers see the
	/// underlying transport or API error.
	#[error(transparent)]
	Admin(#[from] palisade_admin::AdminError),

	#[error("configuration error: {0}")]
	Config(String),

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to parse configuration: {0}")]
	ConfigParse(#[from] toml::de::Error),
}

/// Failure reported by an audit sink. The plugin logs these and keeps going;
/// an audit failure never changes an access decision or masks an admin error.
#[derive(Error, Debug)]
pub enum AuditError {
	#[error("audit sink rejected record: {0}")]
	Sink(String),
}
