// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access-check and administrative request/result shapes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::object::{Policy, ServiceTypeDef};

/// One access check: who wants to do what to which resource.
///
/// `context` is the mutable accumulator context enrichers write into before
/// the decision runs; later enrichers may read what earlier ones wrote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessRequest {
	/// Resource-type name to concrete value, e.g. `{"table": "sales_q1"}`.
	pub resource: BTreeMap<String, String>,
	pub user: String,
	pub user_groups: BTreeSet<String>,
	pub access_type: String,
	/// Caller-facing operation label, e.g. `"select"` or `"grant"`.
	pub action: String,
	pub context: BTreeMap<String, serde_json::Value>,
}

impl AccessRequest {
	pub fn new(user: impl Into<String>, access_type: impl Into<String>) -> Self {
		Self {
			user: user.into(),
			access_type: access_type.into(),
			..Default::default()
		}
	}

	pub fn with_resource(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.resource.insert(name.into(), value.into());
		self
	}

	pub fn with_group(mut self, group: impl Into<String>) -> Self {
		self.user_groups.insert(group.into());
		self
	}

	pub fn with_action(mut self, action: impl Into<String>) -> Self {
		self.action = action.into();
		self
	}
}

/// Outcome of an access check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessResult {
	pub is_allowed: bool,
	/// Whether the policy engine flagged this decision for audit.
	pub is_audited: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub policy_id: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
}

/// Administrative action kind for grant/revoke calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminAction {
	Grant,
	Revoke,
}

impl AdminAction {
	pub fn as_str(&self) -> &'static str {
		match self {
			AdminAction::Grant => "grant",
			AdminAction::Revoke => "revoke",
		}
	}
}

/// A request to grant or revoke access, submitted to the admin service on
/// behalf of `grantor`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrantRevokeRequest {
	pub grantor: String,
	pub resource: BTreeMap<String, String>,
	pub users: BTreeSet<String>,
	pub groups: BTreeSet<String>,
	pub access_types: BTreeSet<String>,
}

/// The full policy set for one service, as delivered by a policy refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePolicies {
	pub service_name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub service_def: Option<ServiceTypeDef>,
	/// Monotonically increasing version assigned by the admin service.
	pub version: i64,
	pub policies: Vec<Policy>,
}
