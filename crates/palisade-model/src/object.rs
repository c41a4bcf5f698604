// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy, service, and service-type objects.
//!
//! All three variants share the [`ObjectBase`] fields (id, timestamps,
//! enablement). [`PolicyObject`] is the tagged union the search crate filters
//! and sorts over; variant-specific accessors degrade to `None` rather than
//! panicking so callers can treat a mixed collection uniformly.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signature::build_resource_signature;

/// Fields common to every policy-model object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectBase {
	pub id: Option<i64>,
	pub created_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
	pub is_enabled: bool,
}

/// A set of literal-or-wildcard resource values with an optional recursive
/// flag. `is_recursive: None` means "not specified"; filtering treats it as
/// `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceMatchSpec {
	pub values: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub is_recursive: Option<bool>,
}

impl ResourceMatchSpec {
	pub fn new(values: Vec<String>) -> Self {
		Self {
			values,
			is_recursive: None,
		}
	}

	pub fn with_recursive(mut self, is_recursive: bool) -> Self {
		self.is_recursive = Some(is_recursive);
		self
	}
}

/// One grant line inside a policy: which users/groups get which accesses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyItem {
	pub users: BTreeSet<String>,
	pub groups: BTreeSet<String>,
	pub accesses: Vec<String>,
}

/// A named rule set binding resource patterns to allowed users, groups, and
/// access types for one service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
	#[serde(flatten)]
	pub base: ObjectBase,
	/// Name of the service this policy belongs to.
	pub service: String,
	pub name: String,
	/// Resource-type name to match spec, ordered for deterministic iteration.
	pub resources: BTreeMap<String, ResourceMatchSpec>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub resource_signature: Option<String>,
	pub items: Vec<PolicyItem>,
}

impl Policy {
	/// Computes and stores the stable content hash of the resource map.
	pub fn refresh_resource_signature(&mut self) {
		self.resource_signature = Some(build_resource_signature(&self.resources));
	}
}

/// A named, typed instance of a protected resource (e.g. one storage cluster).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
	#[serde(flatten)]
	pub base: ObjectBase,
	pub name: String,
	/// Name of the [`ServiceTypeDef`] this service is an instance of.
	pub service_type: String,
}

/// The schema describing what a class of services supports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceTypeDef {
	#[serde(flatten)]
	pub base: ObjectBase,
	pub name: String,
}

/// Tagged union over the three policy-model variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PolicyObject {
	Policy(Policy),
	Service(Service),
	ServiceType(ServiceTypeDef),
}

impl PolicyObject {
	pub fn base(&self) -> &ObjectBase {
		match self {
			PolicyObject::Policy(p) => &p.base,
			PolicyObject::Service(s) => &s.base,
			PolicyObject::ServiceType(t) => &t.base,
		}
	}

	pub fn id(&self) -> Option<i64> {
		self.base().id
	}

	pub fn is_enabled(&self) -> bool {
		self.base().is_enabled
	}

	pub fn created_at(&self) -> Option<DateTime<Utc>> {
		self.base().created_at
	}

	pub fn updated_at(&self) -> Option<DateTime<Utc>> {
		self.base().updated_at
	}

	pub fn as_policy(&self) -> Option<&Policy> {
		match self {
			PolicyObject::Policy(p) => Some(p),
			_ => None,
		}
	}

	pub fn as_service(&self) -> Option<&Service> {
		match self {
			PolicyObject::Service(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_service_type(&self) -> Option<&ServiceTypeDef> {
		match self {
			PolicyObject::ServiceType(t) => Some(t),
			_ => None,
		}
	}
}

impl From<Policy> for PolicyObject {
	fn from(value: Policy) -> Self {
		PolicyObject::Policy(value)
	}
}

impl From<Service> for PolicyObject {
	fn from(value: Service) -> Self {
		PolicyObject::Service(value)
	}
}

impl From<ServiceTypeDef> for PolicyObject {
	fn from(value: ServiceTypeDef) -> Self {
		PolicyObject::ServiceType(value)
	}
}
