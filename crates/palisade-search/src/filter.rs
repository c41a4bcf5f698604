// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Filter specification: an ordered key/value map with well-known keys.

use std::collections::BTreeMap;

/// Well-known filter keys. The `resource.` prefix is an open-ended family:
/// `resource.<name>=<value>` constrains the policy's resource map entry for
/// `<name>`.
pub mod keys {
	pub const SERVICE_TYPE: &str = "serviceType";
	pub const SERVICE_TYPE_ID: &str = "serviceTypeId";
	pub const SERVICE_NAME: &str = "serviceName";
	pub const SERVICE_ID: &str = "serviceId";
	pub const POLICY_NAME: &str = "policyName";
	pub const POLICY_ID: &str = "policyId";
	pub const IS_ENABLED: &str = "isEnabled";
	pub const IS_RECURSIVE: &str = "isRecursive";
	pub const USER: &str = "user";
	pub const GROUP: &str = "group";
	pub const RESOURCE_SIGNATURE: &str = "resourceSignature";
	pub const SORT_BY: &str = "sortBy";
	pub const CREATE_TIME: &str = "createTime";
	pub const UPDATE_TIME: &str = "updateTime";
	pub const RESOURCE_PREFIX: &str = "resource.";
}

/// An ordered mapping from filter key to value. Empty means "match
/// everything." Constructed per query, discarded after use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
	params: BTreeMap<String, String>,
}

impl FilterSpec {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.params.is_empty()
	}

	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.params.insert(key.into(), value.into());
	}

	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.set(key, value);
		self
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.params.get(key).map(String::as_str)
	}

	/// All entries whose key starts with `prefix`, with the prefix stripped
	/// from the returned keys. Entries with an empty remainder are dropped.
	pub fn params_with_prefix(&self, prefix: &str) -> BTreeMap<String, String> {
		self.params
			.iter()
			.filter_map(|(k, v)| {
				let stripped = k.strip_prefix(prefix)?;
				if stripped.is_empty() {
					None
				} else {
					Some((stripped.to_string(), v.clone()))
				}
			})
			.collect()
	}
}

/// Boolean filter-value parsing: case-insensitive `"true"` or `"1"` is true,
/// anything else is false.
pub(crate) fn parse_bool(value: &str) -> bool {
	value.eq_ignore_ascii_case("true") || value == "1"
}

/// Treats absent and empty values alike: an empty filter value places no
/// constraint.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
	value.filter(|v| !v.is_empty())
}
