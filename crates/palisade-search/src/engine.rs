// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The query engine: filter-spec in, filtered and ordered collection out.

use std::sync::Arc;

use palisade_model::PolicyObject;

use crate::filter::{keys, non_empty, FilterSpec};
use crate::predicate::{
	for_group, for_is_enabled, for_is_recursive, for_policy_id, for_policy_name, for_resource_signature,
	for_resources, for_service_id, for_service_name, for_service_type, for_service_type_id, for_user,
	Predicate,
};
use crate::sort::{comparator_for, Comparator};
use crate::store::ServiceLookup;

/// Builds predicates and comparators from filter specifications and applies
/// them to policy-object collections. Stateless between calls; the only
/// captured collaborator is the service lookup used for indirect predicates.
pub struct QueryEngine {
	lookup: Arc<dyn ServiceLookup>,
}

impl QueryEngine {
	pub fn new(lookup: Arc<dyn ServiceLookup>) -> Self {
		Self { lookup }
	}

	/// Composes every applicable per-key predicate with AND. Returns `None`
	/// when the filter is empty or no recognized key carries a value.
	pub fn build_predicate(&self, filter: &FilterSpec) -> Option<Predicate> {
		if filter.is_empty() {
			return None;
		}

		let mut predicates = Vec::new();

		if let Some(v) = non_empty(filter.get(keys::SERVICE_TYPE)) {
			predicates.push(for_service_type(v, Arc::clone(&self.lookup)));
		}
		if let Some(v) = non_empty(filter.get(keys::SERVICE_TYPE_ID)) {
			predicates.push(for_service_type_id(v));
		}
		if let Some(v) = non_empty(filter.get(keys::SERVICE_NAME)) {
			predicates.push(for_service_name(v));
		}
		if let Some(v) = non_empty(filter.get(keys::SERVICE_ID)) {
			predicates.push(for_service_id(v, Arc::clone(&self.lookup)));
		}
		if let Some(v) = non_empty(filter.get(keys::POLICY_NAME)) {
			predicates.push(for_policy_name(v));
		}
		if let Some(v) = non_empty(filter.get(keys::POLICY_ID)) {
			predicates.push(for_policy_id(v));
		}
		if let Some(v) = non_empty(filter.get(keys::IS_ENABLED)) {
			predicates.push(for_is_enabled(v));
		}
		if let Some(v) = non_empty(filter.get(keys::IS_RECURSIVE)) {
			predicates.push(for_is_recursive(v));
		}
		if let Some(v) = non_empty(filter.get(keys::USER)) {
			predicates.push(for_user(v));
		}
		if let Some(v) = non_empty(filter.get(keys::GROUP)) {
			predicates.push(for_group(v));
		}
		if let Some(p) = for_resource_signature(
			non_empty(filter.get(keys::SERVICE_NAME)),
			non_empty(filter.get(keys::RESOURCE_SIGNATURE)),
			non_empty(filter.get(keys::IS_ENABLED)),
		) {
			predicates.push(p);
		}
		if let Some(p) = for_resources(filter.params_with_prefix(keys::RESOURCE_PREFIX)) {
			predicates.push(p);
		}

		if predicates.is_empty() {
			None
		} else {
			Some(Predicate::all_of(predicates))
		}
	}

	/// Resolves the `sortBy` key, if any, to a comparator.
	pub fn build_comparator(&self, filter: &FilterSpec) -> Option<Comparator> {
		non_empty(filter.get(keys::SORT_BY)).and_then(comparator_for)
	}

	/// Filters in place (stable relative order of survivors) and then, if a
	/// comparator resolved, stable-sorts. No-op on an empty collection. For
	/// equal filters and equal input order, the output order is identical.
	pub fn apply(&self, objects: &mut Vec<PolicyObject>, filter: &FilterSpec) {
		if objects.is_empty() {
			return;
		}

		if let Some(predicate) = self.build_predicate(filter) {
			objects.retain(|object| predicate.evaluate(object));
		}

		if let Some(comparator) = self.build_comparator(filter) {
			objects.sort_by(comparator);
		}
	}
}
