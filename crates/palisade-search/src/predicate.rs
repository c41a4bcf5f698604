// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Boolean predicates over policy objects, one constructor per filter key.
//!
//! Every constructor returns `None` when its filter value is absent or empty
//! (no constraint), otherwise a predicate capturing the value. Matching rules
//! distinguish three outcomes per variant:
//!
//! - the key applies and the value matches → true
//! - the key applies and the value differs → false
//! - the key does not apply to this variant → true (pass-through; the AND
//!   composition narrows via the keys that do apply)
//!
//! Predicates never perform I/O beyond the captured [`ServiceLookup`] and
//! never mutate their input.

use std::collections::BTreeMap;
use std::sync::Arc;

use palisade_model::PolicyObject;

use crate::filter::parse_bool;
use crate::store::ServiceLookup;
use crate::wildcard::wildcard_match;

/// A boolean capability over a [`PolicyObject`].
pub struct Predicate {
	f: Box<dyn Fn(&PolicyObject) -> bool + Send + Sync>,
}

impl Predicate {
	pub fn new(f: impl Fn(&PolicyObject) -> bool + Send + Sync + 'static) -> Self {
		Self { f: Box::new(f) }
	}

	pub fn evaluate(&self, object: &PolicyObject) -> bool {
		(self.f)(object)
	}

	/// True iff every member predicate is true. An empty list matches
	/// everything. Evaluation short-circuits left to right, which affects
	/// only efficiency, never the outcome.
	pub fn all_of(predicates: Vec<Predicate>) -> Predicate {
		Predicate::new(move |object| predicates.iter().all(|p| p.evaluate(object)))
	}
}

impl std::fmt::Debug for Predicate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("Predicate")
	}
}

pub fn for_service_type(value: &str, lookup: Arc<dyn ServiceLookup>) -> Predicate {
	let want = value.to_string();
	Predicate::new(move |object| match object {
		PolicyObject::Policy(p) => lookup
			.service_by_name(&p.service)
			.map(|s| s.service_type == want)
			.unwrap_or(false),
		PolicyObject::Service(s) => s.service_type == want,
		PolicyObject::ServiceType(t) => t.name == want,
	})
}

pub fn for_service_type_id(value: &str) -> Predicate {
	let want = value.to_string();
	Predicate::new(move |object| match object {
		PolicyObject::ServiceType(t) => match t.base.id {
			Some(id) => id.to_string() == want,
			None => false,
		},
		_ => true,
	})
}

pub fn for_service_name(value: &str) -> Predicate {
	let want = value.to_string();
	Predicate::new(move |object| match object {
		PolicyObject::Policy(p) => p.service == want,
		PolicyObject::Service(s) => s.name == want,
		PolicyObject::ServiceType(_) => true,
	})
}

pub fn for_service_id(value: &str, lookup: Arc<dyn ServiceLookup>) -> Predicate {
	let want = value.to_string();
	Predicate::new(move |object| match object {
		PolicyObject::Policy(p) => lookup
			.service_by_name(&p.service)
			.and_then(|s| s.base.id)
			.map(|id| id.to_string() == want)
			.unwrap_or(false),
		PolicyObject::Service(s) => match s.base.id {
			Some(id) => id.to_string() == want,
			None => false,
		},
		PolicyObject::ServiceType(_) => true,
	})
}

pub fn for_policy_name(value: &str) -> Predicate {
	let want = value.to_string();
	Predicate::new(move |object| match object {
		PolicyObject::Policy(p) => p.name == want,
		_ => true,
	})
}

pub fn for_policy_id(value: &str) -> Predicate {
	let want = value.to_string();
	Predicate::new(move |object| match object {
		PolicyObject::Policy(p) => match p.base.id {
			Some(id) => id.to_string() == want,
			None => false,
		},
		_ => true,
	})
}

pub fn for_is_enabled(value: &str) -> Predicate {
	let want = parse_bool(value);
	Predicate::new(move |object| object.is_enabled() == want)
}

/// A policy matches when at least one resource entry's recursive flag (unset
/// treated as false) equals the requested value. Policies with no resource
/// entries, and non-policy objects, pass through.
pub fn for_is_recursive(value: &str) -> Predicate {
	let want = parse_bool(value);
	Predicate::new(move |object| match object {
		PolicyObject::Policy(p) if !p.resources.is_empty() => p
			.resources
			.values()
			.any(|spec| spec.is_recursive.unwrap_or(false) == want),
		_ => true,
	})
}

pub fn for_user(value: &str) -> Predicate {
	let want = value.to_string();
	Predicate::new(move |object| match object {
		PolicyObject::Policy(p) => p.items.iter().any(|item| item.users.contains(&want)),
		_ => true,
	})
}

pub fn for_group(value: &str) -> Predicate {
	let want = value.to_string();
	Predicate::new(move |object| match object {
		PolicyObject::Policy(p) => p.items.iter().any(|item| item.groups.contains(&want)),
		_ => true,
	})
}

/// The signature predicate constrains only when service name, signature, and
/// enabled state are all supplied; the three comparisons fold into one
/// predicate. Returns `None` when any of the three is missing.
pub fn for_resource_signature(
	service_name: Option<&str>,
	signature: Option<&str>,
	is_enabled: Option<&str>,
) -> Option<Predicate> {
	let (service_name, signature, is_enabled) = match (service_name, signature, is_enabled) {
		(Some(sn), Some(sig), Some(en)) => (sn.to_string(), sig.to_string(), parse_bool(en)),
		_ => return None,
	};

	Some(Predicate::new(move |object| match object {
		PolicyObject::Policy(p) => {
			p.resource_signature.as_deref() == Some(signature.as_str())
				&& p.service == service_name
				&& p.base.is_enabled == is_enabled
		}
		_ => true,
	}))
}

/// Every requested resource name must individually match: the policy has an
/// entry for the name, and the entry's values contain the requested value
/// verbatim or wildcard-match it. A policy with no resource entries does not
/// match; non-policy objects pass through.
pub fn for_resources(requested: BTreeMap<String, String>) -> Option<Predicate> {
	if requested.is_empty() {
		return None;
	}

	Some(Predicate::new(move |object| match object {
		PolicyObject::Policy(p) => {
			if p.resources.is_empty() {
				return false;
			}

			requested.iter().all(|(name, value)| {
				p.resources
					.get(name)
					.filter(|spec| !spec.values.is_empty())
					.map(|spec| {
						spec.values.iter().any(|v| v == value)
							|| spec.values.iter().any(|v| wildcard_match(v, value))
					})
					.unwrap_or(false)
			})
		}
		_ => true,
	}))
}
