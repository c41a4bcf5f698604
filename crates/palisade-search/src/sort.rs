// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Named orderings over policy objects, selected by sort key.
//!
//! Absent values (missing id, timestamp, or a field the variant does not
//! carry) order before any present value, consistently across the registry —
//! this falls out of `Option`'s ordering, where `None < Some(_)`.

use std::cmp::Ordering;

use palisade_model::PolicyObject;

use crate::filter::keys;

/// A total ordering over two policy objects.
pub type Comparator = fn(&PolicyObject, &PolicyObject) -> Ordering;

/// Resolves a sort key to its comparator. Unknown keys resolve to `None`,
/// which callers treat as "no sort" rather than an error.
pub fn comparator_for(sort_by: &str) -> Option<Comparator> {
	match sort_by {
		keys::SERVICE_TYPE => Some(by_service_type_name),
		keys::SERVICE_TYPE_ID => Some(by_id),
		keys::SERVICE_NAME => Some(by_service_name),
		keys::POLICY_NAME => Some(by_policy_name),
		keys::POLICY_ID => Some(by_id),
		keys::CREATE_TIME => Some(by_created_at),
		keys::UPDATE_TIME => Some(by_updated_at),
		_ => None,
	}
}

fn by_id(a: &PolicyObject, b: &PolicyObject) -> Ordering {
	a.id().cmp(&b.id())
}

fn by_created_at(a: &PolicyObject, b: &PolicyObject) -> Ordering {
	a.created_at().cmp(&b.created_at())
}

fn by_updated_at(a: &PolicyObject, b: &PolicyObject) -> Ordering {
	a.updated_at().cmp(&b.updated_at())
}

fn service_type_name(object: &PolicyObject) -> Option<&str> {
	match object {
		PolicyObject::ServiceType(t) => Some(&t.name),
		PolicyObject::Service(s) => Some(&s.service_type),
		PolicyObject::Policy(_) => None,
	}
}

fn by_service_type_name(a: &PolicyObject, b: &PolicyObject) -> Ordering {
	service_type_name(a).cmp(&service_type_name(b))
}

fn service_name(object: &PolicyObject) -> Option<&str> {
	match object {
		PolicyObject::Policy(p) => Some(&p.service),
		PolicyObject::Service(s) => Some(&s.service_type),
		PolicyObject::ServiceType(_) => None,
	}
}

fn by_service_name(a: &PolicyObject, b: &PolicyObject) -> Ordering {
	service_name(a).cmp(&service_name(b))
}

fn policy_name(object: &PolicyObject) -> Option<&str> {
	match object {
		PolicyObject::Policy(p) => Some(&p.name),
		_ => None,
	}
}

fn by_policy_name(a: &PolicyObject, b: &PolicyObject) -> Ordering {
	policy_name(a).cmp(&policy_name(b))
}
