// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Service lookup seam and an in-memory policy store.
//!
//! Predicates that filter a `Policy` by service type or service id have to
//! resolve the policy's service name to a [`Service`] first; [`ServiceLookup`]
//! is that seam. [`MemoryPolicyStore`] is the built-in implementation used by
//! embedders that hold their policy collections in memory, and by tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use palisade_model::{Policy, PolicyObject, Service, ServiceTypeDef};

use crate::engine::QueryEngine;
use crate::filter::FilterSpec;

/// Resolves a service by name. A `None` return is not an error; predicates
/// treat it as "no match" for that one constraint.
pub trait ServiceLookup: Send + Sync {
	fn service_by_name(&self, name: &str) -> Option<Service>;
}

#[derive(Default)]
struct StoreInner {
	services: HashMap<String, Service>,
	objects: Vec<PolicyObject>,
}

/// In-memory collection of policy objects with service resolution.
#[derive(Default)]
pub struct MemoryPolicyStore {
	inner: RwLock<StoreInner>,
}

impl MemoryPolicyStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_service(&self, service: Service) {
		let mut inner = self.inner.write().expect("policy store lock poisoned");
		inner.services.insert(service.name.clone(), service.clone());
		inner.objects.push(PolicyObject::Service(service));
	}

	pub fn add_service_type(&self, service_type: ServiceTypeDef) {
		let mut inner = self.inner.write().expect("policy store lock poisoned");
		inner.objects.push(PolicyObject::ServiceType(service_type));
	}

	pub fn add_policy(&self, policy: Policy) {
		let mut inner = self.inner.write().expect("policy store lock poisoned");
		inner.objects.push(PolicyObject::Policy(policy));
	}

	/// Snapshot of every stored object, in insertion order.
	pub fn objects(&self) -> Vec<PolicyObject> {
		let inner = self.inner.read().expect("policy store lock poisoned");
		inner.objects.clone()
	}

	/// Filters and sorts a snapshot of the store by `filter`.
	pub fn search(self: &Arc<Self>, filter: &FilterSpec) -> Vec<PolicyObject> {
		let engine = QueryEngine::new(Arc::clone(self) as Arc<dyn ServiceLookup>);
		let mut objects = self.objects();
		engine.apply(&mut objects, filter);
		objects
	}
}

impl ServiceLookup for MemoryPolicyStore {
	fn service_by_name(&self, name: &str) -> Option<Service> {
		let inner = self.inner.read().expect("policy store lock poisoned");
		inner.services.get(name).cloned()
	}
}
