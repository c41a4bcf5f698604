// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy object model for the Palisade authorization runtime.
//!
//! This crate provides the shared types for policies, services, and service
//! types, plus the access-check request/result shapes exchanged between an
//! embedding server and the plugin runtime (`palisade-plugin`). It carries no
//! behavior beyond construction helpers and resource-signature hashing; all
//! filtering and decision logic lives in the dependent crates.

pub mod object;
pub mod request;
pub mod signature;

pub use object::{
	ObjectBase, Policy, PolicyItem, PolicyObject, ResourceMatchSpec, Service, ServiceTypeDef,
};
pub use request::{AccessRequest, AccessResult, AdminAction, GrantRevokeRequest, ServicePolicies};
pub use signature::build_resource_signature;
