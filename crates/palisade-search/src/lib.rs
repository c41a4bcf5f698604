// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Search, filter, and ordering over Palisade policy objects.
//!
//! The building blocks layer bottom-up:
//!
//! 1. [`Predicate`] — a boolean capability over a [`PolicyObject`], composed
//!    with AND via [`Predicate::all_of`].
//! 2. [`sort::comparator_for`] — named orderings selected by a sort key.
//! 3. [`QueryEngine`] — turns a [`FilterSpec`] into a composed predicate plus
//!    an optional comparator and applies both to a collection
//!    (filter, then stable sort).
//!
//! Predicates are deliberately permissive on variant mismatch: a filter key
//! that does not apply to an object's variant passes the object through, and
//! the AND composition narrows from there. Lookup misses (a policy naming a
//! service the store does not know) count as "no match" for that one
//! predicate and are never errors.

pub mod engine;
pub mod filter;
pub mod predicate;
pub mod sort;
pub mod store;
pub mod wildcard;

pub use engine::QueryEngine;
pub use filter::FilterSpec;
pub use predicate::Predicate;
pub use sort::Comparator;
pub use store::{MemoryPolicyStore, ServiceLookup};
pub use wildcard::wildcard_match;

pub use palisade_model::PolicyObject;
