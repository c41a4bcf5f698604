// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stable content hashing for policy resource maps.
//!
//! The signature is a SHA-256 over a canonical rendering of the resource map:
//! entries in key order, values in declaration order, the recursive flag
//! rendered explicitly so `Some(false)` and `None` hash differently. Two
//! policies with equal resource maps always produce equal signatures,
//! regardless of construction order.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::object::ResourceMatchSpec;

/// Field separators chosen outside the value alphabet to keep the canonical
/// form unambiguous.
const UNIT_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

pub fn build_resource_signature(resources: &BTreeMap<String, ResourceMatchSpec>) -> String {
	let mut hasher = Sha256::new();

	for (name, spec) in resources {
		hasher.update(name.as_bytes());
		hasher.update(UNIT_SEP.to_string().as_bytes());

		for value in &spec.values {
			hasher.update(value.as_bytes());
			hasher.update(UNIT_SEP.to_string().as_bytes());
		}

		let recursive = match spec.is_recursive {
			Some(true) => "r=1",
			Some(false) => "r=0",
			None => "r=-",
		};
		hasher.update(recursive.as_bytes());
		hasher.update(RECORD_SEP.to_string().as_bytes());
	}

	hex::encode(hasher.finalize())
}
