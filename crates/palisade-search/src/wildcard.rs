// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shell-style wildcard matching for resource values.
//!
//! `*` matches any run of characters, `?` matches exactly one character,
//! everything else is literal. Patterns are anchored to the full value.

use regex::Regex;
use tracing::warn;

/// Returns true if `value` matches the wildcard `pattern`.
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
	if !pattern.contains(['*', '?']) {
		return pattern == value;
	}

	let mut regex_pattern = String::with_capacity(pattern.len() + 8);
	regex_pattern.push('^');
	for ch in pattern.chars() {
		match ch {
			'*' => regex_pattern.push_str(".*"),
			'?' => regex_pattern.push('.'),
			other => regex_pattern.push_str(&regex::escape(&other.to_string())),
		}
	}
	regex_pattern.push('$');

	match Regex::new(&regex_pattern) {
		Ok(re) => re.is_match(value),
		Err(e) => {
			// Escaping makes this unreachable; degrade to no-match if it ever
			// happens rather than failing the whole filter pass.
			warn!(pattern, error = %e, "wildcard pattern failed to compile");
			false
		}
	}
}
