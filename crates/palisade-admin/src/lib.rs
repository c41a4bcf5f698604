// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client for the central policy-administration service.
//!
//! The plugin runtime talks to the admin service through the [`AdminClient`]
//! trait: grant/revoke administrative actions plus the poll primitive the
//! policy refresher drives. [`RestAdminClient`] is the built-in HTTP
//! implementation; [`AdminClientRegistry`] maps a configured source name to a
//! constructor and falls back to the REST client when the name is unset or
//! unknown — a misconfigured source is logged, never fatal.

pub mod client;
pub mod error;
pub mod registry;

pub use client::{AdminClient, AdminClientConfig, RestAdminClient};
pub use error::{AdminError, Result};
pub use registry::AdminClientRegistry;
