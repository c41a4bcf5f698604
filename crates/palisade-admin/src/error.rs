// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdminError>;

#[derive(Error, Debug)]
pub enum AdminError {
	#[error("http error: {0}")]
	Transport(#[from] reqwest::Error),

	#[error("admin service returned {status}: {message}")]
	Api { status: u16, message: String },

	#[error("invalid admin service URL: {0}")]
	InvalidUrl(String),
}
