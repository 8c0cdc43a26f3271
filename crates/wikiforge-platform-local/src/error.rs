// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use thiserror::Error;
use wikiforge_provisioning::ProvisioningError;

#[derive(Debug, Error)]
pub enum PlatformError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("serialization error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("wiki [{0}] already exists")]
	WikiExists(String),

	#[error("invalid wiki id '{0}': must be a single path segment")]
	InvalidWikiId(String),

	#[error("data directory {} is in use by another run", path.display())]
	Locked { path: PathBuf },
}

impl From<PlatformError> for ProvisioningError {
	fn from(error: PlatformError) -> Self {
		match error {
			PlatformError::WikiExists(id) => ProvisioningError::WikiExists(id),
			other => ProvisioningError::platform(other),
		}
	}
}

pub type Result<T> = std::result::Result<T, PlatformError>;
