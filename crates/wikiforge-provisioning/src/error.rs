// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use wikiforge_jobs::JobError;

/// Errors that can occur while provisioning wikis.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
	#[error("failed to create wiki [{wiki_id}]: {message}")]
	WikiCreation { wiki_id: String, message: String },

	#[error("wiki [{0}] already exists")]
	WikiExists(String),

	#[error("invalid owner reference '{0}'")]
	InvalidOwner(String),

	#[error("invalid extension id '{value}': {message}")]
	InvalidExtension { value: String, message: String },

	#[error("failed to install {extension} on {namespace}: {message}")]
	Installation {
		extension: String,
		namespace: String,
		message: String,
	},

	#[error("installing {extension} on the root namespace is not allowed")]
	RootModificationDenied { extension: String },

	#[error("platform error: {0}")]
	Platform(#[source] Box<dyn std::error::Error + Send + Sync>),

	#[error(transparent)]
	Job(#[from] JobError),

	#[error("Failed to install every wiki.")]
	Incomplete { unfinished: Vec<String> },

	#[error("Failed to set up wikis: {}", failed.join(", "))]
	Failures { failed: Vec<String> },
}

impl ProvisioningError {
	pub fn platform(error: impl std::error::Error + Send + Sync + 'static) -> Self {
		Self::Platform(Box::new(error))
	}
}

pub type Result<T> = std::result::Result<T, ProvisioningError>;
