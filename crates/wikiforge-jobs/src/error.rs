// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum JobError {
	/// The job body returned an error. The cause is kept as-is.
	#[error(transparent)]
	Execution(Box<dyn std::error::Error + Send + Sync>),

	#[error("Job submission rejected: {0}")]
	Rejected(String),

	#[error("Job panicked: {0}")]
	Panicked(String),

	#[error("Job runtime dropped the job before it completed")]
	Abandoned,

	#[error("Timed out waiting for job")]
	Timeout,
}

impl JobError {
	pub fn execution(error: impl std::error::Error + Send + Sync + 'static) -> Self {
		Self::Execution(Box::new(error))
	}
}

pub type Result<T> = std::result::Result<T, JobError>;
