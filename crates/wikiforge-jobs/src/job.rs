// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::JobContext;
use crate::error::JobError;
use crate::types::JobOutput;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Job: Send + Sync + 'static {
	/// Payload the job was submitted with, handed back through its handle.
	type Request: Send + Sync + 'static;

	fn job_type(&self) -> &'static str;
	fn request(&self) -> Arc<Self::Request>;
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError>;
}
