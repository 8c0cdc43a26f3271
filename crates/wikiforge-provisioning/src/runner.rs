// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::job::{ProvisioningJob, WIKI_SETUP_JOB_TYPE};
use crate::request::ProvisioningRequest;
use crate::services::PlatformServices;
use std::sync::Arc;
use tracing::debug;
use wikiforge_jobs::{JobError, JobExecutor, JobHandle};

/// Work the orchestrator can submit.
#[derive(Debug, Clone)]
pub enum JobKind {
	WikiSetup(ProvisioningRequest),
}

impl JobKind {
	pub fn job_type(&self) -> &'static str {
		match self {
			JobKind::WikiSetup(_) => WIKI_SETUP_JOB_TYPE,
		}
	}
}

pub trait JobRunner: Send + Sync {
	/// Hands the job to the runtime without waiting for it.
	fn submit(&self, kind: JobKind) -> Result<JobHandle<ProvisioningRequest>, JobError>;
}

/// Runs jobs on a [`JobExecutor`] against a set of platform services.
pub struct ExecutorJobRunner {
	executor: Arc<JobExecutor>,
	services: PlatformServices,
	root_wiki_id: String,
}

impl ExecutorJobRunner {
	pub fn new(
		executor: Arc<JobExecutor>,
		services: PlatformServices,
		root_wiki_id: impl Into<String>,
	) -> Self {
		Self {
			executor,
			services,
			root_wiki_id: root_wiki_id.into(),
		}
	}

	pub fn executor(&self) -> &Arc<JobExecutor> {
		&self.executor
	}
}

impl JobRunner for ExecutorJobRunner {
	fn submit(&self, kind: JobKind) -> Result<JobHandle<ProvisioningRequest>, JobError> {
		debug!(job_type = kind.job_type(), "Submitting job");
		match kind {
			JobKind::WikiSetup(request) => self.executor.execute(ProvisioningJob::new(
				request,
				self.services.clone(),
				self.root_wiki_id.clone(),
			)),
		}
	}
}
