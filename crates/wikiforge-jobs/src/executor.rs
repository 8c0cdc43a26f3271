// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::{ContextPool, JobContext};
use crate::error::{JobError, Result};
use crate::handle::{job_channel, JobHandle};
use crate::job::Job;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;

/// Runs submitted jobs on tokio tasks, at most `max_concurrent` at a time.
pub struct JobExecutor {
	contexts: Arc<ContextPool>,
	permits: Arc<Semaphore>,
	accepting: AtomicBool,
	tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl JobExecutor {
	pub fn new(max_concurrent: usize) -> Self {
		Self {
			contexts: Arc::new(ContextPool::new()),
			permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
			accepting: AtomicBool::new(true),
			tasks: Mutex::new(Vec::new()),
		}
	}

	pub fn contexts(&self) -> &Arc<ContextPool> {
		&self.contexts
	}

	pub fn is_accepting(&self) -> bool {
		self.accepting.load(Ordering::SeqCst)
	}

	/// Submits `job` and returns immediately with a handle to it.
	///
	/// Fails with [`JobError::Rejected`] once the executor is shut down or when
	/// called outside a tokio runtime.
	#[instrument(skip(self, job), fields(job_type = job.job_type()))]
	pub fn execute<J: Job>(&self, job: J) -> Result<JobHandle<J::Request>> {
		if !self.is_accepting() {
			return Err(JobError::Rejected("executor is shut down".to_string()));
		}
		let runtime = tokio::runtime::Handle::try_current()
			.map_err(|e| JobError::Rejected(format!("no async runtime available: {e}")))?;

		let (reporter, handle) = job_channel(job.job_type(), job.request());
		let job_id = handle.id();
		let contexts = Arc::clone(&self.contexts);
		let permits = Arc::clone(&self.permits);

		reporter.initializing();
		let task = runtime.spawn(async move {
			let _permit = match permits.acquire_owned().await {
				Ok(permit) => permit,
				Err(_) => {
					reporter.failed(&JobError::Rejected("executor closed".to_string()));
					return;
				}
			};

			let execution = contexts.acquire();
			let ctx = JobContext {
				job_id,
				job_type: job.job_type(),
				execution: execution.clone(),
			};

			reporter.running();
			debug!(job_id = %job_id, job_type = ctx.job_type, "Job started");
			let result = AssertUnwindSafe(job.run(&ctx)).catch_unwind().await;
			drop(ctx);
			contexts.release(execution);

			match result {
				Ok(Ok(output)) => {
					info!(job_id = %job_id, job_type = job.job_type(), "Job completed successfully");
					reporter.finished(output);
				}
				Ok(Err(e)) => {
					warn!(job_id = %job_id, job_type = job.job_type(), error = %e, "Job failed");
					reporter.failed(&e);
				}
				Err(payload) => {
					let e = JobError::Panicked(panic_message(payload));
					warn!(job_id = %job_id, job_type = job.job_type(), error = %e, "Job panicked");
					reporter.failed(&e);
				}
			}
		});

		let mut tasks = self.tasks.lock().unwrap_or_else(|p| p.into_inner());
		tasks.retain(|t| !t.is_finished());
		tasks.push(task);

		Ok(handle)
	}

	/// Stops accepting jobs and waits for the ones already submitted.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		self.accepting.store(false, Ordering::SeqCst);

		let tasks: Vec<JoinHandle<()>> = {
			let mut tasks = self.tasks.lock().unwrap_or_else(|p| p.into_inner());
			tasks.drain(..).collect()
		};
		for task in tasks {
			let _ = task.await;
		}

		info!("Job executor shut down");
	}
}

impl Default for JobExecutor {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_CONCURRENT_JOBS)
	}
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		message.to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"unknown panic payload".to_string()
	}
}
