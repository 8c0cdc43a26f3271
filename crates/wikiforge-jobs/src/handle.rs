// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::{JobError, Result};
use crate::types::{JobOutput, JobState, JobStatus};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

/// Creates the two ends of a job: the reporter driven by whoever runs the job
/// and the handle given to whoever submitted it.
pub fn job_channel<R>(job_type: &'static str, request: Arc<R>) -> (JobReporter, JobHandle<R>) {
	let (tx, rx) = watch::channel(JobStatus::new());
	let id = Uuid::new_v4();
	(
		JobReporter { tx },
		JobHandle {
			id,
			job_type,
			request,
			status: rx,
		},
	)
}

pub struct JobReporter {
	tx: watch::Sender<JobStatus>,
}

impl JobReporter {
	pub fn initializing(&self) {
		self.tx.send_modify(|status| status.state = JobState::Initializing);
	}

	pub fn running(&self) {
		self.tx.send_modify(|status| {
			status.state = JobState::Running;
			status.started_at = Some(Utc::now());
		});
	}

	pub fn finished(&self, output: JobOutput) {
		self.tx.send_modify(|status| {
			status.state = JobState::Finished;
			status.completed_at = Some(Utc::now());
			status.output = Some(output);
		});
	}

	pub fn failed(&self, error: &JobError) {
		let message = error.to_string();
		self.tx.send_modify(|status| {
			status.state = JobState::Failed;
			status.completed_at = Some(Utc::now());
			status.error = Some(message);
		});
	}

	pub fn state(&self) -> JobState {
		self.tx.borrow().state
	}
}

/// Submitter-side view of a job.
///
/// Handles are cheap to clone and any number of them may wait on the same job.
pub struct JobHandle<R> {
	id: Uuid,
	job_type: &'static str,
	request: Arc<R>,
	status: watch::Receiver<JobStatus>,
}

impl<R> Clone for JobHandle<R> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			job_type: self.job_type,
			request: Arc::clone(&self.request),
			status: self.status.clone(),
		}
	}
}

impl<R> JobHandle<R> {
	pub fn id(&self) -> Uuid {
		self.id
	}

	pub fn job_type(&self) -> &'static str {
		self.job_type
	}

	pub fn request(&self) -> &R {
		&self.request
	}

	pub fn state(&self) -> JobState {
		self.status.borrow().state
	}

	pub fn status(&self) -> JobStatus {
		self.status.borrow().clone()
	}

	/// Waits until the job reaches a terminal state or `deadline` passes.
	///
	/// `None` waits without bound. A job whose reporter is dropped before it
	/// reaches a terminal state is reported as failed.
	pub async fn wait(&self, deadline: Option<Instant>) -> Result<JobStatus> {
		let terminal = wait_terminal(self.status.clone());
		match deadline {
			None => Ok(terminal.await),
			Some(deadline) => tokio::time::timeout_at(deadline, terminal)
				.await
				.map_err(|_| JobError::Timeout),
		}
	}

	/// `wait(None)`.
	pub async fn join(&self) -> Result<JobStatus> {
		self.wait(None).await
	}
}

impl<R> std::fmt::Debug for JobHandle<R> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("JobHandle")
			.field("id", &self.id)
			.field("job_type", &self.job_type)
			.field("state", &self.state())
			.finish()
	}
}

async fn wait_terminal(mut rx: watch::Receiver<JobStatus>) -> JobStatus {
	let observed = rx
		.wait_for(|status| status.state.is_terminal())
		.await
		.map(|status| JobStatus::clone(&status));

	match observed {
		Ok(status) => status,
		Err(_) => {
			let mut status = rx.borrow().clone();
			status.state = JobState::Failed;
			status.completed_at = Some(Utc::now());
			status.error = Some(JobError::Abandoned.to_string());
			status
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[tokio::test]
	async fn test_handle_tracks_reported_states() {
		let (reporter, handle) = job_channel("test", Arc::new("payload".to_string()));
		assert_eq!(handle.state(), JobState::None);

		reporter.initializing();
		assert_eq!(handle.state(), JobState::Initializing);

		reporter.running();
		assert_eq!(handle.state(), JobState::Running);
		assert!(handle.status().started_at.is_some());

		reporter.finished(JobOutput {
			message: "done".to_string(),
			metadata: None,
		});
		let status = handle.join().await.unwrap();
		assert_eq!(status.state, JobState::Finished);
		assert_eq!(status.output.unwrap().message, "done");
		assert_eq!(handle.request(), "payload");
	}

	#[tokio::test]
	async fn test_failed_state_carries_error_message() {
		let (reporter, handle) = job_channel("test", Arc::new(()));
		reporter.failed(&JobError::Rejected("queue full".to_string()));

		let status = handle.join().await.unwrap();
		assert_eq!(status.state, JobState::Failed);
		assert_eq!(
			status.error.as_deref(),
			Some("Job submission rejected: queue full")
		);
	}

	#[tokio::test]
	async fn test_dropped_reporter_is_reported_as_failure() {
		let (reporter, handle) = job_channel("test", Arc::new(()));
		reporter.running();
		drop(reporter);

		let status = handle.join().await.unwrap();
		assert_eq!(status.state, JobState::Failed);
		assert!(status.error.unwrap().contains("dropped"));
	}

	#[tokio::test(start_paused = true)]
	async fn test_wait_with_deadline_times_out() {
		let (reporter, handle) = job_channel("test", Arc::new(()));
		reporter.running();

		let result = handle
			.wait(Some(Instant::now() + Duration::from_secs(5)))
			.await;

		assert!(matches!(result, Err(JobError::Timeout)));
		assert_eq!(handle.state(), JobState::Running);
		drop(reporter);
	}

	#[tokio::test(start_paused = true)]
	async fn test_wait_with_deadline_returns_status_of_finished_job() {
		let (reporter, handle) = job_channel("test", Arc::new(()));
		reporter.running();

		let finisher = async {
			tokio::time::sleep(Duration::from_secs(1)).await;
			reporter.finished(JobOutput {
				message: "done".to_string(),
				metadata: None,
			});
		};
		let (result, _) = tokio::join!(
			handle.wait(Some(Instant::now() + Duration::from_secs(5))),
			finisher
		);

		assert_eq!(result.unwrap().state, JobState::Finished);
	}

	#[tokio::test]
	async fn test_clones_observe_the_same_job() {
		let (reporter, handle) = job_channel("test", Arc::new(1u32));
		let other = handle.clone();
		assert_eq!(other.id(), handle.id());

		reporter.finished(JobOutput {
			message: String::new(),
			metadata: None,
		});

		assert_eq!(handle.join().await.unwrap().state, JobState::Finished);
		assert_eq!(other.join().await.unwrap().state, JobState::Finished);
	}
}
