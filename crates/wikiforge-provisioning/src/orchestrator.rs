// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Drives the setup jobs of every wiki in a run.
//!
//! The root wiki is submitted and awaited before any other wiki, wherever it
//! appears in the list. The remaining wikis follow in list order. With
//! `parallel` off each one is awaited before the next is submitted. Otherwise
//! they run concurrently and are polled every `poll_interval` until all of
//! them reach a terminal state or the deadline of
//! `poll_interval * deadline_polls` passes. Jobs still running at the deadline
//! are left running; the run only stops waiting for them.

use crate::error::{ProvisioningError, Result};
use crate::request::ProvisioningRequest;
use crate::runner::{JobKind, JobRunner};
use crate::services::ListenerRegistry;
use crate::wiki::{WikiDescriptor, ROOT_WIKI_ID};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};
use wikiforge_jobs::{JobHandle, JobState, JobStatus};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_DEADLINE_POLLS: u32 = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
	pub parallel: bool,
	/// Also fail the run when a wiki failed or was rejected.
	pub strict: bool,
	pub poll_interval: Duration,
	pub deadline_polls: u32,
	pub root_wiki_id: String,
}

impl OrchestratorSettings {
	/// Saturates at `Duration::MAX`.
	pub fn total_wait(&self) -> Duration {
		self.poll_interval
			.checked_mul(self.deadline_polls)
			.unwrap_or(Duration::MAX)
	}
}

impl Default for OrchestratorSettings {
	fn default() -> Self {
		Self {
			parallel: false,
			strict: false,
			poll_interval: DEFAULT_POLL_INTERVAL,
			deadline_polls: DEFAULT_DEADLINE_POLLS,
			root_wiki_id: ROOT_WIKI_ID.to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WikiOutcome {
	Completed,
	Failed { error: String },
	/// The runtime refused the job; it never ran.
	Rejected { error: String },
	/// Still running when the run stopped waiting.
	Unfinished,
}

#[derive(Debug, Clone, Serialize)]
pub struct WikiReport {
	pub wiki_id: String,
	#[serde(flatten)]
	pub outcome: WikiOutcome,
	pub duration_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProvisioningReport {
	pub wikis: Vec<WikiReport>,
	pub elapsed_ms: u64,
	pub interrupted: bool,
}

impl ProvisioningReport {
	fn record(&mut self, wiki_id: &str, outcome: WikiOutcome, duration_ms: Option<i64>) {
		self.wikis.push(WikiReport {
			wiki_id: wiki_id.to_string(),
			outcome,
			duration_ms,
		});
	}

	fn ids_where(&self, predicate: impl Fn(&WikiOutcome) -> bool) -> Vec<String> {
		self.wikis
			.iter()
			.filter(|w| predicate(&w.outcome))
			.map(|w| w.wiki_id.clone())
			.collect()
	}

	pub fn completed(&self) -> Vec<String> {
		self.ids_where(|o| *o == WikiOutcome::Completed)
	}

	/// Wikis whose job failed or was never accepted.
	pub fn failed(&self) -> Vec<String> {
		self.ids_where(|o| matches!(o, WikiOutcome::Failed { .. } | WikiOutcome::Rejected { .. }))
	}

	pub fn unfinished(&self) -> Vec<String> {
		self.ids_where(|o| *o == WikiOutcome::Unfinished)
	}

	pub fn outcome(&self, wiki_id: &str) -> Option<&WikiOutcome> {
		self.wikis
			.iter()
			.find(|w| w.wiki_id == wiki_id)
			.map(|w| &w.outcome)
	}
}

pub struct Orchestrator {
	runner: Arc<dyn JobRunner>,
	listeners: Arc<dyn ListenerRegistry>,
	settings: OrchestratorSettings,
}

impl Orchestrator {
	pub fn new(
		runner: Arc<dyn JobRunner>,
		listeners: Arc<dyn ListenerRegistry>,
		settings: OrchestratorSettings,
	) -> Self {
		Self {
			runner,
			listeners,
			settings,
		}
	}

	pub async fn run(&self, wikis: &[WikiDescriptor]) -> Result<ProvisioningReport> {
		self.run_until(wikis, std::future::pending()).await
	}

	/// Like [`Orchestrator::run`], but stops waiting for concurrent jobs as
	/// soon as `interrupt` completes.
	#[instrument(skip_all, fields(wiki_count = wikis.len(), parallel = self.settings.parallel))]
	pub async fn run_until<F>(&self, wikis: &[WikiDescriptor], interrupt: F) -> Result<ProvisioningReport>
	where
		F: Future<Output = ()>,
	{
		let started = Instant::now();
		let mut report = ProvisioningReport::default();

		match self.listeners.suppress_script_listeners() {
			Ok(removed) => info!(removed, "Suppressed script listeners"),
			Err(e) => warn!(error = %e, "Failed to suppress script listeners"),
		}

		let mut outstanding = self.start_wiki_setup_jobs(wikis, &mut report).await;

		if !outstanding.is_empty() {
			report.interrupted = self
				.wait_for_outstanding(&mut outstanding, &mut report, interrupt)
				.await;
		}

		for handle in &outstanding {
			error!(wiki_id = %handle.request().wiki_id(), "Job for wiki did not finish in time");
			report.record(handle.request().wiki_id(), WikiOutcome::Unfinished, None);
		}

		report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
		self.verdict(report)
	}

	async fn start_wiki_setup_jobs(
		&self,
		wikis: &[WikiDescriptor],
		report: &mut ProvisioningReport,
	) -> Vec<JobHandle<ProvisioningRequest>> {
		let mut outstanding = Vec::new();
		let (roots, others): (Vec<_>, Vec<_>) = wikis
			.iter()
			.partition(|wiki| wiki.is_root(&self.settings.root_wiki_id));

		for wiki in roots {
			if let Some(handle) = self.submit(wiki, report) {
				self.join_inline(&handle, report).await;
			}
		}

		for wiki in others {
			let Some(handle) = self.submit(wiki, report) else {
				continue;
			};
			if self.settings.parallel {
				info!(wiki_id = %wiki.id, job_id = %handle.id(), "Started wiki setup job");
				outstanding.push(handle);
			} else {
				self.join_inline(&handle, report).await;
			}
		}

		outstanding
	}

	fn submit(
		&self,
		wiki: &WikiDescriptor,
		report: &mut ProvisioningReport,
	) -> Option<JobHandle<ProvisioningRequest>> {
		match self
			.runner
			.submit(JobKind::WikiSetup(ProvisioningRequest::new(wiki.clone())))
		{
			Ok(handle) => Some(handle),
			Err(e) => {
				error!(wiki_id = %wiki.id, error = %e, "Failed to set up wiki");
				report.record(&wiki.id, WikiOutcome::Rejected { error: e.to_string() }, None);
				None
			}
		}
	}

	async fn join_inline(&self, handle: &JobHandle<ProvisioningRequest>, report: &mut ProvisioningReport) {
		let wiki_id = handle.request().wiki_id();
		match handle.wait(None).await {
			Ok(status) => record_terminal(report, wiki_id, status),
			Err(e) => {
				error!(wiki_id, error = %e, "Failed to set up wiki");
				report.record(wiki_id, WikiOutcome::Failed { error: e.to_string() }, None);
			}
		}
	}

	/// Polls until `outstanding` is drained or the deadline passes. Returns
	/// whether the wait was interrupted.
	async fn wait_for_outstanding<F>(
		&self,
		outstanding: &mut Vec<JobHandle<ProvisioningRequest>>,
		report: &mut ProvisioningReport,
		interrupt: F,
	) -> bool
	where
		F: Future<Output = ()>,
	{
		// No deadline when it lies beyond what the clock can represent.
		let deadline = Instant::now().checked_add(self.settings.total_wait());
		tokio::pin!(interrupt);

		loop {
			info!(outstanding = outstanding.len(), "Waiting for jobs to finish ...");

			tokio::select! {
				_ = tokio::time::sleep(self.settings.poll_interval) => {}
				_ = &mut interrupt => {
					error!("Got interrupted while waiting for the completion of the wiki setup jobs");
					return true;
				}
			}

			outstanding.retain(|handle| {
				let status = handle.status();
				if status.state.is_terminal() {
					record_terminal(report, handle.request().wiki_id(), status);
					false
				} else {
					true
				}
			});

			if outstanding.is_empty() || deadline.is_some_and(|deadline| Instant::now() >= deadline) {
				return false;
			}
		}
	}

	fn verdict(&self, report: ProvisioningReport) -> Result<ProvisioningReport> {
		let unfinished = report.unfinished();
		if !unfinished.is_empty() {
			error!(unfinished = ?unfinished, "Failed to install every wiki.");
			return Err(ProvisioningError::Incomplete { unfinished });
		}

		let failed = report.failed();
		if !failed.is_empty() {
			if self.settings.strict {
				error!(failed = ?failed, "Failed to install every wiki.");
				return Err(ProvisioningError::Failures { failed });
			}
			warn!(failed = ?failed, "Some wikis failed to set up");
		}

		info!(
			completed = report.completed().len(),
			elapsed_ms = report.elapsed_ms,
			"Successfully installed every wiki."
		);
		Ok(report)
	}
}

fn record_terminal(report: &mut ProvisioningReport, wiki_id: &str, status: JobStatus) {
	let duration_ms = status.duration_ms();
	match status.state {
		JobState::Finished => {
			info!(wiki_id, "Job for wiki is now finished");
			report.record(wiki_id, WikiOutcome::Completed, duration_ms);
		}
		_ => {
			let error = status
				.error
				.unwrap_or_else(|| format!("job ended in state {:?}", status.state));
			error!(wiki_id, error = %error, "Failed to set up wiki");
			report.record(wiki_id, WikiOutcome::Failed { error }, duration_ms);
		}
	}
}
