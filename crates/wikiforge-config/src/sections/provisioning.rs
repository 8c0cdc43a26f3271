// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning run configuration section.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wikiforge_provisioning::{OrchestratorSettings, ROOT_WIKI_ID};

const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
const DEFAULT_DEADLINE_POLLS: u32 = 12;
const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProvisioningConfigLayer {
	pub parallel: Option<bool>,
	pub strict: Option<bool>,
	pub poll_interval_ms: Option<u64>,
	pub deadline_polls: Option<u32>,
	pub max_concurrent_jobs: Option<usize>,
	pub root_wiki_id: Option<String>,
}

impl ProvisioningConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.parallel.is_some() {
			self.parallel = other.parallel;
		}
		if other.strict.is_some() {
			self.strict = other.strict;
		}
		if other.poll_interval_ms.is_some() {
			self.poll_interval_ms = other.poll_interval_ms;
		}
		if other.deadline_polls.is_some() {
			self.deadline_polls = other.deadline_polls;
		}
		if other.max_concurrent_jobs.is_some() {
			self.max_concurrent_jobs = other.max_concurrent_jobs;
		}
		if other.root_wiki_id.is_some() {
			self.root_wiki_id = other.root_wiki_id;
		}
	}

	pub fn finalize(self) -> ProvisioningConfig {
		ProvisioningConfig {
			parallel: self.parallel.unwrap_or(false),
			strict: self.strict.unwrap_or(false),
			poll_interval_ms: self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
			deadline_polls: self.deadline_polls.unwrap_or(DEFAULT_DEADLINE_POLLS),
			max_concurrent_jobs: self.max_concurrent_jobs.unwrap_or(DEFAULT_MAX_CONCURRENT_JOBS),
			root_wiki_id: self.root_wiki_id.unwrap_or_else(|| ROOT_WIKI_ID.to_string()),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProvisioningConfig {
	pub parallel: bool,
	pub strict: bool,
	pub poll_interval_ms: u64,
	pub deadline_polls: u32,
	pub max_concurrent_jobs: usize,
	pub root_wiki_id: String,
}

impl ProvisioningConfig {
	pub fn orchestrator_settings(&self) -> OrchestratorSettings {
		OrchestratorSettings {
			parallel: self.parallel,
			strict: self.strict,
			poll_interval: Duration::from_millis(self.poll_interval_ms),
			deadline_polls: self.deadline_polls,
			root_wiki_id: self.root_wiki_id.clone(),
		}
	}
}

impl Default for ProvisioningConfig {
	fn default() -> Self {
		ProvisioningConfigLayer::default().finalize()
	}
}
