// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
	None,
	Initializing,
	Running,
	Finished,
	Failed,
}

impl JobState {
	/// Finished and failed jobs never change state again.
	pub fn is_terminal(self) -> bool {
		matches!(self, JobState::Finished | JobState::Failed)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutput {
	pub message: String,
	pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
	pub state: JobState,
	pub started_at: Option<DateTime<Utc>>,
	pub completed_at: Option<DateTime<Utc>>,
	pub output: Option<JobOutput>,
	pub error: Option<String>,
}

impl JobStatus {
	pub fn new() -> Self {
		Self {
			state: JobState::None,
			started_at: None,
			completed_at: None,
			output: None,
			error: None,
		}
	}

	pub fn duration_ms(&self) -> Option<i64> {
		match (self.started_at, self.completed_at) {
			(Some(started), Some(completed)) => Some((completed - started).num_milliseconds()),
			_ => None,
		}
	}
}

impl Default for JobStatus {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;

	#[test]
	fn test_terminal_states() {
		assert!(JobState::Finished.is_terminal());
		assert!(JobState::Failed.is_terminal());
		assert!(!JobState::None.is_terminal());
		assert!(!JobState::Initializing.is_terminal());
		assert!(!JobState::Running.is_terminal());
	}

	#[test]
	fn test_duration_requires_both_timestamps() {
		let mut status = JobStatus::new();
		assert_eq!(status.duration_ms(), None);

		let started = Utc::now();
		status.started_at = Some(started);
		assert_eq!(status.duration_ms(), None);

		status.completed_at = Some(started + Duration::milliseconds(250));
		assert_eq!(status.duration_ms(), Some(250));
	}

	#[test]
	fn test_state_serializes_snake_case() {
		let json = serde_json::to_string(&JobState::Initializing).unwrap();
		assert_eq!(json, "\"initializing\"");
	}
}
