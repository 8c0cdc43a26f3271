// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;
use uuid::Uuid;

/// Passed to every [`crate::Job::run`] invocation.
pub struct JobContext {
	pub job_id: Uuid,
	pub job_type: &'static str,
	pub execution: ExecutionContext,
}

/// Request-scoped property bag shared between a job and the services it calls.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct ExecutionContext {
	properties: Arc<Mutex<HashMap<String, Value>>>,
}

impl ExecutionContext {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<String, Value>> {
		self.properties
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	pub fn set_property(&self, key: impl Into<String>, value: Value) {
		self.lock().insert(key.into(), value);
	}

	pub fn property(&self, key: &str) -> Option<Value> {
		self.lock().get(key).cloned()
	}

	pub fn contains_property(&self, key: &str) -> bool {
		self.lock().contains_key(key)
	}

	pub fn remove_property(&self, key: &str) -> Option<Value> {
		self.lock().remove(key)
	}

	pub fn property_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.lock().keys().cloned().collect();
		names.sort();
		names
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	/// Returns a guard that removes `key` from this context when dropped,
	/// including when the owning job returns early with an error or panics.
	pub fn cleanup_on_drop(&self, key: &'static str) -> PropertyCleanup {
		PropertyCleanup {
			context: self.clone(),
			key,
		}
	}
}

impl std::fmt::Debug for ExecutionContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ExecutionContext")
			.field("properties", &self.property_names())
			.finish()
	}
}

#[must_use = "the property is removed as soon as the guard is dropped"]
pub struct PropertyCleanup {
	context: ExecutionContext,
	key: &'static str,
}

impl Drop for PropertyCleanup {
	fn drop(&mut self) {
		if self.context.remove_property(self.key).is_some() {
			trace!(key = self.key, "removed leftover context property");
		}
	}
}

/// Execution contexts available for reuse by the executor.
///
/// A context released by one job is handed to the next job that starts, the
/// same way a worker thread keeps its context between jobs.
#[derive(Default)]
pub struct ContextPool {
	idle: Mutex<Vec<ExecutionContext>>,
}

impl ContextPool {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn acquire(&self) -> ExecutionContext {
		self.idle
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.pop()
			.unwrap_or_default()
	}

	pub fn release(&self, context: ExecutionContext) {
		self.idle
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.push(context);
	}

	pub fn idle_count(&self) -> usize {
		self.idle
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.len()
	}
}
