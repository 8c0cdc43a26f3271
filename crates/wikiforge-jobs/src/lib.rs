// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Asynchronous job runtime for wikiforge.
//!
//! Jobs are submitted to a [`JobExecutor`], run on tokio tasks under a
//! concurrency limit, and observed through a [`JobHandle`] that can be polled
//! for its [`JobState`] or awaited with an optional deadline.
//!
//! Each job receives an [`ExecutionContext`] taken from a shared pool. Contexts
//! are reused between sequential jobs, so jobs that leave properties behind
//! must clear them (see [`ExecutionContext::cleanup_on_drop`]).

pub mod context;
pub mod error;
pub mod executor;
pub mod handle;
pub mod job;
pub mod types;

pub use context::{ContextPool, ExecutionContext, JobContext, PropertyCleanup};
pub use error::{JobError, Result};
pub use executor::JobExecutor;
pub use handle::{job_channel, JobHandle, JobReporter};
pub use job::Job;
pub use types::{JobOutput, JobState, JobStatus};
