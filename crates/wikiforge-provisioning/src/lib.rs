// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wiki provisioning for wikiforge.
//!
//! This crate provides:
//! - The wiki model ([`WikiDescriptor`]) and the requests derived from it
//! - [`ProvisioningJob`], which creates one wiki and installs its extensions
//! - [`Orchestrator`], which drives every wiki of a run under a shared deadline
//! - The collaborator traits a platform implements ([`WikiCreator`],
//!   [`OwnerResolver`], [`ExtensionInstaller`], [`ListenerRegistry`])
//! - [`memory::InMemoryPlatform`], an in-process platform for dry runs and tests
//!
//! # Usage
//!
//! ```ignore
//! let platform = Arc::new(InMemoryPlatform::new(ROOT_WIKI_ID));
//! let services = PlatformServices::from_platform(platform);
//! let runner = ExecutorJobRunner::new(Arc::new(JobExecutor::default()), services.clone(), ROOT_WIKI_ID);
//! let orchestrator = Orchestrator::new(Arc::new(runner), services.listeners, OrchestratorSettings::default());
//! let report = orchestrator.run(&wikis).await?;
//! ```

pub mod error;
pub mod job;
pub mod memory;
pub mod orchestrator;
pub mod owner;
pub mod request;
pub mod runner;
pub mod services;
pub mod wiki;

pub use error::{ProvisioningError, Result};
pub use job::{ProvisioningJob, SetupPhase, WIKI_SETUP_JOB_TYPE};
pub use orchestrator::{Orchestrator, OrchestratorSettings, ProvisioningReport, WikiOutcome, WikiReport};
pub use owner::OwnerRef;
pub use request::{
	ExtensionRewriter, InstallRequest, Namespace, ProvisioningRequest, WikiCreationRequest,
	PACKAGE_CONFIGURATION_PROPERTY,
};
pub use runner::{ExecutorJobRunner, JobKind, JobRunner};
pub use services::{
	ExtensionInstaller, InstallReport, ListenerRegistry, OwnerResolver, PlatformServices,
	WikiCreation, WikiCreator, SCRIPT_LISTENERS,
};
pub use wiki::{merge_installed, ExtensionId, MembershipType, UserScope, WikiDescriptor, ROOT_WIKI_ID};
