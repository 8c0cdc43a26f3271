// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job that creates one wiki and installs its extensions.

use crate::error::ProvisioningError;
use crate::request::{
	ExtensionRewriter, InstallRequest, Namespace, ProvisioningRequest, WikiCreationRequest,
	PACKAGE_CONFIGURATION_PROPERTY,
};
use crate::services::{PlatformServices, WikiCreation};
use crate::wiki::WikiDescriptor;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use wikiforge_jobs::{Job, JobContext, JobError, JobOutput};

pub const WIKI_SETUP_JOB_TYPE: &str = "wiki_setup";

/// Extension types that always land on the root namespace when the root
/// wiki is set up.
const ROOT_NAMESPACE_TYPES: [&str; 2] = ["jar", "webjar"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupPhase {
	Pending,
	CreatingWiki,
	InstallingExtensions,
	Done,
	Failed,
}

impl SetupPhase {
	pub fn is_terminal(self) -> bool {
		matches!(self, SetupPhase::Done | SetupPhase::Failed)
	}

	pub fn can_transition_to(self, next: SetupPhase) -> bool {
		use SetupPhase::*;
		match (self, next) {
			(Pending, CreatingWiki) | (Pending, InstallingExtensions) => true,
			(CreatingWiki, InstallingExtensions) => true,
			(InstallingExtensions, Done) => true,
			(from, Failed) => !from.is_terminal(),
			_ => false,
		}
	}
}

impl fmt::Display for SetupPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			SetupPhase::Pending => "pending",
			SetupPhase::CreatingWiki => "creating_wiki",
			SetupPhase::InstallingExtensions => "installing_extensions",
			SetupPhase::Done => "done",
			SetupPhase::Failed => "failed",
		};
		f.write_str(name)
	}
}

fn advance(phase: &mut SetupPhase, next: SetupPhase) {
	debug_assert!(
		phase.can_transition_to(next),
		"invalid setup transition {phase} -> {next}"
	);
	debug!(from = %phase, to = %next, "Wiki setup phase changed");
	*phase = next;
}

pub struct ProvisioningJob {
	request: Arc<ProvisioningRequest>,
	services: PlatformServices,
	root_wiki_id: String,
}

impl ProvisioningJob {
	pub fn new(
		request: ProvisioningRequest,
		services: PlatformServices,
		root_wiki_id: impl Into<String>,
	) -> Self {
		Self {
			request: Arc::new(request),
			services,
			root_wiki_id: root_wiki_id.into(),
		}
	}

	async fn setup(
		&self,
		ctx: &JobContext,
		phase: &mut SetupPhase,
	) -> Result<JobOutput, ProvisioningError> {
		let wiki = self.request.wiki();
		// Contexts outlive this job; whatever the installer leaves must go.
		let cleanup = ctx.execution.cleanup_on_drop(PACKAGE_CONFIGURATION_PROPERTY);

		let mut install_request = InstallRequest::default();
		let mut created = None;

		if wiki.is_root(&self.root_wiki_id) {
			install_request.root_modifications_allowed = true;

			let mut rewriter = ExtensionRewriter::new();
			for extension_type in ROOT_NAMESPACE_TYPES {
				rewriter.install_type_on_root_namespace(extension_type);
			}
			install_request.rewriter = Some(rewriter);
		} else {
			advance(phase, SetupPhase::CreatingWiki);
			created = Some(self.create_wiki(wiki).await?);
		}

		install_request.acting_user = Some(self.services.owner_resolver.resolve_owner(&wiki.owner)?);
		install_request.verbose = true;

		advance(phase, SetupPhase::InstallingExtensions);
		let namespace = Namespace::wiki(&wiki.id);
		info!(wiki_id = %wiki.id, namespace = %namespace, extension_count = wiki.extensions.len(), "Installing extensions on wiki");
		let report = self
			.services
			.installer
			.install(&wiki.extensions, &install_request, &namespace, &ctx.execution)
			.await?;
		drop(cleanup);
		info!(
			wiki_id = %wiki.id,
			installed = report.installed.len(),
			unchanged = report.unchanged,
			"Installation done"
		);

		advance(phase, SetupPhase::Done);
		Ok(JobOutput {
			message: format!("Wiki [{}] is set up", wiki.id),
			metadata: Some(serde_json::json!({
				"wiki_id": wiki.id,
				"created": created == Some(WikiCreation::Created),
				"installed": report.installed.len(),
				"unchanged": report.unchanged,
			})),
		})
	}

	async fn create_wiki(&self, wiki: &WikiDescriptor) -> Result<WikiCreation, ProvisioningError> {
		let request = WikiCreationRequest::for_wiki(wiki);

		info!(wiki_id = %wiki.id, "Creating wiki");
		let creation = self.services.wiki_creator.create_wiki(&request).await?;
		match creation {
			WikiCreation::Created => info!(wiki_id = %wiki.id, "Successfully created wiki"),
			WikiCreation::AlreadyExists => info!(wiki_id = %wiki.id, "Wiki already exists, skipping creation"),
		}
		Ok(creation)
	}
}

#[async_trait]
impl Job for ProvisioningJob {
	type Request = ProvisioningRequest;

	fn job_type(&self) -> &'static str {
		WIKI_SETUP_JOB_TYPE
	}

	fn request(&self) -> Arc<ProvisioningRequest> {
		Arc::clone(&self.request)
	}

	#[instrument(skip(self, ctx), fields(wiki_id = %self.request.wiki_id(), job_id = %ctx.job_id))]
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		let mut phase = SetupPhase::Pending;

		match self.setup(ctx, &mut phase).await {
			Ok(output) => Ok(output),
			Err(e) => {
				let failed_in = phase;
				advance(&mut phase, SetupPhase::Failed);
				warn!(phase = %failed_in, error = %e, "Wiki setup failed");
				Err(JobError::execution(e))
			}
		}
	}
}
