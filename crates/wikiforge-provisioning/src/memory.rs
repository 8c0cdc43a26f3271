// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process platform.
//!
//! Keeps wikis and installed extensions in memory and records every call it
//! receives. Used for dry runs and as the platform behind the orchestrator
//! tests. Individual wikis can be made to fail, stall, or never finish
//! creation.

use crate::error::{ProvisioningError, Result};
use crate::owner::OwnerRef;
use crate::request::{InstallRequest, Namespace, WikiCreationRequest, PACKAGE_CONFIGURATION_PROPERTY};
use crate::services::{
	ExtensionInstaller, InstallReport, ListenerRegistry, OwnerResolver, WikiCreation, WikiCreator,
	SCRIPT_LISTENERS,
};
use crate::wiki::{merge_installed, ExtensionId};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;
use wikiforge_jobs::ExecutionContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
	ListenersSuppressed { removed: usize },
	WikiCreated { wiki_id: String },
	WikiAlreadyExists { wiki_id: String },
	InstallRequested {
		namespace: Namespace,
		extension_count: usize,
		acting_user: Option<String>,
		root_modifications_allowed: bool,
	},
	ExtensionInstalled {
		extension: ExtensionId,
		namespace: Namespace,
	},
}

#[derive(Default)]
struct PlatformState {
	wikis: BTreeSet<String>,
	installed: BTreeMap<Namespace, Vec<ExtensionId>>,
	listeners: BTreeSet<String>,
	creation_requests: Vec<WikiCreationRequest>,
	events: Vec<PlatformEvent>,
	failing: BTreeSet<String>,
	hanging: BTreeSet<String>,
	delays: BTreeMap<String, Duration>,
}

pub struct InMemoryPlatform {
	root_wiki_id: String,
	state: Mutex<PlatformState>,
}

impl InMemoryPlatform {
	pub fn new(root_wiki_id: impl Into<String>) -> Self {
		let root_wiki_id = root_wiki_id.into();
		let mut state = PlatformState::default();
		state.wikis.insert(root_wiki_id.clone());
		state.listeners = SCRIPT_LISTENERS.iter().map(|l| l.to_string()).collect();

		Self {
			root_wiki_id,
			state: Mutex::new(state),
		}
	}

	fn lock(&self) -> MutexGuard<'_, PlatformState> {
		self.state.lock().unwrap_or_else(|p| p.into_inner())
	}

	/// Creation of `wiki_id` fails.
	pub fn fail_creation_of(self, wiki_id: impl Into<String>) -> Self {
		self.lock().failing.insert(wiki_id.into());
		self
	}

	/// Creation of `wiki_id` never completes.
	pub fn hang_creation_of(self, wiki_id: impl Into<String>) -> Self {
		self.lock().hanging.insert(wiki_id.into());
		self
	}

	/// Creation of `wiki_id` takes `delay`.
	pub fn delay_creation_of(self, wiki_id: impl Into<String>, delay: Duration) -> Self {
		self.lock().delays.insert(wiki_id.into(), delay);
		self
	}

	pub fn root_wiki_id(&self) -> &str {
		&self.root_wiki_id
	}

	pub fn wiki_exists(&self, wiki_id: &str) -> bool {
		self.lock().wikis.contains(wiki_id)
	}

	pub fn wikis(&self) -> Vec<String> {
		self.lock().wikis.iter().cloned().collect()
	}

	pub fn installed(&self, namespace: &Namespace) -> Vec<ExtensionId> {
		self.lock()
			.installed
			.get(namespace)
			.cloned()
			.unwrap_or_default()
	}

	pub fn creation_requests(&self) -> Vec<WikiCreationRequest> {
		self.lock().creation_requests.clone()
	}

	pub fn events(&self) -> Vec<PlatformEvent> {
		self.lock().events.clone()
	}

	pub fn registered_listeners(&self) -> Vec<String> {
		self.lock().listeners.iter().cloned().collect()
	}
}

#[async_trait]
impl WikiCreator for InMemoryPlatform {
	async fn create_wiki(&self, request: &WikiCreationRequest) -> Result<WikiCreation> {
		let (fails, hangs, delay) = {
			let mut state = self.lock();
			state.creation_requests.push(request.clone());
			(
				state.failing.contains(&request.id),
				state.hanging.contains(&request.id),
				state.delays.get(&request.id).copied(),
			)
		};

		if hangs {
			std::future::pending::<()>().await;
		}
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		if fails {
			return Err(ProvisioningError::WikiCreation {
				wiki_id: request.id.clone(),
				message: "simulated creation failure".to_string(),
			});
		}

		let mut state = self.lock();
		if state.wikis.contains(&request.id) {
			if request.fail_on_exist {
				return Err(ProvisioningError::WikiExists(request.id.clone()));
			}
			state.events.push(PlatformEvent::WikiAlreadyExists {
				wiki_id: request.id.clone(),
			});
			return Ok(WikiCreation::AlreadyExists);
		}

		state.wikis.insert(request.id.clone());
		state.events.push(PlatformEvent::WikiCreated {
			wiki_id: request.id.clone(),
		});
		debug!(wiki_id = %request.id, "created in-memory wiki");
		Ok(WikiCreation::Created)
	}
}

impl OwnerResolver for InMemoryPlatform {
	fn resolve_owner(&self, owner: &str) -> Result<OwnerRef> {
		OwnerRef::parse(owner, &self.root_wiki_id)
	}
}

#[async_trait]
impl ExtensionInstaller for InMemoryPlatform {
	async fn install(
		&self,
		extensions: &[ExtensionId],
		request: &InstallRequest,
		namespace: &Namespace,
		context: &ExecutionContext,
	) -> Result<InstallReport> {
		context.set_property(
			PACKAGE_CONFIGURATION_PROPERTY,
			serde_json::json!({
				"namespace": namespace.to_string(),
				"user": request.acting_user.as_ref().map(|u| u.to_string()),
				"verbose": request.verbose,
			}),
		);

		let mut guard = self.lock();
		let state = &mut *guard;
		state.events.push(PlatformEvent::InstallRequested {
			namespace: namespace.clone(),
			extension_count: extensions.len(),
			acting_user: request.acting_user.as_ref().map(|u| u.to_string()),
			root_modifications_allowed: request.root_modifications_allowed,
		});

		let plan = request.plan(extensions, namespace)?;
		for (extension, target) in &plan {
			if let Namespace::Wiki(wiki_id) = target {
				if !state.wikis.contains(wiki_id) {
					return Err(ProvisioningError::Installation {
						extension: extension.to_string(),
						namespace: target.to_string(),
						message: format!("wiki [{wiki_id}] does not exist"),
					});
				}
			}
		}

		let mut report = InstallReport::default();
		for (extension, target) in plan {
			let installed = state.installed.entry(target.clone()).or_default();
			if merge_installed(installed, &extension) {
				state.events.push(PlatformEvent::ExtensionInstalled {
					extension: extension.clone(),
					namespace: target.clone(),
				});
				report.installed.push((extension, target));
			} else {
				report.unchanged += 1;
			}
		}
		Ok(report)
	}
}

impl ListenerRegistry for InMemoryPlatform {
	fn suppress_script_listeners(&self) -> Result<usize> {
		let mut state = self.lock();
		let removed = SCRIPT_LISTENERS
			.iter()
			.filter(|listener| state.listeners.remove(**listener))
			.count();
		state.events.push(PlatformEvent::ListenersSuppressed { removed });
		Ok(removed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::wiki::{WikiDescriptor, ROOT_WIKI_ID};

	#[tokio::test]
	async fn test_creation_is_idempotent_without_fail_on_exist() {
		let platform = InMemoryPlatform::new(ROOT_WIKI_ID);
		let request = WikiCreationRequest::for_wiki(&WikiDescriptor::new("dept1"));

		assert_eq!(platform.create_wiki(&request).await.unwrap(), WikiCreation::Created);
		assert_eq!(
			platform.create_wiki(&request).await.unwrap(),
			WikiCreation::AlreadyExists
		);
		assert!(platform.wiki_exists("dept1"));
	}

	#[tokio::test]
	async fn test_creation_with_fail_on_exist_errors() {
		let platform = InMemoryPlatform::new(ROOT_WIKI_ID);
		let mut request = WikiCreationRequest::for_wiki(&WikiDescriptor::new(ROOT_WIKI_ID));
		request.fail_on_exist = true;

		let err = platform.create_wiki(&request).await.unwrap_err();
		assert!(matches!(err, ProvisioningError::WikiExists(id) if id == ROOT_WIKI_ID));
	}

	#[tokio::test]
	async fn test_install_on_missing_wiki_fails() {
		let platform = InMemoryPlatform::new(ROOT_WIKI_ID);
		let extensions = vec![ExtensionId::new("ext", "foo", "1.0")];

		let err = platform
			.install(
				&extensions,
				&InstallRequest::default(),
				&Namespace::wiki("ghost"),
				&ExecutionContext::new(),
			)
			.await
			.unwrap_err();
		assert!(err.to_string().contains("does not exist"));
		assert!(platform.installed(&Namespace::wiki("ghost")).is_empty());
	}

	#[tokio::test]
	async fn test_install_leaves_package_configuration_in_context() {
		let platform = InMemoryPlatform::new(ROOT_WIKI_ID);
		let context = ExecutionContext::new();

		platform
			.install(&[], &InstallRequest::default(), &Namespace::wiki(ROOT_WIKI_ID), &context)
			.await
			.unwrap();

		assert!(context.contains_property(PACKAGE_CONFIGURATION_PROPERTY));
	}

	#[test]
	fn test_listener_suppression_is_idempotent() {
		let platform = InMemoryPlatform::new(ROOT_WIKI_ID);
		assert_eq!(platform.registered_listeners().len(), 2);

		assert_eq!(platform.suppress_script_listeners().unwrap(), 2);
		assert_eq!(platform.suppress_script_listeners().unwrap(), 0);
		assert!(platform.registered_listeners().is_empty());
	}
}
