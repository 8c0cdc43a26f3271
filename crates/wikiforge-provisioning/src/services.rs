// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Platform services the provisioning job calls into.

use crate::error::Result;
use crate::owner::OwnerRef;
use crate::request::{InstallRequest, Namespace, WikiCreationRequest};
use crate::wiki::ExtensionId;
use async_trait::async_trait;
use std::sync::Arc;
use wikiforge_jobs::ExecutionContext;

/// Listeners that evaluate scripts when documents change. They need a
/// rendering context that provisioning never has.
pub const SCRIPT_LISTENERS: [&str; 2] = [
	"EventStreamStoreListener",
	"DefaultWikiComponentManagerEventListener",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WikiCreation {
	Created,
	AlreadyExists,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
	/// Extensions whose install changed the platform, with where they landed.
	pub installed: Vec<(ExtensionId, Namespace)>,
	/// Extensions that were already present.
	pub unchanged: usize,
}

#[async_trait]
pub trait WikiCreator: Send + Sync {
	/// Completes only once the wiki is usable.
	async fn create_wiki(&self, request: &WikiCreationRequest) -> Result<WikiCreation>;
}

pub trait OwnerResolver: Send + Sync {
	fn resolve_owner(&self, owner: &str) -> Result<OwnerRef>;
}

#[async_trait]
pub trait ExtensionInstaller: Send + Sync {
	async fn install(
		&self,
		extensions: &[ExtensionId],
		request: &InstallRequest,
		namespace: &Namespace,
		context: &ExecutionContext,
	) -> Result<InstallReport>;
}

pub trait ListenerRegistry: Send + Sync {
	/// Unregisters [`SCRIPT_LISTENERS`]. Returns how many were still
	/// registered; calling it again is harmless.
	fn suppress_script_listeners(&self) -> Result<usize>;
}

#[derive(Clone)]
pub struct PlatformServices {
	pub wiki_creator: Arc<dyn WikiCreator>,
	pub owner_resolver: Arc<dyn OwnerResolver>,
	pub installer: Arc<dyn ExtensionInstaller>,
	pub listeners: Arc<dyn ListenerRegistry>,
}

impl PlatformServices {
	pub fn from_platform<P>(platform: Arc<P>) -> Self
	where
		P: WikiCreator + OwnerResolver + ExtensionInstaller + ListenerRegistry + 'static,
	{
		Self {
			wiki_creator: platform.clone(),
			owner_resolver: platform.clone(),
			installer: platform.clone(),
			listeners: platform,
		}
	}
}
