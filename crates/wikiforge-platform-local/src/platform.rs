// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::{PlatformError, Result};
use crate::store::WikiStore;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use wikiforge_jobs::ExecutionContext;
use wikiforge_provisioning::{
	merge_installed, ExtensionId, ExtensionInstaller, InstallReport, InstallRequest, ListenerRegistry,
	Namespace, OwnerRef, OwnerResolver, ProvisioningError, WikiCreation, WikiCreationRequest,
	WikiCreator, WikiDescriptor, PACKAGE_CONFIGURATION_PROPERTY, SCRIPT_LISTENERS,
};

/// Held for as long as a platform is open on a data directory.
pub const LOCK_FILE: &str = ".lock";

/// Wiki farm stored under a data directory.
///
/// Only one platform may be open on a directory at a time. Dropping the
/// platform releases the directory; [`LocalPlatform::close`] does the same
/// and reports failures.
pub struct LocalPlatform {
	store: WikiStore,
	root_wiki_id: String,
	lock_path: PathBuf,
	released: AtomicBool,
	writes: tokio::sync::Mutex<()>,
	listeners: Mutex<BTreeSet<String>>,
}

impl LocalPlatform {
	#[instrument(skip_all, fields(data_dir = %data_dir.as_ref().display()))]
	pub async fn open(data_dir: impl AsRef<Path>, root_wiki_id: impl Into<String>) -> Result<Self> {
		let data_dir = data_dir.as_ref();
		tokio::fs::create_dir_all(data_dir).await?;

		let lock_path = data_dir.join(LOCK_FILE);
		let mut lock = match tokio::fs::OpenOptions::new()
			.write(true)
			.create_new(true)
			.open(&lock_path)
			.await
		{
			Ok(file) => file,
			Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
				return Err(PlatformError::Locked { path: lock_path });
			}
			Err(e) => return Err(e.into()),
		};
		lock.write_all(std::process::id().to_string().as_bytes()).await?;
		lock.flush().await?;

		let platform = Self {
			store: WikiStore::new(data_dir),
			root_wiki_id: root_wiki_id.into(),
			lock_path,
			released: AtomicBool::new(false),
			writes: tokio::sync::Mutex::new(()),
			listeners: Mutex::new(SCRIPT_LISTENERS.iter().map(|l| l.to_string()).collect()),
		};

		if !platform.store.wiki_exists(&platform.root_wiki_id).await? {
			let root = WikiCreationRequest::for_wiki(&WikiDescriptor::new(platform.root_wiki_id.as_str()));
			platform.store.save_descriptor(&root).await?;
			info!(wiki_id = %platform.root_wiki_id, "Initialized root wiki");
		}

		info!("Opened local platform");
		Ok(platform)
	}

	pub fn data_dir(&self) -> &Path {
		self.store.root()
	}

	/// Releases the data directory.
	pub async fn close(&self) -> Result<()> {
		if self.released.swap(true, Ordering::SeqCst) {
			return Ok(());
		}
		tokio::fs::remove_file(&self.lock_path).await?;
		info!(data_dir = %self.data_dir().display(), "Closed local platform");
		Ok(())
	}
}

impl Drop for LocalPlatform {
	fn drop(&mut self) {
		if !self.released.swap(true, Ordering::SeqCst) {
			if let Err(e) = std::fs::remove_file(&self.lock_path) {
				warn!(path = %self.lock_path.display(), error = %e, "Failed to release data directory");
			}
		}
	}
}

#[async_trait]
impl WikiCreator for LocalPlatform {
	async fn create_wiki(&self, request: &WikiCreationRequest) -> wikiforge_provisioning::Result<WikiCreation> {
		let _guard = self.writes.lock().await;

		if self.store.wiki_exists(&request.id).await? {
			if request.fail_on_exist {
				return Err(PlatformError::WikiExists(request.id.clone()).into());
			}
			debug!(wiki_id = %request.id, "Wiki already on disk");
			return Ok(WikiCreation::AlreadyExists);
		}

		self.store.save_descriptor(request).await?;
		Ok(WikiCreation::Created)
	}
}

impl OwnerResolver for LocalPlatform {
	fn resolve_owner(&self, owner: &str) -> wikiforge_provisioning::Result<OwnerRef> {
		OwnerRef::parse(owner, &self.root_wiki_id)
	}
}

#[async_trait]
impl ExtensionInstaller for LocalPlatform {
	async fn install(
		&self,
		extensions: &[ExtensionId],
		request: &InstallRequest,
		namespace: &Namespace,
		context: &ExecutionContext,
	) -> wikiforge_provisioning::Result<InstallReport> {
		context.set_property(
			PACKAGE_CONFIGURATION_PROPERTY,
			serde_json::json!({
				"namespace": namespace.to_string(),
				"user": request.acting_user.as_ref().map(|u| u.to_string()),
				"verbose": request.verbose,
			}),
		);

		let plan = request.plan(extensions, namespace)?;
		let _guard = self.writes.lock().await;

		let mut manifests: BTreeMap<Namespace, (Vec<ExtensionId>, bool)> = BTreeMap::new();
		let mut report = InstallReport::default();

		for (extension, target) in plan {
			if !manifests.contains_key(&target) {
				if let Namespace::Wiki(wiki_id) = &target {
					if !self.store.wiki_exists(wiki_id).await? {
						return Err(ProvisioningError::Installation {
							extension: extension.to_string(),
							namespace: target.to_string(),
							message: format!("wiki [{wiki_id}] does not exist"),
						});
					}
				}
				let installed = self.store.installed(&target).await?;
				manifests.insert(target.clone(), (installed, false));
			}

			let Some((installed, dirty)) = manifests.get_mut(&target) else {
				continue;
			};
			if merge_installed(installed, &extension) {
				if request.verbose {
					info!(extension = %extension, namespace = %target, "Installed extension");
				}
				*dirty = true;
				report.installed.push((extension, target));
			} else {
				debug!(extension = %extension, namespace = %target, "Extension already installed");
				report.unchanged += 1;
			}
		}

		for (target, (installed, dirty)) in &manifests {
			if *dirty {
				self.store.save_installed(target, installed).await?;
			}
		}

		Ok(report)
	}
}

impl ListenerRegistry for LocalPlatform {
	fn suppress_script_listeners(&self) -> wikiforge_provisioning::Result<usize> {
		let mut listeners = self.listeners.lock().unwrap_or_else(|p| p.into_inner());
		Ok(SCRIPT_LISTENERS
			.iter()
			.filter(|listener| listeners.remove(**listener))
			.count())
	}
}
