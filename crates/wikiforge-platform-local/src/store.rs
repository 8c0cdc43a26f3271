// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! On-disk layout of a wiki farm.
//!
//! ```text
//! <data_dir>/
//!   wikis/<wiki_id>/descriptor.json   creation request the wiki was created from
//!   wikis/<wiki_id>/extensions.json   extensions installed on wiki:<wiki_id>
//!   extensions/root.json              extensions installed on the root namespace
//! ```
//!
//! Writes go to a `.tmp` sibling first and are renamed into place.

use crate::error::{PlatformError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use wikiforge_provisioning::{ExtensionId, Namespace, WikiCreationRequest};

const WIKIS_DIR: &str = "wikis";
const ROOT_EXTENSIONS: &str = "extensions/root.json";
const DESCRIPTOR_FILE: &str = "descriptor.json";
const EXTENSIONS_FILE: &str = "extensions.json";

#[derive(Debug, Clone)]
pub struct WikiStore {
	root: PathBuf,
}

impl WikiStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn wiki_dir(&self, wiki_id: &str) -> Result<PathBuf> {
		let valid = !wiki_id.is_empty()
			&& wiki_id != "."
			&& wiki_id != ".."
			&& !wiki_id.contains(['/', '\\']);
		if !valid {
			return Err(PlatformError::InvalidWikiId(wiki_id.to_string()));
		}
		Ok(self.root.join(WIKIS_DIR).join(wiki_id))
	}

	fn manifest_path(&self, namespace: &Namespace) -> Result<PathBuf> {
		match namespace {
			Namespace::Root => Ok(self.root.join(ROOT_EXTENSIONS)),
			Namespace::Wiki(wiki_id) => Ok(self.wiki_dir(wiki_id)?.join(EXTENSIONS_FILE)),
		}
	}

	pub async fn wiki_exists(&self, wiki_id: &str) -> Result<bool> {
		let path = self.wiki_dir(wiki_id)?.join(DESCRIPTOR_FILE);
		Ok(tokio::fs::try_exists(&path).await?)
	}

	pub async fn load_descriptor(&self, wiki_id: &str) -> Result<Option<WikiCreationRequest>> {
		read_json(&self.wiki_dir(wiki_id)?.join(DESCRIPTOR_FILE)).await
	}

	pub async fn save_descriptor(&self, request: &WikiCreationRequest) -> Result<()> {
		let path = self.wiki_dir(&request.id)?.join(DESCRIPTOR_FILE);
		write_json(&path, request).await
	}

	/// Ids of every wiki on disk, sorted.
	pub async fn list_wikis(&self) -> Result<Vec<String>> {
		let dir = self.root.join(WIKIS_DIR);
		if !tokio::fs::try_exists(&dir).await? {
			return Ok(Vec::new());
		}

		let mut entries = tokio::fs::read_dir(&dir).await?;
		let mut ids = Vec::new();
		while let Some(entry) = entries.next_entry().await? {
			if !entry.file_type().await?.is_dir() {
				continue;
			}
			if let Some(id) = entry.file_name().to_str() {
				if tokio::fs::try_exists(entry.path().join(DESCRIPTOR_FILE)).await? {
					ids.push(id.to_string());
				}
			}
		}
		ids.sort();
		Ok(ids)
	}

	/// Installed extensions on `namespace`, in install order.
	pub async fn installed(&self, namespace: &Namespace) -> Result<Vec<ExtensionId>> {
		Ok(read_json(&self.manifest_path(namespace)?)
			.await?
			.unwrap_or_default())
	}

	pub async fn save_installed(&self, namespace: &Namespace, extensions: &[ExtensionId]) -> Result<()> {
		write_json(&self.manifest_path(namespace)?, &extensions).await
	}
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
	let contents = match tokio::fs::read_to_string(path).await {
		Ok(contents) => contents,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
		Err(e) => return Err(e.into()),
	};
	Ok(Some(serde_json::from_str(&contents)?))
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
	if let Some(parent) = path.parent() {
		tokio::fs::create_dir_all(parent).await?;
	}

	let json = serde_json::to_string_pretty(value)?;
	let tmp_path = path.with_extension("json.tmp");
	tokio::fs::write(&tmp_path, &json).await?;
	tokio::fs::rename(&tmp_path, path).await?;

	debug!(path = %path.display(), "wrote manifest");
	Ok(())
}
