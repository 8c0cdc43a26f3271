// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wiki descriptors as read from configuration.

use crate::error::ProvisioningError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of the primordial wiki. It always exists and is never created.
pub const ROOT_WIKI_ID: &str = "xwiki";

const DEFAULT_PRETTY_NAME: &str = "XWiki";
const DEFAULT_OWNER: &str = "xwiki:XWiki.superadmin";
const DEFAULT_EXTENSION_TYPE: &str = "jar";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipType {
	#[default]
	#[serde(alias = "OPEN")]
	Open,
	#[serde(alias = "REQUEST")]
	Request,
	#[serde(alias = "INVITE")]
	Invite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserScope {
	#[default]
	#[serde(alias = "GLOBAL_ONLY")]
	GlobalOnly,
	#[serde(alias = "LOCAL_ONLY")]
	LocalOnly,
	#[serde(alias = "LOCAL_AND_GLOBAL")]
	LocalAndGlobal,
}

/// One wiki to provision. Missing fields take the root wiki's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiDescriptor {
	pub id: String,
	pub pretty_name: String,
	pub owner: String,
	pub membership: MembershipType,
	pub user_scope: UserScope,
	pub template: bool,
	/// Installed in this order.
	pub extensions: Vec<ExtensionId>,
}

impl WikiDescriptor {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			..Default::default()
		}
	}

	pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = ExtensionId>) -> Self {
		self.extensions = extensions.into_iter().collect();
		self
	}

	pub fn is_root(&self, root_wiki_id: &str) -> bool {
		self.id == root_wiki_id
	}
}

impl Default for WikiDescriptor {
	fn default() -> Self {
		Self {
			id: ROOT_WIKI_ID.to_string(),
			pretty_name: DEFAULT_PRETTY_NAME.to_string(),
			owner: DEFAULT_OWNER.to_string(),
			membership: MembershipType::Open,
			user_scope: UserScope::GlobalOnly,
			template: false,
			extensions: Vec::new(),
		}
	}
}

/// Package coordinate of an extension: `group:artifact:version[:type]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtensionId {
	pub group_id: String,
	pub artifact_id: String,
	pub version: String,
	pub extension_type: Option<String>,
}

impl ExtensionId {
	pub fn new(
		group_id: impl Into<String>,
		artifact_id: impl Into<String>,
		version: impl Into<String>,
	) -> Self {
		Self {
			group_id: group_id.into(),
			artifact_id: artifact_id.into(),
			version: version.into(),
			extension_type: None,
		}
	}

	pub fn with_type(mut self, extension_type: impl Into<String>) -> Self {
		self.extension_type = Some(extension_type.into());
		self
	}

	/// Packaging type, `jar` when none was declared.
	pub fn extension_type(&self) -> &str {
		self.extension_type.as_deref().unwrap_or(DEFAULT_EXTENSION_TYPE)
	}

	/// Whether both name the same `group:artifact`, whatever the version.
	pub fn same_artifact(&self, other: &ExtensionId) -> bool {
		self.group_id == other.group_id && self.artifact_id == other.artifact_id
	}
}

impl fmt::Display for ExtensionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
		if let Some(extension_type) = &self.extension_type {
			write!(f, ":{extension_type}")?;
		}
		Ok(())
	}
}

impl FromStr for ExtensionId {
	type Err = ProvisioningError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		let invalid = |message: &str| ProvisioningError::InvalidExtension {
			value: value.to_string(),
			message: message.to_string(),
		};

		let parts: Vec<&str> = value.trim().split(':').collect();
		if parts.len() != 3 && parts.len() != 4 {
			return Err(invalid("expected group:artifact:version[:type]"));
		}
		if parts.iter().any(|p| p.trim().is_empty()) {
			return Err(invalid("empty coordinate segment"));
		}

		let mut id = ExtensionId::new(parts[0].trim(), parts[1].trim(), parts[2].trim());
		if let Some(extension_type) = parts.get(3) {
			id.extension_type = Some(extension_type.trim().to_string());
		}
		Ok(id)
	}
}

impl TryFrom<String> for ExtensionId {
	type Error = ProvisioningError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<ExtensionId> for String {
	fn from(id: ExtensionId) -> Self {
		id.to_string()
	}
}

/// Adds `extension` to an installed list.
///
/// Returns `false` when that exact extension is already present. Another
/// version of the same artifact is replaced in place.
pub fn merge_installed(installed: &mut Vec<ExtensionId>, extension: &ExtensionId) -> bool {
	if installed.contains(extension) {
		return false;
	}
	match installed.iter_mut().find(|e| e.same_artifact(extension)) {
		Some(existing) => *existing = extension.clone(),
		None => installed.push(extension.clone()),
	}
	true
}
