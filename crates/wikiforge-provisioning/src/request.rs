// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::{ProvisioningError, Result};
use crate::owner::OwnerRef;
use crate::wiki::{ExtensionId, MembershipType, UserScope, WikiDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Context property the extension installer leaves behind after a run.
pub const PACKAGE_CONFIGURATION_PROPERTY: &str = "extension.xar.packageconfiguration";

/// Payload of a wiki setup job.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisioningRequest {
	wiki: WikiDescriptor,
}

impl ProvisioningRequest {
	pub fn new(wiki: WikiDescriptor) -> Self {
		Self { wiki }
	}

	pub fn wiki(&self) -> &WikiDescriptor {
		&self.wiki
	}

	pub fn wiki_id(&self) -> &str {
		&self.wiki.id
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiCreationRequest {
	pub id: String,
	pub wiki_id: String,
	pub alias: String,
	pub pretty_name: String,
	/// Unresolved owner reference, as written in the descriptor.
	pub owner_id: String,
	pub membership: MembershipType,
	pub user_scope: UserScope,
	pub template: bool,
	pub members: Vec<String>,
	pub fail_on_exist: bool,
}

impl WikiCreationRequest {
	/// Creation request for `wiki`: aliased to its id, no initial members, and
	/// succeeding without changes when the wiki already exists.
	pub fn for_wiki(wiki: &WikiDescriptor) -> Self {
		Self {
			id: wiki.id.clone(),
			wiki_id: wiki.id.clone(),
			alias: wiki.id.clone(),
			pretty_name: wiki.pretty_name.clone(),
			owner_id: wiki.owner.clone(),
			membership: wiki.membership,
			user_scope: wiki.user_scope,
			template: wiki.template,
			members: Vec::new(),
			fail_on_exist: false,
		}
	}
}

/// Where an extension gets installed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
	Root,
	Wiki(String),
}

impl Namespace {
	pub fn wiki(id: impl Into<String>) -> Self {
		Self::Wiki(id.into())
	}
}

impl fmt::Display for Namespace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Namespace::Root => f.write_str("{root}"),
			Namespace::Wiki(id) => write!(f, "wiki:{id}"),
		}
	}
}

/// Redirects extensions of some types to the root namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionRewriter {
	root_types: BTreeSet<String>,
}

impl ExtensionRewriter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn install_type_on_root_namespace(&mut self, extension_type: impl Into<String>) {
		self.root_types.insert(extension_type.into());
	}

	pub fn rewrite(&self, extension: &ExtensionId, namespace: &Namespace) -> Namespace {
		if self.root_types.contains(extension.extension_type()) {
			Namespace::Root
		} else {
			namespace.clone()
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstallRequest {
	pub root_modifications_allowed: bool,
	pub verbose: bool,
	/// User the installation is performed as.
	pub acting_user: Option<OwnerRef>,
	pub rewriter: Option<ExtensionRewriter>,
}

impl InstallRequest {
	pub fn target_namespace(&self, extension: &ExtensionId, namespace: &Namespace) -> Namespace {
		match &self.rewriter {
			Some(rewriter) => rewriter.rewrite(extension, namespace),
			None => namespace.clone(),
		}
	}

	/// Resolves where each extension goes, in order, refusing root namespace
	/// targets unless root modifications are allowed.
	pub fn plan(
		&self,
		extensions: &[ExtensionId],
		namespace: &Namespace,
	) -> Result<Vec<(ExtensionId, Namespace)>> {
		extensions
			.iter()
			.map(|extension| {
				let target = self.target_namespace(extension, namespace);
				if target == Namespace::Root && !self.root_modifications_allowed {
					return Err(ProvisioningError::RootModificationDenied {
						extension: extension.to_string(),
					});
				}
				Ok((extension.clone(), target))
			})
			.collect()
	}
}
