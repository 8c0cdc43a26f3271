// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::{ProvisioningError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_USER_SPACE: &str = "XWiki";

/// Resolved reference to the account document owning a wiki.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
	pub wiki: String,
	pub space: String,
	pub name: String,
}

impl OwnerRef {
	/// Parses `[wiki:][Space.]Name`.
	///
	/// The wiki part defaults to `default_wiki` and the space to `XWiki`.
	pub fn parse(reference: &str, default_wiki: &str) -> Result<Self> {
		let reference = reference.trim();
		let invalid = || ProvisioningError::InvalidOwner(reference.to_string());

		let (wiki, document) = match reference.split_once(':') {
			Some((wiki, document)) => (wiki, document),
			None => (default_wiki, reference),
		};
		let (space, name) = match document.rsplit_once('.') {
			Some((space, name)) => (space, name),
			None => (DEFAULT_USER_SPACE, document),
		};

		if wiki.is_empty() || space.is_empty() || name.is_empty() {
			return Err(invalid());
		}

		Ok(Self {
			wiki: wiki.to_string(),
			space: space.to_string(),
			name: name.to_string(),
		})
	}
}

impl fmt::Display for OwnerRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}.{}", self.wiki, self.space, self.name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_full_reference() {
		let owner = OwnerRef::parse("xwiki:XWiki.superadmin", "xwiki").unwrap();
		assert_eq!(owner.wiki, "xwiki");
		assert_eq!(owner.space, "XWiki");
		assert_eq!(owner.name, "superadmin");
		assert_eq!(owner.to_string(), "xwiki:XWiki.superadmin");
	}

	#[test]
	fn test_parse_defaults_wiki_and_space() {
		let owner = OwnerRef::parse("Admin", "main").unwrap();
		assert_eq!(owner.to_string(), "main:XWiki.Admin");

		let owner = OwnerRef::parse("Users.jdoe", "main").unwrap();
		assert_eq!(owner.to_string(), "main:Users.jdoe");
	}

	#[test]
	fn test_parse_nested_space_keeps_last_segment_as_name() {
		let owner = OwnerRef::parse("dept1:Org.Team.lead", "xwiki").unwrap();
		assert_eq!(owner.space, "Org.Team");
		assert_eq!(owner.name, "lead");
	}

	#[test]
	fn test_parse_rejects_empty_parts() {
		assert!(OwnerRef::parse("", "xwiki").is_err());
		assert!(OwnerRef::parse(":XWiki.Admin", "xwiki").is_err());
		assert!(OwnerRef::parse("xwiki:XWiki.", "xwiki").is_err());
	}
}
