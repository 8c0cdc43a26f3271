// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;
use wikiforge_provisioning::WikiDescriptor;

use crate::sections::{LoggingConfigLayer, PlatformConfigLayer, ProvisioningConfigLayer};

/// Configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WikiforgeConfigLayer {
	#[serde(default)]
	pub provisioning: Option<ProvisioningConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub platform: Option<PlatformConfigLayer>,
	/// Replaced as a whole, never merged entry by entry.
	#[serde(default)]
	pub wikis: Option<Vec<WikiDescriptor>>,
}

impl WikiforgeConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: WikiforgeConfigLayer) {
		merge_option(
			&mut self.provisioning,
			other.provisioning,
			ProvisioningConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_option(&mut self.platform, other.platform, PlatformConfigLayer::merge);
		if other.wikis.is_some() {
			self.wikis = other.wikis;
		}
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}
