// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Local platform configuration section.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `<XDG data dir>/wikiforge`, or `./data` where there is no data dir.
fn default_data_dir() -> PathBuf {
	dirs::data_dir()
		.map(|dir| dir.join("wikiforge"))
		.unwrap_or_else(|| PathBuf::from("./data"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlatformConfigLayer {
	pub data_dir: Option<PathBuf>,
}

impl PlatformConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.data_dir.is_some() {
			self.data_dir = other.data_dir;
		}
	}

	pub fn finalize(self) -> PlatformConfig {
		PlatformConfig {
			data_dir: self.data_dir.unwrap_or_else(default_data_dir),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformConfig {
	pub data_dir: PathBuf,
}

impl Default for PlatformConfig {
	fn default() -> Self {
		Self {
			data_dir: default_data_dir(),
		}
	}
}
