// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for wikiforge.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`WIKIFORGE_*`)
//!
//! The wikis to provision are read from `[[wikis]]` tables in the TOML file.
//!
//! # Usage
//!
//! ```ignore
//! use wikiforge_config::load_config;
//!
//! let config = load_config(Some(Path::new("farm.toml")))?;
//! let settings = config.provisioning.orchestrator_settings();
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::WikiforgeConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};
use wikiforge_provisioning::WikiDescriptor;

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct WikiforgeConfig {
	pub provisioning: ProvisioningConfig,
	pub logging: LoggingConfig,
	pub platform: PlatformConfig,
	/// Provisioned in this order.
	pub wikis: Vec<WikiDescriptor>,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WIKIFORGE_*`)
/// 2. Config file (`config_path`, or `<XDG config dir>/wikiforge/wikiforge.toml`)
/// 3. Built-in defaults
///
/// An explicit `config_path` must exist.
pub fn load_config(config_path: Option<&Path>) -> Result<WikiforgeConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(DefaultsSource), Box::new(EnvSource::new())];
	match config_path {
		Some(path) => sources.push(Box::new(TomlSource::required(path))),
		None => {
			if let Some(source) = TomlSource::user() {
				sources.push(Box::new(source));
			}
		}
	}

	load_config_from_sources(sources)
}

/// Merge `sources` in precedence order and finalize the result.
pub fn load_config_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<WikiforgeConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = WikiforgeConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: WikiforgeConfigLayer) -> Result<WikiforgeConfig, ConfigError> {
	let provisioning = layer.provisioning.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let platform = layer.platform.unwrap_or_default().finalize();
	let wikis = layer.wikis.unwrap_or_default();

	validate_config(&provisioning, &wikis)?;

	info!(
		parallel = provisioning.parallel,
		strict = provisioning.strict,
		poll_interval_ms = provisioning.poll_interval_ms,
		deadline_polls = provisioning.deadline_polls,
		max_concurrent_jobs = provisioning.max_concurrent_jobs,
		data_dir = %platform.data_dir.display(),
		wiki_count = wikis.len(),
		"Configuration loaded"
	);

	Ok(WikiforgeConfig {
		provisioning,
		logging,
		platform,
		wikis,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(provisioning: &ProvisioningConfig, wikis: &[WikiDescriptor]) -> Result<(), ConfigError> {
	if provisioning.poll_interval_ms == 0 {
		return Err(ConfigError::Validation(
			"provisioning.poll_interval_ms must be greater than 0".to_string(),
		));
	}
	if provisioning.deadline_polls == 0 {
		return Err(ConfigError::Validation(
			"provisioning.deadline_polls must be greater than 0".to_string(),
		));
	}
	if provisioning.max_concurrent_jobs == 0 {
		return Err(ConfigError::Validation(
			"provisioning.max_concurrent_jobs must be greater than 0".to_string(),
		));
	}
	if provisioning.root_wiki_id.trim().is_empty() {
		return Err(ConfigError::Validation(
			"provisioning.root_wiki_id must not be empty".to_string(),
		));
	}

	let mut seen = HashSet::new();
	for (index, wiki) in wikis.iter().enumerate() {
		if wiki.id.trim().is_empty() {
			return Err(ConfigError::Validation(format!("wikis[{index}] has an empty id")));
		}
		if !seen.insert(wiki.id.as_str()) {
			warn!(wiki_id = %wiki.id, "Wiki is declared more than once; it will be set up again");
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use std::path::PathBuf;
	use tempfile::NamedTempFile;

	fn config_file(contents: &str) -> NamedTempFile {
		let mut file = NamedTempFile::new().unwrap();
		write!(file, "{contents}").unwrap();
		file
	}

	#[test]
	fn test_defaults_only() {
		let config = load_config_from_sources(vec![Box::new(DefaultsSource)]).unwrap();
		assert_eq!(config.provisioning, ProvisioningConfig::default());
		assert_eq!(config.logging.level, "info");
		assert!(config.wikis.is_empty());
	}

	#[test]
	fn test_environment_overrides_file() {
		let file = config_file(
			r#"
[provisioning]
parallel = false
deadline_polls = 3

[platform]
data_dir = "/srv/from-file"

[[wikis]]
id = "dept1"
"#,
		);

		let config = load_config_from_sources(vec![
			Box::new(EnvSource::from_vars([
				("WIKIFORGE_PARALLEL", "true"),
				("WIKIFORGE_DATA_DIR", "/srv/from-env"),
			])),
			Box::new(TomlSource::required(file.path())),
			Box::new(DefaultsSource),
		])
		.unwrap();

		assert!(config.provisioning.parallel);
		assert_eq!(config.provisioning.deadline_polls, 3);
		assert_eq!(config.platform.data_dir, PathBuf::from("/srv/from-env"));
		assert_eq!(config.wikis.len(), 1);
	}

	#[test]
	fn test_zero_values_fail_validation() {
		for (key, value) in [
			("WIKIFORGE_POLL_INTERVAL_MS", "0"),
			("WIKIFORGE_DEADLINE_POLLS", "0"),
			("WIKIFORGE_MAX_CONCURRENT_JOBS", "0"),
		] {
			let result = load_config_from_sources(vec![Box::new(EnvSource::from_vars([(key, value)]))]);
			assert!(
				matches!(result, Err(ConfigError::Validation(_))),
				"{key}=0 was accepted"
			);
		}
	}

	#[test]
	fn test_empty_wiki_id_fails_validation() {
		let file = config_file("[[wikis]]\nid = \"xwiki\"\n\n[[wikis]]\nid = \" \"\n");

		let err = load_config_from_sources(vec![Box::new(TomlSource::required(file.path()))]).unwrap_err();
		assert!(err.to_string().contains("wikis[1]"));
	}

	#[test]
	fn test_duplicate_wiki_ids_are_kept() {
		let file = config_file("[[wikis]]\nid = \"dept1\"\n\n[[wikis]]\nid = \"dept1\"\n");

		let config = load_config_from_sources(vec![Box::new(TomlSource::required(file.path()))]).unwrap();
		assert_eq!(config.wikis.len(), 2);
	}

	#[test]
	fn test_load_config_with_missing_explicit_path_fails() {
		let result = load_config(Some(Path::new("/nonexistent/farm.toml")));
		assert!(matches!(result, Err(ConfigError::FileRead { .. })));
	}
}
