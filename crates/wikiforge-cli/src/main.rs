// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! wikiforge - provisions a wiki farm from a TOML description.

use anyhow::Context;
use clap::Parser;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wikiforge_config::WikiforgeConfig;
use wikiforge_jobs::JobExecutor;
use wikiforge_platform_local::LocalPlatform;
use wikiforge_provisioning::memory::InMemoryPlatform;
use wikiforge_provisioning::{
	ExecutorJobRunner, Orchestrator, PlatformServices, ProvisioningError, ProvisioningReport,
};

/// wikiforge - create wikis and install their extensions.
#[derive(Parser, Debug)]
#[command(name = "wikiforge", version)]
struct Args {
	/// Config file describing the run and its wikis
	#[arg(long, env = "WIKIFORGE_CONFIG")]
	config: Option<PathBuf>,

	/// Set up non-root wikis concurrently
	#[arg(long)]
	parallel: bool,

	/// Fail the run when any wiki fails, not only when one never finishes
	#[arg(long)]
	strict: bool,

	/// Directory holding the wiki farm
	#[arg(long)]
	data_dir: Option<PathBuf>,

	/// Provision against an in-memory platform and leave the data directory alone
	#[arg(long)]
	dry_run: bool,

	/// Emit logs and the final report as JSON
	#[arg(long)]
	json: bool,
}

impl Args {
	fn apply(&self, config: &mut WikiforgeConfig) {
		if self.parallel {
			config.provisioning.parallel = true;
		}
		if self.strict {
			config.provisioning.strict = true;
		}
		if let Some(data_dir) = &self.data_dir {
			config.platform.data_dir = data_dir.clone();
		}
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let mut config =
		wikiforge_config::load_config(args.config.as_deref()).context("Failed to load configuration")?;
	args.apply(&mut config);

	init_tracing(&config.logging.level, args.json);

	let report = run(config, args.dry_run, shutdown_signal()).await?;

	if args.json {
		println!("{}", serde_json::to_string_pretty(&report)?);
	}
	Ok(())
}

fn init_tracing(level: &str, json: bool) {
	let registry = tracing_subscriber::registry().with(
		tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()),
	);
	if json {
		registry.with(tracing_subscriber::fmt::layer().json()).init();
	} else {
		registry.with(tracing_subscriber::fmt::layer()).init();
	}
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		warn!(error = %e, "Failed to listen for ctrl-c");
		std::future::pending::<()>().await;
	}
}

async fn run<F>(config: WikiforgeConfig, dry_run: bool, interrupt: F) -> anyhow::Result<ProvisioningReport>
where
	F: Future<Output = ()>,
{
	let root_wiki_id = config.provisioning.root_wiki_id.clone();

	if dry_run {
		info!(wiki_count = config.wikis.len(), "Dry run against an in-memory platform");
		let platform = Arc::new(InMemoryPlatform::new(root_wiki_id));
		let result = provision(&config, PlatformServices::from_platform(platform), interrupt).await;
		return Ok(result?);
	}

	let data_dir = &config.platform.data_dir;
	let platform = Arc::new(
		LocalPlatform::open(data_dir, root_wiki_id)
			.await
			.with_context(|| format!("Failed to open wiki farm at {}", data_dir.display()))?,
	);
	let result = provision(&config, PlatformServices::from_platform(Arc::clone(&platform)), interrupt).await;
	platform.close().await.context("Failed to close wiki farm")?;
	Ok(result?)
}

async fn provision<F>(
	config: &WikiforgeConfig,
	services: PlatformServices,
	interrupt: F,
) -> Result<ProvisioningReport, ProvisioningError>
where
	F: Future<Output = ()>,
{
	let settings = config.provisioning.orchestrator_settings();
	let grace = settings.poll_interval;

	let executor = Arc::new(JobExecutor::new(config.provisioning.max_concurrent_jobs));
	let runner = ExecutorJobRunner::new(Arc::clone(&executor), services.clone(), settings.root_wiki_id.clone());
	let orchestrator = Orchestrator::new(Arc::new(runner), services.listeners, settings);

	let result = orchestrator.run_until(&config.wikis, interrupt).await;

	// Unfinished jobs keep running; give them one poll interval before exiting.
	if tokio::time::timeout(grace, executor.shutdown()).await.is_err() {
		warn!("Abandoning jobs that are still running");
	}

	result
}
