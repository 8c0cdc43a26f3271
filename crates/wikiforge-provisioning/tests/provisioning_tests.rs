// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end provisioning runs against the in-memory platform.
//!
//! Tests cover:
//! - Wikis declared in TOML, provisioned sequentially
//! - Root wiki extensions landing on the root namespace
//! - Upgrading an extension between runs
//! - Parallel runs sharing the executor's concurrency limit

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use wikiforge_jobs::JobExecutor;
use wikiforge_provisioning::memory::{InMemoryPlatform, PlatformEvent};
use wikiforge_provisioning::{
	ExecutorJobRunner, ExtensionId, MembershipType, Namespace, Orchestrator, OrchestratorSettings,
	PlatformServices, ProvisioningError, WikiDescriptor, WikiOutcome, ROOT_WIKI_ID,
};

#[derive(Deserialize)]
struct Declared {
	wikis: Vec<WikiDescriptor>,
}

fn declared(toml_src: &str) -> Vec<WikiDescriptor> {
	toml::from_str::<Declared>(toml_src).unwrap().wikis
}

struct Harness {
	platform: Arc<InMemoryPlatform>,
	executor: Arc<JobExecutor>,
	orchestrator: Orchestrator,
}

fn harness(platform: InMemoryPlatform, max_concurrent: usize, settings: OrchestratorSettings) -> Harness {
	let platform = Arc::new(platform);
	let executor = Arc::new(JobExecutor::new(max_concurrent));
	let services = PlatformServices::from_platform(Arc::clone(&platform));
	let runner = ExecutorJobRunner::new(Arc::clone(&executor), services.clone(), ROOT_WIKI_ID);
	let orchestrator = Orchestrator::new(Arc::new(runner), services.listeners, settings);
	Harness {
		platform,
		executor,
		orchestrator,
	}
}

const FARM: &str = r#"
[[wikis]]
id = "xwiki"
extensions = ["org.example:platform-lib:1.0", "org.example:platform-ui:1.0:xar"]

[[wikis]]
id = "dept1"
pretty_name = "Department 1"
membership = "INVITE"
extensions = ["ext:foo:1.0"]

[[wikis]]
id = "dept2"
owner = "dept2:Admins.alice"
"#;

#[tokio::test]
async fn test_declared_farm_is_provisioned_in_order() {
	let wikis = declared(FARM);
	assert_eq!(wikis[1].membership, MembershipType::Invite);
	assert_eq!(wikis[2].pretty_name, "XWiki");

	let h = harness(InMemoryPlatform::new(ROOT_WIKI_ID), 4, OrchestratorSettings::default());
	let report = h.orchestrator.run(&wikis).await.unwrap();

	assert_eq!(report.completed(), vec!["xwiki", "dept1", "dept2"]);
	assert!(h.platform.registered_listeners().is_empty());
	assert_eq!(
		h.platform.installed(&Namespace::Root),
		vec![ExtensionId::new("org.example", "platform-lib", "1.0")]
	);
	assert_eq!(
		h.platform.installed(&Namespace::wiki("xwiki")),
		vec![ExtensionId::new("org.example", "platform-ui", "1.0").with_type("xar")]
	);
	assert_eq!(
		h.platform.installed(&Namespace::wiki("dept1")),
		vec![ExtensionId::new("ext", "foo", "1.0")]
	);
	assert!(h.platform.installed(&Namespace::wiki("dept2")).is_empty());

	let requests = h.platform.creation_requests();
	let ids: Vec<_> = requests.iter().map(|r| r.id.as_str()).collect();
	assert_eq!(ids, vec!["dept1", "dept2"]);
	assert_eq!(requests[0].pretty_name, "Department 1");

	let dept2_user = h.platform.events().into_iter().find_map(|e| match e {
		PlatformEvent::InstallRequested {
			namespace,
			acting_user,
			..
		} if namespace == Namespace::wiki("dept2") => acting_user,
		_ => None,
	});
	assert_eq!(dept2_user.as_deref(), Some("dept2:Admins.alice"));

	h.executor.shutdown().await;
}

#[tokio::test]
async fn test_new_version_replaces_installed_one() {
	let h = harness(InMemoryPlatform::new(ROOT_WIKI_ID), 4, OrchestratorSettings::default());

	h.orchestrator
		.run(&declared(
			r#"
[[wikis]]
id = "dept1"
extensions = ["ext:foo:1.0", "ext:bar:1.0"]
"#,
		))
		.await
		.unwrap();
	h.orchestrator
		.run(&declared(
			r#"
[[wikis]]
id = "dept1"
extensions = ["ext:foo:2.0"]
"#,
		))
		.await
		.unwrap();

	assert_eq!(
		h.platform.installed(&Namespace::wiki("dept1")),
		vec![ExtensionId::new("ext", "foo", "2.0"), ExtensionId::new("ext", "bar", "1.0")]
	);
}

#[tokio::test(start_paused = true)]
async fn test_parallel_run_with_small_pool_finishes_within_deadline() {
	let mut platform = InMemoryPlatform::new(ROOT_WIKI_ID);
	let mut wikis = vec![WikiDescriptor::new(ROOT_WIKI_ID)];
	for i in 0..6 {
		let id = format!("team{i}");
		platform = platform.delay_creation_of(id.clone(), Duration::from_secs(4));
		wikis.push(WikiDescriptor::new(id));
	}
	let h = harness(
		platform,
		2,
		OrchestratorSettings {
			parallel: true,
			..Default::default()
		},
	);

	let report = h.orchestrator.run(&wikis).await.unwrap();

	assert_eq!(report.completed().len(), 7);
	// Three waves of two four-second creations, observed at the next poll.
	assert!((15_000..20_000).contains(&report.elapsed_ms), "took {}ms", report.elapsed_ms);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_wiki_fails_run_but_others_are_provisioned() {
	let h = harness(
		InMemoryPlatform::new(ROOT_WIKI_ID).hang_creation_of("stuck"),
		4,
		OrchestratorSettings {
			parallel: true,
			poll_interval: Duration::from_secs(1),
			deadline_polls: 3,
			..Default::default()
		},
	);
	let wikis = vec![
		WikiDescriptor::new(ROOT_WIKI_ID),
		WikiDescriptor::new("stuck"),
		WikiDescriptor::new("fine").with_extensions(["ext:foo:1.0".parse().unwrap()]),
	];

	let err = h.orchestrator.run(&wikis).await.unwrap_err();

	match err {
		ProvisioningError::Incomplete { unfinished } => assert_eq!(unfinished, vec!["stuck"]),
		e => panic!("Expected Incomplete error, got: {:?}", e),
	}
	assert!(h.platform.wiki_exists("fine"));
	assert_eq!(h.platform.installed(&Namespace::wiki("fine")).len(), 1);
	assert!(!h.platform.wiki_exists("stuck"));
}

#[tokio::test]
async fn test_failed_wiki_is_reported_with_cause() {
	let h = harness(
		InMemoryPlatform::new(ROOT_WIKI_ID).fail_creation_of("broken"),
		4,
		OrchestratorSettings::default(),
	);
	let wikis = vec![WikiDescriptor::new("broken"), WikiDescriptor::new("dept1")];

	let report = h.orchestrator.run(&wikis).await.unwrap();

	match report.outcome("broken") {
		Some(WikiOutcome::Failed { error }) => assert!(error.contains("simulated creation failure")),
		other => panic!("Expected failed outcome, got: {:?}", other),
	}
	assert_eq!(report.outcome("dept1"), Some(&WikiOutcome::Completed));
}
