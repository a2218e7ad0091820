use std::sync::Arc;

use verity_config::Config;
use verity_service::{ChatMode, Error, EvidencePackage, RagRequest, RagService, SourceHit};
use verity_testkit::{
	FailingRerank, FailingSource, RecordingObserver, ScriptedCompletion, StaticSource, TextRerank,
	hit, service, test_config,
};

struct Harness {
	service: RagService,
	rerank: Arc<TextRerank>,
	completion: Arc<ScriptedCompletion>,
}

fn harness(cfg: Config, vector: Vec<SourceHit>, keyword: Vec<SourceHit>) -> Harness {
	let rerank = Arc::new(TextRerank::new([
		("Central bank raises rates by 25bp.", 0.93),
		("Analysts expected the hike.", 0.71),
		("Markets rallied on the decision.", 0.64),
		("Weather forecast for Sunday.", 0.04),
	]));
	let completion = Arc::new(ScriptedCompletion::new());
	let service = service(
		cfg,
		Arc::new(StaticSource::new(vector)),
		Arc::new(StaticSource::new(keyword)),
		rerank.clone(),
		completion.clone(),
	);

	Harness { service, rerank, completion }
}

fn news_hits() -> (Vec<SourceHit>, Vec<SourceHit>) {
	let vector = vec![
		hit("rates-1", "Central bank raises rates by 25bp.", "Rates rise", "Reuters"),
		hit("weather-1", "Weather forecast for Sunday.", "Sunday weather", "Local"),
		hit("rates-2", "Analysts expected the hike.", "No surprise", "FT"),
	];
	let keyword = vec![
		hit("rates-2", "Analysts expected the hike.", "No surprise", "FT"),
		hit("markets-1", "Markets rallied on the decision.", "Stocks up", "Bloomberg"),
	];

	(vector, keyword)
}

fn admitted_keys(package: &EvidencePackage) -> Vec<&str> {
	package.admitted.iter().map(|candidate| candidate.key.as_str()).collect()
}

fn stage_sequence(observer: &RecordingObserver) -> Vec<String> {
	observer
		.payloads()
		.into_iter()
		.filter(|(name, _)| *name == "rag_pipeline")
		.map(|(_, payload)| {
			format!(
				"{}:{}",
				payload["stage"].as_str().unwrap_or_default(),
				payload["status"].as_str().unwrap_or_default()
			)
		})
		.collect()
}

#[tokio::test]
async fn news_query_returns_gated_evidence_and_reasoning() {
	let (vector, keyword) = news_hits();
	let harness = harness(test_config(), vector, keyword);
	let observer = RecordingObserver::default();
	let request = RagRequest::new("What did the central bank decide?", ChatMode::News);
	let package = harness
		.service
		.run(request, Some(&observer))
		.await
		.expect("Failed to run pipeline.");
	let admitted = admitted_keys(&package);

	assert!(package.sufficient);
	assert_eq!(package.candidate_count, 4);
	assert_eq!(admitted, vec!["rates-1", "rates-2", "markets-1"]);
	assert_eq!(package.admitted[0].rerank_score, Some(0.93));
	assert_eq!(package.chain_of_thought.as_ref().map(|trace| trace.thoughts.len()), Some(4));
	assert_eq!(harness.rerank.calls(), 1);
	assert_eq!(harness.completion.call_count(), 4);
	assert_eq!(
		stage_sequence(&observer),
		vec![
			"retrieval:starting",
			"retrieval:completed",
			"rerank:starting",
			"rerank:completed",
			"relevance:completed",
			"reasoning:starting",
			"reasoning:completed",
		]
	);
}

#[tokio::test]
async fn default_mode_skips_reasoning() {
	let (vector, keyword) = news_hits();
	let harness = harness(test_config(), vector, keyword);
	let package = harness
		.service
		.run(RagRequest::new("central bank", ChatMode::Default), None)
		.await
		.expect("Failed to run pipeline.");

	assert!(package.sufficient);
	assert!(package.chain_of_thought.is_none());
	assert_eq!(harness.completion.call_count(), 0);
}

#[tokio::test]
async fn zero_results_are_insufficient_and_skip_downstream_calls() {
	let harness = harness(test_config(), Vec::new(), Vec::new());
	let observer = RecordingObserver::default();
	let package = harness
		.service
		.run(RagRequest::new("unknown topic", ChatMode::News), Some(&observer))
		.await
		.expect("Failed to run pipeline.");

	assert!(!package.sufficient);
	assert!(package.admitted.is_empty());
	assert!(package.chain_of_thought.is_none());
	assert_eq!(package.candidate_count, 0);
	assert_eq!(harness.rerank.calls(), 0);
	assert_eq!(harness.completion.call_count(), 0);
	assert_eq!(
		stage_sequence(&observer),
		vec!["retrieval:starting", "retrieval:completed", "relevance:insufficient_data"]
	);
}

#[tokio::test]
async fn too_few_relevant_candidates_skip_reasoning() {
	let vector = vec![
		hit("rates-1", "Central bank raises rates by 25bp.", "Rates rise", "Reuters"),
		hit("weather-1", "Weather forecast for Sunday.", "Sunday weather", "Local"),
	];
	let harness = harness(test_config(), vector, Vec::new());
	let package = harness
		.service
		.run(RagRequest::new("central bank", ChatMode::News), None)
		.await
		.expect("Failed to run pipeline.");
	let admitted = admitted_keys(&package);

	assert!(!package.sufficient);
	assert_eq!(admitted, vec!["rates-1"]);
	assert_eq!(harness.completion.call_count(), 0);
}

#[tokio::test]
async fn rerank_failure_falls_back_to_fused_order() {
	let (vector, keyword) = news_hits();
	let rerank = Arc::new(FailingRerank::default());
	let service = service(
		test_config(),
		Arc::new(StaticSource::new(vector)),
		Arc::new(StaticSource::new(keyword)),
		rerank.clone(),
		Arc::new(ScriptedCompletion::new()),
	);
	let package = service
		.run(RagRequest::new("central bank", ChatMode::Default), None)
		.await
		.expect("Failed to run pipeline.");
	let admitted = admitted_keys(&package);

	assert_eq!(rerank.calls(), 1);
	assert!(package.sufficient);
	assert_eq!(admitted, vec!["rates-2", "rates-1", "weather-1", "markets-1"]);
	assert!(package.admitted.iter().all(|candidate| candidate.rerank_score == Some(1.0)));
}

#[tokio::test]
async fn disabled_reranking_uses_neutral_scores_without_remote_call() {
	let (vector, keyword) = news_hits();
	let mut cfg = test_config();

	cfg.relevance.enable_reranking = false;

	let harness = harness(cfg, vector, keyword);
	let package = harness
		.service
		.run(RagRequest::new("central bank", ChatMode::Default), None)
		.await
		.expect("Failed to run pipeline.");

	assert_eq!(harness.rerank.calls(), 0);
	assert!(package.sufficient);
	assert_eq!(package.admitted.len(), 4);
}

#[tokio::test]
async fn one_failing_source_still_produces_evidence() {
	let (vector, _) = news_hits();
	let service = service(
		test_config(),
		Arc::new(StaticSource::new(vector)),
		Arc::new(FailingSource),
		Arc::new(TextRerank::new([
			("Central bank raises rates by 25bp.", 0.9),
			("Analysts expected the hike.", 0.8),
		])),
		Arc::new(ScriptedCompletion::new()),
	);
	let package = service
		.run(RagRequest::new("central bank", ChatMode::Default), None)
		.await
		.expect("Failed to run pipeline.");

	assert!(package.sufficient);
	assert_eq!(package.admitted.len(), 2);
	assert!(package.admitted.iter().all(|candidate| candidate.keyword_score.is_none()));
}

#[tokio::test]
async fn reasoning_failure_is_reported_as_error() {
	let (vector, keyword) = news_hits();
	let service = service(
		test_config(),
		Arc::new(StaticSource::new(vector)),
		Arc::new(StaticSource::new(keyword)),
		Arc::new(TextRerank::new([
			("Central bank raises rates by 25bp.", 0.9),
			("Analysts expected the hike.", 0.8),
		])),
		Arc::new(ScriptedCompletion::failing_on(1)),
	);
	let err = service
		.run(RagRequest::new("central bank", ChatMode::News), None)
		.await
		.expect_err("Expected reasoning to fail.");

	assert!(matches!(err, Error::Reasoning { .. }));
}

#[tokio::test]
async fn blank_query_is_rejected() {
	let (vector, keyword) = news_hits();
	let harness = harness(test_config(), vector, keyword);
	let err = harness
		.service
		.run(RagRequest::new("   ", ChatMode::News), None)
		.await
		.expect_err("Expected blank query to be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
	assert_eq!(harness.rerank.calls(), 0);
}

#[tokio::test]
async fn nan_rerank_score_drops_candidate_without_failing() {
	let (vector, keyword) = news_hits();
	let service = service(
		test_config(),
		Arc::new(StaticSource::new(vector)),
		Arc::new(StaticSource::new(keyword)),
		Arc::new(TextRerank::new([
			("Central bank raises rates by 25bp.", 0.93),
			("Analysts expected the hike.", f32::NAN),
			("Markets rallied on the decision.", 0.64),
			("Weather forecast for Sunday.", 0.04),
		])),
		Arc::new(ScriptedCompletion::new()),
	);
	let package = service
		.run(RagRequest::new("central bank", ChatMode::Default), None)
		.await
		.expect("Failed to run pipeline.");
	let admitted = admitted_keys(&package);

	assert!(package.sufficient);
	assert_eq!(admitted, vec!["rates-1", "markets-1"]);
}
