use std::sync::Arc;

use serde_json::Map;

use verity_config::RerankProviderConfig;
use verity_service::{Candidate, RerankScore, Reranker};
use verity_testkit::{FailingRerank, TextRerank};

fn candidates(texts: &[&str]) -> Vec<Candidate> {
	texts
		.iter()
		.enumerate()
		.map(|(idx, text)| Candidate {
			key: format!("k{idx}"),
			text: text.to_string(),
			payload: Map::new(),
			vector_score: Some(0.5),
			keyword_score: None,
			rrf_score: 0.01,
			rerank_score: None,
		})
		.collect()
}

fn configured() -> RerankProviderConfig {
	RerankProviderConfig {
		url: Some("http://127.0.0.1:1/rerank".to_string()),
		..RerankProviderConfig::default()
	}
}

fn neutral(count: usize) -> Vec<RerankScore> {
	(0..count).map(|index| RerankScore { index, score: 1.0 }).collect()
}

#[tokio::test]
async fn unconfigured_endpoint_yields_neutral_scores_without_calling_provider() {
	let provider = Arc::new(TextRerank::default());
	let reranker = Reranker::new(provider.clone(), RerankProviderConfig::default());
	let scores = reranker.rerank("q", &candidates(&["a", "b", "c"])).await;

	assert_eq!(scores, neutral(3));
	assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn provider_failure_yields_neutral_scores() {
	let provider = Arc::new(FailingRerank::default());
	let reranker = Reranker::new(provider.clone(), configured());
	let scores = reranker.rerank("q", &candidates(&["a", "b"])).await;

	assert_eq!(scores, neutral(2));
	assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn provider_scores_are_returned_by_index() {
	let provider = Arc::new(TextRerank::new([("relevant", 0.92), ("noise", 0.03)]));
	let reranker = Reranker::new(provider.clone(), configured());
	let scores = reranker.rerank("q", &candidates(&["noise", "relevant"])).await;

	assert_eq!(
		scores,
		vec![RerankScore { index: 0, score: 0.03 }, RerankScore { index: 1, score: 0.92 }]
	);
}

#[tokio::test]
async fn empty_input_skips_the_provider() {
	let provider = Arc::new(TextRerank::default());
	let reranker = Reranker::new(provider.clone(), configured());

	assert!(reranker.rerank("q", &[]).await.is_empty());
	assert_eq!(provider.calls(), 0);
}
