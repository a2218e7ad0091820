//! Concurrent dense and lexical retrieval merged by reciprocal rank fusion.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use verity_config::Retrieval;

use crate::{
	Candidate, KeywordSource, Result, SourceHit, VectorSource,
	fusion::{self, cmp_f64_desc},
};

pub struct HybridRetriever {
	vector: Arc<dyn VectorSource>,
	keyword: Arc<dyn KeywordSource>,
	cfg: Retrieval,
}
impl HybridRetriever {
	pub fn new(
		vector: Arc<dyn VectorSource>,
		keyword: Arc<dyn KeywordSource>,
		cfg: Retrieval,
	) -> Self {
		Self { vector, keyword, cfg }
	}

	/// Queries both sources concurrently and returns at most `candidate_budget` candidates in
	/// descending fused order.
	///
	/// A source that fails or exceeds `source_timeout_ms` contributes an empty list, so one
	/// healthy source is enough to produce candidates.
	pub async fn retrieve(&self, query: &str) -> Vec<Candidate> {
		let timeout = Duration::from_millis(self.cfg.source_timeout_ms);
		let (vector_hits, keyword_hits) = tokio::join!(
			run_source("vector", timeout, self.vector.search(query)),
			run_source("keyword", timeout, self.keyword.search(query)),
		);
		let candidates = merge_candidates(
			&vector_hits,
			&keyword_hits,
			self.cfg.rrf_k,
			self.cfg.candidate_budget as usize,
		);

		tracing::info!(
			vector_hits = vector_hits.len(),
			keyword_hits = keyword_hits.len(),
			candidates = candidates.len(),
			"Hybrid retrieval completed."
		);

		candidates
	}
}

async fn run_source<F>(label: &'static str, timeout: Duration, search: F) -> Vec<SourceHit>
where
	F: Future<Output = Result<Vec<SourceHit>>>,
{
	match tokio::time::timeout(timeout, search).await {
		Ok(Ok(hits)) => hits,
		Ok(Err(err)) => {
			tracing::warn!(error = %err, source = label, "Retrieval source failed.");

			Vec::new()
		},
		Err(_) => {
			tracing::warn!(
				source = label,
				timeout_ms = timeout.as_millis() as u64,
				"Retrieval source timed out."
			);

			Vec::new()
		},
	}
}

/// Folds both ranked lists into unique candidates keyed by `key`.
///
/// Text and payload come from the first list that returned the key. Keyless hits and repeats of
/// a key within the same list are dropped. The sort is stable, so equal fused scores keep
/// vector-first discovery order.
pub fn merge_candidates(
	vector_hits: &[SourceHit],
	keyword_hits: &[SourceHit],
	rrf_k: u32,
	budget: usize,
) -> Vec<Candidate> {
	let fused = fusion::fuse(&[vector_hits, keyword_hits], rrf_k);
	let mut index: HashMap<String, usize> = HashMap::new();
	let mut candidates: Vec<Candidate> = Vec::new();

	for hit in vector_hits.iter().filter(|hit| hit.has_key()) {
		if index.contains_key(&hit.key) {
			continue;
		}

		index.insert(hit.key.clone(), candidates.len());
		candidates.push(Candidate {
			key: hit.key.clone(),
			text: hit.text.clone(),
			payload: hit.payload.clone(),
			vector_score: Some(hit.score),
			keyword_score: None,
			rrf_score: fused.get(&hit.key).unwrap_or(0.0),
			rerank_score: None,
		});
	}

	for hit in keyword_hits.iter().filter(|hit| hit.has_key()) {
		match index.get(&hit.key) {
			Some(&pos) => {
				let candidate = &mut candidates[pos];

				if candidate.keyword_score.is_none() {
					candidate.keyword_score = Some(hit.score);
				}
			},
			None => {
				index.insert(hit.key.clone(), candidates.len());
				candidates.push(Candidate {
					key: hit.key.clone(),
					text: hit.text.clone(),
					payload: hit.payload.clone(),
					vector_score: None,
					keyword_score: Some(hit.score),
					rrf_score: fused.get(&hit.key).unwrap_or(0.0),
					rerank_score: None,
				});
			},
		}
	}

	candidates.sort_by(|a, b| cmp_f64_desc(a.rrf_score, b.rrf_score));
	candidates.truncate(budget);

	candidates
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hits(keys: &[&str], score: f32) -> Vec<SourceHit> {
		keys.iter().map(|key| SourceHit::new(*key, format!("text {key}"), score)).collect()
	}

	fn keys(candidates: &[Candidate]) -> Vec<&str> {
		candidates.iter().map(|candidate| candidate.key.as_str()).collect()
	}

	#[test]
	fn shared_keys_carry_both_scores_and_rank_first() {
		let vector = hits(&["a", "b", "c"], 0.8);
		let keyword = hits(&["c", "d"], 4.2);
		let merged = merge_candidates(&vector, &keyword, 60, 10);
		let shared = &merged[0];

		assert_eq!(shared.key, "c");
		assert_eq!(shared.vector_score, Some(0.8));
		assert_eq!(shared.keyword_score, Some(4.2));
		assert_eq!(merged.len(), 4);
	}

	#[test]
	fn candidates_are_unique_and_sorted_by_fused_score() {
		let vector = hits(&["a", "b"], 0.5);
		let keyword = hits(&["b", "a"], 1.0);
		let merged = merge_candidates(&vector, &keyword, 60, 10);

		assert_eq!(merged.len(), 2);
		assert!(merged.windows(2).all(|pair| pair[0].rrf_score >= pair[1].rrf_score));
	}

	#[test]
	fn equal_fused_scores_keep_vector_first_order() {
		let vector = hits(&["v"], 0.5);
		let keyword = hits(&["k"], 1.0);
		let merged = merge_candidates(&vector, &keyword, 60, 10);

		assert_eq!(keys(&merged), vec!["v", "k"]);
		assert_eq!(merged[0].keyword_score, None);
		assert_eq!(merged[1].vector_score, None);
	}

	#[test]
	fn budget_truncates_after_sorting() {
		let vector = hits(&["a", "b", "c", "d"], 0.5);
		let keyword = hits(&["d"], 1.0);
		let merged = merge_candidates(&vector, &keyword, 60, 2);

		assert_eq!(keys(&merged), vec!["d", "a"]);
	}

	#[test]
	fn keyless_hits_never_become_candidates() {
		let vector = hits(&["", "a"], 0.5);
		let keyword = hits(&["  "], 1.0);
		let merged = merge_candidates(&vector, &keyword, 60, 10);

		assert_eq!(keys(&merged), vec!["a"]);
		assert_eq!(merged[0].rrf_score, 1.0 / 62.0);
	}

	#[test]
	fn repeated_key_keeps_first_occurrence() {
		let vector = vec![SourceHit::new("a", "first", 0.9), SourceHit::new("a", "second", 0.1)];
		let merged = merge_candidates(&vector, &[], 60, 10);

		assert_eq!(merged.len(), 1);
		assert_eq!(merged[0].text, "first");
		assert_eq!(merged[0].vector_score, Some(0.9));
	}

	#[test]
	fn empty_inputs_yield_no_candidates() {
		assert!(merge_candidates(&[], &[], 60, 10).is_empty());
	}
}
