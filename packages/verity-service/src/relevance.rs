use verity_config::Relevance;

use crate::Candidate;

#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceOutcome {
	/// Candidates at or above the threshold, in input order.
	pub admitted: Vec<Candidate>,
	pub sufficient: bool,
}

/// Gates reranked candidates on a minimum score and a minimum admitted count.
///
/// The strict threshold applies while cross-encoder scores are meaningful. With reranking
/// disabled every candidate carries the neutral score, so the permissive baseline is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceFilter {
	threshold: f32,
	min_relevant_count: usize,
}
impl RelevanceFilter {
	pub fn new(cfg: &Relevance) -> Self {
		let threshold =
			if cfg.enable_reranking { cfg.rerank_min_score } else { cfg.baseline_min_score };

		Self { threshold, min_relevant_count: cfg.min_relevant_count as usize }
	}

	pub fn threshold(&self) -> f32 {
		self.threshold
	}

	pub fn min_relevant_count(&self) -> usize {
		self.min_relevant_count
	}

	/// A candidate without a rerank score is treated as scoring zero.
	pub fn filter(&self, candidates: Vec<Candidate>) -> RelevanceOutcome {
		let total = candidates.len();
		let admitted: Vec<Candidate> = candidates
			.into_iter()
			.filter(|candidate| candidate.rerank_score.unwrap_or(0.0) >= self.threshold)
			.collect();
		let sufficient = admitted.len() >= self.min_relevant_count;

		tracing::debug!(
			total,
			admitted = admitted.len(),
			threshold = self.threshold,
			sufficient,
			"Applied relevance filter."
		);

		RelevanceOutcome { admitted, sufficient }
	}
}
