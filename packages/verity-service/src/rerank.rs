//! Cross-encoder rescoring of fused candidates with a neutral fallback.

use std::{cmp::Ordering, sync::Arc};

use verity_config::RerankProviderConfig;

use crate::{Candidate, RerankProvider, RerankScore};

/// Score assigned to every document when the cross-encoder is unavailable.
pub const NEUTRAL_SCORE: f32 = 1.0;

pub struct Reranker {
	provider: Arc<dyn RerankProvider>,
	cfg: RerankProviderConfig,
}
impl Reranker {
	pub fn new(provider: Arc<dyn RerankProvider>, cfg: RerankProviderConfig) -> Self {
		Self { provider, cfg }
	}

	pub fn is_configured(&self) -> bool {
		self.cfg.url.is_some()
	}

	/// Scores each candidate's text against `query`.
	///
	/// Never fails. An unconfigured endpoint or any provider error yields one neutral score per
	/// candidate, so the pipeline degrades to fused order.
	pub async fn rerank(&self, query: &str, candidates: &[Candidate]) -> Vec<RerankScore> {
		if candidates.is_empty() {
			return Vec::new();
		}
		if !self.is_configured() {
			tracing::debug!("Rerank endpoint is not configured. Using neutral scores.");

			return neutral_scores(candidates.len());
		}

		let docs: Vec<String> = candidates.iter().map(|candidate| candidate.text.clone()).collect();

		match self.provider.rerank(&self.cfg, query, &docs).await {
			Ok(scores) => scores,
			Err(err) => {
				tracing::warn!(
					error = %err,
					docs = docs.len(),
					"Rerank failed. Using neutral scores."
				);

				neutral_scores(docs.len())
			},
		}
	}
}

pub fn neutral_scores(count: usize) -> Vec<RerankScore> {
	(0..count).map(|index| RerankScore { index, score: NEUTRAL_SCORE }).collect()
}

/// Writes each score onto the candidate at its index. Out-of-range indices are ignored and
/// candidates without a score keep `None`. Non-finite scores are stored as `None`.
pub fn apply_rerank_scores(candidates: &mut [Candidate], scores: &[RerankScore]) {
	for score in scores {
		match candidates.get_mut(score.index) {
			Some(candidate) if score.score.is_finite() => candidate.rerank_score = Some(score.score),
			Some(candidate) => {
				tracing::warn!(
					index = score.index,
					score = %score.score,
					"Rerank score is not finite. Treating candidate as unscored."
				);

				candidate.rerank_score = None;
			},
			None => {
				tracing::warn!(
					index = score.index,
					candidates = candidates.len(),
					"Rerank score index is out of range."
				);
			},
		}
	}
}

/// Stable descending sort by rerank score. Ties keep fused order and unscored candidates sink.
pub fn sort_by_rerank_score(candidates: &mut [Candidate]) {
	candidates.sort_by(|a, b| match (a.rerank_score, b.rerank_score) {
		(Some(a), Some(b)) => cmp_f32_desc(a, b),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	});
}

/// Descending total order with NaN last.
fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.total_cmp(&a),
	}
}
