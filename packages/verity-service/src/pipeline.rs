use serde::{Deserialize, Serialize};

use crate::{
	Candidate, ChainOfThought, Error, RagService, Result,
	progress::{self, PipelineStage, ProgressEvent, ProgressObserver, StageStatus},
	rerank::{self, apply_rerank_scores, sort_by_rerank_score},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
	#[default]
	Default,
	News,
}
impl ChatMode {
	pub fn requires_reasoning(self) -> bool {
		matches!(self, Self::News)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagRequest {
	pub query: String,
	#[serde(default)]
	pub mode: ChatMode,
}
impl RagRequest {
	pub fn new(query: impl Into<String>, mode: ChatMode) -> Self {
		Self { query: query.into(), mode }
	}
}

/// Everything a caller needs to ground an answer. The caller decides how to phrase an answer
/// when `sufficient` is false.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidencePackage {
	pub query: String,
	pub mode: ChatMode,
	pub sufficient: bool,
	/// Admitted candidates in descending rerank order.
	pub admitted: Vec<Candidate>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub chain_of_thought: Option<ChainOfThought>,
	/// Fused candidates considered before the relevance gate.
	pub candidate_count: usize,
}

impl RagService {
	/// Retrieves, rescores, and gates evidence for one query, then runs the reasoning trace when
	/// the mode asks for it and the evidence is sufficient.
	///
	/// Source and rerank failures degrade silently. Only a blank query or a reasoning failure
	/// returns an error.
	pub async fn run(
		&self,
		request: RagRequest,
		observer: Option<&dyn ProgressObserver>,
	) -> Result<EvidencePackage> {
		let query = request.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		progress::dispatch(
			observer,
			ProgressEvent::stage(PipelineStage::Retrieval, StageStatus::Starting, None),
		);

		let mut candidates = self.retriever().retrieve(query).await;
		let candidate_count = candidates.len();

		progress::dispatch(
			observer,
			ProgressEvent::stage(
				PipelineStage::Retrieval,
				StageStatus::Completed,
				Some(candidate_count),
			),
		);

		if !candidates.is_empty() {
			progress::dispatch(
				observer,
				ProgressEvent::stage(PipelineStage::Rerank, StageStatus::Starting, None),
			);

			let scores = if self.cfg.relevance.enable_reranking {
				self.reranker().rerank(query, &candidates).await
			} else {
				rerank::neutral_scores(candidates.len())
			};

			apply_rerank_scores(&mut candidates, &scores);
			sort_by_rerank_score(&mut candidates);
			progress::dispatch(
				observer,
				ProgressEvent::stage(
					PipelineStage::Rerank,
					StageStatus::Completed,
					Some(scores.len()),
				),
			);
		}

		let outcome = self.relevance_filter().filter(candidates);
		let relevance_status =
			if outcome.sufficient { StageStatus::Completed } else { StageStatus::InsufficientData };

		progress::dispatch(
			observer,
			ProgressEvent::stage(
				PipelineStage::Relevance,
				relevance_status,
				Some(outcome.admitted.len()),
			),
		);

		if !outcome.sufficient {
			tracing::info!(
				candidates = candidate_count,
				admitted = outcome.admitted.len(),
				"Evidence is insufficient."
			);

			return Ok(EvidencePackage {
				query: query.to_string(),
				mode: request.mode,
				sufficient: false,
				admitted: outcome.admitted,
				chain_of_thought: None,
				candidate_count,
			});
		}

		let chain_of_thought = if request.mode.requires_reasoning() && self.cfg.reasoning.enabled {
			progress::dispatch(
				observer,
				ProgressEvent::stage(PipelineStage::Reasoning, StageStatus::Starting, None),
			);

			let trace = self.orchestrator().run(query, &outcome.admitted, observer).await?;

			progress::dispatch(
				observer,
				ProgressEvent::stage(
					PipelineStage::Reasoning,
					StageStatus::Completed,
					Some(trace.thoughts.len()),
				),
			);

			Some(trace)
		} else {
			None
		};

		tracing::info!(
			candidates = candidate_count,
			admitted = outcome.admitted.len(),
			reasoning = chain_of_thought.is_some(),
			"Evidence pipeline completed."
		);

		Ok(EvidencePackage {
			query: query.to_string(),
			mode: request.mode,
			sufficient: true,
			admitted: outcome.admitted,
			chain_of_thought,
			candidate_count,
		})
	}
}
