//! Four-phase reasoning trace generated for news-mode queries.
//!
//! Phases run in a fixed order and each one sees the outputs recorded before it. A failed phase
//! aborts the run; nothing after it is recorded.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use verity_config::{LlmProviderConfig, Reasoning};

use crate::{
	Candidate, ChatMessage, CompletionProvider, Error, Result,
	progress::{self, ProgressEvent, ProgressObserver, ThoughtData, ThoughtStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningPhaseKind {
	AnalyzeQuery,
	SearchStrategy,
	EvaluateSources,
	SynthesizeAnswer,
}
impl ReasoningPhaseKind {
	pub const ALL: [Self; 4] =
		[Self::AnalyzeQuery, Self::SearchStrategy, Self::EvaluateSources, Self::SynthesizeAnswer];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::AnalyzeQuery => "analyze_query",
			Self::SearchStrategy => "search_strategy",
			Self::EvaluateSources => "evaluate_sources",
			Self::SynthesizeAnswer => "synthesize_answer",
		}
	}
}

impl fmt::Display for ReasoningPhaseKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningPhase {
	pub phase: ReasoningPhaseKind,
	pub content: String,
	#[serde(with = "crate::time_serde")]
	pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainOfThought {
	pub success: bool,
	pub thoughts: Vec<ReasoningPhase>,
	pub total_phases: usize,
	#[serde(with = "crate::time_serde")]
	pub generated_at: OffsetDateTime,
}

/// Inputs visible to a phase's prompt builder.
pub struct PhaseContext<'a> {
	pub query: &'a str,
	pub sources: &'a [Candidate],
	pub previous: &'a [ReasoningPhase],
	pub settings: &'a Reasoning,
}

struct PhaseDescriptor {
	kind: ReasoningPhaseKind,
	instruction: &'static str,
	build_request: fn(&PhaseContext<'_>) -> String,
	completed_data: fn(String, &PhaseContext<'_>) -> ThoughtData,
}

const PHASES: [PhaseDescriptor; 4] = [
	PhaseDescriptor {
		kind: ReasoningPhaseKind::AnalyzeQuery,
		instruction: ANALYZE_QUERY_INSTRUCTION,
		build_request: analyze_query_request,
		completed_data: |analysis, _| ThoughtData::Analysis { analysis },
	},
	PhaseDescriptor {
		kind: ReasoningPhaseKind::SearchStrategy,
		instruction: SEARCH_STRATEGY_INSTRUCTION,
		build_request: search_strategy_request,
		completed_data: |strategy, _| ThoughtData::Strategy { strategy },
	},
	PhaseDescriptor {
		kind: ReasoningPhaseKind::EvaluateSources,
		instruction: EVALUATE_SOURCES_INSTRUCTION,
		build_request: evaluate_sources_request,
		completed_data: |evaluation, ctx| ThoughtData::Evaluation {
			evaluation,
			source_count: ctx.sources.len(),
		},
	},
	PhaseDescriptor {
		kind: ReasoningPhaseKind::SynthesizeAnswer,
		instruction: SYNTHESIZE_ANSWER_INSTRUCTION,
		build_request: synthesize_answer_request,
		completed_data: |reasoning, _| ThoughtData::Reasoning { reasoning },
	},
];

const ANALYZE_QUERY_INSTRUCTION: &str = "\
You are analyzing a news-related query to understand its key components.

Break the query down and identify:
1. Core topic or subject
2. Type of information sought (facts, opinions, updates, analysis)
3. Time sensitivity (recent events or historical background)
4. Key entities (people, companies, locations, events)
5. Subtopics worth exploring

Be concise and focused. Output the analysis in a clear, structured way.";

const SEARCH_STRATEGY_INSTRUCTION: &str = "\
Based on the query analysis, determine the best strategy for finding relevant news.

Consider:
1. Which keywords would be most effective
2. Which time range should be prioritized
3. Which kinds of sources would be most valuable
4. Which biases or blind spots to watch for

Provide a clear strategy for information gathering.";

const EVALUATE_SOURCES_INSTRUCTION: &str = "\
Evaluate news sources for their relevance and quality regarding a specific query.

For each source, consider:
1. Direct relevance to the query
2. Credibility and reputation
3. Recency and timeliness
4. Bias or perspective
5. Completeness of information

Summarize the overall source quality and any gaps.";

const SYNTHESIZE_ANSWER_INSTRUCTION: &str = "\
Based on the analysis and source evaluation, explain the approach for synthesizing a \
comprehensive answer.

Consider:
1. How to prioritize different pieces of information
2. How to handle conflicting reports or viewpoints
3. Which context or background is needed
4. How to structure the response for clarity
5. Which limitations or uncertainties to acknowledge

Explain the reasoning process for creating the final answer.";

pub struct ChainOfThoughtOrchestrator {
	completion: Arc<dyn CompletionProvider>,
	cfg: LlmProviderConfig,
	settings: Reasoning,
}
impl ChainOfThoughtOrchestrator {
	pub fn new(
		completion: Arc<dyn CompletionProvider>,
		cfg: LlmProviderConfig,
		settings: Reasoning,
	) -> Self {
		Self { completion, cfg, settings }
	}

	/// Runs every phase in order against the admitted `sources`.
	///
	/// On failure a `chain_of_thoughts_error` event is dispatched and the error names the phase
	/// that failed.
	pub async fn run(
		&self,
		query: &str,
		sources: &[Candidate],
		observer: Option<&dyn ProgressObserver>,
	) -> Result<ChainOfThought> {
		tracing::info!(sources = sources.len(), "Starting chain of thought.");

		let mut thoughts: Vec<ReasoningPhase> = Vec::with_capacity(PHASES.len());

		for descriptor in &PHASES {
			progress::dispatch(
				observer,
				ProgressEvent::thought(descriptor.kind, ThoughtStatus::Starting, None),
			);

			let ctx =
				PhaseContext { query, sources, previous: &thoughts, settings: &self.settings };
			let messages = vec![
				ChatMessage::system(descriptor.instruction),
				ChatMessage::user((descriptor.build_request)(&ctx)),
			];
			let content = match self.completion.complete(&self.cfg, &messages).await {
				Ok(content) => content.trim().to_string(),
				Err(err) => {
					tracing::error!(
						error = %err,
						phase = descriptor.kind.as_str(),
						"Chain of thought phase failed."
					);
					progress::dispatch(observer, ProgressEvent::thought_error(err.to_string()));

					return Err(Error::Reasoning {
						phase: descriptor.kind,
						message: err.to_string(),
					});
				},
			};
			let data = (descriptor.completed_data)(content.clone(), &ctx);

			thoughts.push(ReasoningPhase {
				phase: descriptor.kind,
				content,
				timestamp: OffsetDateTime::now_utc(),
			});
			progress::dispatch(
				observer,
				ProgressEvent::thought(descriptor.kind, ThoughtStatus::Completed, Some(data)),
			);
		}

		tracing::info!(phases = thoughts.len(), "Completed chain of thought.");

		Ok(ChainOfThought {
			success: true,
			total_phases: PHASES.len(),
			thoughts,
			generated_at: OffsetDateTime::now_utc(),
		})
	}
}

fn analyze_query_request(ctx: &PhaseContext<'_>) -> String {
	format!("Analyze this query: \"{}\"", ctx.query)
}

fn search_strategy_request(ctx: &PhaseContext<'_>) -> String {
	let analysis = phase_content(ctx.previous, ReasoningPhaseKind::AnalyzeQuery);

	format!(
		"Query: \"{}\"\nAnalysis: {analysis}\n\nWhat is the optimal search strategy?",
		ctx.query
	)
}

fn evaluate_sources_request(ctx: &PhaseContext<'_>) -> String {
	format!(
		"Query: \"{}\"\n\nAvailable sources:\n{}\n\nEvaluate these sources for answering the \
		 query.",
		ctx.query,
		source_listing(ctx.sources, ctx.settings.max_sources as usize)
	)
}

fn synthesize_answer_request(ctx: &PhaseContext<'_>) -> String {
	format!(
		"Query: \"{}\"\n\nPrevious thinking:\n{}\n\nAvailable sources: {} articles\n\nHow will you \
		 synthesize the final answer?",
		ctx.query,
		thoughts_summary(ctx.previous, ctx.settings.summary_chars as usize),
		ctx.sources.len()
	)
}

fn phase_content(previous: &[ReasoningPhase], kind: ReasoningPhaseKind) -> &str {
	previous.iter().find(|thought| thought.phase == kind).map_or("", |thought| &thought.content)
}

/// Numbered `N. "title" (source)` lines for at most `limit` candidates.
pub fn source_listing(sources: &[Candidate], limit: usize) -> String {
	sources
		.iter()
		.take(limit)
		.enumerate()
		.map(|(idx, candidate)| {
			format!("{}. \"{}\" ({})", idx + 1, candidate.title(), candidate.source())
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// `phase: <prefix>...` blocks, each prefix capped at `max_chars` characters.
pub fn thoughts_summary(previous: &[ReasoningPhase], max_chars: usize) -> String {
	previous
		.iter()
		.map(|thought| {
			let prefix: String = thought.content.chars().take(max_chars).collect();

			format!("{}: {prefix}...", thought.phase)
		})
		.collect::<Vec<_>>()
		.join("\n\n")
}
