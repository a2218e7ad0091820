//! Progress events streamed to an optional observer while a query runs.
//!
//! Dispatch is guarded: an observer that returns an error or panics is logged and otherwise
//! ignored, so a misbehaving transport can never fail retrieval or reasoning.

use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::{Result, reasoning::ReasoningPhaseKind};

pub const PIPELINE_EVENT: &str = "rag_pipeline";
pub const THOUGHT_EVENT: &str = "chain_of_thoughts";
pub const THOUGHT_ERROR_EVENT: &str = "chain_of_thoughts_error";

/// Receives `(event name, payload)` pairs. Implementations must return quickly.
pub trait ProgressObserver
where
	Self: Send + Sync,
{
	fn notify(&self, event: &ProgressEvent) -> Result<()>;
}
impl<F> ProgressObserver for F
where
	F: Fn(&ProgressEvent) -> Result<()> + Send + Sync,
{
	fn notify(&self, event: &ProgressEvent) -> Result<()> {
		self(event)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProgressEvent {
	Stage(StageEvent),
	Thought(ThoughtEvent),
	ThoughtError(ThoughtErrorEvent),
}
impl ProgressEvent {
	pub fn stage(stage: PipelineStage, status: StageStatus, count: Option<usize>) -> Self {
		Self::Stage(StageEvent { stage, status, count, timestamp: OffsetDateTime::now_utc() })
	}

	pub fn thought(
		phase: ReasoningPhaseKind,
		status: ThoughtStatus,
		data: Option<ThoughtData>,
	) -> Self {
		Self::Thought(ThoughtEvent { phase, status, timestamp: OffsetDateTime::now_utc(), data })
	}

	pub fn thought_error(error: impl Into<String>) -> Self {
		Self::ThoughtError(ThoughtErrorEvent {
			error: error.into(),
			timestamp: OffsetDateTime::now_utc(),
		})
	}

	pub fn name(&self) -> &'static str {
		match self {
			Self::Stage(_) => PIPELINE_EVENT,
			Self::Thought(_) => THOUGHT_EVENT,
			Self::ThoughtError(_) => THOUGHT_ERROR_EVENT,
		}
	}

	pub fn payload(&self) -> Value {
		serde_json::to_value(self).unwrap_or(Value::Null)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
	Retrieval,
	Rerank,
	Relevance,
	Reasoning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
	Starting,
	Completed,
	InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageEvent {
	pub stage: PipelineStage,
	pub status: StageStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub count: Option<usize>,
	#[serde(with = "crate::time_serde")]
	pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtStatus {
	Starting,
	Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThoughtEvent {
	pub phase: ReasoningPhaseKind,
	pub status: ThoughtStatus,
	#[serde(with = "crate::time_serde")]
	pub timestamp: OffsetDateTime,
	#[serde(flatten, skip_serializing_if = "Option::is_none")]
	pub data: Option<ThoughtData>,
}

/// Phase-specific fields carried by a `completed` thought event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ThoughtData {
	Analysis { analysis: String },
	Strategy { strategy: String },
	Evaluation { evaluation: String, source_count: usize },
	Reasoning { reasoning: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThoughtErrorEvent {
	pub error: String,
	#[serde(with = "crate::time_serde")]
	pub timestamp: OffsetDateTime,
}

pub(crate) fn dispatch(observer: Option<&dyn ProgressObserver>, event: ProgressEvent) {
	let Some(observer) = observer else { return };

	match panic::catch_unwind(AssertUnwindSafe(|| observer.notify(&event))) {
		Ok(Ok(())) => {},
		Ok(Err(err)) => {
			tracing::error!(error = %err, event = event.name(), "Progress observer failed.");
		},
		Err(_) => {
			tracing::error!(event = event.name(), "Progress observer panicked.");
		},
	}
}
