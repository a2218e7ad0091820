use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of a source's ranked list. Lists are ordered best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceHit {
	/// Blank keys mark hits that cannot be correlated across sources.
	pub key: String,
	pub text: String,
	#[serde(default)]
	pub payload: Map<String, Value>,
	pub score: f32,
}
impl SourceHit {
	pub fn new(key: impl Into<String>, text: impl Into<String>, score: f32) -> Self {
		Self { key: key.into(), text: text.into(), payload: Map::new(), score }
	}

	pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
		self.payload = payload;

		self
	}

	pub fn has_key(&self) -> bool {
		!self.key.trim().is_empty()
	}
}

/// A unit of evidence after fusion. Per-source scores are present only when that source
/// returned the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub key: String,
	pub text: String,
	pub payload: Map<String, Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vector_score: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub keyword_score: Option<f32>,
	pub rrf_score: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rerank_score: Option<f32>,
}
impl Candidate {
	pub fn payload_str(&self, field: &str) -> Option<&str> {
		self.payload.get(field).and_then(Value::as_str)
	}

	pub fn title(&self) -> &str {
		self.payload_str("title").unwrap_or("Untitled")
	}

	pub fn source(&self) -> &str {
		self.payload_str("source").unwrap_or("unknown source")
	}
}
