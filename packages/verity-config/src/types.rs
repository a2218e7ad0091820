use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub relevance: Relevance,
	#[serde(default)]
	pub reasoning: Reasoning,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	/// Optional. Required for Qdrant Cloud deployments.
	pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	#[serde(default)]
	pub rerank: RerankProviderConfig,
	pub completion: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Cross-encoder endpoint. A missing `url` disables remote scoring and every candidate receives
/// the neutral score.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RerankProviderConfig {
	pub url: Option<String>,
	pub api_key: Option<String>,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}
impl Default for RerankProviderConfig {
	fn default() -> Self {
		Self { url: None, api_key: None, timeout_ms: 15_000, default_headers: Map::new() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	/// Reciprocal rank fusion smoothing constant.
	pub rrf_k: u32,
	/// Upper bound on fused candidates handed to the reranker.
	pub candidate_budget: u32,
	pub vector_top_k: u32,
	pub keyword_top_k: u32,
	pub source_timeout_ms: u64,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			rrf_k: 60,
			candidate_budget: 40,
			vector_top_k: 30,
			keyword_top_k: 30,
			source_timeout_ms: 10_000,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Relevance {
	pub enable_reranking: bool,
	/// Applied when reranking is enabled.
	pub rerank_min_score: f32,
	/// Applied when reranking is disabled so neutral scores still pass.
	pub baseline_min_score: f32,
	pub min_relevant_count: u32,
}
impl Default for Relevance {
	fn default() -> Self {
		Self {
			enable_reranking: true,
			rerank_min_score: 0.5,
			baseline_min_score: 0.01,
			min_relevant_count: 2,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Reasoning {
	pub enabled: bool,
	pub max_sources: u32,
	pub summary_chars: u32,
}
impl Default for Reasoning {
	fn default() -> Self {
		Self { enabled: true, max_sources: 10, summary_chars: 200 }
	}
}
