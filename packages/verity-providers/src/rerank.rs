// std
use std::time::Duration as StdDuration;

// crates.io
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Cross-encoder score for the document at `index` of the request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RerankScore {
	pub index: usize,
	pub score: f32,
}

pub async fn rerank(
	cfg: &verity_config::RerankProviderConfig,
	query: &str,
	docs: &[String],
) -> Result<Vec<RerankScore>> {
	let Some(url) = cfg.url.as_deref() else {
		return Err(Error::InvalidConfig {
			message: "Rerank endpoint url is not configured.".to_string(),
		});
	};
	let client = Client::builder().timeout(StdDuration::from_millis(cfg.timeout_ms)).build()?;
	let body = serde_json::json!({ "query": query, "documents": docs });
	let res = client
		.post(url)
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_rerank_response(json, docs.len())
}

/// Accepts a bare `[{index, score}]` array or an object wrapping `results`/`data`, with either
/// `score` or `relevance_score` per item. The output is ordered by index.
fn parse_rerank_response(json: Value, doc_count: usize) -> Result<Vec<RerankScore>> {
	let results = json
		.as_array()
		.or_else(|| json.get("results").and_then(|v| v.as_array()))
		.or_else(|| json.get("data").and_then(|v| v.as_array()))
		.ok_or_else(|| Error::InvalidResponse {
			message: "Rerank response is missing results array.".to_string(),
		})?;
	let mut scores = Vec::with_capacity(results.len());

	for item in results {
		let index = item.get("index").and_then(|v| v.as_u64()).ok_or_else(|| {
			Error::InvalidResponse { message: "Rerank result missing index.".to_string() }
		})? as usize;
		let score = item
			.get("score")
			.or_else(|| item.get("relevance_score"))
			.and_then(|v| v.as_f64())
			.ok_or_else(|| Error::InvalidResponse {
				message: "Rerank result missing score.".to_string(),
			})? as f32;

		if index >= doc_count {
			tracing::warn!(index, doc_count, "Rerank result index out of range.");

			continue;
		}

		scores.push(RerankScore { index, score });
	}

	scores.sort_by_key(|item| item.index);

	Ok(scores)
}
