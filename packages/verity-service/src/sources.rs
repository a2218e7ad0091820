//! Qdrant-backed retrieval sources: dense search over the embedded query and server-side BM25.

use std::sync::Arc;

use qdrant_client::qdrant::ScoredPoint;

use verity_config::EmbeddingProviderConfig;
use verity_storage::{
	payload::{self, TEXT_FIELD},
	qdrant::QdrantStore,
};

use crate::{
	BoxFuture, EmbeddingProvider, Error, KeywordSource, Result, SourceHit, VectorSource,
};

pub struct QdrantVectorSource {
	store: Arc<QdrantStore>,
	embedding: Arc<dyn EmbeddingProvider>,
	cfg: EmbeddingProviderConfig,
	top_k: u32,
}
impl QdrantVectorSource {
	pub fn new(
		store: Arc<QdrantStore>,
		embedding: Arc<dyn EmbeddingProvider>,
		cfg: EmbeddingProviderConfig,
		top_k: u32,
	) -> Self {
		Self { store, embedding, cfg, top_k }
	}

	async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let texts = vec![query.to_string()];
		let vector = self.embedding.embed(&self.cfg, &texts).await?.into_iter().next().ok_or_else(
			|| Error::Provider { message: "Embedding provider returned no vectors.".to_string() },
		)?;

		if vector.len() != self.store.vector_dim as usize {
			return Err(Error::Provider {
				message: format!(
					"Embedding dimension mismatch: expected {}, got {}.",
					self.store.vector_dim,
					vector.len()
				),
			});
		}

		Ok(vector)
	}
}

impl VectorSource for QdrantVectorSource {
	fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Vec<SourceHit>>> {
		Box::pin(async move {
			let vector = self.embed_query(query).await?;
			let points = self.store.search_dense(vector, self.top_k).await?;

			Ok(collect_source_hits(&points))
		})
	}
}

pub struct QdrantKeywordSource {
	store: Arc<QdrantStore>,
	top_k: u32,
}
impl QdrantKeywordSource {
	pub fn new(store: Arc<QdrantStore>, top_k: u32) -> Self {
		Self { store, top_k }
	}
}

impl KeywordSource for QdrantKeywordSource {
	fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Vec<SourceHit>>> {
		Box::pin(async move {
			let points = self.store.search_keyword(query, self.top_k).await?;

			Ok(collect_source_hits(&points))
		})
	}
}

/// Converts scored points into hits, preserving rank order. Points with no usable key are
/// dropped with a warning.
pub fn collect_source_hits(points: &[ScoredPoint]) -> Vec<SourceHit> {
	let mut hits = Vec::with_capacity(points.len());

	for point in points {
		let Some(key) = payload::point_key(point) else {
			tracing::warn!("Scored point has no key or id. Skipping.");

			continue;
		};
		let text = payload::payload_string(&point.payload, TEXT_FIELD).unwrap_or_default();

		hits.push(
			SourceHit::new(key, text, point.score)
				.with_payload(payload::payload_to_json(&point.payload)),
		);
	}

	hits
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use qdrant_client::qdrant::{PointId, Value, point_id::PointIdOptions, value::Kind};

	use super::*;

	fn point(id: Option<u64>, payload: &[(&str, &str)], score: f32) -> ScoredPoint {
		let payload: HashMap<String, Value> = payload
			.iter()
			.map(|(field, value)| {
				(field.to_string(), Value { kind: Some(Kind::StringValue(value.to_string())) })
			})
			.collect();

		ScoredPoint {
			id: id.map(|num| PointId { point_id_options: Some(PointIdOptions::Num(num)) }),
			payload,
			score,
			..Default::default()
		}
	}

	#[test]
	fn hits_keep_rank_order_and_payload() {
		let points = vec![
			point(Some(1), &[("key", "doc-b"), ("text", "beta"), ("title", "B")], 0.9),
			point(Some(2), &[("text", "alpha")], 0.4),
		];
		let hits = collect_source_hits(&points);

		assert_eq!(hits.len(), 2);
		assert_eq!(hits[0].key, "doc-b");
		assert_eq!(hits[0].text, "beta");
		assert_eq!(hits[0].payload["title"], "B");
		assert_eq!(hits[1].key, "2");
		assert_eq!(hits[1].score, 0.4);
	}

	#[test]
	fn points_without_key_or_id_are_skipped() {
		let points = vec![point(None, &[("text", "orphan")], 0.7)];

		assert!(collect_source_hits(&points).is_empty());
	}
}
