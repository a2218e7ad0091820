use qdrant_client::qdrant::{Document, Query, QueryPointsBuilder, ScoredPoint};

use crate::Result;

pub const DENSE_VECTOR_NAME: &str = "dense";
pub const BM25_VECTOR_NAME: &str = "bm25";
pub const BM25_MODEL: &str = "qdrant/bm25";

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &verity_config::Qdrant) -> Result<Self> {
		let client =
			qdrant_client::Qdrant::from_url(&cfg.url).api_key(cfg.api_key.clone()).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Nearest neighbours on the dense vector, best first.
	pub async fn search_dense(&self, vector: Vec<f32>, limit: u32) -> Result<Vec<ScoredPoint>> {
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.using(DENSE_VECTOR_NAME)
			.with_payload(true)
			.limit(limit as u64);
		let response = self.client.query(search).await?;

		Ok(response.result)
	}

	/// BM25 lexical ranking with server-side sparse inference, best first.
	pub async fn search_keyword(&self, text: &str, limit: u32) -> Result<Vec<ScoredPoint>> {
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(Document::new(text.to_string(), BM25_MODEL)))
			.using(BM25_VECTOR_NAME)
			.with_payload(true)
			.limit(limit as u64);
		let response = self.client.query(search).await?;

		Ok(response.result)
	}
}
