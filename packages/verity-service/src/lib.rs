pub mod candidate;
pub mod fusion;
pub mod hybrid;
pub mod pipeline;
pub mod progress;
pub mod reasoning;
pub mod relevance;
pub mod rerank;
pub mod sources;
pub mod time_serde;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

pub use candidate::{Candidate, SourceHit};
pub use error::{Error, Result};
pub use fusion::{FusionResult, fuse};
pub use hybrid::HybridRetriever;
pub use pipeline::{ChatMode, EvidencePackage, RagRequest};
pub use progress::{
	PipelineStage, ProgressEvent, ProgressObserver, StageEvent, StageStatus, ThoughtData,
	ThoughtErrorEvent, ThoughtEvent, ThoughtStatus,
};
pub use reasoning::{
	ChainOfThought, ChainOfThoughtOrchestrator, ReasoningPhase, ReasoningPhaseKind,
};
pub use relevance::{RelevanceFilter, RelevanceOutcome};
pub use rerank::Reranker;
use verity_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, RerankProviderConfig};
pub use verity_providers::{ChatMessage, RerankScore, Role};
use verity_providers::{completion, embedding, rerank as rerank_http};
use verity_storage::qdrant::QdrantStore;

use crate::sources::{QdrantKeywordSource, QdrantVectorSource};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a RerankProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, Result<Vec<RerankScore>>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, Result<String>>;
}

/// Dense similarity retrieval. Returns hits best first.
pub trait VectorSource
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Vec<SourceHit>>>;
}

/// Lexical retrieval. Returns hits best first.
pub trait KeywordSource
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<Vec<SourceHit>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub rerank: Arc<dyn RerankProvider>,
	pub completion: Arc<dyn CompletionProvider>,
}
impl Providers {
	pub fn new(rerank: Arc<dyn RerankProvider>, completion: Arc<dyn CompletionProvider>) -> Self {
		Self { rerank, completion }
	}
}
impl Default for Providers {
	fn default() -> Self {
		Self { rerank: Arc::new(DefaultProviders), completion: Arc::new(DefaultProviders) }
	}
}

#[derive(Clone)]
pub struct Sources {
	pub vector: Arc<dyn VectorSource>,
	pub keyword: Arc<dyn KeywordSource>,
}
impl Sources {
	pub fn new(vector: Arc<dyn VectorSource>, keyword: Arc<dyn KeywordSource>) -> Self {
		Self { vector, keyword }
	}
}

pub struct RagService {
	pub cfg: Config,
	pub providers: Providers,
	pub sources: Sources,
}
impl RagService {
	pub fn new(cfg: Config, providers: Providers, sources: Sources) -> Self {
		Self { cfg, providers, sources }
	}

	/// Wires the HTTP providers and Qdrant-backed sources described by `cfg`.
	pub fn connect(cfg: Config) -> Result<Self> {
		let store = Arc::new(QdrantStore::new(&cfg.storage.qdrant)?);
		let embedding: Arc<dyn EmbeddingProvider> = Arc::new(DefaultProviders);
		let vector = QdrantVectorSource::new(
			store.clone(),
			embedding,
			cfg.providers.embedding.clone(),
			cfg.retrieval.vector_top_k,
		);
		let keyword = QdrantKeywordSource::new(store, cfg.retrieval.keyword_top_k);
		let sources = Sources::new(Arc::new(vector), Arc::new(keyword));

		Ok(Self::new(cfg, Providers::default(), sources))
	}

	pub fn retriever(&self) -> HybridRetriever {
		HybridRetriever::new(
			self.sources.vector.clone(),
			self.sources.keyword.clone(),
			self.cfg.retrieval.clone(),
		)
	}

	pub fn reranker(&self) -> Reranker {
		Reranker::new(self.providers.rerank.clone(), self.cfg.providers.rerank.clone())
	}

	pub fn relevance_filter(&self) -> RelevanceFilter {
		RelevanceFilter::new(&self.cfg.relevance)
	}

	pub fn orchestrator(&self) -> ChainOfThoughtOrchestrator {
		ChainOfThoughtOrchestrator::new(
			self.providers.completion.clone(),
			self.cfg.providers.completion.clone(),
			self.cfg.reasoning.clone(),
		)
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}

impl RerankProvider for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a RerankProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, Result<Vec<RerankScore>>> {
		Box::pin(async move { Ok(rerank_http::rerank(cfg, query, docs).await?) })
	}
}

impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(completion::complete(cfg, messages).await?) })
	}
}
