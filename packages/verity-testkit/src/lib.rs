//! In-memory sources, scripted providers, and recording observers for pipeline tests.

use std::{
	collections::HashMap,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::{Map, Value};

use verity_config::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, Providers as ProviderSettings, Qdrant,
	Reasoning, Relevance, RerankProviderConfig, Retrieval, Service, Storage,
};
use verity_service::{
	BoxFuture, ChatMessage, CompletionProvider, Error, KeywordSource, ProgressEvent,
	ProgressObserver, Providers, RagService, RerankProvider, RerankScore, Result, SourceHit,
	Sources, VectorSource,
};

/// A hit whose payload carries `title` and `source`.
pub fn hit(key: &str, text: &str, title: &str, source: &str) -> SourceHit {
	let mut payload = Map::new();

	payload.insert("title".to_string(), Value::from(title));
	payload.insert("source".to_string(), Value::from(source));

	SourceHit::new(key, text, 0.5).with_payload(payload)
}

/// Returns the same ranked list on every call and counts calls.
#[derive(Default)]
pub struct StaticSource {
	hits: Vec<SourceHit>,
	calls: AtomicUsize,
}
impl StaticSource {
	pub fn new(hits: Vec<SourceHit>) -> Self {
		Self { hits, calls: AtomicUsize::new(0) }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn respond(&self) -> BoxFuture<'_, Result<Vec<SourceHit>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let hits = self.hits.clone();

		Box::pin(async move { Ok(hits) })
	}
}

impl VectorSource for StaticSource {
	fn search<'a>(&'a self, _query: &'a str) -> BoxFuture<'a, Result<Vec<SourceHit>>> {
		self.respond()
	}
}

impl KeywordSource for StaticSource {
	fn search<'a>(&'a self, _query: &'a str) -> BoxFuture<'a, Result<Vec<SourceHit>>> {
		self.respond()
	}
}

pub struct FailingSource;

impl VectorSource for FailingSource {
	fn search<'a>(&'a self, _query: &'a str) -> BoxFuture<'a, Result<Vec<SourceHit>>> {
		let result: Result<Vec<SourceHit>> =
			Err(Error::Source { message: "vector index is down.".to_string() });

		Box::pin(async move { result })
	}
}

impl KeywordSource for FailingSource {
	fn search<'a>(&'a self, _query: &'a str) -> BoxFuture<'a, Result<Vec<SourceHit>>> {
		let result: Result<Vec<SourceHit>> =
			Err(Error::Source { message: "keyword index is down.".to_string() });

		Box::pin(async move { result })
	}
}

/// Sleeps before answering; pair with a short `source_timeout_ms`.
pub struct SlowSource {
	delay: Duration,
	hits: Vec<SourceHit>,
}
impl SlowSource {
	pub fn new(delay: Duration, hits: Vec<SourceHit>) -> Self {
		Self { delay, hits }
	}

	fn respond(&self) -> BoxFuture<'_, Result<Vec<SourceHit>>> {
		Box::pin(async move {
			tokio::time::sleep(self.delay).await;

			Ok(self.hits.clone())
		})
	}
}

impl VectorSource for SlowSource {
	fn search<'a>(&'a self, _query: &'a str) -> BoxFuture<'a, Result<Vec<SourceHit>>> {
		self.respond()
	}
}

impl KeywordSource for SlowSource {
	fn search<'a>(&'a self, _query: &'a str) -> BoxFuture<'a, Result<Vec<SourceHit>>> {
		self.respond()
	}
}

/// Scores documents by exact text match. Unknown texts score zero.
#[derive(Default)]
pub struct TextRerank {
	scores: HashMap<String, f32>,
	calls: AtomicUsize,
}
impl TextRerank {
	pub fn new<'a>(scores: impl IntoIterator<Item = (&'a str, f32)>) -> Self {
		Self {
			scores: scores.into_iter().map(|(text, score)| (text.to_string(), score)).collect(),
			calls: AtomicUsize::new(0),
		}
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl RerankProvider for TextRerank {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a RerankProviderConfig,
		_query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, Result<Vec<RerankScore>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let scores = docs
			.iter()
			.enumerate()
			.map(|(index, doc)| RerankScore {
				index,
				score: self.scores.get(doc).copied().unwrap_or(0.0),
			})
			.collect();

		Box::pin(async move { Ok(scores) })
	}
}

#[derive(Default)]
pub struct FailingRerank {
	calls: AtomicUsize,
}
impl FailingRerank {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl RerankProvider for FailingRerank {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a RerankProviderConfig,
		_query: &'a str,
		_docs: &'a [String],
	) -> BoxFuture<'a, Result<Vec<RerankScore>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let result: Result<Vec<RerankScore>> =
			Err(Error::Provider { message: "reranker timed out.".to_string() });

		Box::pin(async move { result })
	}
}

/// Answers `"<n>: <phase output>"` for call `n` (1-based), failing on `fail_on` when set.
#[derive(Default)]
pub struct ScriptedCompletion {
	fail_on: Option<usize>,
	calls: Mutex<Vec<Vec<ChatMessage>>>,
}
impl ScriptedCompletion {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing_on(call: usize) -> Self {
		Self { fail_on: Some(call), calls: Mutex::new(Vec::new()) }
	}

	pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn call_count(&self) -> usize {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}

impl CompletionProvider for ScriptedCompletion {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, Result<String>> {
		let call = {
			let mut calls = self.calls.lock().unwrap_or_else(|err| err.into_inner());

			calls.push(messages.to_vec());

			calls.len()
		};
		let fail = self.fail_on == Some(call);

		Box::pin(async move {
			if fail {
				return Err(Error::Provider { message: format!("completion call {call} failed.") });
			}

			Ok(format!("  {call}: phase output  "))
		})
	}
}

#[derive(Default)]
pub struct RecordingObserver {
	events: Mutex<Vec<ProgressEvent>>,
}
impl RecordingObserver {
	pub fn events(&self) -> Vec<ProgressEvent> {
		self.events.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	/// `(event name, payload)` pairs in delivery order.
	pub fn payloads(&self) -> Vec<(&'static str, Value)> {
		self.events().iter().map(|event| (event.name(), event.payload())).collect()
	}
}

impl ProgressObserver for RecordingObserver {
	fn notify(&self, event: &ProgressEvent) -> Result<()> {
		self.events.lock().unwrap_or_else(|err| err.into_inner()).push(event.clone());

		Ok(())
	}
}

pub struct FailingObserver;

impl ProgressObserver for FailingObserver {
	fn notify(&self, _event: &ProgressEvent) -> Result<()> {
		Err(Error::Observer { message: "client disconnected.".to_string() })
	}
}

pub struct PanickingObserver;

impl ProgressObserver for PanickingObserver {
	fn notify(&self, _event: &ProgressEvent) -> Result<()> {
		panic!("observer bug")
	}
}

/// Config with every provider pointed at unroutable hosts. Tests inject fakes instead.
pub fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			qdrant: Qdrant {
				url: "http://127.0.0.1:6334".to_string(),
				collection: "verity_test".to_string(),
				vector_dim: 4,
				api_key: None,
			},
		},
		providers: ProviderSettings {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/embeddings".to_string(),
				model: "test-embedding".to_string(),
				dimensions: 4,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			rerank: RerankProviderConfig {
				url: Some("http://127.0.0.1:1/rerank".to_string()),
				..RerankProviderConfig::default()
			},
			completion: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/chat/completions".to_string(),
				model: "test-chat".to_string(),
				temperature: 0.0,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		retrieval: Retrieval::default(),
		relevance: Relevance::default(),
		reasoning: Reasoning::default(),
	}
}

/// A service wired to the given fakes.
pub fn service(
	cfg: Config,
	vector: Arc<dyn VectorSource>,
	keyword: Arc<dyn KeywordSource>,
	rerank: Arc<dyn RerankProvider>,
	completion: Arc<dyn CompletionProvider>,
) -> RagService {
	RagService::new(cfg, Providers::new(rerank, completion), Sources::new(vector, keyword))
}
