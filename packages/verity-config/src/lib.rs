mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, Providers, Qdrant, Reasoning, Relevance,
	RerankProviderConfig, Retrieval, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.rerank.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.rerank.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (label, id) in [
		("embedding", &cfg.providers.embedding.provider_id),
		("completion", &cfg.providers.completion.provider_id),
	] {
		if id.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} provider_id must be non-empty."),
			});
		}
	}
	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("completion", &cfg.providers.completion.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	validate_retrieval(&cfg.retrieval)?;
	validate_relevance(&cfg.relevance)?;

	if cfg.reasoning.max_sources == 0 {
		return Err(Error::Validation {
			message: "reasoning.max_sources must be greater than zero.".to_string(),
		});
	}
	if cfg.reasoning.summary_chars == 0 {
		return Err(Error::Validation {
			message: "reasoning.summary_chars must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_retrieval(retrieval: &Retrieval) -> Result<()> {
	for (label, value) in [
		("retrieval.rrf_k", retrieval.rrf_k),
		("retrieval.candidate_budget", retrieval.candidate_budget),
		("retrieval.vector_top_k", retrieval.vector_top_k),
		("retrieval.keyword_top_k", retrieval.keyword_top_k),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if retrieval.source_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.source_timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_relevance(relevance: &Relevance) -> Result<()> {
	for (label, value) in [
		("relevance.rerank_min_score", relevance.rerank_min_score),
		("relevance.baseline_min_score", relevance.baseline_min_score),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if relevance.baseline_min_score > relevance.rerank_min_score {
		return Err(Error::Validation {
			message: "relevance.baseline_min_score must not exceed relevance.rerank_min_score."
				.to_string(),
		});
	}
	if relevance.min_relevant_count == 0 {
		return Err(Error::Validation {
			message: "relevance.min_relevant_count must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.providers.rerank.url.as_deref().map(|url| url.trim().is_empty()).unwrap_or(false) {
		cfg.providers.rerank.url = None;
	}
	if cfg.providers.rerank.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.providers.rerank.api_key = None;
	}
	if cfg.storage.qdrant.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.storage.qdrant.api_key = None;
	}
}
