use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	System,
	User,
	Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
	pub role: Role,
	pub content: String,
}
impl ChatMessage {
	pub fn system(content: impl Into<String>) -> Self {
		Self { role: Role::System, content: content.into() }
	}

	pub fn user(content: impl Into<String>) -> Self {
		Self { role: Role::User, content: content.into() }
	}
}

pub async fn complete(
	cfg: &verity_config::LlmProviderConfig,
	messages: &[ChatMessage],
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
		"stream": false,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(Some(&cfg.api_key), &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	tracing::debug!(
		provider_id = %cfg.provider_id,
		model = %cfg.model,
		messages = messages.len(),
		"Completion response received."
	);

	parse_completion_content(&json)
}

/// Reads the assistant text from OpenAI-style `choices`, Ollama-style `message`, or Gemini-style
/// `candidates` responses.
fn parse_completion_content(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.or_else(|| json.get("message").and_then(|msg| msg.get("content")))
		.or_else(|| {
			json.get("candidates")
				.and_then(|v| v.as_array())
				.and_then(|arr| arr.first())
				.and_then(|candidate| candidate.get("content"))
				.and_then(|content| content.get("parts"))
				.and_then(|v| v.as_array())
				.and_then(|parts| parts.first())
				.and_then(|part| part.get("text"))
		})
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing message content.".to_string(),
		})?;

	Ok(content.trim().to_string())
}
