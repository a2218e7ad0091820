use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::Value;
use tower::util::ServiceExt;

use verity_api::{routes, state::AppState};
use verity_service::CompletionProvider;
use verity_testkit::{ScriptedCompletion, StaticSource, TextRerank, hit, service, test_config};

fn app(vector_keys: &[&str], completion: Arc<dyn CompletionProvider>) -> Router {
	let vector = vector_keys
		.iter()
		.map(|key| hit(key, &format!("story {key}"), &format!("Title {key}"), "Wire"))
		.collect();
	let rerank = TextRerank::new([("story a", 0.9), ("story b", 0.8), ("story c", 0.2)]);
	let service = service(
		test_config(),
		Arc::new(StaticSource::new(vector)),
		Arc::new(StaticSource::default()),
		Arc::new(rerank),
		completion,
	);

	routes::router(AppState::from_service(service))
}

async fn post_rag(app: Router, body: &str) -> (StatusCode, Value) {
	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/v1/rag")
				.header("content-type", "application/json")
				.body(Body::from(body.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /v1/rag.");
	let status = response.status();
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = serde_json::from_slice(&bytes).expect("Failed to parse response body.");

	(status, json)
}

#[tokio::test]
async fn health_ok() {
	let request =
		Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request.");
	let response = app(&[], Arc::new(ScriptedCompletion::new()))
		.oneshot(request)
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn news_query_returns_chunks_and_reasoning() {
	let app = app(&["a", "b", "c"], Arc::new(ScriptedCompletion::new()));
	let (status, json) = post_rag(app, r#"{"query":"what happened?","mode":"news"}"#).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["ok"], true);
	assert!(json.get("message").is_none());
	assert_eq!(json["candidate_count"], 3);
	assert_eq!(json["chunks"].as_array().map(Vec::len), Some(2));
	assert_eq!(json["chunks"][0]["key"], "a");
	assert_eq!(json["chain_of_thought"]["total_phases"], 4);
	assert_eq!(json["chain_of_thought"]["thoughts"][3]["phase"], "synthesize_answer");
	assert!(json["trace_id"].as_str().is_some_and(|id| id.len() == 36));
}

#[tokio::test]
async fn insufficient_evidence_sets_ok_false_with_message() {
	let app = app(&["c"], Arc::new(ScriptedCompletion::new()));
	let (status, json) = post_rag(app, r#"{"query":"what happened?","mode":"news"}"#).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["ok"], false);
	assert_eq!(json["message"], routes::INSUFFICIENT_EVIDENCE_MESSAGE);
	assert!(json.get("chain_of_thought").is_none());
}

#[tokio::test]
async fn blank_query_is_a_bad_request() {
	let app = app(&["a", "b"], Arc::new(ScriptedCompletion::new()));
	let (status, json) = post_rag(app, r#"{"query":"  "}"#).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
	let app = app(&["a", "b"], Arc::new(ScriptedCompletion::new()));
	let (status, json) = post_rag(app, r#"{"mode":"news"}"#).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn reasoning_failure_maps_to_bad_gateway() {
	let app = app(&["a", "b"], Arc::new(ScriptedCompletion::failing_on(2)));
	let (status, json) = post_rag(app, r#"{"query":"what happened?","mode":"news"}"#).await;

	assert_eq!(status, StatusCode::BAD_GATEWAY);
	assert_eq!(json["error_code"], "REASONING_FAILED");
	assert!(json["message"].as_str().is_some_and(|message| message.contains("search_strategy")));
}
