use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use uuid::Uuid;

use verity_service::{
	Candidate, ChainOfThought, Error as ServiceError, ProgressEvent, ProgressObserver, RagRequest,
	Result as ServiceResult,
};

use crate::state::AppState;

pub const INSUFFICIENT_EVIDENCE_MESSAGE: &str =
	"I don't have enough relevant information to answer that reliably.";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/rag", post(rag))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn rag(
	State(state): State<AppState>,
	payload: Result<Json<RagRequest>, JsonRejection>,
) -> Result<Json<RagResponse>, ApiError> {
	let Json(request) = payload.map_err(|err| {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.body_text())
	})?;
	let trace_id = Uuid::new_v4();
	let observer = TracingObserver { trace_id };
	let package = state.service.run(request, Some(&observer)).await.map_err(|err| {
		tracing::warn!(error = %err, %trace_id, "RAG request failed.");

		ApiError::from(err)
	})?;
	let message = (!package.sufficient).then(|| INSUFFICIENT_EVIDENCE_MESSAGE.to_string());

	Ok(Json(RagResponse {
		trace_id,
		ok: package.sufficient,
		message,
		chunks: package.admitted,
		chain_of_thought: package.chain_of_thought,
		candidate_count: package.candidate_count,
	}))
}

#[derive(Debug, Serialize)]
pub struct RagResponse {
	pub trace_id: Uuid,
	pub ok: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	pub chunks: Vec<Candidate>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub chain_of_thought: Option<ChainOfThought>,
	pub candidate_count: usize,
}

/// Logs every progress event under the request's trace id.
struct TracingObserver {
	trace_id: Uuid,
}
impl ProgressObserver for TracingObserver {
	fn notify(&self, event: &ProgressEvent) -> ServiceResult<()> {
		tracing::info!(
			trace_id = %self.trace_id,
			event = event.name(),
			payload = %event.payload(),
			"Progress event."
		);

		Ok(())
	}
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			ServiceError::Reasoning { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "REASONING_FAILED", err.to_string()),
			ServiceError::Provider { .. } | ServiceError::Source { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", err.to_string()),
			ServiceError::Observer { .. } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", err.to_string()),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}
