use crate::reasoning::ReasoningPhaseKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Source error: {message}")]
	Source { message: String },
	#[error("Reasoning failed during {phase}: {message}")]
	Reasoning { phase: ReasoningPhaseKind, message: String },
	#[error("Observer error: {message}")]
	Observer { message: String },
}
impl From<verity_providers::Error> for Error {
	fn from(err: verity_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<verity_storage::Error> for Error {
	fn from(err: verity_storage::Error) -> Self {
		Self::Source { message: err.to_string() }
	}
}
