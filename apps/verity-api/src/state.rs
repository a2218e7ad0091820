use std::sync::Arc;

use verity_service::RagService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RagService>,
}
impl AppState {
	pub fn new(config: verity_config::Config) -> color_eyre::Result<Self> {
		let service = RagService::connect(config)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: RagService) -> Self {
		Self { service: Arc::new(service) }
	}
}
