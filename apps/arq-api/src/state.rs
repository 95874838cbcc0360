use std::sync::Arc;

use arq_service::ArqService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ArqService>,
}
impl AppState {
	pub fn new(config: arq_config::Config) -> color_eyre::Result<Self> {
		let tenants = arq_config::load_tenants(&config.tenants.dir)?;

		tracing::info!(tenants = tenants.len(), "Loaded tenant configuration.");

		let service = ArqService::new(config, tenants);

		Ok(Self { service: Arc::new(service) })
	}

	pub fn from_service(service: ArqService) -> Self {
		Self { service: Arc::new(service) }
	}
}
