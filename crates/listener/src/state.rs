use std::sync::Arc;

use orchestrator::{InFlightRegistry, Provisioner};
use provisioning::{RuntimeEnvironment, SecretString, ServiceConfig};

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub environment: RuntimeEnvironment,
    pub component_secret: SecretString,
    pub provisioner: Arc<Provisioner>,
    pub in_flight: InFlightRegistry,
}

impl AppState {
    pub fn new(config: &ServiceConfig, provisioner: Arc<Provisioner>) -> Self {
        Self {
            environment: config.environment,
            component_secret: config.platform.component_secret.clone(),
            provisioner,
            in_flight: InFlightRegistry::new(),
        }
    }
}
