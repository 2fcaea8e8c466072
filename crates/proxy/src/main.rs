mod context;
mod service;
mod upstream;

use anyhow::Result;
use pingora_core::server::Server;
use pingora_proxy::http_proxy_service;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use rtgate_common::AppConfig;
use crate::service::RtGateProxy;

fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .json()
        .init();

    // Parse command-line args for config path
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/rtgate.yaml".to_string());

    info!(config_path = %config_path, "starting rt-gate");

    // Load configuration
    let config = AppConfig::load(&config_path)?;

    // The durable block-list shared by the gate and the registrar
    let store = rtgate_store::from_config(&config.store)?;
    info!(backend = ?config.store.backend, "block-list store configured");

    // One registry so the registrar's /api/metrics covers both components
    let registry = prometheus::Registry::new();

    // Create Pingora server
    let mut server = Server::new(None)?;
    server.bootstrap();

    // Create the gate proxy service
    let gate_proxy = RtGateProxy::new(&config, store.clone(), &registry);
    let mut proxy_service = http_proxy_service(&server.configuration, gate_proxy);

    // Add listeners from config
    for listen_addr in &config.server.listen {
        info!(addr = %listen_addr, "adding listener");
        proxy_service.add_tcp(listen_addr);
    }

    server.add_service(proxy_service);

    // Launch the registrar in the background on its own listener
    let registrar_state =
        rtgate_registrar::new_shared_state(&config.registrar, store, registry);

    server.add_service(pingora_core::services::background::background_service(
        "registrar",
        RegistrarBackgroundService {
            listen_addr: config.server.registrar_listen.clone(),
            state: registrar_state,
        },
    ));

    info!("rt-gate started successfully");
    server.run_forever();
}

/// Background service to run the registrar alongside Pingora.
struct RegistrarBackgroundService {
    listen_addr: String,
    state: rtgate_registrar::SharedState,
}

#[async_trait::async_trait]
impl pingora_core::services::background::BackgroundService for RegistrarBackgroundService {
    async fn start(&self, mut shutdown: pingora_core::server::ShutdownWatch) {
        info!(addr = %self.listen_addr, "starting registrar");

        tokio::select! {
            result = rtgate_registrar::run_registrar_server(self.state.clone(), &self.listen_addr) => {
                if let Err(e) = result {
                    error!(error = %e, "registrar server error");
                }
            }
            _ = shutdown.changed() => {
                info!("registrar shutting down");
            }
        }
    }
}
