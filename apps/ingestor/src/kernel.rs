// [apps/ingestor/src/kernel.rs]
/*!
 * Composition root: bootstrap state, spawn the background notifier
 * pool, build the router, bind and serve.
 */

use std::net::{IpAddr, SocketAddr};

use tracing::{error, info, instrument};

use crate::config::IngestorConfig;
use crate::routes::build_router;
use crate::services::spawn_notifier_pool;
use crate::state::AppState;

pub struct IngestorKernel {
    pub listen_port: u16,
    pub state: AppState,
}

impl IngestorKernel {
    #[instrument(skip(config))]
    pub async fn ignite(config: &IngestorConfig) -> Self {
        let (state, notifier_rx) = AppState::bootstrap(config)
            .await
            .expect("FATAL: failed to bootstrap application state");

        spawn_notifier_pool(
            config.notifier_pool_size,
            notifier_rx,
            state.notifier_client.clone(),
            state.rate_limiter.clone(),
            state.circuit_breakers.clone(),
        );

        Self {
            listen_port: config.listen_port,
            state,
        }
    }

    pub async fn launch(self) {
        let router = build_router(self.state);

        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().unwrap(), self.listen_port);

        info!(%bind_address, "ingestor listening");

        let listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("FATAL: failed to bind listen port");

        if let Err(error) = axum::serve(listener, router).await {
            error!(%error, "server loop terminated");
            std::process::exit(1);
        }
    }
}
