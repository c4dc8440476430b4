// [apps/ingestor/src/main.rs]
/*!
 * Binary entry point: load environment and config, initialize tracing,
 * ignite and launch the kernel.
 */

use ticketflow_ingestor::prelude::*;

use dotenvy::dotenv;
use ticketflow_shared_telemetry::init_tracing;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("ticketflow_ingestor");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        let config = IngestorConfig::load();

        info!("ticketflow-ingestor starting up");

        let kernel = IngestorKernel::ignite(&config).await;
        kernel.launch().await;

        Ok(())
    })
}
