// [apps/ingestor/src/config.rs]
/*!
 * Runtime configuration. Every setting has a CLI flag and an
 * environment-variable fallback via `clap`'s `env` feature; `.env` is
 * loaded in `main` before parsing so local development needs no shell
 * exports.
 */

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "ticketflow-ingestor", about = "Ticket ingestion and analytics backend")]
pub struct IngestorConfig {
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[arg(long, env = "DATABASE_AUTH_TOKEN")]
    pub database_auth_token: Option<String>,

    #[arg(long, env = "LISTEN_PORT", default_value_t = 8080)]
    pub listen_port: u16,

    #[arg(long, env = "EXTERNAL_SOURCE_BASE_URL")]
    pub external_source_base_url: String,

    #[arg(long, env = "RATE_LIMITER_CAPACITY", default_value_t = 60)]
    pub rate_limiter_capacity: usize,

    #[arg(long, env = "RATE_LIMITER_WINDOW_SECS", default_value_t = 60)]
    pub rate_limiter_window_secs: u64,

    #[arg(long, env = "LOCK_TTL_SECS", default_value_t = 60)]
    pub lock_ttl_secs: u64,

    #[arg(long, env = "NOTIFIER_POOL_SIZE", default_value_t = 4)]
    pub notifier_pool_size: usize,
}

impl IngestorConfig {
    pub fn load() -> Self {
        Self::parse()
    }
}
