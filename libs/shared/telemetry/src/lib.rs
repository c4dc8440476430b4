// [libs/shared/telemetry/src/lib.rs]
/*!
 * =================================================================
 * APARATO: TELEMETRY INITIALIZATION
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4/L6)
 * RESPONSABILIDAD: TRAZADO ESTRUCTURADO Y CAPTURA DE PÁNICOS
 *
 * Dev mode favors a readable compact formatter; release mode emits
 * flat JSON for ingestion by a log pipeline. The panic hook runs
 * regardless of mode so a panic on any tokio task is still visible
 * as a structured event before the task unwinds.
 * =================================================================
 */

use std::panic;
use tracing::{error, info, instrument};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Initializes the global tracing subscriber and panic hook for
/// `service_name`. Panics if a subscriber has already been installed in
/// this process.
#[instrument(skip_all)]
pub fn init_tracing(service_name: &str) {
    let environmental_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{service_name}={level},tower_http=warn,hyper=warn,libsql=error",
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    if cfg!(debug_assertions) {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().compact().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().json().flatten_event(true))
            .init();
    }

    let service_id_snapshot = service_name.to_string();

    panic::set_hook(Box::new(move |panic_info| {
        let panic_location = panic_info
            .location()
            .map(|location| format!("{}:{}:{}", location.file(), location.line(), location.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let panic_payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("non-string panic payload");

        error!(
            target: "panic_monitor",
            service = %service_id_snapshot,
            location = %panic_location,
            "task panicked: {}",
            panic_payload
        );
    }));

    info!(service = %service_name, "tracing initialized");
}
