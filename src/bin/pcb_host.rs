//! Binary entrypoint for `pcb-host`.

use pcb_host::{init, PcbHostConfig, Registry};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = PcbHostConfig::load().unwrap_or_else(|e| {
        eprintln!("failed to load configuration: {e}");
        std::process::exit(1);
    });
    if let Err(e) = config.validate() {
        eprintln!("invalid configuration: {e}");
        std::process::exit(1);
    }

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(bind_addr = %config.bind_addr, log_dir = %config.log_dir, "starting pcb-host");

    let registry = Registry::new(PathBuf::from(&config.log_dir));
    init::run_from_env(&registry, &config.init_process_env_var).await;

    let app = pcb_host::http::router(registry);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(bind_addr = %config.bind_addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    // Graceful shutdown stops accepting new connections but does not touch
    // any in-flight supervised children: `Pcb::kill` is never called here,
    // so running processes are simply orphaned to the registry's `Arc`,
    // matching `spec.md`'s process-lifetime (not host-lifetime) scope.
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received, draining HTTP surface");
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
