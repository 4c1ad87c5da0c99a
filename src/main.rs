//! slircd - Straylight IRC Daemon

use std::net::SocketAddr;
use std::sync::Arc;

use slircd_core::config::{self, Config};
use slircd_core::network::Gateway;
use slircd_core::state::{Matrix, actor};
use slircd_core::{http, metrics, telemetry};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)
        .map_err(|e| anyhow::anyhow!("failed to load {config_path}: {e}"))?;

    telemetry::init_tracing(&config.logging);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    info!(
        server = %config.server.name,
        network = %config.server.network,
        sid = %config.server.sid,
        "Starting slircd"
    );

    metrics::init();
    if let Some(port) = config.server.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        tokio::spawn(async move {
            if let Err(e) = http::run_http_server(addr).await {
                error!(error = %e, "Metrics endpoint failed");
            }
        });
    }

    let config = Arc::new(config);
    let mut matrix = Matrix::new(Arc::clone(&config))?;
    for name in &config.modules.load {
        if let Err(e) = matrix.load_bundled(name) {
            warn!(module = %name, error = %e, "Module failed to load");
        }
    }

    let uid_gen = Arc::clone(&matrix.uid_gen);
    let (core, core_task) = actor::spawn(matrix);

    let gateway = Gateway::bind(config.listen.address, &config, core, uid_gen).await?;
    info!("Server ready");

    tokio::select! {
        result = gateway.run() => result?,
        _ = core_task => error!("Core actor exited"),
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }
    Ok(())
}
