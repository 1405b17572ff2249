use gateway::{run, GatewayConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    common_net::telemetry::init("gateway");

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "failed to load gateway configuration");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = common_net::shutdown::channel();
    let bind_addr = config.settings.bind_addr;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received shutdown signal");
            common_net::shutdown::trigger(&shutdown_tx);
        }
    });

    info!(%bind_addr, "starting matchmaking gateway");
    if let Err(err) = run(config, shutdown_rx).await {
        error!(%err, "gateway exited with error");
        std::process::exit(1);
    }
}
