//! Live bridge: listens for UDP skeleton frames and publishes one marker
//! collection per frame until interrupted.

use clap::Parser;

use skelbridge_core::BridgeResult;
use skelbridge_marker::{ChannelPublisher, MarkerEncoder};
use skelbridge_runtime::{init_tracing, BridgeArgs, BridgeConfig, BusPump};
use skelbridge_transport::IngestService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = BridgeArgs::parse();
    init_tracing(args.log_format);

    if let Err(e) = run(args.into_config()).await {
        tracing::error!("skelbridge failed: {}", e);
        return Err(e.into());
    }
    Ok(())
}

async fn run(config: BridgeConfig) -> BridgeResult<()> {
    let (publisher, rx) = ChannelPublisher::channel(config.bus_capacity);

    let mut pump = BusPump::new(rx);
    if let Some(dest) = config.forward_to {
        pump = pump.with_forwarding(dest).await?;
    }
    if let Some(path) = &config.record_to {
        pump = pump.with_log(path)?;
    }
    let bus = pump.spawn();

    let topic = config.ingest.topic.clone();
    let service =
        IngestService::start(config.ingest, MarkerEncoder::new(config.frame_id), publisher).await?;
    tracing::info!(addr = %service.local_addr(), %topic, "bridge running, Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    // Stopping the service drops the publisher, which ends the pump
    service.stop().await;
    match bus.await {
        Ok(result) => {
            result?;
        }
        Err(e) => tracing::warn!("bus pump ended abnormally: {}", e),
    }
    Ok(())
}
