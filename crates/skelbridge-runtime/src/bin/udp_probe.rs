//! Diagnostic listener: reports what a producer is sending without
//! transforming or publishing anything.

use clap::Parser;

use skelbridge_runtime::{init_tracing, ProbeArgs};
use skelbridge_transport::DiagnosticListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ProbeArgs::parse();
    init_tracing(args.log_format);
    let config = args.into_config();

    tracing::info!(
        addr = %config.bind_addr,
        duration_secs = config.duration.as_secs(),
        "listening for skeleton datagrams"
    );

    let listener = match DiagnosticListener::bind(config).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("udp-probe failed: {}", e);
            return Err(e.into());
        }
    };

    let report = listener.run().await;
    if report.total() == 0 {
        tracing::warn!("no datagrams received, is the producer running?");
    }
    Ok(())
}
