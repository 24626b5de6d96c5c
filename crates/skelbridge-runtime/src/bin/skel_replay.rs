//! Replays a CSV pose log to a live bridge over UDP

use std::fs::File;
use std::io::BufReader;

use clap::Parser;

use skelbridge_core::BridgeResult;
use skelbridge_runtime::{init_tracing, ReplayArgs, Replayer};
use skelbridge_transport::UdpFrameSender;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ReplayArgs::parse();
    init_tracing(args.log_format);

    if let Err(e) = run(&args).await {
        tracing::error!("skel-replay failed: {}", e);
        return Err(e.into());
    }
    Ok(())
}

async fn run(args: &ReplayArgs) -> BridgeResult<()> {
    let input = BufReader::new(File::open(&args.input)?);
    let sender = UdpFrameSender::bind(args.sender_config()).await?;

    Replayer::new(sender, args.replay_config())
        .replay_csv(input)
        .await?;
    Ok(())
}
