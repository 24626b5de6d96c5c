//! Configuration and command line arguments

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use skelbridge_marker::{DEFAULT_FRAME_ID, DEFAULT_TOPIC};
use skelbridge_record::{default_output_path, ConverterConfig};
use skelbridge_transport::ingest::DEFAULT_PORT;
use skelbridge_transport::{DiagnosticConfig, IngestConfig, SenderConfig};
use skelbridge_wire::JointNaming;

use crate::{LogFormat, ReplayConfig};

/// Default depth of the publish queue between ingestion and the bus
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Live bridge configuration
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    pub ingest: IngestConfig,
    pub frame_id: String,
    /// Publish queue depth; a full queue drops the frame
    pub bus_capacity: usize,
    /// Forward encoded collections to a bus gateway
    pub forward_to: Option<SocketAddr>,
    /// Append collections to a sequential log
    pub record_to: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            ingest: IngestConfig::default(),
            frame_id: DEFAULT_FRAME_ID.to_string(),
            bus_capacity: DEFAULT_BUS_CAPACITY,
            forward_to: None,
            record_to: None,
        }
    }
}

/// Live bridge: UDP skeleton frames in, marker collections out
#[derive(Parser, Debug)]
#[command(name = "skelbridge", version, about = "Bridge UDP skeleton frames to marker collections")]
pub struct BridgeArgs {
    /// UDP port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,
    #[arg(long, default_value = DEFAULT_TOPIC)]
    pub topic: String,
    #[arg(long, default_value = DEFAULT_FRAME_ID)]
    pub frame_id: String,
    #[arg(long, default_value_t = DEFAULT_BUS_CAPACITY)]
    pub bus_capacity: usize,
    /// Forward encoded collections to this UDP address
    #[arg(long, value_name = "ADDR")]
    pub forward: Option<SocketAddr>,
    /// Also write collections to this log file
    #[arg(long, value_name = "PATH")]
    pub record: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl BridgeArgs {
    pub fn into_config(self) -> BridgeConfig {
        BridgeConfig {
            ingest: IngestConfig {
                bind_addr: SocketAddr::new(self.bind, self.port),
                topic: self.topic,
                ..Default::default()
            },
            frame_id: self.frame_id,
            bus_capacity: self.bus_capacity,
            forward_to: self.forward,
            record_to: self.record,
        }
    }
}

/// Offline converter: CSV pose log to sequential marker log
#[derive(Parser, Debug)]
#[command(name = "csv2log", version, about = "Convert a CSV pose log into a marker log")]
pub struct ConvertArgs {
    /// CSV file to convert
    pub input: PathBuf,
    /// Output log (default: skeleton_log_<input stem>.sklog)
    pub output: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_TOPIC)]
    pub topic: String,
    #[arg(long, default_value = DEFAULT_FRAME_ID)]
    pub frame_id: String,
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl ConvertArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input))
    }

    pub fn converter_config(&self) -> ConverterConfig {
        ConverterConfig {
            topic: self.topic.clone(),
            frame_id: self.frame_id.clone(),
        }
    }
}

/// Diagnostic listener
#[derive(Parser, Debug)]
#[command(name = "udp-probe", version, about = "Check that a producer sends well-formed skeleton datagrams")]
pub struct ProbeArgs {
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,
    /// Total listening time in seconds
    #[arg(long, default_value_t = 15)]
    pub duration: u64,
    /// Per-read timeout in seconds
    #[arg(long, default_value_t = 2)]
    pub timeout: u64,
    /// Stop after this many datagrams
    #[arg(long)]
    pub max_packets: Option<usize>,
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl ProbeArgs {
    pub fn into_config(self) -> DiagnosticConfig {
        DiagnosticConfig {
            bind_addr: SocketAddr::new(self.bind, self.port),
            duration: Duration::from_secs(self.duration),
            read_timeout: Duration::from_secs(self.timeout),
            max_packets: self.max_packets,
        }
    }
}

/// Replay a CSV pose log over UDP
#[derive(Parser, Debug)]
#[command(name = "skel-replay", version, about = "Replay a CSV pose log as live UDP frames")]
pub struct ReplayArgs {
    pub input: PathBuf,
    #[arg(long, default_value_t = SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)))]
    pub dest: SocketAddr,
    /// Playback speed factor, 0 sends as fast as possible
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,
    /// Send only the key joints under their short names
    #[arg(long)]
    pub key_joints: bool,
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl ReplayArgs {
    pub fn sender_config(&self) -> SenderConfig {
        SenderConfig {
            dest: self.dest,
            naming: if self.key_joints {
                JointNaming::KeyJoints
            } else {
                JointNaming::Full
            },
        }
    }

    pub fn replay_config(&self) -> ReplayConfig {
        ReplayConfig { speed: self.speed }
    }
}
