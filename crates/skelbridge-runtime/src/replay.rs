//! CSV replay over UDP
//!
//! Streams a recorded CSV log through the frame grouper and sends each
//! frame as a live datagram, paced by the recorded timestamp deltas.

use std::io::Read;
use std::time::Duration;

use skelbridge_core::{BridgeResult, Frame, Timestamp};
use skelbridge_record::CsvFrames;
use skelbridge_transport::UdpFrameSender;

#[derive(Clone, Debug)]
pub struct ReplayConfig {
    /// Playback speed factor; zero or negative disables pacing
    pub speed: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig { speed: 1.0 }
    }
}

impl ReplayConfig {
    /// Wait between two frames recorded `gap` apart
    pub fn pace(&self, gap: Duration) -> Option<Duration> {
        if self.speed <= 0.0 || !self.speed.is_finite() || gap.is_zero() {
            return None;
        }
        Some(gap.div_f64(self.speed))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: u64,
    /// Datagrams sent (frames without skeletons are skipped)
    pub sent: u64,
    pub skipped_rows: u64,
}

pub struct Replayer {
    sender: UdpFrameSender,
    config: ReplayConfig,
    last: Option<Timestamp>,
    summary: ReplaySummary,
}

impl Replayer {
    pub fn new(sender: UdpFrameSender, config: ReplayConfig) -> Self {
        Replayer {
            sender,
            config,
            last: None,
            summary: ReplaySummary::default(),
        }
    }

    /// Replay a CSV log to completion
    pub async fn replay_csv<R: Read>(mut self, input: R) -> BridgeResult<ReplaySummary> {
        let mut frames = CsvFrames::new(input)?;
        while let Some(frame) = frames.next_frame()? {
            self.send_frame(&frame).await?;
        }
        self.summary.skipped_rows = frames.skipped_rows();

        tracing::info!(
            dest = %self.sender.dest(),
            frames = self.summary.frames,
            sent = self.summary.sent,
            skipped_rows = self.summary.skipped_rows,
            "replay finished"
        );
        Ok(self.summary)
    }

    async fn send_frame(&mut self, frame: &Frame) -> BridgeResult<()> {
        if let Some(last) = self.last {
            if let Some(wait) = self.config.pace(frame.timestamp.duration_since(last)) {
                tokio::time::sleep(wait).await;
            }
        }
        self.last = Some(frame.timestamp);

        self.summary.frames += 1;
        if self.sender.send(frame).await? {
            self.summary.sent += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use skelbridge_core::LANDMARK_COUNT;
    use skelbridge_record::csv_header;
    use skelbridge_transport::SenderConfig;
    use skelbridge_wire::{WirePacket, MAX_PACKET_SIZE};
    use tokio::net::UdpSocket;
    use tokio::time::timeout;

    fn csv(rows: &[(i64, i64)]) -> String {
        let mut out = csv_header().join(",");
        out.push('\n');
        for (i, (ts, person)) in rows.iter().enumerate() {
            out.push_str(&format!("{},{},{},1.0", ts, i, person));
            for _ in 0..LANDMARK_COUNT {
                out.push_str(",0.1,0.2,1.5,0.9");
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_pace() {
        let config = ReplayConfig { speed: 2.0 };
        assert_eq!(
            config.pace(Duration::from_millis(100)),
            Some(Duration::from_millis(50))
        );
        assert_eq!(config.pace(Duration::ZERO), None);
        assert_eq!(ReplayConfig { speed: 0.0 }.pace(Duration::from_secs(1)), None);
    }

    #[tokio::test]
    async fn test_skips_malformed_rows() {
        let rx = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sender = UdpFrameSender::bind(SenderConfig {
            dest: rx.local_addr().unwrap(),
            ..Default::default()
        })
        .await
        .unwrap();

        let mut text = csv(&[(0, 0)]);
        text.push_str("0,1,1,1.0,bad\n");
        let summary = Replayer::new(sender, ReplayConfig { speed: 0.0 })
            .replay_csv(Cursor::new(text))
            .await
            .unwrap();
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.skipped_rows, 1);
    }

    #[tokio::test]
    async fn test_replays_one_datagram_per_frame() {
        let rx = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sender = UdpFrameSender::bind(SenderConfig {
            dest: rx.local_addr().unwrap(),
            ..Default::default()
        })
        .await
        .unwrap();

        let text = csv(&[(0, 0), (0, 1), (10, 0)]);
        let summary = Replayer::new(sender, ReplayConfig { speed: 10.0 })
            .replay_csv(Cursor::new(text))
            .await
            .unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.sent, 2);

        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        let (len, _) = timeout(Duration::from_secs(2), rx.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let first = WirePacket::decode(&buf[..len]).unwrap();
        assert_eq!(first.skeletons.len(), 2);
        assert_eq!(first.skeletons[0].joints.len(), LANDMARK_COUNT);
        assert!(first.skeletons[0].joints.contains_key("Left Wrist"));

        let (len, _) = timeout(Duration::from_secs(2), rx.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(WirePacket::decode(&buf[..len]).unwrap().skeletons.len(), 1);
    }
}
