//! Offline CSV converter
//!
//! Reads a recorded CSV log, groups rows into frames by timestamp and
//! writes one marker collection per frame into a sequential log, stamped
//! with the frame's recorded timestamp. Malformed rows are skipped with a
//! warning. Runs to completion and holds no state afterwards.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use skelbridge_core::{BridgeResult, Frame};
use skelbridge_marker::{MarkerCodec, MarkerEncoder, DEFAULT_FRAME_ID, DEFAULT_TOPIC};

use crate::{CsvFrames, LogWriter, TopicMetadata};

/// Extension of the sequential log
pub const LOG_EXTENSION: &str = "sklog";

#[derive(Clone, Debug)]
pub struct ConverterConfig {
    pub topic: String,
    pub frame_id: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            topic: DEFAULT_TOPIC.to_string(),
            frame_id: DEFAULT_FRAME_ID.to_string(),
        }
    }
}

/// Outcome of one conversion
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Rows parsed successfully
    pub rows: u64,
    pub skipped_rows: u64,
    /// Collections written
    pub frames: u64,
    pub markers: u64,
}

pub struct CsvConverter {
    config: ConverterConfig,
    encoder: MarkerEncoder,
}

impl CsvConverter {
    pub fn new(config: ConverterConfig) -> Self {
        let encoder = MarkerEncoder::new(config.frame_id.clone());
        CsvConverter { config, encoder }
    }

    /// Convert `input` into a new log file at `output`.
    ///
    /// A missing input is reported before the output is created.
    pub fn convert_file(&self, input: &Path, output: &Path) -> BridgeResult<ConversionSummary> {
        let reader = BufReader::new(File::open(input)?);
        let mut log = LogWriter::create(output)?;
        let summary = self.convert(reader, &mut log)?;
        log.finish()?;

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            rows = summary.rows,
            skipped = summary.skipped_rows,
            frames = summary.frames,
            markers = summary.markers,
            "conversion finished"
        );
        Ok(summary)
    }

    /// Convert CSV from `input` into an open log
    pub fn convert<R: Read, W: Write>(
        &self,
        input: R,
        log: &mut LogWriter<W>,
    ) -> BridgeResult<ConversionSummary> {
        let mut frames = CsvFrames::new(input)?;
        log.create_topic(&TopicMetadata::marker_array(self.config.topic.clone()))?;

        let mut summary = ConversionSummary::default();
        while let Some(frame) = frames.next_frame()? {
            self.write_frame(&frame, log, &mut summary)?;
        }
        summary.rows = frames.rows_read();
        summary.skipped_rows = frames.skipped_rows();
        Ok(summary)
    }

    fn write_frame<W: Write>(
        &self,
        frame: &Frame,
        log: &mut LogWriter<W>,
        summary: &mut ConversionSummary,
    ) -> BridgeResult<()> {
        let markers = self.encoder.encode(frame);
        log.write(
            &self.config.topic,
            frame.timestamp.as_nanos(),
            &MarkerCodec::encode(&markers),
        )?;

        summary.frames += 1;
        summary.markers += markers.len() as u64;
        tracing::debug!(
            timestamp = frame.timestamp.as_millis(),
            skeletons = frame.skeleton_count(),
            markers = markers.len(),
            "frame written"
        );
        Ok(())
    }
}

/// `skeleton_log_<stem>.sklog` in the current directory
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());
    PathBuf::from(format!("skeleton_log_{}.{}", stem, LOG_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use skelbridge_core::{BridgeError, Point3};
    use skelbridge_marker::{Color, MARKER_ARRAY_TYPE};

    use crate::csv_log::tests::csv_text;
    use crate::{LogReader, LogRecord};

    fn convert(text: String) -> (ConversionSummary, Vec<LogRecord>) {
        let converter = CsvConverter::new(ConverterConfig::default());
        let mut log = LogWriter::new(Vec::new()).unwrap();
        let summary = converter.convert(Cursor::new(text), &mut log).unwrap();

        let bytes = log.finish().unwrap();
        let records = LogReader::new(Cursor::new(bytes))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        (summary, records)
    }

    fn messages(records: &[LogRecord]) -> Vec<(i64, skelbridge_marker::MarkerArray)> {
        records
            .iter()
            .filter_map(|r| match r {
                LogRecord::Message(m) => Some((m.timestamp_ns, MarkerCodec::decode(&m.payload).unwrap())),
                LogRecord::Topic(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_one_collection_per_timestamp() {
        let text = csv_text(
            &[(100, 0), (100, 1), (100, 2), (200, 0), (200, 1), (300, 0)],
            (0.1, 0.2, 1.0, 0.9),
        );
        let (summary, records) = convert(text);

        assert_eq!(summary.rows, 6);
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.markers, 6 * 17);

        assert!(matches!(
            &records[0],
            LogRecord::Topic(t) if t.name == DEFAULT_TOPIC && t.type_name == MARKER_ARRAY_TYPE
        ));

        let messages = messages(&records);
        let stamps: Vec<i64> = messages.iter().map(|(ts, _)| *ts).collect();
        assert_eq!(stamps, vec![100_000_000, 200_000_000, 300_000_000]);
        let sizes: Vec<usize> = messages.iter().map(|(_, m)| m.len()).collect();
        assert_eq!(sizes, vec![3 * 17, 2 * 17, 17]);
    }

    #[test]
    fn test_recorded_marker_content() {
        let (_, records) = convert(csv_text(&[(1500, 2)], (0.1, 0.2, 1.0, 0.9)));
        let messages = messages(&records);
        let markers = &messages[0].1.markers;

        assert_eq!(markers.len(), 17);
        // Left Wrist is landmark 9
        let wrist = &markers[9];
        assert_eq!(wrist.id, 209);
        assert_eq!(wrist.namespace, "person_2");
        assert_eq!(wrist.color, Color::WRIST);
        assert_eq!(wrist.position, Point3::new(1.0, -0.1, -0.2));
        assert_eq!(wrist.stamp.sec, 1);
        assert_eq!(wrist.stamp.nanosec, 500_000_000);
        assert_eq!(markers[0].color, Color::BODY);
    }

    #[test]
    fn test_skeleton_without_valid_joints_adds_nothing() {
        let mut text = csv_text(&[(100, 0)], (0.1, 0.2, 1.0, 0.9));
        let absent = csv_text(&[(100, 1)], (0.1, 0.2, 0.0, 0.1));
        text.push_str(absent.lines().nth(1).unwrap());
        text.push('\n');

        let (summary, records) = convert(text);
        assert_eq!(summary.frames, 1);
        assert_eq!(messages(&records)[0].1.len(), 17);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let mut text = csv_text(&[(100, 0)], (0.1, 0.2, 1.0, 0.9));
        text.push_str("100,1,1,0.9,bad\n");
        let (summary, _) = convert(text);

        assert_eq!(summary.rows, 1);
        assert_eq!(summary.skipped_rows, 1);
        assert_eq!(summary.frames, 1);
    }

    #[test]
    fn test_empty_csv_writes_topic_only() {
        let (summary, records) = convert(csv_text(&[], (0.0, 0.0, 0.0, 0.0)));
        assert_eq!(summary, ConversionSummary::default());
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.sklog");
        let converter = CsvConverter::new(ConverterConfig::default());

        let result = converter.convert_file(&dir.path().join("missing.csv"), &output);
        assert!(matches!(result, Err(BridgeError::Io(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_convert_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("session.csv");
        let output = dir.path().join("session.sklog");
        std::fs::write(&input, csv_text(&[(1, 0), (2, 0)], (0.1, 0.2, 1.0, 0.9))).unwrap();

        let summary = CsvConverter::new(ConverterConfig::default())
            .convert_file(&input, &output)
            .unwrap();
        assert_eq!(summary.frames, 2);

        let count = LogReader::open(&output).unwrap().count();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/data/session_01.csv")),
            PathBuf::from("skeleton_log_session_01.sklog")
        );
    }
}
