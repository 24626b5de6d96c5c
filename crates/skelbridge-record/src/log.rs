//! Sequential marker log (`.sklog`)
//!
//! Append-only container of topic declarations and timestamped messages,
//! read back in write order.
//!
//! ```text
//! file   = "SKLOG" version:u8 record*
//! record = tag:u8 len:u32 body[len]
//! topic   (0x01) = name:str type:str serialization_format:str
//! message (0x02) = topic:str timestamp_ns:i64 payload_len:u32 payload
//! str    = len:u16 utf8
//! ```
//!
//! All integers are little-endian.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use skelbridge_core::{BridgeError, BridgeResult};
use skelbridge_marker::MARKER_ARRAY_TYPE;

/// File magic
pub const LOG_MAGIC: &[u8; 5] = b"SKLOG";

/// Container format version
pub const LOG_VERSION: u8 = 1;

/// Serialization format tag for payloads written by `MarkerCodec`
pub const MARKER_SERIALIZATION_FORMAT: &str = "skelbridge-le";

const TAG_TOPIC: u8 = 0x01;
const TAG_MESSAGE: u8 = 0x02;

/// Topic declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMetadata {
    pub name: String,
    pub type_name: String,
    pub serialization_format: String,
}

impl TopicMetadata {
    /// Marker collection topic in the native payload format
    pub fn marker_array(name: impl Into<String>) -> Self {
        TopicMetadata {
            name: name.into(),
            type_name: MARKER_ARRAY_TYPE.to_string(),
            serialization_format: MARKER_SERIALIZATION_FORMAT.to_string(),
        }
    }
}

/// One logged message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub topic: String,
    pub timestamp_ns: i64,
    pub payload: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Topic(TopicMetadata),
    Message(LogMessage),
}

/// Log writer
pub struct LogWriter<W: Write> {
    out: W,
    topics: HashSet<String>,
    messages: u64,
}

impl LogWriter<BufWriter<File>> {
    /// Create (or truncate) a log file
    pub fn create(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let file = File::create(path.as_ref())?;
        LogWriter::new(BufWriter::new(file))
    }
}

impl<W: Write> LogWriter<W> {
    /// Start a log on `out`, writing the file header
    pub fn new(mut out: W) -> BridgeResult<Self> {
        out.write_all(LOG_MAGIC)?;
        out.write_all(&[LOG_VERSION])?;
        Ok(LogWriter {
            out,
            topics: HashSet::new(),
            messages: 0,
        })
    }

    /// Declare a topic. Declaring an existing topic again is a no-op.
    pub fn create_topic(&mut self, topic: &TopicMetadata) -> BridgeResult<()> {
        if self.topics.contains(&topic.name) {
            return Ok(());
        }

        let mut body = BytesMut::new();
        put_str(&mut body, &topic.name)?;
        put_str(&mut body, &topic.type_name)?;
        put_str(&mut body, &topic.serialization_format)?;
        self.write_record(TAG_TOPIC, &body)?;

        self.topics.insert(topic.name.clone());
        tracing::debug!(topic = %topic.name, "log topic declared");
        Ok(())
    }

    /// Append a message to a declared topic
    pub fn write(&mut self, topic: &str, timestamp_ns: i64, payload: &[u8]) -> BridgeResult<()> {
        if !self.topics.contains(topic) {
            return Err(BridgeError::UnknownTopic(topic.to_string()));
        }
        let payload_len = u32::try_from(payload.len())
            .map_err(|_| BridgeError::LogFormat(format!("payload too large: {}", payload.len())))?;

        let mut body = BytesMut::with_capacity(payload.len() + topic.len() + 16);
        put_str(&mut body, topic)?;
        body.put_i64_le(timestamp_ns);
        body.put_u32_le(payload_len);
        body.put_slice(payload);
        self.write_record(TAG_MESSAGE, &body)?;

        self.messages += 1;
        Ok(())
    }

    /// Messages written so far
    pub fn message_count(&self) -> u64 {
        self.messages
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> BridgeResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_record(&mut self, tag: u8, body: &[u8]) -> BridgeResult<()> {
        let len = u32::try_from(body.len())
            .map_err(|_| BridgeError::LogFormat(format!("record too large: {}", body.len())))?;
        self.out.write_all(&[tag])?;
        self.out.write_all(&len.to_le_bytes())?;
        self.out.write_all(body)?;
        Ok(())
    }
}

/// Log reader, yields records in write order
pub struct LogReader<R: Read> {
    input: R,
}

impl LogReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let file = File::open(path.as_ref())?;
        LogReader::new(BufReader::new(file))
    }
}

impl<R: Read> LogReader<R> {
    /// Check the file header
    pub fn new(mut input: R) -> BridgeResult<Self> {
        let mut header = [0u8; 6];
        input.read_exact(&mut header).map_err(truncated)?;
        if &header[..5] != LOG_MAGIC {
            return Err(BridgeError::LogFormat("not a skeleton log".into()));
        }
        if header[5] != LOG_VERSION {
            return Err(BridgeError::LogFormat(format!(
                "unsupported log version {}",
                header[5]
            )));
        }
        Ok(LogReader { input })
    }

    /// Next record, `None` at a clean end of file
    pub fn next_record(&mut self) -> BridgeResult<Option<LogRecord>> {
        let mut tag = [0u8; 1];
        match self.input.read_exact(&mut tag) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let mut len = [0u8; 4];
        self.input.read_exact(&mut len).map_err(truncated)?;
        let mut body = vec![0u8; u32::from_le_bytes(len) as usize];
        self.input.read_exact(&mut body).map_err(truncated)?;
        let mut buf = &body[..];

        let record = match tag[0] {
            TAG_TOPIC => LogRecord::Topic(TopicMetadata {
                name: get_str(&mut buf)?,
                type_name: get_str(&mut buf)?,
                serialization_format: get_str(&mut buf)?,
            }),
            TAG_MESSAGE => {
                let topic = get_str(&mut buf)?;
                ensure(&buf, 12)?;
                let timestamp_ns = buf.get_i64_le();
                let payload_len = buf.get_u32_le() as usize;
                ensure(&buf, payload_len)?;
                let payload = Bytes::copy_from_slice(&buf[..payload_len]);
                buf.advance(payload_len);
                LogRecord::Message(LogMessage {
                    topic,
                    timestamp_ns,
                    payload,
                })
            }
            other => {
                return Err(BridgeError::LogFormat(format!(
                    "unknown record tag {:#04x}",
                    other
                )))
            }
        };

        if buf.has_remaining() {
            return Err(BridgeError::LogFormat("trailing bytes in record".into()));
        }
        Ok(Some(record))
    }
}

impl<R: Read> Iterator for LogReader<R> {
    type Item = BridgeResult<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

fn put_str(buf: &mut BytesMut, s: &str) -> BridgeResult<()> {
    let len = u16::try_from(s.len())
        .map_err(|_| BridgeError::LogFormat(format!("string too long: {}", s.len())))?;
    buf.put_u16_le(len);
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn get_str(buf: &mut &[u8]) -> BridgeResult<String> {
    ensure(buf, 2)?;
    let len = buf.get_u16_le() as usize;
    ensure(buf, len)?;
    let s = std::str::from_utf8(&buf[..len])
        .map_err(|e| BridgeError::LogFormat(e.to_string()))?
        .to_string();
    buf.advance(len);
    Ok(s)
}

fn ensure(buf: &[u8], needed: usize) -> BridgeResult<()> {
    if buf.len() < needed {
        return Err(BridgeError::LogFormat("truncated record".into()));
    }
    Ok(())
}

fn truncated(e: io::Error) -> BridgeError {
    if e.kind() == ErrorKind::UnexpectedEof {
        BridgeError::LogFormat("unexpected end of log".into())
    } else {
        e.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn write_sample() -> Vec<u8> {
        let mut writer = LogWriter::new(Vec::new()).unwrap();
        writer
            .create_topic(&TopicMetadata::marker_array("/human_skeleton"))
            .unwrap();
        writer.write("/human_skeleton", 100_000_000, b"first").unwrap();
        writer.write("/human_skeleton", 200_000_000, b"").unwrap();
        assert_eq!(writer.message_count(), 2);
        writer.finish().unwrap()
    }

    #[test]
    fn test_records_read_back_in_order() {
        let records: Vec<LogRecord> = LogReader::new(Cursor::new(write_sample()))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0],
            LogRecord::Topic(TopicMetadata {
                name: "/human_skeleton".into(),
                type_name: MARKER_ARRAY_TYPE.into(),
                serialization_format: MARKER_SERIALIZATION_FORMAT.into(),
            })
        );
        match &records[1] {
            LogRecord::Message(m) => {
                assert_eq!(m.timestamp_ns, 100_000_000);
                assert_eq!(&m.payload[..], b"first");
            }
            other => panic!("expected message, got {:?}", other),
        }
        assert!(matches!(&records[2], LogRecord::Message(m) if m.payload.is_empty()));
    }

    #[test]
    fn test_undeclared_topic_rejected() {
        let mut writer = LogWriter::new(Vec::new()).unwrap();
        let result = writer.write("/elsewhere", 0, b"x");
        assert!(matches!(result, Err(BridgeError::UnknownTopic(t)) if t == "/elsewhere"));
    }

    #[test]
    fn test_topic_declared_once() {
        let mut writer = LogWriter::new(Vec::new()).unwrap();
        let topic = TopicMetadata::marker_array("/t");
        writer.create_topic(&topic).unwrap();
        writer.create_topic(&topic).unwrap();
        let bytes = writer.finish().unwrap();

        let topics = LogReader::new(Cursor::new(bytes))
            .unwrap()
            .filter(|r| matches!(r, Ok(LogRecord::Topic(_))))
            .count();
        assert_eq!(topics, 1);
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            LogReader::new(Cursor::new(b"NOTLOG".to_vec())),
            Err(BridgeError::LogFormat(_))
        ));
        assert!(matches!(
            LogReader::new(Cursor::new(b"SKLOG\x09".to_vec())),
            Err(BridgeError::LogFormat(_))
        ));
        assert!(matches!(
            LogReader::new(Cursor::new(b"SK".to_vec())),
            Err(BridgeError::LogFormat(_))
        ));
    }

    #[test]
    fn test_truncated_record() {
        let mut bytes = write_sample();
        bytes.truncate(bytes.len() - 3);

        let results: Vec<BridgeResult<LogRecord>> =
            LogReader::new(Cursor::new(bytes)).unwrap().take(3).collect();
        assert_eq!(results.len(), 3);
        assert!(results[..2].iter().all(|r| r.is_ok()));
        assert!(matches!(results[2], Err(BridgeError::LogFormat(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.sklog");

        let mut writer = LogWriter::create(&path).unwrap();
        writer.create_topic(&TopicMetadata::marker_array("/t")).unwrap();
        writer.write("/t", 5, b"abc").unwrap();
        writer.finish().unwrap();

        let records: Vec<LogRecord> = LogReader::open(&path).unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
    }
}
