//! Grouping of skeleton rows into frames
//!
//! A frame boundary is a change of timestamp between consecutive rows.

use std::io::Read;

use skelbridge_core::{BridgeResult, Frame, Skeleton, Timestamp};

use crate::CsvSkeletonReader;

/// Single-pass grouper over rows in file order
#[derive(Debug, Default)]
pub struct FrameGrouper {
    current: Option<Frame>,
}

impl FrameGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row. Returns the previous frame when `timestamp` starts a new one.
    pub fn push(&mut self, timestamp: Timestamp, skeleton: Skeleton) -> Option<Frame> {
        if let Some(frame) = self.current.as_mut() {
            if frame.timestamp == timestamp {
                frame.push_skeleton(skeleton);
                return None;
            }
        }
        self.current
            .replace(Frame::new(timestamp).with_skeleton(skeleton))
    }

    /// Flush the last open frame
    pub fn finish(&mut self) -> Option<Frame> {
        self.current.take()
    }
}

/// Frames of a CSV log, in file order
///
/// Malformed rows are skipped with a warning and counted.
pub struct CsvFrames<R> {
    rows: CsvSkeletonReader<R>,
    grouper: FrameGrouper,
    rows_read: u64,
    skipped_rows: u64,
    done: bool,
}

impl<R: Read> CsvFrames<R> {
    pub fn new(input: R) -> BridgeResult<Self> {
        Ok(CsvFrames {
            rows: CsvSkeletonReader::new(input)?,
            grouper: FrameGrouper::new(),
            rows_read: 0,
            skipped_rows: 0,
            done: false,
        })
    }

    /// Next complete frame, `None` once the input is exhausted
    pub fn next_frame(&mut self) -> BridgeResult<Option<Frame>> {
        if self.done {
            return Ok(None);
        }

        loop {
            match self.rows.next_row() {
                Ok(Some(row)) => {
                    self.rows_read += 1;
                    if let Some(frame) = self.grouper.push(row.timestamp, row.skeleton) {
                        return Ok(Some(frame));
                    }
                }
                Ok(None) => {
                    self.done = true;
                    return Ok(self.grouper.finish());
                }
                Err(e) if e.is_discardable() => {
                    self.skipped_rows += 1;
                    tracing::warn!("skipping row: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Rows parsed successfully so far
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub fn skipped_rows(&self) -> u64 {
        self.skipped_rows
    }
}

impl<R: Read> Iterator for CsvFrames<R> {
    type Item = BridgeResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}
