//! Wide-format CSV pose logs
//!
//! One row per skeleton per frame:
//!
//! ```text
//! Timestamp,PersonID,J0_X,J0_Y,J0_Z,J0_Conf,...,J16_X,J16_Y,J16_Z,J16_Conf
//! ```
//!
//! Columns are resolved by header name; extra columns (the recorder also
//! writes `FrameIndex` and `Confidence`) are ignored.

use std::io::Read;

use csv::StringRecord;

use skelbridge_core::{
    BridgeError, BridgeResult, Joint, Landmark, Point3, Skeleton, Timestamp, LANDMARK_COUNT,
};

/// Column indices of one recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvColumns {
    timestamp: usize,
    person_id: usize,
    /// x, y, z, confidence per landmark
    joints: [[usize; 4]; LANDMARK_COUNT],
}

impl CsvColumns {
    /// Resolve columns from the header row. A missing column is a schema error.
    pub fn from_headers(headers: &StringRecord) -> BridgeResult<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| BridgeError::Schema(format!("missing CSV column {}", name)))
        };

        let mut joints = [[0usize; 4]; LANDMARK_COUNT];
        for (i, cols) in joints.iter_mut().enumerate() {
            cols[0] = find(&format!("J{}_X", i))?;
            cols[1] = find(&format!("J{}_Y", i))?;
            cols[2] = find(&format!("J{}_Z", i))?;
            cols[3] = find(&format!("J{}_Conf", i))?;
        }

        Ok(CsvColumns {
            timestamp: find("Timestamp")?,
            person_id: find("PersonID")?,
            joints,
        })
    }

    /// Parse one data row into a skeleton; absent joints are dropped.
    pub fn parse_row(&self, record: &StringRecord, line: u64) -> BridgeResult<SkeletonRow> {
        let field = |idx: usize| {
            record.get(idx).ok_or_else(|| BridgeError::InvalidRow {
                line,
                reason: format!("missing field {}", idx + 1),
            })
        };
        let int = |idx: usize| -> BridgeResult<i64> {
            let raw = field(idx)?;
            raw.parse().map_err(|_| BridgeError::InvalidRow {
                line,
                reason: format!("expected integer, got {:?}", raw),
            })
        };
        let float = |idx: usize| -> BridgeResult<f64> {
            let raw = field(idx)?;
            raw.parse().map_err(|_| BridgeError::InvalidRow {
                line,
                reason: format!("expected number, got {:?}", raw),
            })
        };

        let timestamp = Timestamp::from_millis(int(self.timestamp)?);
        let mut skeleton = Skeleton::new(int(self.person_id)?);

        for (landmark, cols) in Landmark::all().iter().zip(self.joints.iter()) {
            let position = Point3::new(float(cols[0])?, float(cols[1])?, float(cols[2])?);
            skeleton.push_joint(Joint::new(*landmark, position, float(cols[3])?));
        }

        Ok(SkeletonRow {
            line,
            timestamp,
            skeleton,
        })
    }
}

/// One parsed CSV row
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonRow {
    /// 1-based line in the source file
    pub line: u64,
    pub timestamp: Timestamp,
    pub skeleton: Skeleton,
}

/// Streams skeleton rows out of a CSV log in file order
pub struct CsvSkeletonReader<R> {
    reader: csv::Reader<R>,
    columns: CsvColumns,
    record: StringRecord,
}

impl<R: Read> CsvSkeletonReader<R> {
    /// Read the header row and resolve columns
    pub fn new(input: R) -> BridgeResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(input);

        let headers = reader.headers().map_err(csv_error)?.clone();
        let columns = CsvColumns::from_headers(&headers)?;

        Ok(CsvSkeletonReader {
            reader,
            columns,
            record: StringRecord::new(),
        })
    }

    /// Next row. `InvalidRow` errors are per-row and reading may continue.
    pub fn next_row(&mut self) -> BridgeResult<Option<SkeletonRow>> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => Ok(None),
            Ok(true) => {
                let line = self.record.position().map(|p| p.line()).unwrap_or(0);
                self.columns.parse_row(&self.record, line).map(Some)
            }
            Err(e) => Err(csv_error(e)),
        }
    }
}

impl<R: Read> Iterator for CsvSkeletonReader<R> {
    type Item = BridgeResult<SkeletonRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

fn csv_error(e: csv::Error) -> BridgeError {
    let line = e.position().map(|p| p.line()).unwrap_or(0);
    match e.into_kind() {
        csv::ErrorKind::Io(io) => BridgeError::Io(io),
        other => BridgeError::InvalidRow {
            line,
            reason: format!("{:?}", other),
        },
    }
}

/// Header row in recorder layout
pub fn csv_header() -> Vec<String> {
    let mut header = vec![
        "Timestamp".to_string(),
        "FrameIndex".to_string(),
        "PersonID".to_string(),
        "Confidence".to_string(),
    ];
    for i in 0..LANDMARK_COUNT {
        header.push(format!("J{}_X", i));
        header.push(format!("J{}_Y", i));
        header.push(format!("J{}_Z", i));
        header.push(format!("J{}_Conf", i));
    }
    header
}
