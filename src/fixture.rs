//! Conformance fixture replay.
//!
//! A fixture is an ordered capture of encoder stimuli and responses, stored as `;`-separated
//! CSV with a header row:
//!
//! ```text
//! tmds_encoder.data_in;tmds_encoder.ve_in;tmds_encoder.control_in;tmds_encoder.q_out
//! 0;0;0;852
//! 0;1;0;256
//! ```
//!
//! Columns are matched on the name after the last `.`, so any prefix is accepted.
//! All records are replayed through one [`Encoder`], the running disparity carries over.

use crate::error::Error;
use crate::{Encoder, Grouped, Symbol};
use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub data_in: i32,
    pub ve_in: bool,
    pub control_in: i32,
    pub expected_q_out: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// 1-based position of the record in the fixture
    pub row: usize,
    pub record: Record,
    pub kind: MismatchKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    Symbol { got: Symbol, cnt: i32 },
    Decode { got: u8 },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    pub records: usize,
    pub mismatches: Vec<Mismatch>,
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column `{0}`")]
    MissingColumn(&'static str),

    #[error("row {row}: cannot parse `{value}` in column `{column}`")]
    Parse {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("codec error: {0}")]
    Codec(#[from] Error),
}

const COLUMNS: [&str; 4] = ["data_in", "ve_in", "control_in", "q_out"];

/// Read every record of a fixture, in order.
pub fn parse<R: io::Read>(reader: R) -> Result<Vec<Record>, FixtureError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut index = [0usize; 4];
    for (slot, column) in index.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.rsplit('.').next() == Some(column))
            .ok_or(FixtureError::MissingColumn(column))?;
    }
    debug!("fixture columns at {index:?}");

    let mut records = vec![];
    for (i, result) in rdr.records().enumerate() {
        let r = result?;
        let row = i + 1;
        let field = |n: usize| -> Result<i64, FixtureError> {
            let value = r.get(index[n]).unwrap_or_default();
            parse_number(value).ok_or_else(|| FixtureError::Parse {
                row,
                column: COLUMNS[n],
                value: value.to_owned(),
            })
        };
        let ve_in = match field(1)? {
            0 => false,
            1 => true,
            _ => {
                return Err(FixtureError::Parse {
                    row,
                    column: COLUMNS[1],
                    value: r.get(index[1]).unwrap_or_default().to_owned(),
                })
            }
        };
        let data_in = narrow(field(0)?, row, COLUMNS[0])?;
        let control_in = narrow(field(2)?, row, COLUMNS[2])?;
        let expected_q_out = u16::try_from(field(3)?).map_err(|_| FixtureError::Parse {
            row,
            column: COLUMNS[3],
            value: r.get(index[3]).unwrap_or_default().to_owned(),
        })?;
        records.push(Record {
            data_in,
            ve_in,
            control_in,
            expected_q_out,
        });
    }
    info!("loaded {} fixture records", records.len());
    Ok(records)
}

/// Accepts decimal, `0x` hex and `0b` binary, plus `true`/`false`.
fn parse_number(value: &str) -> Option<i64> {
    match value {
        "true" => return Some(1),
        "false" => return Some(0),
        _ => {}
    }
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let parsed = if let Some(hex) = digits.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = digits.strip_prefix("0b") {
        i64::from_str_radix(bin, 2)
    } else {
        digits.parse()
    };
    parsed.ok().map(|v| if negative { -v } else { v })
}

fn narrow(value: i64, row: usize, column: &'static str) -> Result<i32, FixtureError> {
    i32::try_from(value).map_err(|_| FixtureError::Parse {
        row,
        column,
        value: value.to_string(),
    })
}

/// Replay `records` through a fresh encoder.
///
/// Fails only when a record holds out-of-range stimuli; wrong outputs are collected in the
/// report.
pub fn replay(records: &[Record]) -> Result<Report, Error> {
    let mut encoder = Encoder::new();
    let mut report = Report {
        records: records.len(),
        mismatches: vec![],
    };
    for (i, record) in records.iter().enumerate() {
        let row = i + 1;
        let symbol = encoder.encode(record.data_in, record.ve_in, record.control_in)?;
        if symbol.value() != record.expected_q_out {
            let mismatch = Mismatch {
                row,
                record: *record,
                kind: MismatchKind::Symbol {
                    got: symbol,
                    cnt: encoder.disparity(),
                },
            };
            warn!("{mismatch}");
            report.mismatches.push(mismatch);
        }
        if record.ve_in {
            let got = symbol.decode();
            if got as i32 != record.data_in {
                let mismatch = Mismatch {
                    row,
                    record: *record,
                    kind: MismatchKind::Decode { got },
                };
                warn!("{mismatch}");
                report.mismatches.push(mismatch);
            }
        }
    }
    if report.passed() {
        info!("all {} fixture records passed", report.records);
    } else {
        info!(
            "{} errors over {} fixture records",
            report.mismatches.len(),
            report.records
        );
    }
    Ok(report)
}

/// Load and replay a fixture in one go.
pub fn check<R: io::Read>(reader: R) -> Result<Report, FixtureError> {
    let records = parse(reader)?;
    Ok(replay(&records)?)
}

impl Report {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.record;
        write!(
            f,
            "row {}: data_in 0x{:02X}, de {}, ctrl {}: ",
            self.row, r.data_in, r.ve_in as u8, r.control_in
        )?;
        match self.kind {
            MismatchKind::Symbol { got, cnt } => write!(
                f,
                "encoded {got} (cnt {cnt}), expected {}",
                Grouped::new(r.expected_q_out, 10)
            ),
            MismatchKind::Decode { got } => write!(f, "decoded back to 0x{got:02X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{check, parse, replay, FixtureError, MismatchKind, Record};
    use crate::{setup, Error};

    const STIMULI: &str = include_str!("../fixtures/stimuli.csv");

    #[test]
    fn test_fixture_conformance() {
        setup();
        let records = parse(STIMULI.as_bytes()).unwrap();
        assert_eq!(records.len(), STIMULI.lines().count() - 1);
        assert_eq!(
            records[0],
            Record {
                data_in: 0,
                ve_in: false,
                control_in: 0,
                expected_q_out: 0b1101010100,
            }
        );
        let report = replay(&records).unwrap();
        assert_eq!(report.records, records.len());
        assert!(report.passed(), "{:#?}", report.mismatches);
    }

    #[test]
    fn test_fixture_reports_mismatch() {
        setup();
        let csv = "a.data_in;a.ve_in;a.control_in;a.q_out\n0;1;0;256\n0;1;0;255\n0;0;1;170\n";
        let records = parse(csv.as_bytes()).unwrap();
        let report = replay(&records).unwrap();
        assert!(!report.passed());
        assert_eq!(report.mismatches.len(), 2);
        // row 2 expects the uninverted symbol, row 3 the wrong control code
        assert_eq!(report.mismatches[0].row, 2);
        assert!(matches!(
            report.mismatches[0].kind,
            MismatchKind::Symbol { .. }
        ));
        assert_eq!(report.mismatches[1].row, 3);
        assert!(report.mismatches[1]
            .to_string()
            .starts_with("row 3: data_in 0x00, de 0, ctrl 1: encoded"));
    }

    #[test]
    fn test_fixture_errors() {
        setup();
        let err = parse("data_in;ve_in;q_out\n0;1;256\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FixtureError::MissingColumn("control_in")));

        let err = parse("data_in;ve_in;control_in;q_out\n0;2;0;256\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            FixtureError::Parse {
                row: 1,
                column: "ve_in",
                ..
            }
        ));

        let err = parse("data_in;ve_in;control_in;q_out\nzz;1;0;256\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FixtureError::Parse { column: "data_in", .. }));

        // out-of-range stimuli parse, but stop the replay
        let records = parse("data_in;ve_in;control_in;q_out\n0x100;1;0;0\n".as_bytes()).unwrap();
        assert_eq!(records[0].data_in, 256);
        assert!(matches!(
            replay(&records),
            Err(Error::OutOfRange { field: "data", .. })
        ));
        let err = check("data_in;ve_in;control_in;q_out\n0;1;7;0\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            FixtureError::Codec(Error::OutOfRange {
                field: "control",
                value: 7,
                ..
            })
        ));
    }
}
