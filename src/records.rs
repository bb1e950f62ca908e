//! Flat per-cell time series tables.

use log::{debug, info};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{LineageError, Result};

const CELL_COLUMN: &str = "cell";
const TIME_COLUMN: &str = "time";

/// One observation of one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub cell: String,
    pub time: u32,
    pub value: f64,
}

/// Samples of one cell, in time order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellSeries {
    pub start_timepoint: u32,
    pub series: Vec<f64>,
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(',').map(|f| f.trim().trim_matches('"')).collect()
}

/// Load the `cell`, `time` and `column` fields of a CSV table.
pub fn load_records(path: &Path, column: &str) -> Result<Vec<Record>> {
    info!("Loading {}...", path.display());
    let file = File::open(path).map_err(|e| LineageError::io(path, e))?;
    let records = parse_records(BufReader::new(file), path, column)?;
    info!("  -> {} rows", records.len());
    Ok(records)
}

/// Parse CSV text; `path` is only used in error messages.
pub fn parse_records<R: BufRead>(reader: R, path: &Path, column: &str) -> Result<Vec<Record>> {
    let mut lines = reader.lines().enumerate();

    let header = loop {
        match lines.next() {
            Some((_, line)) => {
                let line = line.map_err(|e| LineageError::io(path, e))?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => return Err(LineageError::records(path, 1, "missing header row")),
        }
    };

    let header = split_fields(header.trim_start_matches('\u{feff}'));
    let index_of = |name: &str| {
        header
            .iter()
            .position(|h| *h == name)
            .ok_or_else(|| LineageError::records(path, 1, format!("missing column '{}'", name)))
    };
    let cell_idx = index_of(CELL_COLUMN)?;
    let time_idx = index_of(TIME_COLUMN)?;
    let value_idx = index_of(column)?;

    let mut records = Vec::new();
    for (i, line) in lines {
        let line_no = i + 1;
        let line = line.map_err(|e| LineageError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_fields(&line);
        let field = |idx: usize, name: &str| {
            fields.get(idx).copied().ok_or_else(|| {
                LineageError::records(path, line_no, format!("missing field '{}'", name))
            })
        };

        let cell = field(cell_idx, CELL_COLUMN)?;
        let time_str = field(time_idx, TIME_COLUMN)?;
        let value_str = field(value_idx, column)?;

        let time = time_str.parse::<u32>().map_err(|_| {
            LineageError::records(path, line_no, format!("invalid time '{}'", time_str))
        })?;
        let value = value_str.parse::<f64>().map_err(|_| {
            LineageError::records(
                path,
                line_no,
                format!("invalid value '{}' in column '{}'", value_str, column),
            )
        })?;

        records.push(Record {
            cell: cell.to_string(),
            time,
            value,
        });
    }

    Ok(records)
}

/// Group records by cell, keeping only rows with `time <= end_timepoint` when given.
pub fn group_by_cell(records: &[Record], end_timepoint: Option<u32>) -> BTreeMap<String, CellSeries> {
    let mut by_cell: FxHashMap<&str, Vec<(u32, f64)>> = FxHashMap::default();
    for record in records {
        if end_timepoint.map_or(false, |end| record.time > end) {
            continue;
        }
        by_cell
            .entry(record.cell.as_str())
            .or_default()
            .push((record.time, record.value));
    }

    let mut cells = BTreeMap::new();
    for (cell, mut samples) in by_cell {
        samples.sort_by_key(|(time, _)| *time);
        let start_timepoint = samples[0].0;
        cells.insert(
            cell.to_string(),
            CellSeries {
                start_timepoint,
                series: samples.into_iter().map(|(_, v)| v).collect(),
            },
        );
    }

    debug!("Grouped {} rows into {} cells", records.len(), cells.len());
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str, column: &str) -> Result<Vec<Record>> {
        parse_records(Cursor::new(text), Path::new("test.csv"), column)
    }

    #[test]
    fn reads_selected_column() {
        let text = "cell,time,blot,other\nABa,3,10.5,1\n\nABa,4,12,2\n";
        let records = parse(text, "other").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cell, "ABa");
        assert_eq!(records[0].time, 3);
        assert_eq!(records[1].value, 2.0);
    }

    #[test]
    fn strips_quotes_and_whitespace() {
        let text = "\"cell\", \"time\", \"blot\"\n\"ABp\", 7, 1e3\n";
        let records = parse(text, "blot").unwrap();
        assert_eq!(records[0].cell, "ABp");
        assert_eq!(records[0].value, 1000.0);
    }

    #[test]
    fn missing_column_is_reported() {
        let err = parse("cell,time\nABa,1\n", "blot").unwrap_err();
        assert!(err.to_string().contains("missing column 'blot'"), "{err}");
    }

    #[test]
    fn bad_value_reports_line() {
        let err = parse("cell,time,blot\nABa,1,2\nABa,2,x\n", "blot").unwrap_err();
        match err {
            LineageError::Records { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn groups_in_time_order_and_trims() {
        let records = vec![
            Record { cell: "E".into(), time: 12, value: 3.0 },
            Record { cell: "E".into(), time: 10, value: 1.0 },
            Record { cell: "E".into(), time: 11, value: 2.0 },
            Record { cell: "MS".into(), time: 20, value: 9.0 },
        ];

        let all = group_by_cell(&records, None);
        assert_eq!(all["E"].start_timepoint, 10);
        assert_eq!(all["E"].series, vec![1.0, 2.0, 3.0]);
        assert_eq!(all.len(), 2);

        let trimmed = group_by_cell(&records, Some(11));
        assert_eq!(trimmed["E"].series, vec![1.0, 2.0]);
        assert!(!trimmed.contains_key("MS"));
    }
}
