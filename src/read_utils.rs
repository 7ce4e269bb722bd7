// Copyright (C) 2017 Hove and/or its affiliates.
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by the
// Free Software Foundation, version 3.

// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.

// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>

//! Tabular reading of the feed files: byte-order mark and blank line
//! handling, decoding, and loading of typed records.

use crate::{
    file_handler::FileHandler,
    gtfs::{
        headers::HeaderIndex,
        records::{CalendarDate, Record},
        Configuration,
    },
    report::{Notice, NoticeKind, Report, Severity},
    Result,
};
use anyhow::{bail, Context};
use serde::Deserialize;
use std::{fs::File, path::Path};
use tracing::{debug, info};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Character encoding of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Encoding {
    /// UTF-8, invalid sequences are replaced and reported
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    /// ISO-8859-1, every byte is a character
    #[serde(rename = "latin-1", alias = "iso-8859-1")]
    Latin1,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Utf8
    }
}

impl Encoding {
    fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

/// One row of a file, with its 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Line number, the header being line 1
    pub line: usize,
    /// Values of the row, in column order
    pub values: Vec<String>,
}

impl Row {
    /// Value at a given position, `None` if the row is too short.
    pub fn get(&self, position: usize) -> Option<&str> {
        self.values.get(position).map(String::as_str)
    }
}

/// A decoded file: its header row and its data rows.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Table {
    /// The first row of the file, empty if the file is empty
    pub header: Vec<String>,
    /// All the other rows
    pub rows: Vec<Row>,
}

/// Splits the content in physical lines, without the byte-order mark,
/// the trailing whitespaces of each line and the blank lines.
fn physical_lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    content.split(|b| *b == b'\n').filter_map(|line| {
        let end = line.iter().rposition(|b| !b.is_ascii_whitespace())?;
        Some(&line[..=end])
    })
}

/// Checks the quoting of a line: a quote may only open a field, a quoted
/// field must be closed on the same line and be followed by a delimiter.
fn check_quotes(line: &[u8]) -> Result<(), &'static str> {
    let mut in_quotes = false;
    let mut field_start = true;
    let mut closed = false;
    let mut bytes = line.iter().peekable();
    while let Some(&b) = bytes.next() {
        if in_quotes {
            if b == b'"' {
                if bytes.peek() == Some(&&b'"') {
                    bytes.next();
                } else {
                    in_quotes = false;
                    closed = true;
                }
            }
            continue;
        }
        match b {
            b',' => {
                field_start = true;
                closed = false;
            }
            b' ' | b'\t' if closed => {}
            b'"' if field_start => {
                in_quotes = true;
                field_start = false;
            }
            b'"' => return Err("unexpected quote inside a field"),
            _ if closed => return Err("unexpected character after a quoted field"),
            _ => field_start = false,
        }
    }
    if in_quotes {
        Err("quoted field not closed at the end of the line")
    } else {
        Ok(())
    }
}

/// Parses the raw content of a file into a [`Table`].
///
/// Each physical line is one row. A row with broken quoting, or that the
/// delimited parser rejects, is skipped and reported as
/// [`NoticeKind::MalformedRow`]; the following rows keep their line
/// numbers.
pub fn read_table(
    content: &[u8],
    file_name: &str,
    encoding: Encoding,
    report: &mut Report,
) -> Table {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All);
    let mut table = Table::default();
    for (i, physical_line) in physical_lines(content).enumerate() {
        let line = i + 1;
        let parsed = check_quotes(physical_line)
            .map_err(str::to_string)
            .and_then(|_| match builder.from_reader(physical_line).byte_records().next() {
                Some(record) => record.map_err(|e| e.to_string()),
                None => Err("empty record".to_string()),
            });
        let record = match parsed {
            Ok(record) => record,
            Err(e) => {
                report.add_skipped_row(
                    Notice::new(NoticeKind::MalformedRow, file_name, e).on_line(line),
                );
                continue;
            }
        };
        let values: Vec<String> = record.iter().map(|v| encoding.decode(v)).collect();
        if line == 1 {
            table.header = values;
        } else {
            table.rows.push(Row { line, values });
        }
    }
    debug!("{}: {} rows", file_name, table.rows.len());
    table
}

fn parse_objects<R: Record>(
    content: &[u8],
    required_file: bool,
    encoding: Encoding,
    report: &mut Report,
) -> Vec<R> {
    info!("Reading {}", R::FILE_NAME);
    let table = read_table(content, R::FILE_NAME, encoding, report);
    if required_file && table.rows.is_empty() {
        let notice = Notice::new(
            NoticeKind::EmptyFile,
            R::FILE_NAME,
            "the file does not contain any record",
        );
        // services may all be defined in calendar.txt
        let notice = if R::FILE_NAME == CalendarDate::FILE_NAME {
            notice.with_severity(Severity::Recommendation)
        } else {
            notice
        };
        report.add(notice);
    }
    let headers = HeaderIndex::resolve(&table.header, R::COLUMNS, R::FILE_NAME, report);
    table
        .rows
        .iter()
        .map(|row| R::from_row(row, &headers))
        .collect()
}

/// Reads all the records of one kind from the feed.
///
/// A missing file is an error only if `required_file` is set. A
/// required file with no data row gets an [`NoticeKind::EmptyFile`]
/// notice, a recommendation for `calendar_dates.txt` and a violation
/// otherwise.
pub fn read_objects<H, R>(
    file_handler: &mut H,
    required_file: bool,
    encoding: Encoding,
    report: &mut Report,
) -> Result<Vec<R>>
where
    H: FileHandler,
    R: Record,
{
    let (content, path) = file_handler.read_file_if_exists(R::FILE_NAME)?;
    match (content, required_file) {
        (None, false) => {
            info!("Skipping {}", R::FILE_NAME);
            Ok(vec![])
        }
        (None, true) => {
            bail!("file {:?} not found", path)
        }
        (Some(content), _) => Ok(parse_objects(&content, required_file, encoding, report)),
    }
}

/// Reads the records of an optional file, `None` if the file does not
/// exist.
pub fn read_objects_if_exists<H, R>(
    file_handler: &mut H,
    encoding: Encoding,
    report: &mut Report,
) -> Result<Option<Vec<R>>>
where
    H: FileHandler,
    R: Record,
{
    let (content, _) = file_handler.read_file_if_exists(R::FILE_NAME)?;
    match content {
        None => {
            info!("Skipping {}", R::FILE_NAME);
            Ok(None)
        }
        Some(content) => Ok(Some(parse_objects(&content, false, encoding, report))),
    }
}

/// Reads the configuration from a JSON file, or returns the default
/// configuration if no path is given.
pub fn read_config<P: AsRef<Path>>(config_path: Option<P>) -> Result<Configuration> {
    match config_path {
        Some(config_path) => {
            let config_path = config_path.as_ref();
            info!("Reading configuration from {:?}", config_path);
            let json_config_file = File::open(config_path)
                .with_context(|| format!("Error reading {:?}", config_path))?;
            let config = serde_json::from_reader(json_config_file)
                .with_context(|| format!("Error reading {:?}", config_path))?;
            Ok(config)
        }
        None => Ok(Configuration::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(table: &Table) -> Vec<Vec<&str>> {
        table
            .rows
            .iter()
            .map(|r| r.values.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn strip_bom_and_blank_lines() {
        let content = b"\xEF\xBB\xBFstop_id,stop_name\r\n\r\n  \nS1,Central\r\n\nS2,Harbour  \n";
        let mut report = Report::default();
        let table = read_table(content, "stops.txt", Encoding::Utf8, &mut report);
        assert_eq!(vec!["stop_id", "stop_name"], table.header);
        assert_eq!(
            vec![vec!["S1", "Central"], vec!["S2", "Harbour"]],
            values(&table)
        );
        // lines are counted on the cleaned content
        let lines: Vec<usize> = table.rows.iter().map(|r| r.line).collect();
        assert_eq!(vec![2, 3], lines);
        assert!(report.is_empty());
    }

    #[test]
    fn empty_content() {
        let mut report = Report::default();
        let table = read_table(b"\xEF\xBB\xBF\n\n", "stops.txt", Encoding::Utf8, &mut report);
        assert!(table.header.is_empty());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn quoted_values_and_short_rows() {
        let content = b"id,name\n1,\"Helsinki, center\"\n2\n";
        let mut report = Report::default();
        let table = read_table(content, "municipalities.txt", Encoding::Utf8, &mut report);
        assert_eq!(vec![vec!["1", "Helsinki, center"], vec!["2"]], values(&table));
        assert_eq!(None, table.rows[1].get(1));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let content = b"stop_id,stop_name\nS1,\"Central\nS2,Harbour\nS3,Bad\"quote\nS4,\"Pier\" 4\nS5,Dock\n";
        let mut report = Report::default();
        let table = read_table(content, "stops.txt", Encoding::Utf8, &mut report);
        assert_eq!(
            vec![vec!["S2", "Harbour"], vec!["S5", "Dock"]],
            values(&table)
        );
        let lines: Vec<usize> = table.rows.iter().map(|r| r.line).collect();
        assert_eq!(vec![3, 6], lines);
        assert_eq!(3, report.skipped_rows());
        assert_eq!(3, report.count(NoticeKind::MalformedRow));
        let notice_lines: Vec<Option<usize>> = report.notices().iter().map(|n| n.line).collect();
        assert_eq!(vec![Some(2), Some(4), Some(5)], notice_lines);
        assert!(report
            .notices()
            .iter()
            .all(|n| n.file_name == "stops.txt"));
    }

    #[test]
    fn escaped_quotes() {
        let content = b"id,name\n1,\"Say \"\"hi\"\"\"\n2,\"Vantaa\"\n";
        let mut report = Report::default();
        let table = read_table(content, "municipalities.txt", Encoding::Utf8, &mut report);
        assert!(report.is_empty(), "{:?}", report);
        assert_eq!(
            vec![vec!["1", "Say \"hi\""], vec!["2", "Vantaa"]],
            values(&table)
        );
    }

    #[test]
    fn empty_required_files() {
        use crate::{
            file_handler::PathFileHandler,
            gtfs::records::{CalendarDate, Stop},
            test_utils::*,
        };
        test_in_tmp_dir(|path| {
            create_file_with_content(path, "calendar_dates.txt", "service_id,date,exception_type\n");
            create_file_with_content(path, "stops.txt", "stop_id,stop_name\n");
            let mut file_handler = PathFileHandler::new(path.to_path_buf());
            let mut report = Report::default();
            let calendar_dates: Vec<CalendarDate> =
                read_objects(&mut file_handler, true, Encoding::Utf8, &mut report).unwrap();
            let stops: Vec<Stop> =
                read_objects(&mut file_handler, true, Encoding::Utf8, &mut report).unwrap();
            assert!(calendar_dates.is_empty());
            assert!(stops.is_empty());
            let notices: Vec<(&str, NoticeKind, Severity)> = report
                .notices()
                .iter()
                .map(|n| (n.file_name.as_str(), n.kind, n.severity))
                .collect();
            assert_eq!(
                vec![
                    (
                        "calendar_dates.txt",
                        NoticeKind::EmptyFile,
                        Severity::Recommendation
                    ),
                    ("stops.txt", NoticeKind::EmptyFile, Severity::Violation),
                ],
                notices
            );
        });
    }

    #[test]
    fn missing_optional_file() {
        use crate::{file_handler::PathFileHandler, gtfs::records::MunicipalityRow, test_utils::*};
        test_in_tmp_dir(|path| {
            let mut file_handler = PathFileHandler::new(path.to_path_buf());
            let mut report = Report::default();
            let municipalities: Option<Vec<MunicipalityRow>> =
                read_objects_if_exists(&mut file_handler, Encoding::Latin1, &mut report).unwrap();
            assert_eq!(None, municipalities);
            assert!(report.is_empty());
        });
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let content = b"id,name\n1,Espoo\xFF\n";
        let mut report = Report::default();
        let table = read_table(content, "municipalities.txt", Encoding::Utf8, &mut report);
        assert_eq!("Espoo\u{FFFD}", table.rows[0].values[1]);
    }

    #[test]
    fn latin1_decoding() {
        let content = b"id,name\n1,J\xE4rvenp\xE4\xE4\n";
        let mut report = Report::default();
        let table = read_table(content, "municipalities.txt", Encoding::Latin1, &mut report);
        assert_eq!("Järvenpää", table.rows[0].values[1]);
    }

    #[test]
    fn encoding_from_json() {
        let encoding: Encoding = serde_json::from_str("\"latin-1\"").unwrap();
        assert_eq!(Encoding::Latin1, encoding);
        let encoding: Encoding = serde_json::from_str("\"utf-8\"").unwrap();
        assert_eq!(Encoding::Utf8, encoding);
    }
}
