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

//! Helpers to collect the notices raised while loading and validating a
//! feed.
use serde::Serialize;
use std::fmt;

/// How serious a notice is.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Must be fixed, the feed does not follow the format.
    Violation,
    /// Should be fixed, the feed is valid but could be better.
    Recommendation,
}

/// Category of a notice.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum NoticeKind {
    // load errors
    MalformedRow,
    DuplicateHeader,
    EmptyFile,
    // field level
    MissingRequiredField,
    InvalidCharacter,
    InvalidUrl,
    InvalidColor,
    InvalidTimezone,
    InvalidLanguageCode,
    InvalidPhoneNumber,
    InvalidEmail,
    InvalidLatitude,
    InvalidLongitude,
    InvalidDate,
    InvalidTime,
    InvalidInteger,
    InvalidFloat,
    InvalidCurrencyCode,
    InvalidCurrencyAmount,
    UnexpectedEnumValue,
    // cross-file
    ForeignKeyViolation,
    DuplicateKey,
    TooFewShapePoints,
    SingleAgencyRecommended,
    AgencyIdRequiredForRoute,
}

impl NoticeKind {
    /// The severity a notice of this kind has unless stated otherwise.
    pub fn default_severity(self) -> Severity {
        use NoticeKind::*;
        match self {
            SingleAgencyRecommended => Severity::Recommendation,
            _ => Severity::Violation,
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A structured finding, attached to a file and optionally to a field
/// and a line.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notice {
    /// Category of the notice
    pub kind: NoticeKind,
    /// Severity of the notice
    pub severity: Severity,
    /// Name of the file the notice is about (`stops.txt`)
    pub file_name: String,
    /// Name of the field the notice is about, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    /// 1-based line number (the header row is line 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Human readable description
    pub message: String,
}

impl Notice {
    /// Creates a notice with the default severity of its kind.
    pub fn new<S: Into<String>>(kind: NoticeKind, file_name: &str, message: S) -> Self {
        Notice {
            kind,
            severity: kind.default_severity(),
            file_name: file_name.to_string(),
            field_name: None,
            line: None,
            message: message.into(),
        }
    }

    /// Attaches the notice to a field.
    pub fn with_field(mut self, field_name: &str) -> Self {
        self.field_name = Some(field_name.to_string());
        self
    }

    /// Attaches the notice to a line.
    pub fn on_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Overrides the default severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Violation => "violation",
            Severity::Recommendation => "recommendation",
        };
        write!(f, "[{}] {} in {}", severity, self.kind, self.file_name)?;
        if let Some(field_name) = &self.field_name {
            write!(f, " (field '{}')", field_name)?;
        }
        if let Some(line) = self.line {
            write!(f, " at line {}", line)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// The ordered list of notices produced by a run, from loading to
/// cross-file validation.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    notices: Vec<Notice>,
    skipped_rows: usize,
}

impl Report {
    /// Add a notice.
    pub fn add(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Record a row which could not be read and was skipped.
    pub fn add_skipped_row(&mut self, notice: Notice) {
        self.skipped_rows += 1;
        self.add(notice);
    }

    /// Append all the notices of another report.
    pub fn merge(&mut self, other: Report) {
        self.skipped_rows += other.skipped_rows;
        self.notices.extend(other.notices);
    }

    /// All the notices, in the order they were raised.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Notices with the [`Severity::Violation`] severity.
    pub fn violations(&self) -> impl Iterator<Item = &Notice> {
        self.notices
            .iter()
            .filter(|n| n.severity == Severity::Violation)
    }

    /// Notices with the [`Severity::Recommendation`] severity.
    pub fn recommendations(&self) -> impl Iterator<Item = &Notice> {
        self.notices
            .iter()
            .filter(|n| n.severity == Severity::Recommendation)
    }

    /// Whether at least one violation was raised.
    pub fn has_violations(&self) -> bool {
        self.violations().next().is_some()
    }

    /// Number of notices of a given kind.
    pub fn count(&self, kind: NoticeKind) -> usize {
        self.notices.iter().filter(|n| n.kind == kind).count()
    }

    /// Number of rows skipped because they could not be read.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Total number of notices.
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    /// Whether the report is empty.
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_notice() {
        let notice = Notice::new(NoticeKind::InvalidUrl, "agency.txt", "'foo' is not a URL")
            .with_field("agency_url")
            .on_line(2);
        assert_eq!(
            "[violation] InvalidUrl in agency.txt (field 'agency_url') at line 2: 'foo' is not a URL",
            notice.to_string()
        );
    }

    #[test]
    fn split_by_severity() {
        let mut report = Report::default();
        report.add(Notice::new(
            NoticeKind::SingleAgencyRecommended,
            "agency.txt",
            "",
        ));
        report.add(
            Notice::new(NoticeKind::AgencyIdRequiredForRoute, "routes.txt", "")
                .with_severity(Severity::Recommendation),
        );
        report.add_skipped_row(Notice::new(NoticeKind::MalformedRow, "stops.txt", ""));
        assert_eq!(3, report.len());
        assert_eq!(2, report.recommendations().count());
        assert_eq!(1, report.violations().count());
        assert_eq!(1, report.skipped_rows());
        assert!(report.has_violations());
    }

    #[test]
    fn merge_keeps_order() {
        let mut first = Report::default();
        first.add(Notice::new(NoticeKind::InvalidDate, "calendar.txt", ""));
        let mut second = Report::default();
        second.add_skipped_row(Notice::new(NoticeKind::MalformedRow, "shapes.txt", ""));
        first.merge(second);
        let kinds: Vec<NoticeKind> = first.notices().iter().map(|n| n.kind).collect();
        assert_eq!(
            vec![NoticeKind::InvalidDate, NoticeKind::MalformedRow],
            kinds
        );
        assert_eq!(1, first.skipped_rows());
    }
}
