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

//! Resolution of the header row of a file.

use crate::report::{Notice, NoticeKind, Report};
use std::collections::HashMap;

/// Maps the column names found in a header row to their positions.
///
/// Only recognized columns are indexed, other columns are kept with no
/// position so that looking them up is cheap.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HeaderIndex {
    positions: HashMap<String, Option<usize>>,
}

impl HeaderIndex {
    /// Resolves `header` against the `recognized` column names of a file.
    ///
    /// When a column name appears more than once, the first occurrence
    /// wins and a [`NoticeKind::DuplicateHeader`] is reported for each
    /// following one.
    pub fn resolve(
        header: &[String],
        recognized: &[&str],
        file_name: &str,
        report: &mut Report,
    ) -> Self {
        let mut positions = HashMap::with_capacity(header.len());
        for (position, name) in header.iter().enumerate() {
            if positions.contains_key(name) {
                report.add(
                    Notice::new(
                        NoticeKind::DuplicateHeader,
                        file_name,
                        format!("column '{}' is declared more than once", name),
                    )
                    .with_field(name)
                    .on_line(1),
                );
                continue;
            }
            let indexed = if recognized.contains(&name.as_str()) {
                Some(position)
            } else {
                None
            };
            positions.insert(name.clone(), indexed);
        }
        HeaderIndex { positions }
    }

    /// Position of a recognized column, `None` if it is missing or not
    /// recognized.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied().flatten()
    }

    /// Whether the header row contains the given column, recognized or not.
    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// Whether the header row was empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
