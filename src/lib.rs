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

//! The `transit_graph` crate loads a [GTFS](https://gtfs.org/) feed,
//! validates every field and cross-file reference, and links the
//! records into an immutable, indexed graph of lines, stop points,
//! routes, journeys and journey patterns.
//!
//! ```no_run
//! # fn main() -> transit_graph::Result<()> {
//! let (graph, report) = transit_graph::gtfs::read("path/to/gtfs")?;
//! for notice in report.notices() {
//!     println!("{}", notice);
//! }
//! println!("{} journeys", graph.journeys.len());
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod calendars;
pub mod file_handler;
pub mod geometry;
pub mod gtfs;
pub(crate) mod linking;
pub mod model;
pub mod objects;
pub mod read_utils;
pub mod report;
#[doc(hidden)]
pub mod test_utils;
pub mod validation;

/// The error type used by the crate.
pub type Error = anyhow::Error;

/// The corresponding result type used by the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub use crate::model::Graph;
pub use crate::report::{Notice, NoticeKind, Report, Severity};
