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

//! [GTFS](https://gtfs.org/reference/static) loading: reading the files,
//! validating them and linking them into a [`Graph`].

pub mod headers;
pub mod records;

use self::records::Feed;
use crate::{
    file_handler::{FileHandler, PathFileHandler, ZipHandler},
    linking,
    model::Graph,
    read_utils::{read_objects, read_objects_if_exists, Encoding},
    report::Report,
    validation, Result,
};
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Settings of the loading of a feed.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Configuration {
    /// Do not check the references between files; the fields are still
    /// validated
    pub skip_validation: bool,
    /// Encoding of `municipalities.txt`
    pub municipality_encoding: Encoding,
}

/// Loads the records of every file of a feed.
///
/// Fails if a required file is missing or cannot be read.
pub fn read_feed<H: FileHandler>(
    file_handler: &mut H,
    configuration: &Configuration,
    report: &mut Report,
) -> Result<Feed> {
    let utf8 = Encoding::Utf8;
    let agencies = read_objects(file_handler, true, utf8, report)?;
    let routes = read_objects(file_handler, true, utf8, report)?;
    let stops = read_objects(file_handler, true, utf8, report)?;
    let trips = read_objects(file_handler, true, utf8, report)?;
    let stop_times = read_objects(file_handler, true, utf8, report)?;
    let calendars = read_objects(file_handler, true, utf8, report)?;
    let calendar_dates = read_objects(file_handler, true, utf8, report)?;
    let shapes = read_objects(file_handler, true, utf8, report)?;
    let fare_attributes = read_objects(file_handler, false, utf8, report)?;
    let municipalities =
        read_objects_if_exists(file_handler, configuration.municipality_encoding, report)?;
    Ok(Feed {
        agencies,
        routes,
        stops,
        trips,
        stop_times,
        calendars,
        calendar_dates,
        shapes,
        fare_attributes,
        has_municipalities: municipalities.is_some(),
        municipalities: municipalities.unwrap_or_default(),
    })
}

/// Loads, validates and links a feed read through a [`FileHandler`].
pub fn read_from_handler<H: FileHandler>(
    file_handler: &mut H,
    configuration: &Configuration,
) -> Result<(Graph, Report)> {
    let mut report = Report::default();
    let feed = read_feed(file_handler, configuration, &mut report)?;
    validation::validate_feed(&feed, configuration.skip_validation, &mut report);
    let collections = linking::make_collections(&feed)?;
    let graph = Graph::new(collections)?;
    info!(
        "{} loaded: {} notices, {} skipped rows",
        file_handler.source_name(),
        report.len(),
        report.skipped_rows()
    );
    Ok((graph, report))
}

/// Reads a feed, either from a directory or from a ZIP archive.
pub struct Reader {
    configuration: Configuration,
}

impl Reader {
    /// Builds a reader with the given configuration.
    pub fn new(configuration: Configuration) -> Self {
        Reader { configuration }
    }

    /// Reads a feed from a directory.
    pub fn parse_dir<P: AsRef<Path>>(self, path: P) -> Result<(Graph, Report)> {
        let mut file_handler = PathFileHandler::new(path.as_ref().to_path_buf());
        read_from_handler(&mut file_handler, &self.configuration)
    }

    /// Reads a feed from a ZIP archive.
    pub fn parse_zip<P: AsRef<Path>>(self, path: P) -> Result<(Graph, Report)> {
        let mut file_handler = ZipHandler::from_path(path)?;
        read_from_handler(&mut file_handler, &self.configuration)
    }

    /// Reads a feed from a directory or a ZIP archive, depending on what
    /// `path` is.
    pub fn parse<P: AsRef<Path>>(self, path: P) -> Result<(Graph, Report)> {
        let p = path.as_ref();
        if p.is_file() {
            self.parse_zip(p)
        } else if p.is_dir() {
            self.parse_dir(p)
                .with_context(|| format!("impossible to read gtfs directory from {:?}", p))
        } else {
            Err(anyhow!(
                "file {:?} is neither a file nor a directory, cannot read a gtfs from it",
                p
            ))
        }
    }
}

/// Reads a feed with the default configuration.
///
/// The returned [`Report`] holds every notice raised while loading and
/// validating the feed; none of them prevents the graph from being built.
pub fn read<P: AsRef<Path>>(path: P) -> Result<(Graph, Report)> {
    Reader::new(Configuration::default()).parse(path)
}
