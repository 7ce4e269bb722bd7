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

//! Validation of a loaded feed: every field of every record, then the
//! references between files.
//!
//! Validation never fails, every problem found is added to the
//! [`Report`](crate::report::Report).

pub mod cross_file;
pub mod fields;
pub mod rules;

pub use self::{
    cross_file::validate_cross_file,
    fields::{check_field, FieldType, InvalidField, Presence},
    rules::{validate_records, FieldRule, Validate},
};

use crate::{gtfs::records::Feed, report::Report};
use tracing::info;

/// Validates the fields of all the records of the feed and, unless
/// `skip_cross_file` is set, the references between the files.
pub fn validate_feed(feed: &Feed, skip_cross_file: bool, report: &mut Report) {
    info!("Validating fields");
    validate_records(&feed.agencies, report);
    validate_records(&feed.routes, report);
    validate_records(&feed.stops, report);
    validate_records(&feed.trips, report);
    validate_records(&feed.stop_times, report);
    validate_records(&feed.calendars, report);
    validate_records(&feed.calendar_dates, report);
    validate_records(&feed.shapes, report);
    validate_records(&feed.fare_attributes, report);
    validate_records(&feed.municipalities, report);
    if skip_cross_file {
        info!("Skipping validation of references between files");
    } else {
        validate_cross_file(feed, report);
    }
}
