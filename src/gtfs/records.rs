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

//! Raw records, one kind per file, before any validation or linking.
//!
//! Every field is an `Option<String>`: `None` when the column is missing
//! or the row too short, `Some("")` when the column exists but the value
//! is empty.

use super::headers::HeaderIndex;
use crate::read_utils::Row;

/// A flat record built from one row of a file.
pub trait Record: Sized {
    /// Name of the file the records are read from
    const FILE_NAME: &'static str;
    /// Recognized column names
    const COLUMNS: &'static [&'static str];

    /// Builds the record from a row, leaving absent the fields whose
    /// column is missing.
    fn from_row(row: &Row, headers: &HeaderIndex) -> Self;

    /// 1-based line number of the row the record comes from.
    fn line(&self) -> usize;

    /// Raw value of a column, `None` if absent or not recognized.
    fn value(&self, column: &str) -> Option<&str>;
}

macro_rules! gtfs_record {
    ($(#[$attr:meta])* $name:ident, $file:expr, [$($field:ident),+ $(,)?]) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Default, PartialEq)]
        #[allow(missing_docs)]
        pub struct $name {
            /// Line of the record in its file
            pub line: usize,
            $(pub $field: Option<String>,)+
        }

        impl Record for $name {
            const FILE_NAME: &'static str = $file;
            const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),+];

            fn from_row(row: &Row, headers: &HeaderIndex) -> Self {
                $name {
                    line: row.line,
                    $($field: headers
                        .position(stringify!($field))
                        .and_then(|position| row.get(position))
                        .map(str::to_string),)+
                }
            }

            fn line(&self) -> usize {
                self.line
            }

            fn value(&self, column: &str) -> Option<&str> {
                $(if column == stringify!($field) {
                    return self.$field.as_deref();
                })+
                None
            }
        }
    };
}

gtfs_record! {
    /// A row of `agency.txt`.
    Agency, "agency.txt", [
        agency_id,
        agency_name,
        agency_url,
        agency_timezone,
        agency_lang,
        agency_phone,
        agency_fare_url,
        agency_email,
    ]
}

gtfs_record! {
    /// A row of `routes.txt`.
    Route, "routes.txt", [
        route_id,
        agency_id,
        route_short_name,
        route_long_name,
        route_desc,
        route_type,
        route_url,
        route_color,
        route_text_color,
        route_sort_order,
        continuous_pickup,
        continuous_drop_off,
    ]
}

gtfs_record! {
    /// A row of `stops.txt`, `municipality_id` being an extension column.
    Stop, "stops.txt", [
        stop_id,
        stop_code,
        stop_name,
        stop_desc,
        stop_lat,
        stop_lon,
        zone_id,
        stop_url,
        location_type,
        parent_station,
        stop_timezone,
        wheelchair_boarding,
        level_id,
        platform_code,
        municipality_id,
    ]
}

gtfs_record! {
    /// A row of `trips.txt`.
    Trip, "trips.txt", [
        route_id,
        service_id,
        trip_id,
        trip_headsign,
        trip_short_name,
        direction_id,
        block_id,
        shape_id,
        wheelchair_accessible,
        bikes_allowed,
    ]
}

gtfs_record! {
    /// A row of `stop_times.txt`.
    StopTime, "stop_times.txt", [
        trip_id,
        arrival_time,
        departure_time,
        stop_id,
        stop_sequence,
        stop_headsign,
        pickup_type,
        drop_off_type,
        continuous_pickup,
        continuous_drop_off,
        shape_dist_traveled,
        timepoint,
    ]
}

gtfs_record! {
    /// A row of `calendar.txt`.
    CalendarItem, "calendar.txt", [
        service_id,
        monday,
        tuesday,
        wednesday,
        thursday,
        friday,
        saturday,
        sunday,
        start_date,
        end_date,
    ]
}

gtfs_record! {
    /// A row of `calendar_dates.txt`.
    CalendarDate, "calendar_dates.txt", [
        service_id,
        date,
        exception_type,
    ]
}

gtfs_record! {
    /// A row of `shapes.txt`.
    Shape, "shapes.txt", [
        shape_id,
        shape_pt_lat,
        shape_pt_lon,
        shape_pt_sequence,
        shape_dist_traveled,
    ]
}

gtfs_record! {
    /// A row of `fare_attributes.txt`.
    FareAttribute, "fare_attributes.txt", [
        fare_id,
        price,
        currency_type,
        payment_method,
        transfers,
        agency_id,
        transfer_duration,
    ]
}

gtfs_record! {
    /// A row of the `municipalities.txt` extension file.
    MunicipalityRow, "municipalities.txt", [
        id,
        name,
    ]
}

/// Returns the value if it is present and not blank.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// All the records of a feed, as read from its files.
#[derive(Debug, Default, Clone)]
#[allow(missing_docs)]
pub struct Feed {
    pub agencies: Vec<Agency>,
    pub routes: Vec<Route>,
    pub stops: Vec<Stop>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,
    pub calendars: Vec<CalendarItem>,
    pub calendar_dates: Vec<CalendarDate>,
    pub shapes: Vec<Shape>,
    pub fare_attributes: Vec<FareAttribute>,
    pub municipalities: Vec<MunicipalityRow>,
    /// Whether `municipalities.txt` was found
    pub has_municipalities: bool,
}
