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

//! Field rules of every file.

use super::fields::{
    check_field, missing_field,
    FieldType::{self, *},
    Presence::{self, *},
};
use crate::{
    gtfs::records::{self, present, Record},
    report::Report,
};

/// Type and presence of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    /// Type of the values
    pub field_type: FieldType,
    /// Name of the column
    pub column: &'static str,
    /// Whether the value is required
    pub presence: Presence,
}

const fn field(field_type: FieldType, column: &'static str, presence: Presence) -> FieldRule {
    FieldRule {
        field_type,
        column,
        presence,
    }
}

/// A record whose fields can be validated.
pub trait Validate: Record {
    /// One rule per recognized column
    const RULES: &'static [FieldRule];

    /// Checks the fields whose presence depends on other fields.
    fn check_conditions(&self, _report: &mut Report) {}
}

/// Checks every field of every record.
pub fn validate_records<R: Validate>(records: &[R], report: &mut Report) {
    for record in records {
        for rule in R::RULES {
            check_field(
                rule.field_type,
                rule.presence,
                record.value(rule.column),
                R::FILE_NAME,
                rule.column,
                record.line(),
                report,
            );
        }
        record.check_conditions(report);
    }
}

impl Validate for records::Agency {
    const RULES: &'static [FieldRule] = &[
        // required when there are several agencies, see cross-file checks
        field(Id, "agency_id", Conditional),
        field(Text, "agency_name", Required),
        field(Url, "agency_url", Required),
        field(Timezone, "agency_timezone", Required),
        field(LanguageCode, "agency_lang", Optional),
        field(Phone, "agency_phone", Optional),
        field(Url, "agency_fare_url", Optional),
        field(Email, "agency_email", Optional),
    ];
}

impl Validate for records::Route {
    const RULES: &'static [FieldRule] = &[
        field(Id, "route_id", Required),
        field(Id, "agency_id", Conditional),
        field(Text, "route_short_name", Conditional),
        field(Text, "route_long_name", Conditional),
        field(Text, "route_desc", Optional),
        field(RouteType, "route_type", Required),
        field(Url, "route_url", Optional),
        field(Color, "route_color", Optional),
        field(Color, "route_text_color", Optional),
        field(Integer, "route_sort_order", Optional),
        field(ContinuousPickupDropOff, "continuous_pickup", Optional),
        field(ContinuousPickupDropOff, "continuous_drop_off", Optional),
    ];

    fn check_conditions(&self, report: &mut Report) {
        if present(&self.route_short_name).is_none() && present(&self.route_long_name).is_none() {
            report.add(missing_field(Self::FILE_NAME, "route_short_name", self.line));
        }
    }
}

impl Validate for records::Stop {
    const RULES: &'static [FieldRule] = &[
        field(Id, "stop_id", Required),
        field(Text, "stop_code", Optional),
        field(Text, "stop_name", Conditional),
        field(Text, "stop_desc", Optional),
        field(Latitude, "stop_lat", Conditional),
        field(Longitude, "stop_lon", Conditional),
        field(Id, "zone_id", Optional),
        field(Url, "stop_url", Optional),
        field(LocationType, "location_type", Optional),
        field(Id, "parent_station", Conditional),
        field(Timezone, "stop_timezone", Optional),
        field(WheelchairAccessibility, "wheelchair_boarding", Optional),
        field(Id, "level_id", Optional),
        field(Text, "platform_code", Optional),
        field(Id, "municipality_id", Optional),
    ];

    fn check_conditions(&self, report: &mut Report) {
        // an invalid location type has already been reported
        let location_type = match present(&self.location_type) {
            None => 0,
            Some(location_type) => match location_type.parse::<u8>() {
                Ok(location_type) => location_type,
                Err(_) => return,
            },
        };
        if location_type <= 2 {
            for (column, value) in &[
                ("stop_name", &self.stop_name),
                ("stop_lat", &self.stop_lat),
                ("stop_lon", &self.stop_lon),
            ] {
                if present(value).is_none() {
                    report.add(missing_field(Self::FILE_NAME, column, self.line));
                }
            }
        }
        if (2..=4).contains(&location_type) && present(&self.parent_station).is_none() {
            report.add(missing_field(Self::FILE_NAME, "parent_station", self.line));
        }
    }
}

impl Validate for records::Trip {
    const RULES: &'static [FieldRule] = &[
        field(Id, "route_id", Required),
        field(Id, "service_id", Required),
        field(Id, "trip_id", Required),
        field(Text, "trip_headsign", Optional),
        field(Text, "trip_short_name", Optional),
        field(DirectionId, "direction_id", Optional),
        field(Id, "block_id", Optional),
        field(Id, "shape_id", Optional),
        field(WheelchairAccessibility, "wheelchair_accessible", Optional),
        field(BikesAllowed, "bikes_allowed", Optional),
    ];
}

impl Validate for records::StopTime {
    const RULES: &'static [FieldRule] = &[
        field(Id, "trip_id", Required),
        field(Time, "arrival_time", Conditional),
        field(Time, "departure_time", Conditional),
        field(Id, "stop_id", Required),
        field(Integer, "stop_sequence", Required),
        field(Text, "stop_headsign", Optional),
        field(PickupDropOffType, "pickup_type", Optional),
        field(PickupDropOffType, "drop_off_type", Optional),
        field(ContinuousPickupDropOff, "continuous_pickup", Optional),
        field(ContinuousPickupDropOff, "continuous_drop_off", Optional),
        field(Float, "shape_dist_traveled", Optional),
        field(Timepoint, "timepoint", Optional),
    ];

    fn check_conditions(&self, report: &mut Report) {
        if present(&self.timepoint) != Some("1") {
            return;
        }
        for (column, value) in &[
            ("arrival_time", &self.arrival_time),
            ("departure_time", &self.departure_time),
        ] {
            if present(value).is_none() {
                report.add(missing_field(Self::FILE_NAME, column, self.line));
            }
        }
    }
}

impl Validate for records::CalendarItem {
    const RULES: &'static [FieldRule] = &[
        field(Id, "service_id", Required),
        field(CalendarDay, "monday", Required),
        field(CalendarDay, "tuesday", Required),
        field(CalendarDay, "wednesday", Required),
        field(CalendarDay, "thursday", Required),
        field(CalendarDay, "friday", Required),
        field(CalendarDay, "saturday", Required),
        field(CalendarDay, "sunday", Required),
        field(Date, "start_date", Required),
        field(Date, "end_date", Required),
    ];
}

impl Validate for records::CalendarDate {
    const RULES: &'static [FieldRule] = &[
        field(Id, "service_id", Required),
        field(Date, "date", Required),
        field(CalendarException, "exception_type", Required),
    ];
}

impl Validate for records::Shape {
    const RULES: &'static [FieldRule] = &[
        field(Id, "shape_id", Required),
        field(Latitude, "shape_pt_lat", Required),
        field(Longitude, "shape_pt_lon", Required),
        field(Integer, "shape_pt_sequence", Required),
        field(Float, "shape_dist_traveled", Optional),
    ];
}

impl Validate for records::FareAttribute {
    const RULES: &'static [FieldRule] = &[
        field(Id, "fare_id", Required),
        field(CurrencyAmount, "price", Required),
        field(CurrencyCode, "currency_type", Required),
        field(PaymentMethod, "payment_method", Required),
        // empty means unlimited transfers
        field(Transfers, "transfers", Optional),
        field(Id, "agency_id", Optional),
        field(Integer, "transfer_duration", Optional),
    ];
}

impl Validate for records::MunicipalityRow {
    const RULES: &'static [FieldRule] = &[field(Id, "id", Required), field(Text, "name", Required)];
}
