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

//! Referential integrity and structural checks between the files of a
//! feed.

use super::fields::missing_field;
use crate::{
    gtfs::records::{
        present, Agency, CalendarDate, CalendarItem, FareAttribute, Feed, MunicipalityRow, Record,
        Route, Shape, Stop, Trip,
    },
    report::{Notice, NoticeKind, Report, Severity},
};
use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    hash::Hash,
};
use tracing::info;

/// Identifiers declared by one column of one file.
struct Keys<'a> {
    file_name: &'static str,
    field_name: &'static str,
    values: HashSet<&'a str>,
}

impl<'a> Keys<'a> {
    fn collect<R, F>(records: &'a [R], field_name: &'static str, key: F) -> Self
    where
        R: Record,
        F: Fn(&'a R) -> &'a Option<String>,
    {
        Keys {
            file_name: R::FILE_NAME,
            field_name,
            values: records.iter().filter_map(|r| present(key(r))).collect(),
        }
    }

    /// Reports a `ForeignKeyViolation` if the value is present and not
    /// declared. An absent value is not checked.
    fn check<R: Record>(
        &self,
        record: &R,
        field_name: &str,
        value: &Option<String>,
        report: &mut Report,
    ) {
        if let Some(value) = present(value) {
            if !self.values.contains(value) {
                report.add(
                    Notice::new(
                        NoticeKind::ForeignKeyViolation,
                        R::FILE_NAME,
                        format!(
                            "'{}' does not match any {} of {}",
                            value, self.field_name, self.file_name
                        ),
                    )
                    .with_field(field_name)
                    .on_line(record.line()),
                );
            }
        }
    }
}

/// Reports a `DuplicateKey` for every key already seen.
fn check_unique<'a, R, K, F>(records: &'a [R], field_name: &str, key: F, report: &mut Report)
where
    R: Record,
    K: Eq + Hash + Display,
    F: Fn(&'a R) -> Option<K>,
{
    let mut first_lines: HashMap<K, usize> = HashMap::new();
    for record in records {
        let key = match key(record) {
            Some(key) => key,
            None => continue,
        };
        if let Some(first_line) = first_lines.get(&key) {
            report.add(
                Notice::new(
                    NoticeKind::DuplicateKey,
                    R::FILE_NAME,
                    format!("{} already defined at line {}", key, first_line),
                )
                .with_field(field_name)
                .on_line(record.line()),
            );
        } else {
            first_lines.insert(key, record.line());
        }
    }
}

fn single_key(value: &Option<String>) -> Option<String> {
    present(value).map(|v| format!("'{}'", v))
}

fn check_agencies(agencies: &[Agency], report: &mut Report) {
    match agencies {
        [agency] => {
            if present(&agency.agency_id).is_none() {
                report.add(
                    Notice::new(
                        NoticeKind::SingleAgencyRecommended,
                        Agency::FILE_NAME,
                        "the only agency should have an agency_id",
                    )
                    .with_field("agency_id")
                    .on_line(agency.line),
                );
            }
        }
        _ => {
            for agency in agencies.iter().filter(|a| present(&a.agency_id).is_none()) {
                report.add(missing_field(Agency::FILE_NAME, "agency_id", agency.line));
            }
            check_unique(agencies, "agency_id", |a| single_key(&a.agency_id), report);
        }
    }
}

fn check_routes(routes: &[Route], agencies: &Keys<'_>, agency_count: usize, report: &mut Report) {
    check_unique(routes, "route_id", |r| single_key(&r.route_id), report);
    for route in routes {
        if present(&route.agency_id).is_some() {
            agencies.check(route, "agency_id", &route.agency_id, report);
            continue;
        }
        let severity = if agency_count > 1 {
            Severity::Violation
        } else {
            Severity::Recommendation
        };
        report.add(
            Notice::new(
                NoticeKind::AgencyIdRequiredForRoute,
                Route::FILE_NAME,
                format!("the feed has {} agencies", agency_count),
            )
            .with_field("agency_id")
            .on_line(route.line)
            .with_severity(severity),
        );
    }
}

fn check_stops(
    stops: &[Stop],
    stop_ids: &Keys<'_>,
    municipalities: Option<&Keys<'_>>,
    report: &mut Report,
) {
    check_unique(stops, "stop_id", |s| single_key(&s.stop_id), report);
    for stop in stops {
        stop_ids.check(stop, "parent_station", &stop.parent_station, report);
        if let Some(municipalities) = municipalities {
            municipalities.check(stop, "municipality_id", &stop.municipality_id, report);
        }
    }
}

fn check_shapes(shapes: &[Shape], report: &mut Report) {
    // first line and number of points, in encounter order
    let mut order = vec![];
    let mut points: HashMap<&str, (usize, usize)> = HashMap::new();
    for shape in shapes {
        let shape_id = match present(&shape.shape_id) {
            Some(shape_id) => shape_id,
            None => continue,
        };
        let entry = points.entry(shape_id).or_insert_with(|| {
            order.push(shape_id);
            (shape.line, 0)
        });
        entry.1 += 1;
    }
    for shape_id in order {
        let (line, count) = points[shape_id];
        if count < 2 {
            report.add(
                Notice::new(
                    NoticeKind::TooFewShapePoints,
                    Shape::FILE_NAME,
                    format!("shape '{}' has {} point(s)", shape_id, count),
                )
                .with_field("shape_id")
                .on_line(line),
            );
        }
    }
}

/// Runs every check involving more than one file, or more than one
/// record of a file.
pub fn validate_cross_file(feed: &Feed, report: &mut Report) {
    info!("Validating references between files");
    let agency_ids = Keys::collect(&feed.agencies, "agency_id", |a: &Agency| &a.agency_id);
    let route_ids = Keys::collect(&feed.routes, "route_id", |r: &Route| &r.route_id);
    let stop_ids = Keys::collect(&feed.stops, "stop_id", |s: &Stop| &s.stop_id);
    let trip_ids = Keys::collect(&feed.trips, "trip_id", |t: &Trip| &t.trip_id);
    let service_ids = Keys::collect(&feed.calendars, "service_id", |c: &CalendarItem| {
        &c.service_id
    });
    let shape_ids = Keys::collect(&feed.shapes, "shape_id", |s: &Shape| &s.shape_id);
    let municipality_ids = if feed.has_municipalities {
        Some(Keys::collect(&feed.municipalities, "id", |m: &MunicipalityRow| &m.id))
    } else {
        None
    };

    check_agencies(&feed.agencies, report);
    check_routes(&feed.routes, &agency_ids, feed.agencies.len(), report);
    check_stops(&feed.stops, &stop_ids, municipality_ids.as_ref(), report);

    check_unique(&feed.trips, "trip_id", |t| single_key(&t.trip_id), report);
    for trip in &feed.trips {
        route_ids.check(trip, "route_id", &trip.route_id, report);
        service_ids.check(trip, "service_id", &trip.service_id, report);
        shape_ids.check(trip, "shape_id", &trip.shape_id, report);
    }

    for stop_time in &feed.stop_times {
        trip_ids.check(stop_time, "trip_id", &stop_time.trip_id, report);
        stop_ids.check(stop_time, "stop_id", &stop_time.stop_id, report);
    }

    check_unique(
        &feed.calendars,
        "service_id",
        |c| single_key(&c.service_id),
        report,
    );
    check_unique(
        &feed.calendar_dates,
        "date",
        |c: &CalendarDate| {
            let service_id = present(&c.service_id)?;
            let date = present(&c.date)?;
            Some(format!("'{}' on '{}'", service_id, date))
        },
        report,
    );
    for calendar_date in &feed.calendar_dates {
        service_ids.check(
            calendar_date,
            "service_id",
            &calendar_date.service_id,
            report,
        );
    }

    check_shapes(&feed.shapes, report);

    check_unique(
        &feed.fare_attributes,
        "fare_id",
        |f: &FareAttribute| single_key(&f.fare_id),
        report,
    );
    for fare in &feed.fare_attributes {
        agency_ids.check(fare, "agency_id", &fare.agency_id, report);
    }
}
