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

//! Mapping of `calendar.txt` and `calendar_dates.txt` onto day types and
//! day type exceptions.

use crate::{
    gtfs::records::{present, CalendarDate, CalendarItem},
    objects::{DayType, DayTypeException},
};
use chrono::{NaiveDate, Weekday};
use std::collections::HashMap;
use tracing::warn;

/// Normalizes a `YYYYMMDD` date into `YYYY-MM-DD`.
///
/// A value which is not a valid date made of exactly 8 digits is
/// returned unchanged.
pub fn normalize_date(date: &str) -> String {
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return date.to_string();
    }
    match NaiveDate::parse_from_str(date, "%Y%m%d") {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => date.to_string(),
    }
}

/// Builds the day type of a calendar: the days whose flag is `1`, and
/// the validity period.
pub fn day_type(calendar: &CalendarItem) -> DayType {
    let flags = [
        (&calendar.monday, Weekday::Mon),
        (&calendar.tuesday, Weekday::Tue),
        (&calendar.wednesday, Weekday::Wed),
        (&calendar.thursday, Weekday::Thu),
        (&calendar.friday, Weekday::Fri),
        (&calendar.saturday, Weekday::Sat),
        (&calendar.sunday, Weekday::Sun),
    ];
    DayType {
        days: flags
            .iter()
            .filter(|(flag, _)| flag.as_deref() == Some("1"))
            .map(|(_, day)| *day)
            .collect(),
        start_date: normalize_date(present(&calendar.start_date).unwrap_or_default()),
        end_date: normalize_date(present(&calendar.end_date).unwrap_or_default()),
    }
}

/// Builds the exception of a calendar date; the service runs on that date
/// if `exception_type` is `1`.
pub fn day_type_exception(calendar_date: &CalendarDate) -> DayTypeException {
    DayTypeException {
        date: normalize_date(present(&calendar_date.date).unwrap_or_default()),
        runs: calendar_date.exception_type.as_deref() == Some("1"),
    }
}

/// Day types and exceptions of every service of a feed.
#[derive(Debug, Default)]
pub struct Services {
    day_types: HashMap<String, DayType>,
    exceptions: HashMap<String, Vec<DayTypeException>>,
}

impl Services {
    /// Indexes the calendars by `service_id`, the first calendar of a
    /// service being kept.
    pub fn new(calendars: &[CalendarItem], calendar_dates: &[CalendarDate]) -> Self {
        let mut services = Services::default();
        for calendar in calendars {
            let service_id = match present(&calendar.service_id) {
                Some(service_id) => service_id,
                None => continue,
            };
            if services.day_types.contains_key(service_id) {
                warn!("calendar {} is defined more than once", service_id);
                continue;
            }
            services
                .day_types
                .insert(service_id.to_string(), day_type(calendar));
        }
        for calendar_date in calendar_dates {
            if let Some(service_id) = present(&calendar_date.service_id) {
                services
                    .exceptions
                    .entry(service_id.to_string())
                    .or_insert_with(Vec::new)
                    .push(day_type_exception(calendar_date));
            }
        }
        services
    }

    /// Day type of a service, `None` if it has no calendar.
    pub fn day_type(&self, service_id: &str) -> Option<&DayType> {
        self.day_types.get(service_id)
    }

    /// Exceptions of a service, in file order.
    pub fn exceptions(&self, service_id: &str) -> &[DayTypeException] {
        self.exceptions
            .get(service_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn s(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    fn weekdays(line: usize, service_id: &str) -> CalendarItem {
        CalendarItem {
            line,
            service_id: s(service_id),
            monday: s("1"),
            tuesday: s("1"),
            wednesday: s("1"),
            thursday: s("1"),
            friday: s("1"),
            saturday: s("0"),
            sunday: s("0"),
            start_date: s("20240101"),
            end_date: s("20241231"),
        }
    }

    #[test]
    fn normalize_valid_dates() {
        assert_eq!("2024-01-01", normalize_date("20240101"));
        assert_eq!("2099-12-31", normalize_date("20991231"));
    }

    #[test]
    fn invalid_dates_pass_through() {
        assert_eq!("20240230", normalize_date("20240230"));
        assert_eq!("2024-01-01", normalize_date("2024-01-01"));
        assert_eq!("", normalize_date(""));
        // chrono alone would accept one digit months and days
        assert_eq!("2024011", normalize_date("2024011"));
        assert_eq!("2024111", normalize_date("2024111"));
        assert_eq!("202411", normalize_date("202411"));
        assert_eq!("+2024111", normalize_date("+2024111"));
    }

    #[test]
    fn days_in_week_order() {
        let day_type = day_type(&weekdays(2, "WD"));
        assert_eq!(
            vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri
            ],
            day_type.days
        );
        assert_eq!("2024-01-01", day_type.start_date);
        assert_eq!("2024-12-31", day_type.end_date);

        let weekend = CalendarItem {
            monday: s("0"),
            tuesday: s("0"),
            wednesday: s("0"),
            thursday: s("0"),
            friday: s("0"),
            saturday: s("1"),
            sunday: s("1"),
            ..weekdays(3, "WE")
        };
        assert_eq!(vec![Weekday::Sat, Weekday::Sun], super::day_type(&weekend).days);
    }

    #[test]
    fn exceptions_by_service() {
        let calendar_dates = vec![
            CalendarDate {
                line: 2,
                service_id: s("WD"),
                date: s("20241225"),
                exception_type: s("2"),
            },
            CalendarDate {
                line: 3,
                service_id: s("WD"),
                date: s("20241228"),
                exception_type: s("1"),
            },
            CalendarDate {
                line: 4,
                service_id: s("XMAS"),
                date: s("2024-12-24"),
                exception_type: s("1"),
            },
        ];
        let services = Services::new(&[weekdays(2, "WD")], &calendar_dates);
        assert_eq!(
            vec![
                DayTypeException {
                    date: "2024-12-25".to_string(),
                    runs: false
                },
                DayTypeException {
                    date: "2024-12-28".to_string(),
                    runs: true
                },
            ],
            services.exceptions("WD")
        );
        // a service with exceptions only has no day type
        assert!(services.day_type("XMAS").is_none());
        assert_eq!("2024-12-24", services.exceptions("XMAS")[0].date);
        assert!(services.exceptions("WE").is_empty());
    }
}
