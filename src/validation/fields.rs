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

//! Field level checks.

use crate::report::{Notice, NoticeKind, Report};
use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Marks the bytes that could not be decoded.
const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

lazy_static! {
    static ref COLOR: Regex = Regex::new("^[0-9A-Fa-f]{6}$").unwrap();
    static ref TIMEZONE: Regex =
        Regex::new("^[A-Za-z_]+/[A-Za-z0-9_+-]+(/[A-Za-z0-9_+-]+)*$").unwrap();
    static ref LANGUAGE_CODE: Regex =
        Regex::new("^[A-Za-z]{2,3}([-_]([A-Za-z]{2}|[0-9]{3}))?$").unwrap();
    static ref PHONE: Regex = Regex::new(r"^[0-9 ()+\-]{5,}$").unwrap();
    static ref EMAIL: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$"
    )
    .unwrap();
    static ref DATE: Regex = Regex::new("^[0-9]{8}$").unwrap();
    static ref TIME: Regex = Regex::new("^([0-9]|[0-3][0-9]|4[0-7]):[0-5][0-9]:[0-5][0-9]$").unwrap();
    static ref CURRENCY_CODE: Regex = Regex::new("^[A-Z]{3}$").unwrap();
}

/// Whether a field must be filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be present and not empty
    Required,
    /// May be absent or empty
    Optional,
    /// Required depending on other fields of the record, checked by the
    /// record itself
    Conditional,
}

/// Kind of a field, driving which check applies to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Identifier
    Id,
    /// Free text
    Text,
    /// Absolute URL
    Url,
    /// 6 hexadecimal digits
    Color,
    /// `Area/Location` timezone
    Timezone,
    /// Language code with an optional region
    LanguageCode,
    /// Phone number
    Phone,
    /// Email address
    Email,
    /// Latitude in degrees
    Latitude,
    /// Longitude in degrees
    Longitude,
    /// `YYYYMMDD` date
    Date,
    /// `H:MM:SS` time, up to 47 hours
    Time,
    /// Integer
    Integer,
    /// Floating point number
    Float,
    /// ISO 4217 like code
    CurrencyCode,
    /// Amount of money
    CurrencyAmount,
    /// 0 or 1, service available on a day of the week
    CalendarDay,
    /// 1 (added) or 2 (removed)
    CalendarException,
    /// Mode of transport of a route
    RouteType,
    /// 1 to 4
    ContinuousPickupDropOff,
    /// 0 to 4
    LocationType,
    /// 0 to 2, for both stops and trips
    WheelchairAccessibility,
    /// 0 to 3
    PickupDropOffType,
    /// 0 or 1
    Timepoint,
    /// 0 or 1
    DirectionId,
    /// 0 to 2
    BikesAllowed,
    /// 0 or 1
    PaymentMethod,
    /// 0 to 2
    Transfers,
}

/// Why a value does not match its field type.
#[derive(Debug, Error, PartialEq)]
#[allow(missing_docs)]
pub enum InvalidField {
    #[error("'{0}' contains characters which could not be decoded")]
    Character(String),
    #[error("'{0}' is not an absolute URL")]
    Url(String),
    #[error("'{0}' is not a color made of 6 hexadecimal digits")]
    Color(String),
    #[error("'{0}' is not a timezone of the form Area/Location")]
    Timezone(String),
    #[error("'{0}' is not a language code")]
    LanguageCode(String),
    #[error("'{0}' is not a phone number")]
    Phone(String),
    #[error("'{0}' is not an email address")]
    Email(String),
    #[error("'{0}' is not a latitude between -90 and 90")]
    Latitude(String),
    #[error("'{0}' is not a longitude between -180 and 180")]
    Longitude(String),
    #[error("'{0}' is not a YYYYMMDD date between 1900 and 2099")]
    Date(String),
    #[error("'{0}' is not a H:MM:SS time")]
    Time(String),
    #[error("'{0}' is not an integer")]
    Integer(String),
    #[error("'{0}' is not a number")]
    Float(String),
    #[error("'{0}' is not a currency code of 3 uppercase letters")]
    CurrencyCode(String),
    #[error("'{0}' is not an amount")]
    CurrencyAmount(String),
    #[error("'{value}' is not one of the accepted values ({expected})")]
    EnumValue {
        value: String,
        expected: &'static str,
    },
}

impl InvalidField {
    /// The notice kind reporting this error.
    pub fn notice_kind(&self) -> NoticeKind {
        use InvalidField::*;
        match self {
            Character(_) => NoticeKind::InvalidCharacter,
            Url(_) => NoticeKind::InvalidUrl,
            Color(_) => NoticeKind::InvalidColor,
            Timezone(_) => NoticeKind::InvalidTimezone,
            LanguageCode(_) => NoticeKind::InvalidLanguageCode,
            Phone(_) => NoticeKind::InvalidPhoneNumber,
            Email(_) => NoticeKind::InvalidEmail,
            Latitude(_) => NoticeKind::InvalidLatitude,
            Longitude(_) => NoticeKind::InvalidLongitude,
            Date(_) => NoticeKind::InvalidDate,
            Time(_) => NoticeKind::InvalidTime,
            Integer(_) => NoticeKind::InvalidInteger,
            Float(_) => NoticeKind::InvalidFloat,
            CurrencyCode(_) => NoticeKind::InvalidCurrencyCode,
            CurrencyAmount(_) => NoticeKind::InvalidCurrencyAmount,
            EnumValue { .. } => NoticeKind::UnexpectedEnumValue,
        }
    }
}

const ROUTE_TYPES: &[(u16, u16)] = &[
    (0, 7),
    (11, 12),
    (100, 117),
    (200, 209),
    (400, 405),
    (700, 716),
    (800, 800),
    (900, 906),
    (1000, 1000),
    (1100, 1100),
    (1200, 1200),
    (1300, 1307),
    (1400, 1400),
    (1500, 1507),
    (1700, 1700),
    (1702, 1702),
];

/// Parses a canonical decimal code (`"1"`, not `"01"` nor `"+1"`).
fn parse_code(value: &str) -> Option<u16> {
    value.parse::<u16>().ok().filter(|c| c.to_string() == value)
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn check_enum(value: &str, ranges: &[(u16, u16)], expected: &'static str) -> Result<(), InvalidField> {
    match parse_code(value) {
        Some(code) if ranges.iter().any(|(min, max)| (*min..=*max).contains(&code)) => Ok(()),
        _ => Err(InvalidField::EnumValue {
            value: value.to_string(),
            expected,
        }),
    }
}

fn check_range(
    value: &str,
    min: f64,
    max: f64,
    err: fn(String) -> InvalidField,
) -> Result<(), InvalidField> {
    match parse_finite(value) {
        Some(v) if v >= min && v <= max => Ok(()),
        _ => Err(err(value.to_string())),
    }
}

fn check_pattern(
    value: &str,
    regex: &Regex,
    err: fn(String) -> InvalidField,
) -> Result<(), InvalidField> {
    if regex.is_match(value) {
        Ok(())
    } else {
        Err(err(value.to_string()))
    }
}

fn check_date(value: &str) -> Result<(), InvalidField> {
    let date = if DATE.is_match(value) {
        NaiveDate::parse_from_str(value, "%Y%m%d").ok()
    } else {
        None
    };
    match date {
        Some(date) if (1900..=2099).contains(&date.year()) => Ok(()),
        _ => Err(InvalidField::Date(value.to_string())),
    }
}

impl FieldType {
    /// Checks a non empty value.
    pub fn check(self, value: &str) -> Result<(), InvalidField> {
        use FieldType::*;
        match self {
            Id | Text => {
                if value.contains(REPLACEMENT_CHARACTER) {
                    Err(InvalidField::Character(value.to_string()))
                } else {
                    Ok(())
                }
            }
            Url => match url::Url::parse(value) {
                Ok(_) => Ok(()),
                Err(_) => Err(InvalidField::Url(value.to_string())),
            },
            Color => check_pattern(value, &COLOR, InvalidField::Color),
            Timezone => check_pattern(value, &TIMEZONE, InvalidField::Timezone),
            LanguageCode => check_pattern(value, &LANGUAGE_CODE, InvalidField::LanguageCode),
            Phone => check_pattern(value, &PHONE, InvalidField::Phone),
            Email => check_pattern(value, &EMAIL, InvalidField::Email),
            Latitude => check_range(value, -90.0, 90.0, InvalidField::Latitude),
            Longitude => check_range(value, -180.0, 180.0, InvalidField::Longitude),
            Date => check_date(value),
            Time => check_pattern(value, &TIME, InvalidField::Time),
            Integer => match value.parse::<i64>() {
                Ok(_) => Ok(()),
                Err(_) => Err(InvalidField::Integer(value.to_string())),
            },
            Float => match parse_finite(value) {
                Some(_) => Ok(()),
                None => Err(InvalidField::Float(value.to_string())),
            },
            CurrencyCode => check_pattern(value, &CURRENCY_CODE, InvalidField::CurrencyCode),
            CurrencyAmount => match parse_finite(value) {
                Some(_) => Ok(()),
                None => Err(InvalidField::CurrencyAmount(value.to_string())),
            },
            CalendarDay => check_enum(value, &[(0, 1)], "0 or 1"),
            CalendarException => check_enum(value, &[(1, 2)], "1 or 2"),
            RouteType => check_enum(value, ROUTE_TYPES, "a basic or extended route type"),
            ContinuousPickupDropOff => check_enum(value, &[(1, 4)], "1 to 4"),
            LocationType => check_enum(value, &[(0, 4)], "0 to 4"),
            WheelchairAccessibility => check_enum(value, &[(0, 2)], "0 to 2"),
            PickupDropOffType => check_enum(value, &[(0, 3)], "0 to 3"),
            Timepoint => check_enum(value, &[(0, 1)], "0 or 1"),
            DirectionId => check_enum(value, &[(0, 1)], "0 or 1"),
            BikesAllowed => check_enum(value, &[(0, 2)], "0 to 2"),
            PaymentMethod => check_enum(value, &[(0, 1)], "0 or 1"),
            Transfers => check_enum(value, &[(0, 2)], "0 to 2"),
        }
    }
}

/// Checks one field of a record against its type and presence.
///
/// An absent or empty field raises [`NoticeKind::MissingRequiredField`]
/// when required and nothing otherwise. A filled field raises at most
/// one notice for its type, plus [`NoticeKind::InvalidCharacter`] when
/// it could not be decoded.
pub fn check_field(
    field_type: FieldType,
    presence: Presence,
    value: Option<&str>,
    file_name: &str,
    field_name: &str,
    line: usize,
    report: &mut Report,
) {
    let value = match value.filter(|v| !v.trim().is_empty()) {
        Some(value) => value,
        None => {
            if presence == Presence::Required {
                report.add(missing_field(file_name, field_name, line));
            }
            return;
        }
    };
    let mut character_reported = false;
    if let Err(e) = field_type.check(value) {
        character_reported = e.notice_kind() == NoticeKind::InvalidCharacter;
        report.add(
            Notice::new(e.notice_kind(), file_name, e.to_string())
                .with_field(field_name)
                .on_line(line),
        );
    }
    if !character_reported && value.contains(REPLACEMENT_CHARACTER) {
        report.add(
            Notice::new(
                NoticeKind::InvalidCharacter,
                file_name,
                format!("'{}' contains characters which could not be decoded", value),
            )
            .with_field(field_name)
            .on_line(line),
        );
    }
}

/// A [`NoticeKind::MissingRequiredField`] notice.
pub fn missing_field(file_name: &str, field_name: &str, line: usize) -> Notice {
    Notice::new(
        NoticeKind::MissingRequiredField,
        file_name,
        format!("'{}' is required", field_name),
    )
    .with_field(field_name)
    .on_line(line)
}
