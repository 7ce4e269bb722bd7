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

//! The different objects contained in the graph.

#![allow(missing_docs)]

use chrono::Weekday;
use geo::LineString;
use typed_index_collection::{Id, Idx};

macro_rules! impl_id {
    ($ty:ty, $gen:ty, $id:ident) => {
        impl Id<$gen> for $ty {
            fn id(&self) -> &str {
                &self.$id
            }
            fn set_id(&mut self, id: String) {
                self.$id = id;
            }
        }
    };
    ($ty:ty) => {
        impl_id!($ty, $ty, id);
    };
}

/// Number of decimals kept for the coordinates of a stop point.
pub const COORD_DECIMALS: i32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Municipality {
    /// Public code of the municipality
    pub id: String,
    pub name: String,
}
impl_id!(Municipality);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

impl Coord {
    /// Builds a coordinate rounded to [`COORD_DECIMALS`] decimals.
    pub fn rounded(lon: f64, lat: f64) -> Self {
        let factor = 10f64.powi(COORD_DECIMALS);
        Coord {
            lon: (lon * factor).round() / factor,
            lat: (lat * factor).round() / factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopPoint {
    pub id: String,
    pub name: String,
    /// Short code displayed to passengers
    pub code: Option<String>,
    pub coord: Coord,
    pub zone_id: Option<String>,
    /// Only set when the municipality exists
    pub municipality_id: Option<String>,
}
impl_id!(StopPoint);

impl StopPoint {
    /// The short code of the stop point, or its identifier if it has none.
    pub fn short_name(&self) -> &str {
        self.code.as_deref().unwrap_or(&self.id)
    }
}

/// A transit line, identified by the `route_id` of the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub route_type: Option<u16>,
    pub color: Option<String>,
    pub text_color: Option<String>,
}
impl_id!(Line);

/// A geometric path, identified by its `shape_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: String,
    /// Coordinates as (longitude, latitude), in file order
    pub geometry: LineString<f64>,
    /// Delta encoded geometry, see [`crate::geometry::encode`]
    pub projection: String,
    /// The line of the first journey using the route
    pub line_id: Option<String>,
}
impl_id!(Route);

/// An ordered sequence of stop points shared by journeys.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyPattern {
    /// Hash of the identifiers of the stop points
    pub id: String,
    pub stop_point_idxs: Vec<Idx<StopPoint>>,
    /// The route of the first journey using the pattern
    pub route_id: Option<String>,
}
impl_id!(JourneyPattern);

#[derive(Debug, Clone, PartialEq)]
pub struct JourneyCall {
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_point_idx: Idx<StopPoint>,
}

/// Regular service days of a journey.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DayType {
    pub days: Vec<Weekday>,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`
    pub end_date: String,
}

/// A date on which the regular service is added or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTypeException {
    /// `YYYY-MM-DD`, or the raw value if it could not be parsed
    pub date: String,
    /// Whether the journey runs on that date
    pub runs: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Journey {
    /// `trip_id` of the feed
    pub id: String,
    pub headsign: Option<String>,
    /// `direction_id` is 1
    pub direction: bool,
    /// `wheelchair_accessible` is 1
    pub wheelchair_accessible: bool,
    pub calls: Vec<JourneyCall>,
    pub day_type: DayType,
    pub exceptions: Vec<DayTypeException>,
    pub line_id: String,
    pub route_id: String,
    pub journey_pattern_id: String,
    /// `{line name}_{HHMM}_{last stop}_{first stop}`
    pub activity_id: String,
}
impl_id!(Journey);
impl_id!(Journey, Line, line_id);
impl_id!(Journey, Route, route_id);
impl_id!(Journey, JourneyPattern, journey_pattern_id);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn round_coordinates() {
        let coord = Coord::rounded(24.941_234_9, 60.171_005_1);
        assert_relative_eq!(24.94123, coord.lon);
        assert_relative_eq!(60.17101, coord.lat);
    }

    #[test]
    fn short_name_falls_back_on_id() {
        let mut stop_point = StopPoint {
            id: "1040601".to_string(),
            name: "Kamppi".to_string(),
            code: None,
            coord: Coord::default(),
            zone_id: None,
            municipality_id: None,
        };
        assert_eq!("1040601", stop_point.short_name());
        stop_point.code = Some("H1234".to_string());
        assert_eq!("H1234", stop_point.short_name());
    }
}
