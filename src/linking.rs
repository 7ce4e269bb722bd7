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

//! Construction of the domain objects from the records of a feed.
//!
//! Journeys sharing the same sequence of stops share the same
//! [`JourneyPattern`]. Records whose references cannot be resolved are
//! dropped with a warning.

use crate::{
    calendars::Services,
    geometry,
    gtfs::records::{present, Feed, Stop, StopTime, Trip},
    model::Collections,
    objects::*,
    Result,
};
use anyhow::{anyhow, bail};
use skip_error::skip_error_and_warn;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap, HashSet},
};
use tracing::{info, warn};
use typed_index_collection::{CollectionWithId, Id};

/// Builds a collection sorted with `compare`. When an identifier is
/// declared more than once, the first object in file order is kept.
fn sorted_collection<T, F>(objects: Vec<T>, compare: F) -> CollectionWithId<T>
where
    T: Id<T>,
    F: FnMut(&T, &T) -> Ordering,
{
    let mut ids = HashSet::new();
    let mut objects: Vec<T> = objects
        .into_iter()
        .filter(|object| {
            let first = ids.insert(object.id().to_string());
            if !first {
                warn!("identifier {} is declared more than once", object.id());
            }
            first
        })
        .collect();
    objects.sort_by(compare);
    let mut collection = CollectionWithId::default();
    for object in objects {
        skip_error_and_warn!(collection.push(object));
    }
    collection
}

fn parse_coord(stop: &Stop) -> Result<Coord> {
    let lon = present(&stop.stop_lon)
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| anyhow!("stop {:?} has no valid longitude", stop.stop_id))?;
    let lat = present(&stop.stop_lat)
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| anyhow!("stop {:?} has no valid latitude", stop.stop_id))?;
    Ok(Coord::rounded(lon, lat))
}

fn make_municipalities(feed: &Feed) -> CollectionWithId<Municipality> {
    let municipalities = feed
        .municipalities
        .iter()
        .filter_map(|row| {
            Some(Municipality {
                id: present(&row.id)?.to_string(),
                name: present(&row.name).unwrap_or_default().to_string(),
            })
        })
        .collect();
    sorted_collection(municipalities, |a, b| {
        a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))
    })
}

fn make_stop_points(
    feed: &Feed,
    municipalities: &CollectionWithId<Municipality>,
) -> CollectionWithId<StopPoint> {
    let mut stop_points = vec![];
    for stop in &feed.stops {
        let id = skip_error_and_warn!(present(&stop.stop_id)
            .ok_or_else(|| anyhow!("stops.txt line {}: stop without stop_id", stop.line)));
        let coord = skip_error_and_warn!(parse_coord(stop));
        let municipality_id = present(&stop.municipality_id)
            .filter(|id| municipalities.contains_id(id))
            .map(str::to_string);
        stop_points.push(StopPoint {
            id: id.to_string(),
            name: present(&stop.stop_name).unwrap_or_default().to_string(),
            code: present(&stop.stop_code).map(str::to_string),
            coord,
            zone_id: present(&stop.zone_id).map(str::to_string),
            municipality_id,
        });
    }
    sorted_collection(stop_points, |a, b| a.id.cmp(&b.id))
}

fn make_lines(feed: &Feed) -> CollectionWithId<Line> {
    let lines = feed
        .routes
        .iter()
        .filter_map(|route| {
            let id = present(&route.route_id)?;
            let short_name = present(&route.route_short_name);
            let long_name = present(&route.route_long_name);
            Some(Line {
                id: id.to_string(),
                name: short_name.or(long_name).unwrap_or_default().to_string(),
                description: long_name.map(str::to_string),
                route_type: present(&route.route_type).and_then(|v| v.parse().ok()),
                color: present(&route.route_color).map(str::to_string),
                text_color: present(&route.route_text_color).map(str::to_string),
            })
        })
        .collect();
    sorted_collection(lines, |a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)))
}

fn make_routes(feed: &Feed) -> CollectionWithId<Route> {
    let routes = geometry::shape_geometries(&feed.shapes)
        .into_iter()
        .map(|(id, geometry)| Route {
            id,
            projection: geometry::encode(&geometry),
            geometry,
            line_id: None,
        })
        .collect();
    sorted_collection(routes, |a, b| a.id.cmp(&b.id))
}

/// Groups the stop times by `trip_id`, each group being sorted by
/// `stop_sequence`. A sequence which is not a number is sorted after the
/// numeric ones, keeping file order.
fn group_stop_times(stop_times: &[StopTime]) -> BTreeMap<&str, Vec<&StopTime>> {
    let mut groups: BTreeMap<&str, Vec<&StopTime>> = BTreeMap::new();
    for stop_time in stop_times {
        if let Some(trip_id) = present(&stop_time.trip_id) {
            groups.entry(trip_id).or_insert_with(Vec::new).push(stop_time);
        }
    }
    for group in groups.values_mut() {
        group.sort_by_key(|stop_time| {
            match present(&stop_time.stop_sequence).and_then(|v| v.parse::<i64>().ok()) {
                Some(sequence) => (false, sequence),
                None => (true, 0),
            }
        });
    }
    groups
}

/// Identifier of the journey pattern serving the given stops, in order.
pub fn journey_pattern_id<S: AsRef<str>>(stop_ids: &[S]) -> String {
    let joined = stop_ids
        .iter()
        .map(|stop_id| stop_id.as_ref())
        .collect::<Vec<&str>>()
        .join("\n");
    format!("{:x}", md5::compute(joined))
}

/// Calls of a trip, and the pattern they follow.
struct TripCalls {
    journey_pattern_id: String,
    calls: Vec<JourneyCall>,
}

/// Resolves the stop points of every trip. A trip with a stop which
/// cannot be resolved gets no calls, and its sequence registers no
/// pattern.
fn make_trip_calls<'a>(
    stop_times: &'a [StopTime],
    stop_points: &CollectionWithId<StopPoint>,
    journey_patterns: &mut BTreeMap<String, JourneyPattern>,
) -> HashMap<&'a str, TripCalls> {
    let mut trip_calls = HashMap::new();
    for (trip_id, group) in group_stop_times(stop_times) {
        let mut calls = Vec::with_capacity(group.len());
        let mut stop_ids = Vec::with_capacity(group.len());
        let mut complete = true;
        for stop_time in group {
            let stop_id = present(&stop_time.stop_id).unwrap_or_default();
            let stop_point_idx = match stop_points.get_idx(stop_id) {
                Some(stop_point_idx) => stop_point_idx,
                None => {
                    warn!(
                        "stop_times.txt line {}: stop {:?} of trip {} not found",
                        stop_time.line, stop_id, trip_id
                    );
                    complete = false;
                    continue;
                }
            };
            let arrival = present(&stop_time.arrival_time);
            let departure = present(&stop_time.departure_time);
            calls.push(JourneyCall {
                arrival_time: arrival.or(departure).unwrap_or_default().to_string(),
                departure_time: departure.or(arrival).unwrap_or_default().to_string(),
                stop_point_idx,
            });
            stop_ids.push(stop_id);
        }
        if !complete {
            warn!("trip {} is ignored, some of its stops are unknown", trip_id);
            continue;
        }
        let journey_pattern_id = journey_pattern_id(&stop_ids);
        journey_patterns
            .entry(journey_pattern_id.clone())
            .or_insert_with(|| JourneyPattern {
                id: journey_pattern_id.clone(),
                stop_point_idxs: calls.iter().map(|call| call.stop_point_idx).collect(),
                route_id: None,
            });
        trip_calls.insert(
            trip_id,
            TripCalls {
                journey_pattern_id,
                calls,
            },
        );
    }
    trip_calls
}

/// `{line name}_{HHMM of the first departure}_{last stop}_{first stop}`
fn activity_id(
    line: &Line,
    calls: &[JourneyCall],
    stop_points: &CollectionWithId<StopPoint>,
) -> Result<String> {
    let (first, last) = match (calls.first(), calls.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => bail!("no call"),
    };
    let hhmm: String = first.departure_time.split(':').take(2).collect();
    Ok(format!(
        "{}_{}_{}_{}",
        line.name,
        hhmm,
        stop_points[last.stop_point_idx].short_name(),
        stop_points[first.stop_point_idx].short_name()
    ))
}

struct Linker<'a> {
    stop_points: &'a CollectionWithId<StopPoint>,
    lines: &'a CollectionWithId<Line>,
    routes: &'a CollectionWithId<Route>,
    trip_calls: &'a HashMap<&'a str, TripCalls>,
    services: &'a Services,
}

impl<'a> Linker<'a> {
    fn make_journey(&self, trip: &Trip) -> Result<Journey> {
        let trip_id = present(&trip.trip_id)
            .ok_or_else(|| anyhow!("trips.txt line {}: trip without trip_id", trip.line))?;
        let trip_calls = self
            .trip_calls
            .get(trip_id)
            .ok_or_else(|| anyhow!("trip {} has no valid stop times", trip_id))?;
        let line_id = present(&trip.route_id).unwrap_or_default();
        let line = self
            .lines
            .get(line_id)
            .ok_or_else(|| anyhow!("route {:?} of trip {} not found", line_id, trip_id))?;
        let route_id = present(&trip.shape_id)
            .ok_or_else(|| anyhow!("trip {} has no shape_id", trip_id))?;
        if !self.routes.contains_id(route_id) {
            bail!("shape {} of trip {} not found", route_id, trip_id);
        }
        let service_id = present(&trip.service_id).unwrap_or_default();
        let day_type = self
            .services
            .day_type(service_id)
            .ok_or_else(|| anyhow!("calendar {:?} of trip {} not found", service_id, trip_id))?;
        Ok(Journey {
            id: trip_id.to_string(),
            headsign: present(&trip.trip_headsign).map(str::to_string),
            direction: present(&trip.direction_id) == Some("1"),
            wheelchair_accessible: present(&trip.wheelchair_accessible) == Some("1"),
            activity_id: activity_id(line, &trip_calls.calls, self.stop_points)?,
            calls: trip_calls.calls.clone(),
            day_type: day_type.clone(),
            exceptions: self.services.exceptions(service_id).to_vec(),
            line_id: line.id.clone(),
            route_id: route_id.to_string(),
            journey_pattern_id: trip_calls.journey_pattern_id.clone(),
        })
    }
}

/// Builds all the collections of the graph from a feed.
pub fn make_collections(feed: &Feed) -> Result<Collections> {
    info!("Linking the objects");
    let municipalities = make_municipalities(feed);
    let stop_points = make_stop_points(feed, &municipalities);
    let lines = make_lines(feed);
    let mut routes = make_routes(feed);
    let mut journey_patterns = BTreeMap::new();
    let trip_calls = make_trip_calls(&feed.stop_times, &stop_points, &mut journey_patterns);
    let services = Services::new(&feed.calendars, &feed.calendar_dates);

    let linker = Linker {
        stop_points: &stop_points,
        lines: &lines,
        routes: &routes,
        trip_calls: &trip_calls,
        services: &services,
    };
    let mut journeys = vec![];
    for trip in &feed.trips {
        let journey = skip_error_and_warn!(linker.make_journey(trip));
        journeys.push(journey);
    }

    for journey in &journeys {
        if let Some(route_idx) = routes.get_idx(&journey.route_id) {
            routes
                .index_mut(route_idx)
                .line_id
                .get_or_insert_with(|| journey.line_id.clone());
        }
        if let Some(journey_pattern) = journey_patterns.get_mut(&journey.journey_pattern_id) {
            journey_pattern
                .route_id
                .get_or_insert_with(|| journey.route_id.clone());
        }
    }
    info!(
        "{} journeys and {} journey patterns",
        journeys.len(),
        journey_patterns.len()
    );

    Ok(Collections {
        municipalities,
        stop_points,
        lines,
        routes,
        journeys: sorted_collection(journeys, |a, b| a.id.cmp(&b.id)),
        journey_patterns: sorted_collection(
            journey_patterns.into_values().collect(),
            |a, b| a.id.cmp(&b.id),
        ),
    })
}
