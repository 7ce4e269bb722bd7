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

//! Definition of the transit graph.

use crate::{objects::*, Result};
use derivative::Derivative;
use relational_types::{IdxSet, ManyToMany, OneToMany, Relation};
use std::{collections::BTreeMap, ops};
use tracing::debug;
use typed_index_collection::{CollectionWithId, Idx};

/// The set of collections representing the graph.
///
/// Every collection is sorted by its natural key: municipalities and
/// lines by name, the others by identifier.
#[derive(Derivative, Debug)]
#[derivative(Default)]
#[allow(missing_docs)]
pub struct Collections {
    pub municipalities: CollectionWithId<Municipality>,
    pub stop_points: CollectionWithId<StopPoint>,
    pub lines: CollectionWithId<Line>,
    pub routes: CollectionWithId<Route>,
    pub journeys: CollectionWithId<Journey>,
    pub journey_patterns: CollectionWithId<JourneyPattern>,
}

/// The transit graph: the collections and the relations between them.
///
/// The graph is immutable once built and can be shared between threads.
pub struct Graph {
    collections: Collections,

    lines_to_journeys: OneToMany<Line, Journey>,
    routes_to_journeys: OneToMany<Route, Journey>,
    journey_patterns_to_journeys: OneToMany<JourneyPattern, Journey>,
    routes_to_journey_patterns: ManyToMany<Route, JourneyPattern>,
    journeys_to_stop_points: ManyToMany<Journey, StopPoint>,
    stop_points_to_municipalities: ManyToMany<StopPoint, Municipality>,
    journeys_by_activity_id: BTreeMap<String, IdxSet<Journey>>,
}

fn singleton<T>(idx: Option<Idx<T>>) -> IdxSet<T> {
    idx.into_iter().collect()
}

fn resolve<'a, T>(collection: &'a CollectionWithId<T>, idxs: IdxSet<T>) -> Vec<&'a T> {
    idxs.into_iter().map(|idx| &collection[idx]).collect()
}

impl Graph {
    /// Constructs a graph from the given `Collections`.
    ///
    /// Fails if a journey references an object missing from the
    /// collections.
    pub fn new(c: Collections) -> Result<Self> {
        let lines_to_journeys = OneToMany::new(&c.lines, &c.journeys, "lines_to_journeys")?;
        let routes_to_journeys = OneToMany::new(&c.routes, &c.journeys, "routes_to_journeys")?;
        let journey_patterns_to_journeys = OneToMany::new(
            &c.journey_patterns,
            &c.journeys,
            "journey_patterns_to_journeys",
        )?;
        let routes_to_journey_patterns =
            ManyToMany::from_relations_sink(&routes_to_journeys, &journey_patterns_to_journeys);

        let forward_journeys_to_stop_points = c
            .journeys
            .iter()
            .map(|(idx, journey)| {
                let stop_points = journey.calls.iter().map(|call| call.stop_point_idx).collect();
                (idx, stop_points)
            })
            .collect();
        let journeys_to_stop_points = ManyToMany::from_forward(forward_journeys_to_stop_points);

        let forward_stop_points_to_municipalities = c
            .stop_points
            .iter()
            .map(|(idx, stop_point)| {
                let municipalities = singleton(
                    stop_point
                        .municipality_id
                        .as_ref()
                        .and_then(|id| c.municipalities.get_idx(id)),
                );
                (idx, municipalities)
            })
            .collect();
        let stop_points_to_municipalities =
            ManyToMany::from_forward(forward_stop_points_to_municipalities);

        let mut journeys_by_activity_id: BTreeMap<String, IdxSet<Journey>> = BTreeMap::new();
        for (idx, journey) in &c.journeys {
            journeys_by_activity_id
                .entry(journey.activity_id.clone())
                .or_default()
                .insert(idx);
        }
        debug!(
            "{} activity identifiers for {} journeys",
            journeys_by_activity_id.len(),
            c.journeys.len()
        );

        Ok(Graph {
            collections: c,
            lines_to_journeys,
            routes_to_journeys,
            journey_patterns_to_journeys,
            routes_to_journey_patterns,
            journeys_to_stop_points,
            stop_points_to_municipalities,
            journeys_by_activity_id,
        })
    }

    /// Consumes the graph to return its collections.
    pub fn into_collections(self) -> Collections {
        self.collections
    }

    /// Journeys whose activity identifier is `activity_id`.
    pub fn journeys_by_activity_id(&self, activity_id: &str) -> Vec<&Journey> {
        match self.journeys_by_activity_id.get(activity_id) {
            Some(idxs) => resolve(&self.journeys, idxs.clone()),
            None => vec![],
        }
    }

    /// Journeys of a line, sorted by identifier.
    pub fn journeys_of_line(&self, line_id: &str) -> Vec<&Journey> {
        let from = singleton(self.lines.get_idx(line_id));
        resolve(
            &self.journeys,
            self.lines_to_journeys.get_corresponding_forward(&from),
        )
    }

    /// Journeys following a route, sorted by identifier.
    pub fn journeys_of_route(&self, route_id: &str) -> Vec<&Journey> {
        let from = singleton(self.routes.get_idx(route_id));
        resolve(
            &self.journeys,
            self.routes_to_journeys.get_corresponding_forward(&from),
        )
    }

    /// Journeys sharing a journey pattern, sorted by identifier.
    pub fn journeys_of_journey_pattern(&self, journey_pattern_id: &str) -> Vec<&Journey> {
        let from = singleton(self.journey_patterns.get_idx(journey_pattern_id));
        resolve(
            &self.journeys,
            self.journey_patterns_to_journeys
                .get_corresponding_forward(&from),
        )
    }

    /// Journey patterns carried by a route.
    pub fn journey_patterns_of_route(&self, route_id: &str) -> Vec<&JourneyPattern> {
        let from = singleton(self.routes.get_idx(route_id));
        resolve(
            &self.journey_patterns,
            self.routes_to_journey_patterns
                .get_corresponding_forward(&from),
        )
    }

    /// Routes carrying a journey pattern.
    pub fn routes_of_journey_pattern(&self, journey_pattern_id: &str) -> Vec<&Route> {
        let to = singleton(self.journey_patterns.get_idx(journey_pattern_id));
        resolve(
            &self.routes,
            self.routes_to_journey_patterns
                .get_corresponding_backward(&to),
        )
    }

    /// Distinct stop points called by a journey, sorted by identifier.
    pub fn stop_points_of_journey(&self, journey_id: &str) -> Vec<&StopPoint> {
        let from = singleton(self.journeys.get_idx(journey_id));
        resolve(
            &self.stop_points,
            self.journeys_to_stop_points.get_corresponding_forward(&from),
        )
    }

    /// Journeys calling at a stop point, sorted by identifier.
    pub fn journeys_of_stop_point(&self, stop_point_id: &str) -> Vec<&Journey> {
        let to = singleton(self.stop_points.get_idx(stop_point_id));
        resolve(
            &self.journeys,
            self.journeys_to_stop_points.get_corresponding_backward(&to),
        )
    }

    /// Stop points located in a municipality, sorted by identifier.
    pub fn stop_points_of_municipality(&self, municipality_id: &str) -> Vec<&StopPoint> {
        let to = singleton(self.municipalities.get_idx(municipality_id));
        resolve(
            &self.stop_points,
            self.stop_points_to_municipalities
                .get_corresponding_backward(&to),
        )
    }
}

impl ops::Deref for Graph {
    type Target = Collections;
    fn deref(&self) -> &Self::Target {
        &self.collections
    }
}
