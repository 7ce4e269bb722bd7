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

//! Geometries of the shapes and their compact encoding.

use crate::gtfs::records::{present, Shape};
use geo::{Coord, LineString};
use std::collections::BTreeMap;
use tracing::warn;

const SCALE: f64 = 100_000.0;
const POINT_SEPARATOR: char = ':';

fn scale(value: f64) -> i64 {
    (value * SCALE).round() as i64
}

/// Encodes a geometry into a projection string.
///
/// Coordinates are scaled to integers (`round(value * 100000)`). The
/// first point is written as `lat,lon`, every following point as the
/// difference between the previous point and itself. Points are
/// separated by `:`.
///
/// ```
/// # use geo::LineString;
/// let geometry = LineString::from(vec![(24.0, 60.0), (24.1, 60.1)]);
/// assert_eq!(
///     "6000000,2400000:-10000,-10000",
///     transit_graph::geometry::encode(&geometry)
/// );
/// ```
pub fn encode(geometry: &LineString<f64>) -> String {
    let mut encoded = String::new();
    let mut previous: Option<(i64, i64)> = None;
    for coord in geometry.coords() {
        let current = (scale(coord.y), scale(coord.x));
        match previous {
            None => encoded.push_str(&format!("{},{}", current.0, current.1)),
            Some(previous) => {
                encoded.push(POINT_SEPARATOR);
                encoded.push_str(&format!(
                    "{},{}",
                    previous.0 - current.0,
                    previous.1 - current.1
                ));
            }
        }
        previous = Some(current);
    }
    encoded
}

/// Builds the geometry of every shape, keeping the points in the order
/// they appear in the file. Points with invalid coordinates are ignored.
pub fn shape_geometries(shapes: &[Shape]) -> BTreeMap<String, LineString<f64>> {
    let mut coords: BTreeMap<String, Vec<Coord<f64>>> = BTreeMap::new();
    for shape in shapes {
        let shape_id = match present(&shape.shape_id) {
            Some(shape_id) => shape_id,
            None => continue,
        };
        let lat = present(&shape.shape_pt_lat).and_then(|v| v.parse::<f64>().ok());
        let lon = present(&shape.shape_pt_lon).and_then(|v| v.parse::<f64>().ok());
        match (lat, lon) {
            (Some(y), Some(x)) => coords
                .entry(shape_id.to_string())
                .or_insert_with(Vec::new)
                .push(Coord { x, y }),
            _ => warn!(
                "shapes.txt line {}: invalid coordinates for shape {}",
                shape.line, shape_id
            ),
        }
    }
    coords
        .into_iter()
        .map(|(shape_id, coords)| (shape_id, LineString::new(coords)))
        .collect()
}
