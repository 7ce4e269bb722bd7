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

use approx::assert_relative_eq;
use chrono::Weekday;
use pretty_assertions::assert_eq;
use std::{fs, path::Path};
use transit_graph::{
    gtfs,
    objects::DayTypeException,
    test_utils::{create_file_with_content, test_in_tmp_dir},
    Graph, NoticeKind, Severity,
};

const FIXTURE: &str = "tests/fixtures/gtfs";

fn journey_ids(graph: &Graph) -> Vec<String> {
    graph.journeys.values().map(|j| j.id.clone()).collect()
}

fn journey_pattern_ids(graph: &Graph) -> Vec<String> {
    graph
        .journey_patterns
        .values()
        .map(|jp| jp.id.clone())
        .collect()
}

/// Copies the fixture feed into `path`, replacing some of its files.
fn copy_fixture(path: &Path, replaced: &[(&str, &str)]) {
    for entry in fs::read_dir(FIXTURE).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), path.join(entry.file_name())).unwrap();
    }
    for (file_name, content) in replaced {
        create_file_with_content(path, file_name, content);
    }
}

#[test]
fn simple_gtfs_reading() {
    let (graph, report) = gtfs::read(FIXTURE).unwrap();
    assert!(report.is_empty(), "{:?}", report.notices());
    assert_eq!(2, graph.lines.len());
    assert_eq!(4, graph.stop_points.len());
    assert_eq!(2, graph.routes.len());
    assert_eq!(2, graph.municipalities.len());
    assert_eq!(vec!["T1", "T2", "T3"], journey_ids(&graph));
    assert_eq!(2, graph.journey_patterns.len());
}

#[test]
fn ziped_gtfs_reading() {
    let (graph, report) = gtfs::read("tests/fixtures/gtfs.zip").unwrap();
    assert!(report.is_empty(), "{:?}", report.notices());
    assert_eq!(vec!["T1", "T2", "T3"], journey_ids(&graph));
    assert_eq!(2, graph.municipalities.len());
}

#[test]
fn unexistent_file() {
    let error = gtfs::read("tests/fixtures/i_m_not_here").unwrap_err();
    assert_eq!(
        "file \"tests/fixtures/i_m_not_here\" is neither a file nor a directory, cannot read a gtfs from it",
        error.to_string()
    );
}

#[test]
fn one_journey_one_pattern() {
    let (graph, _) = gtfs::read(FIXTURE).unwrap();
    let t1 = graph.journeys.get("T1").unwrap();
    assert_eq!("10_0800_B_A", t1.activity_id);
    assert_eq!("R1", t1.line_id);
    assert_eq!("S1", t1.route_id);
    assert_eq!(Some("Harbour".to_string()), t1.headsign);
    assert!(!t1.direction);
    assert_eq!(
        vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri
        ],
        t1.day_type.days
    );
    assert_eq!("2024-01-01", t1.day_type.start_date);
    assert_eq!(
        vec![DayTypeException {
            date: "2024-12-25".to_string(),
            runs: false,
        }],
        t1.exceptions
    );

    let journey_pattern = graph
        .journey_patterns
        .get(&t1.journey_pattern_id)
        .unwrap();
    let stop_ids: Vec<&str> = journey_pattern
        .stop_point_idxs
        .iter()
        .map(|idx| graph.stop_points[*idx].id.as_str())
        .collect();
    assert_eq!(vec!["ST1", "ST2"], stop_ids);

    let route = graph.routes.get("S1").unwrap();
    assert_eq!("6000000,2400000:-10000,-10000", route.projection);
    assert_eq!(Some("R1".to_string()), route.line_id);
}

#[test]
fn identical_sequences_share_a_pattern() {
    let (graph, _) = gtfs::read(FIXTURE).unwrap();
    let t1 = graph.journeys.get("T1").unwrap();
    let t2 = graph.journeys.get("T2").unwrap();
    let t3 = graph.journeys.get("T3").unwrap();
    assert_eq!(t1.journey_pattern_id, t2.journey_pattern_id);
    assert_ne!(t1.journey_pattern_id, t3.journey_pattern_id);
    assert_eq!(
        vec!["T1", "T2"],
        graph
            .journeys_of_journey_pattern(&t1.journey_pattern_id)
            .iter()
            .map(|j| j.id.as_str())
            .collect::<Vec<_>>()
    );
    assert_eq!("550_0730_A_C", t3.activity_id);
    assert!(t3.direction);
    assert!(t3.wheelchair_accessible);
    assert_eq!("07:45:00", t3.calls[1].arrival_time);
    assert_eq!("07:46:00", t3.calls[1].departure_time);
}

#[test]
fn sorted_collections() {
    let (graph, _) = gtfs::read(FIXTURE).unwrap();
    let line_names: Vec<&str> = graph.lines.values().map(|l| l.name.as_str()).collect();
    assert_eq!(vec!["10", "550"], line_names);
    let municipality_names: Vec<&str> = graph
        .municipalities
        .values()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(vec!["Espoo", "Helsinki"], municipality_names);
    let stop_point_ids: Vec<&str> = graph.stop_points.values().map(|s| s.id.as_str()).collect();
    assert_eq!(vec!["ST1", "ST2", "ST3", "STA"], stop_point_ids);
    let mut sorted = journey_pattern_ids(&graph);
    sorted.sort();
    assert_eq!(sorted, journey_pattern_ids(&graph));
}

#[test]
fn stop_points() {
    let (graph, _) = gtfs::read(FIXTURE).unwrap();
    let station = graph.stop_points.get("STA").unwrap();
    assert_eq!("Central station", station.name);
    assert_eq!(None, station.code);
    assert_eq!(Some("A".to_string()), station.zone_id);
    assert_relative_eq!(60.17123, station.coord.lat);
    assert_relative_eq!(24.94123, station.coord.lon);
    let helsinki: Vec<&str> = graph
        .stop_points_of_municipality("091")
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(vec!["ST1", "ST2", "STA"], helsinki);
}

#[test]
fn relations() {
    let (graph, _) = gtfs::read(FIXTURE).unwrap();
    let of_line: Vec<&str> = graph
        .journeys_of_line("R1")
        .iter()
        .map(|j| j.id.as_str())
        .collect();
    assert_eq!(vec!["T1", "T2"], of_line);
    assert_eq!(1, graph.journey_patterns_of_route("S2").len());
    let at_st3: Vec<&str> = graph
        .journeys_of_stop_point("ST3")
        .iter()
        .map(|j| j.id.as_str())
        .collect();
    assert_eq!(vec!["T3"], at_st3);
    let by_activity: Vec<&str> = graph
        .journeys_by_activity_id("10_0900_B_A")
        .iter()
        .map(|j| j.id.as_str())
        .collect();
    assert_eq!(vec!["T2"], by_activity);
    let t3 = graph.journeys.get("T3").unwrap();
    let routes: Vec<&str> = graph
        .routes_of_journey_pattern(&t3.journey_pattern_id)
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(vec!["S2"], routes);
}

// Journeys and patterns are sorted whatever the order of the rows.
#[test]
fn output_order_does_not_depend_on_input_order() {
    let (expected, _) = gtfs::read(FIXTURE).unwrap();
    test_in_tmp_dir(|path| {
        copy_fixture(path, &[]);
        for file_name in &["trips.txt", "stop_times.txt", "shapes.txt", "stops.txt"] {
            let content = fs::read_to_string(path.join(file_name)).unwrap();
            let mut lines: Vec<&str> = content.lines().collect();
            lines[1..].reverse();
            create_file_with_content(path, file_name, &lines.join("\n"));
        }
        let (graph, _) = gtfs::read(path).unwrap();
        assert_eq!(journey_ids(&expected), journey_ids(&graph));
        assert_eq!(journey_pattern_ids(&expected), journey_pattern_ids(&graph));
    });
}

#[test]
fn unknown_stop_drops_the_trip() {
    test_in_tmp_dir(|path| {
        copy_fixture(
            path,
            &[(
                "stop_times.txt",
                "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
                 T1,08:00:00,08:00:00,ST1,1\n\
                 T1,08:05:00,08:05:00,UNKNOWN,2\n\
                 T1,08:10:00,08:10:00,ST2,3\n\
                 T2,09:00:00,09:00:00,ST1,1\n\
                 T2,09:10:00,09:10:00,ST2,2\n\
                 T3,07:30:00,07:30:00,ST3,1\n\
                 T3,07:55:00,07:55:00,ST1,2\n",
            )],
        );
        let (graph, report) = gtfs::read(path).unwrap();
        assert_eq!(vec!["T2", "T3"], journey_ids(&graph));
        assert_eq!(1, report.len());
        let notice = &report.notices()[0];
        assert_eq!(NoticeKind::ForeignKeyViolation, notice.kind);
        assert_eq!("stop_times.txt", notice.file_name);
        assert_eq!(Some(3), notice.line);
    });
}

#[test]
fn route_without_agency_with_two_agencies() {
    test_in_tmp_dir(|path| {
        copy_fixture(
            path,
            &[
                (
                    "agency.txt",
                    "agency_id,agency_name,agency_url,agency_timezone\n\
                     A1,Helsingin seudun liikenne,https://www.hsl.fi/,Europe/Helsinki\n\
                     A2,Espoon kaupunki,https://www.espoo.fi/,Europe/Helsinki\n",
                ),
                (
                    "routes.txt",
                    "route_id,agency_id,route_short_name,route_type\nR1,A1,10,3\nR2,,550,3\n",
                ),
            ],
        );
        let (graph, report) = gtfs::read(path).unwrap();
        assert_eq!(1, report.len());
        let notice = &report.notices()[0];
        assert_eq!(NoticeKind::AgencyIdRequiredForRoute, notice.kind);
        assert_eq!(Severity::Violation, notice.severity);
        assert_eq!(Some(3), notice.line);
        // the notice does not prevent the route from being loaded
        assert_eq!(3, graph.journeys.len());
    });
}

#[test]
fn load_errors_do_not_block_the_graph() {
    test_in_tmp_dir(|path| {
        copy_fixture(
            path,
            &[
                ("calendar_dates.txt", "\u{feff}service_id,date,exception_type\n"),
                (
                    "routes.txt",
                    "route_id,agency_id,route_short_name,route_short_name,route_type,route_color\n\
                     R1,A1,10,11,3,blue\n\
                     R2,A1,550,551,3,\n",
                ),
            ],
        );
        let (graph, report) = gtfs::read(path).unwrap();
        let kinds: Vec<NoticeKind> = report.notices().iter().map(|n| n.kind).collect();
        assert_eq!(
            vec![
                NoticeKind::DuplicateHeader,
                NoticeKind::EmptyFile,
                NoticeKind::InvalidColor,
            ],
            kinds
        );
        assert_eq!(
            Severity::Recommendation,
            report.notices()[1].severity,
            "a calendar_dates.txt with only a header is allowed"
        );
        assert_eq!(2, report.violations().count());
        assert_eq!(3, graph.journeys.len());
        assert!(graph.journeys.get("T1").unwrap().exceptions.is_empty());
        assert_eq!("10", graph.lines.get("R1").unwrap().name);
    });
}

#[test]
fn skip_validation_from_config_file() {
    test_in_tmp_dir(|path| {
        copy_fixture(
            path,
            &[(
                "trips.txt",
                "route_id,service_id,trip_id,shape_id\nR1,WD,T1,S1\nR9,WD,T2,S1\n",
            )],
        );
        create_file_with_content(path, "config.json", r#"{"skip_validation": true}"#);
        let configuration =
            transit_graph::read_utils::read_config(Some(path.join("config.json"))).unwrap();
        let (graph, report) = gtfs::Reader::new(configuration).parse(path).unwrap();
        assert!(report.is_empty(), "{:?}", report.notices());
        assert_eq!(vec!["T1"], journey_ids(&graph));
    });
}
