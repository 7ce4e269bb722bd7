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

use anyhow::{bail, Context};
use clap::Parser;
use std::{fs::File, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};
use transit_graph::{gtfs, read_utils, Result, Severity};

#[derive(Debug, Parser)]
#[command(
    name = "gtfs2graph",
    about = "Validate a GTFS and build its transit graph.",
    version
)]
struct Opt {
    /// Input directory or ZIP archive.
    #[arg(short = 'i', long = "input", default_value = ".")]
    input: PathBuf,

    /// JSON file containing additional configuration.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Do not check the references between files.
    #[arg(long)]
    skip_validation: bool,

    /// Write the validation report as JSON in this file.
    #[arg(short = 'r', long = "report")]
    report: Option<PathBuf>,

    /// Only validate the feed; fails if any violation is found.
    #[arg(long)]
    dry_run: bool,
}

fn init_logger() {
    let default_level = LevelFilter::INFO;
    let rust_log =
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter_subscriber = EnvFilter::try_new(rust_log).unwrap_or_else(|e| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            e,
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter_subscriber)
        .init();
}

fn run(opt: Opt) -> Result<()> {
    info!("Launching gtfs2graph...");

    let mut configuration = read_utils::read_config(opt.config)?;
    configuration.skip_validation |= opt.skip_validation;

    let (graph, report) = gtfs::Reader::new(configuration).parse(opt.input)?;
    for notice in report.notices() {
        match notice.severity {
            Severity::Violation => warn!("{}", notice),
            Severity::Recommendation => info!("{}", notice),
        }
    }

    if let Some(report_path) = opt.report {
        let file = File::create(&report_path)
            .with_context(|| format!("Error creating {:?}", report_path))?;
        serde_json::to_writer_pretty(file, &report)
            .with_context(|| format!("Error writing {:?}", report_path))?;
        info!("Report written in {:?}", report_path);
    }

    let violations = report.violations().count();
    println!(
        "{} violation(s), {} recommendation(s), {} skipped row(s)",
        violations,
        report.recommendations().count(),
        report.skipped_rows()
    );
    println!(
        "{} stop points, {} lines, {} routes, {} journey patterns, {} journeys",
        graph.stop_points.len(),
        graph.lines.len(),
        graph.routes.len(),
        graph.journey_patterns.len(),
        graph.journeys.len()
    );

    if opt.dry_run && violations > 0 {
        bail!("the feed has {} violation(s)", violations);
    }
    Ok(())
}

fn main() {
    init_logger();
    if let Err(err) = run(Opt::parse()) {
        for cause in err.chain() {
            eprintln!("{cause}");
        }
        std::process::exit(1);
    }
}
