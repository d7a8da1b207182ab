//! Route command for planning the current trip with the log service.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use hos_remote::RoutePlan;

use crate::Config;
use crate::adapters::Remote;
use crate::commands::util::open_database;

#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &RouteArgs, config: &Config) -> Result<()> {
    let trip = open_database(config)?
        .load_trip()
        .context("failed to load trip details")?;
    trip.validate().context("invalid trip details")?;
    if trip.pickup().is_none() || trip.dropoff_location.trim().is_empty() {
        anyhow::bail!("set pickup and dropoff with `hos trip` before planning a route");
    }

    let remote = Remote::required(config)?;
    let plan = remote
        .block_on(remote.client().calculate_route(&trip))
        .context("route planning failed")?;

    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &plan)?;
        writeln!(writer)?;
        return Ok(());
    }
    write_plan(writer, &plan)
}

fn write_plan<W: Write>(writer: &mut W, plan: &RoutePlan) -> Result<()> {
    writeln!(writer, "Distance: {:.1} mi", plan.total_distance)?;
    writeln!(writer, "Duration: {}", plan.total_duration)?;
    writeln!(writer, "Driving:  {}", plan.driving_time)?;
    writeln!(writer, "Rest:     {}", plan.rest_time)?;
    if !plan.stops.is_empty() {
        writeln!(writer, "Stops:")?;
        for stop in &plan.stops {
            writeln!(
                writer,
                "  {:<10} {:>5.2}h  {}",
                stop.kind, stop.duration_hours, stop.location
            )?;
        }
    }
    Ok(())
}
