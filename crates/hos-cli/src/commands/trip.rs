//! Trip command for showing and editing the log-sheet header details.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use hos_core::TripMetadata;

use crate::Config;
use crate::commands::util::open_database;

#[derive(Debug, Default, Args)]
pub struct TripArgs {
    #[arg(long)]
    pub driver: Option<String>,

    #[arg(long)]
    pub carrier: Option<String>,

    #[arg(long)]
    pub carrier_address: Option<String>,

    #[arg(long)]
    pub home_terminal: Option<String>,

    #[arg(long)]
    pub vehicle: Option<String>,

    #[arg(long)]
    pub trailer: Option<String>,

    #[arg(long)]
    pub current_location: Option<String>,

    #[arg(long)]
    pub pickup: Option<String>,

    #[arg(long)]
    pub dropoff: Option<String>,

    /// Hours already used in the 70-hour/8-day cycle (0-70).
    #[arg(long)]
    pub cycle_hours: Option<f64>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl TripArgs {
    /// Applies the given fields. Returns whether anything was set.
    fn apply(&self, trip: &mut TripMetadata) -> bool {
        let fields = [
            (&self.driver, &mut trip.driver_name),
            (&self.carrier, &mut trip.carrier_name),
            (&self.carrier_address, &mut trip.carrier_address),
            (&self.home_terminal, &mut trip.home_terminal),
            (&self.vehicle, &mut trip.vehicle_number),
            (&self.trailer, &mut trip.trailer_number),
            (&self.current_location, &mut trip.current_location),
            (&self.pickup, &mut trip.pickup_location),
            (&self.dropoff, &mut trip.dropoff_location),
        ];
        let mut changed = false;
        for (value, field) in fields {
            if let Some(value) = value {
                value.trim().clone_into(field);
                changed = true;
            }
        }
        if let Some(hours) = self.cycle_hours {
            trip.current_cycle_hours = hours;
            changed = true;
        }
        changed
    }
}

pub fn run<W: Write>(writer: &mut W, args: &TripArgs, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let mut trip = db.load_trip().context("failed to load trip details")?;

    if args.apply(&mut trip) {
        trip.validate().context("invalid trip details")?;
        db.save_trip(&trip, Utc::now())
            .context("failed to save trip details")?;
        tracing::debug!("updated trip details");
    }

    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &trip)?;
        writeln!(writer)?;
        return Ok(());
    }

    let rows = [
        ("Driver", trip.driver_name.as_str()),
        ("Carrier", trip.carrier_name.as_str()),
        ("Carrier address", trip.carrier_address.as_str()),
        ("Home terminal", trip.home_terminal.as_str()),
        ("Vehicle", trip.vehicle_number.as_str()),
        ("Trailer", trip.trailer_number.as_str()),
        ("Current location", trip.current_location.as_str()),
        ("Pickup", trip.pickup_location.as_str()),
        ("Dropoff", trip.dropoff_location.as_str()),
    ];
    for (label, value) in rows {
        let value = if value.is_empty() { "-" } else { value };
        writeln!(writer, "{:<17} {value}", format!("{label}:"))?;
    }
    writeln!(
        writer,
        "{:<17} {:.2} of {:.0}",
        "Cycle hours:",
        trip.current_cycle_hours,
        config.cycle_limit_hours
    )?;
    Ok(())
}
