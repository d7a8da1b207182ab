//! Finalize command for closing the log day.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use hos_core::{ComplianceConfig, DailyLogRecord, FinalizeOutcome, Finalizer, compliance};

use crate::Config;
use crate::adapters::{Remote, RemoteMileage, StagedStore, commit_closed_days};
use crate::commands::status::{write_compliance, write_segments, write_summary};
use crate::commands::util::{load_or_start_session, open_database, resolve_at};

#[derive(Debug, Args)]
pub struct FinalizeArgs {
    /// Closing time (RFC 3339 or "N minutes ago"). Defaults to now.
    #[arg(long)]
    pub at: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &FinalizeArgs, config: &Config) -> Result<()> {
    let at = resolve_at(args.at.as_deref())?;
    let mut db = open_database(config)?;
    let session = load_or_start_session(&mut db, config, at)?;
    let trip = db.load_trip().context("failed to load trip details")?;
    let remote = Remote::from_config(config)?;

    let (outcome, staged) = {
        let mut finalizer =
            Finalizer::new(RemoteMileage::new(remote.as_ref()), StagedStore::new(&db))
                .with_average_speed(config.average_speed_mph);
        let outcome = finalizer
            .finalize(&session, at, &trip)
            .context("cannot finalize log day")?;
        (outcome, finalizer.into_store().into_staged())
    };
    if let Some(e) = outcome.persistence_failure() {
        anyhow::bail!("cannot finalize log day: {e}");
    }
    let unpushed = commit_closed_days(&mut db, remote.as_ref(), &staged, &outcome.next)?;

    write_rolled_over(writer, &outcome.rolled_over)?;
    write_record(writer, &outcome.record, &config.compliance())?;
    if unpushed > 0 {
        writeln!(
            writer,
            "Warning: {unpushed} daily log(s) saved locally but not pushed; run `hos sync` to retry"
        )?;
    }
    writeln!(writer, "Started log day {}", outcome.next.date())?;
    Ok(())
}

/// Reports the days closed at midnight on the way to the current one.
pub(crate) fn write_rolled_over<W: Write>(
    writer: &mut W,
    rolled_over: &[FinalizeOutcome],
) -> Result<()> {
    for closed in rolled_over {
        writeln!(
            writer,
            "Closed log for {} at midnight ({:.2} driving hours, {:.1} miles)",
            closed.record.date(),
            closed.record.summary().driving,
            closed.record.total_miles()
        )?;
    }
    Ok(())
}

/// Writes a finalized record in log-sheet order.
pub(crate) fn write_record<W: Write>(
    writer: &mut W,
    record: &DailyLogRecord,
    thresholds: &ComplianceConfig,
) -> Result<()> {
    writeln!(writer, "Daily log {}", record.date())?;
    write_segments(writer, &record.timeline())?;
    writeln!(writer)?;
    write_summary(writer, record.summary())?;
    write_compliance(writer, &compliance::evaluate(record.summary(), thresholds))?;
    writeln!(writer, "Total miles: {:.1}", record.total_miles())?;
    writeln!(writer, "Remarks: {}", record.remarks())?;
    Ok(())
}
