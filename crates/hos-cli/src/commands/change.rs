//! Change command for recording a duty-status change.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use hos_core::{ChangeKind, DutyCategory, Finalizer, StatusChange};

use crate::Config;
use crate::adapters::{Remote, RemoteMileage, StagedStore, commit_closed_days};
use crate::commands::finalize::write_rolled_over;
use crate::commands::util::{format_hour, load_or_start_session, open_database, resolve_at};

#[derive(Debug, Args)]
pub struct ChangeArgs {
    /// New duty status: off, sleeper, driving or on.
    pub status: DutyCategory,

    /// Location for the remarks line.
    #[arg(long, default_value = "")]
    pub location: String,

    /// When the change happened (RFC 3339 or "N minutes ago"). Defaults to now.
    #[arg(long)]
    pub at: Option<String>,

    /// Mark the change as system-generated.
    #[arg(long)]
    pub automatic: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &ChangeArgs, config: &Config) -> Result<()> {
    let at = resolve_at(args.at.as_deref())?;
    let mut db = open_database(config)?;
    let session = load_or_start_session(&mut db, config, at)?;
    let trip = db.load_trip().context("failed to load trip details")?;

    let change = StatusChange {
        category: args.status,
        location: args.location.clone(),
        timestamp: at,
        kind: if args.automatic {
            ChangeKind::Automatic
        } else {
            ChangeKind::Manual
        },
    };

    // A change past midnight closes the days in between, which may push logs
    let remote = if session.day().has_ended_by(at) {
        Remote::from_config(config)?
    } else {
        None
    };
    let (outcome, staged) = {
        let mut finalizer = Finalizer::new(RemoteMileage::new(None), StagedStore::new(&db))
            .with_average_speed(config.average_speed_mph);
        let outcome = finalizer
            .record_change(&session, change, &trip)
            .context("duty change rejected")?;
        (outcome, finalizer.into_store().into_staged())
    };
    if let Some(e) = outcome
        .rolled_over
        .iter()
        .find_map(|closed| closed.persistence.as_ref().err())
    {
        anyhow::bail!("cannot close the previous log day: {e}");
    }
    let unpushed = commit_closed_days(&mut db, remote.as_ref(), &staged, &outcome.session)
        .context("failed to save session")?;

    write_rolled_over(writer, &outcome.rolled_over)?;
    if unpushed > 0 {
        writeln!(
            writer,
            "Warning: {unpushed} daily log(s) saved locally but not pushed; run `hos sync` to retry"
        )?;
    }
    let session = outcome.session;
    writeln!(
        writer,
        "Recorded {} at {} on {}",
        args.status,
        format_hour(session.day().hour_of_day(at)),
        session.date()
    )?;
    Ok(())
}
