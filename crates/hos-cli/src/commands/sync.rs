//! Sync command for pushing locally committed logs to the log service.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use crate::Config;
use crate::adapters::{self, Remote};
use crate::commands::util::open_database;

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// List the logs that would be pushed without contacting the service.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed: usize,
    pub failed: usize,
}

pub fn run<W: Write>(writer: &mut W, args: &SyncArgs, config: &Config) -> Result<SyncReport> {
    let mut db = open_database(config)?;
    let pending = db.list_unsynced().context("failed to list unsynced logs")?;
    if pending.is_empty() {
        writeln!(writer, "All daily logs are synced.")?;
        return Ok(SyncReport::default());
    }

    if args.dry_run {
        for stored in &pending {
            writeln!(writer, "Would push {}", stored.record.date())?;
        }
        return Ok(SyncReport::default());
    }

    let remote = Remote::required(config)?;
    let mut report = SyncReport::default();
    for stored in &pending {
        if adapters::push(&mut db, &remote, &stored.record) {
            writeln!(writer, "Pushed {}", stored.record.date())?;
            report.pushed += 1;
        } else {
            writeln!(writer, "Failed {}", stored.record.date())?;
            report.failed += 1;
        }
    }
    writeln!(
        writer,
        "Synced {} of {} daily logs",
        report.pushed,
        pending.len()
    )?;
    tracing::info!(pushed = report.pushed, failed = report.failed, "sync finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, Utc};
    use hos_core::{DaySession, LogDay, Mileage, TripMetadata};
    use hos_db::Database;
    use insta::assert_snapshot;

    use crate::commands::util::parse_date;

    fn test_config(temp: &tempfile::TempDir) -> Config {
        Config {
            database_path: temp.path().join("hos.db"),
            ..Config::default()
        }
    }

    fn insert(db: &mut Database, date: &str) {
        let day = LogDay::in_timezone(parse_date(date).unwrap(), &Utc);
        let record = DaySession::start(day, day.start)
            .finalize(
                day.start + Duration::hours(20),
                &TripMetadata::default(),
                Mileage::Reported(0.0),
            )
            .unwrap()
            .record;
        db.insert_log(&record).unwrap();
    }

    fn sync(config: &Config, dry_run: bool) -> Result<(SyncReport, String)> {
        let mut output = Vec::new();
        let report = run(&mut output, &SyncArgs { dry_run }, config)?;
        Ok((report, String::from_utf8(output).unwrap()))
    }

    #[test]
    fn nothing_to_sync() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(&temp);
        let (report, output) = sync(&config, false).unwrap();
        assert_eq!(report, SyncReport::default());
        assert_snapshot!(output, @"All daily logs are synced.");
    }

    #[test]
    fn dry_run_lists_pending_logs() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(&temp);
        let mut db = Database::open(&config.database_path).unwrap();
        insert(&mut db, "2025-01-15");
        insert(&mut db, "2025-01-16");
        db.mark_synced(parse_date("2025-01-16").unwrap(), Utc::now())
            .unwrap();

        let (_, output) = sync(&config, true).unwrap();
        assert_snapshot!(output, @"Would push 2025-01-15");
    }

    #[test]
    fn pending_logs_need_a_log_service() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(&temp);
        let mut db = Database::open(&config.database_path).unwrap();
        insert(&mut db, "2025-01-15");

        let err = sync(&config, false).unwrap_err();
        assert!(err.to_string().contains("no log service configured"));
    }
}
