//! Status command for showing the open log day.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use hos_core::{
    ComplianceReport, ComplianceStatus, DailySummary, DaySession, DutyCategory, Segment,
    SessionState, StatusEvent,
};
use serde::Serialize;

use crate::Config;
use crate::commands::util::{format_hour, load_or_start_session, open_database, resolve_at};

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    /// Time used to seed a new log day if none is open (RFC 3339 or "N hours ago").
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport<'a> {
    date: chrono::NaiveDate,
    state: SessionState,
    current_status: DutyCategory,
    events: &'a [StatusEvent],
    segments: &'a [Segment],
    summary: &'a DailySummary,
    compliance: ComplianceReport,
}

pub fn run<W: Write>(writer: &mut W, args: &StatusArgs, config: &Config) -> Result<()> {
    let at = resolve_at(args.at.as_deref())?;
    let mut db = open_database(config)?;
    let session = load_or_start_session(&mut db, config, at)?;
    let compliance = session.compliance(&config.compliance());

    if args.json {
        let report = StatusReport {
            date: session.date(),
            state: session.state(),
            current_status: session.current_category(),
            events: session.events(),
            segments: session.segments(),
            summary: session.summary(),
            compliance,
        };
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)?;
        return Ok(());
    }

    write_session(writer, &session)?;
    writeln!(writer)?;
    write_summary(writer, session.summary())?;
    write_compliance(writer, &compliance)?;
    Ok(())
}

fn write_session<W: Write>(writer: &mut W, session: &DaySession) -> Result<()> {
    writeln!(
        writer,
        "Log day {} ({})",
        session.date(),
        session.state().as_str()
    )?;
    if let Some(last) = session.segments().last() {
        writeln!(
            writer,
            "Current status: {} since {}",
            last.category,
            format_hour(last.start)
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "Events:")?;
    for event in session.events() {
        let hour = session.day().hour_of_day(event.timestamp);
        let line = format!(
            "  {}  {:<13}  {}",
            format_hour(hour),
            event.category.label(),
            event.change_kind.as_str()
        );
        if event.has_location() {
            writeln!(writer, "{line}  {}", event.location.trim())?;
        } else {
            writeln!(writer, "{line}")?;
        }
    }

    writeln!(writer)?;
    write_segments(writer, session.segments())
}

/// Writes one line per segment; open segments are marked `open`.
pub(crate) fn write_segments<W: Write>(writer: &mut W, segments: &[Segment]) -> Result<()> {
    writeln!(writer, "Segments:")?;
    for segment in segments {
        let (end, tail) = match segment.end_hour() {
            Some(end) => (
                format_hour(end),
                format!("{:.2}h", end - segment.start),
            ),
            None => (String::new(), "open".to_string()),
        };
        writeln!(
            writer,
            "  {}-{:<5}  {:<13}  {}",
            format_hour(segment.start),
            end,
            segment.category.label(),
            tail
        )?;
    }
    Ok(())
}

pub(crate) fn write_summary<W: Write>(writer: &mut W, summary: &DailySummary) -> Result<()> {
    writeln!(
        writer,
        "Summary: off {:.2} | sleeper {:.2} | driving {:.2} | on {:.2} | total {:.2}",
        summary.off_duty,
        summary.sleeper,
        summary.driving,
        summary.on_duty,
        summary.total()
    )?;
    Ok(())
}

pub(crate) fn write_compliance<W: Write>(writer: &mut W, report: &ComplianceReport) -> Result<()> {
    let status = match report.status {
        ComplianceStatus::Compliant => "compliant",
        ComplianceStatus::Violation => "VIOLATION",
    };
    writeln!(
        writer,
        "Compliance: {status} ({:.2} of {:.2} driving hours)",
        report.driving_hours, report.max_driving_hours
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};
    use hos_core::StatusChange;
    use hos_db::Database;
    use insta::assert_snapshot;

    use crate::config::LogTimezone;

    fn test_config(temp: &tempfile::TempDir) -> Config {
        Config {
            database_path: temp.path().join("hos.db"),
            timezone: LogTimezone::Utc,
            ..Config::default()
        }
    }

    fn status(config: &Config, json: bool) -> String {
        let args = StatusArgs {
            json,
            at: Some("2025-01-15T08:00:00Z".to_string()),
        };
        let mut output = Vec::new();
        run(&mut output, &args, config).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn status_starts_a_new_day() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(&temp);

        assert_snapshot!(status(&config, false), @r"
        Log day 2025-01-15 (open)
        Current status: Off Duty since 00:00

        Events:
          08:00  Off Duty       automatic

        Segments:
          00:00-       Off Duty       open

        Summary: off 0.00 | sleeper 0.00 | driving 0.00 | on 0.00 | total 0.00
        Compliance: compliant (0.00 of 11.00 driving hours)
        ");

        let db = Database::open(&config.database_path).unwrap();
        assert!(db.load_session().unwrap().is_some());
    }

    #[test]
    fn status_shows_recorded_changes() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(&temp);
        let at = |h: u32, m: u32| Utc.with_ymd_and_hms(2025, 1, 15, h, m, 0).unwrap();

        let mut db = Database::open(&config.database_path).unwrap();
        let session = load_or_start_session(&mut db, &config, at(0, 0))
            .unwrap()
            .record_change(StatusChange::manual(DutyCategory::OnDuty, "Dallas, TX", at(6, 0)))
            .unwrap()
            .record_change(StatusChange::manual(DutyCategory::Driving, "", at(6, 30)))
            .unwrap();
        db.save_session(&session).unwrap();

        assert_snapshot!(status(&config, false), @r"
        Log day 2025-01-15 (open)
        Current status: Driving since 06:30

        Events:
          00:00  Off Duty       automatic
          06:00  On Duty        manual  Dallas, TX
          06:30  Driving        manual

        Segments:
          00:00-06:00  Off Duty       6.00h
          06:00-06:30  On Duty        0.50h
          06:30-       Driving        open

        Summary: off 6.00 | sleeper 0.00 | driving 0.00 | on 0.50 | total 6.50
        Compliance: compliant (0.00 of 11.00 driving hours)
        ");
    }

    #[test]
    fn status_json_uses_status_indexes() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(&temp);
        let output = status(&config, true);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["date"], "2025-01-15");
        assert_eq!(json["state"], "open");
        assert_eq!(json["currentStatus"], 0);
        assert_eq!(json["segments"][0]["end"]["state"], "open");
        assert_eq!(json["compliance"]["status"], "compliant");
    }
}
