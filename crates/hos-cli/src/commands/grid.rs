//! Grid command for drawing a log day on the 24-hour sheet.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use hos_core::grid::{self, BUCKETS};
use hos_core::{DailySummary, DutyCategory, Segment};

use crate::Config;
use crate::commands::util::{load_or_start_session, open_database, parse_date, resolve_at};

/// Coverage at or above this counts as a filled bucket.
const FULL: f64 = 1.0 - 1e-9;

#[derive(Debug, Args)]
pub struct GridArgs {
    /// Log date (YYYY-MM-DD). Defaults to the open log day.
    #[arg(long)]
    pub date: Option<String>,

    /// Output the grid rectangles as JSON.
    #[arg(long)]
    pub json: bool,
}

/// The timeline to draw, from either a finalized log or the open session.
struct Sheet {
    date: NaiveDate,
    open: bool,
    segments: Vec<Segment>,
    summary: DailySummary,
}

pub fn run<W: Write>(writer: &mut W, args: &GridArgs, config: &Config) -> Result<()> {
    let sheet = load_sheet(args, config)?;
    let rects = grid::project(&sheet.segments);

    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &rects)?;
        writeln!(writer)?;
        return Ok(());
    }

    let rows = grid::coverage(&rects);
    let state = if sheet.open { " (open)" } else { "" };
    writeln!(writer, "Log grid {}{state}", sheet.date)?;
    let (tens, units): (String, String) = (0..BUCKETS)
        .map(|hour| {
            (
                char::from(b'0' + hour / 10),
                char::from(b'0' + hour % 10),
            )
        })
        .unzip();
    writeln!(writer, "{:15}{tens}", "")?;
    writeln!(writer, "{:15}{units}", "")?;
    for category in DutyCategory::ALL {
        let cells: String = rows[usize::from(category.index())]
            .iter()
            .map(|&filled| cell(filled))
            .collect();
        writeln!(
            writer,
            "{:<13}  {cells}  {:>5.2}",
            category.label(),
            sheet.summary.hours(category)
        )?;
    }
    Ok(())
}

fn cell(filled: f64) -> char {
    if filled >= FULL {
        '#'
    } else if filled > 0.0 {
        '+'
    } else {
        '.'
    }
}

fn load_sheet(args: &GridArgs, config: &Config) -> Result<Sheet> {
    let mut db = open_database(config)?;
    let Some(date) = args.date.as_deref().map(parse_date).transpose()? else {
        let session = load_or_start_session(&mut db, config, resolve_at(None)?)?;
        return Ok(Sheet {
            date: session.date(),
            open: true,
            segments: session.segments().to_vec(),
            summary: *session.summary(),
        });
    };

    if let Some(stored) = db.get_log(date).context("failed to read daily log")? {
        return Ok(Sheet {
            date,
            open: false,
            segments: stored.record.timeline(),
            summary: *stored.record.summary(),
        });
    }
    match db.load_session().context("failed to load session")? {
        Some(session) if session.date() == date => Ok(Sheet {
            date,
            open: !session.is_finalized(),
            segments: session.segments().to_vec(),
            summary: *session.summary(),
        }),
        _ => anyhow::bail!("no log for {date}"),
    }
}
