//! Export command for downloading finalized logs as JSON.
//!
//! Records are written in the shape the log service stores, one pretty-printed
//! array per invocation.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use hos_core::DailyLogRecord;

use crate::Config;
use crate::commands::util::{open_database, parse_date};

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Only export the log for this date (YYYY-MM-DD).
    #[arg(long)]
    pub date: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &ExportArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let records: Vec<DailyLogRecord> = match args.date.as_deref() {
        Some(date) => {
            let date = parse_date(date)?;
            let stored = db
                .get_log(date)
                .context("failed to read daily log")?
                .with_context(|| format!("no finalized log for {date}"))?;
            vec![stored.record]
        }
        None => db
            .list_logs()
            .context("failed to list daily logs")?
            .into_iter()
            .map(|stored| stored.record)
            .collect(),
    };

    serde_json::to_writer_pretty(&mut *writer, &records).context("failed to serialize logs")?;
    writeln!(writer)?;
    tracing::debug!(count = records.len(), "exported daily logs");
    Ok(())
}
