//! Logs command for listing finalized daily logs.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use hos_core::DailyLogRecord;
use serde::Serialize;

use crate::Config;
use crate::adapters::Remote;
use crate::commands::util::open_database;

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    /// List the logs held by the log service instead of the local database.
    #[arg(long)]
    pub remote: bool,
}

/// One listed log.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LogEntry {
    #[serde(flatten)]
    record: DailyLogRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    synced: Option<bool>,
}

pub fn run<W: Write>(writer: &mut W, args: &LogsArgs, config: &Config) -> Result<()> {
    let entries = if args.remote {
        let remote = Remote::required(config)?;
        remote
            .block_on(remote.client().list_logs())
            .context("failed to fetch logs from the log service")?
            .into_iter()
            .map(|record| LogEntry {
                record,
                synced: None,
            })
            .collect()
    } else {
        open_database(config)?
            .list_logs()
            .context("failed to list daily logs")?
            .into_iter()
            .map(|stored| LogEntry {
                record: stored.record,
                synced: Some(stored.synced_at.is_some()),
            })
            .collect::<Vec<_>>()
    };

    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &entries)?;
        writeln!(writer)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(writer, "No daily logs.")?;
        return Ok(());
    }
    for entry in &entries {
        write_entry(writer, entry)?;
    }
    Ok(())
}

fn write_entry<W: Write>(writer: &mut W, entry: &LogEntry) -> Result<()> {
    let record = &entry.record;
    let summary = record.summary();
    let sync = match entry.synced {
        Some(true) => "  synced",
        Some(false) => "  pending",
        None => "",
    };
    writeln!(
        writer,
        "{}  driving {:>5.2}  on {:>5.2}  {:>7.1} mi{sync}  {}",
        record.date(),
        summary.driving,
        summary.on_duty,
        record.total_miles(),
        record.remarks()
    )?;
    Ok(())
}
