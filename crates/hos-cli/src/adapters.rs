//! Bindings from the remote services and local database to the core's
//! collaborator traits.
//!
//! The core traits are synchronous; remote calls run on a tokio runtime owned
//! by [`Remote`].

use anyhow::{Context, Result};
use chrono::Utc;
use hos_core::{
    DailyLogRecord, DaySession, LogStore, MileageSource, MileageUnavailable, PersistenceFailure,
};
use hos_db::{Database, DbError};
use hos_remote::Client;
use tokio::runtime::Runtime;

use crate::Config;

/// The log service client with a runtime to drive it.
pub struct Remote {
    runtime: Runtime,
    client: Client,
}

impl Remote {
    /// Builds a client when a log service is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(base_url) = config.api_base_url() else {
            return Ok(None);
        };
        let mut client = Client::new(base_url).context("failed to create log service client")?;
        if let Some(token) = &config.api_token {
            client = client.with_api_token(token.clone());
        }
        let runtime = Runtime::new().context("failed to initialize tokio runtime")?;
        Ok(Some(Self { runtime, client }))
    }

    /// Like [`Remote::from_config`], but a log service is required.
    pub fn required(config: &Config) -> Result<Self> {
        Self::from_config(config)?
            .context("no log service configured: set api_base_url or HOS_API_BASE_URL")
    }

    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub const fn client(&self) -> &Client {
        &self.client
    }
}

/// Mileage from the log service, when one is configured.
pub struct RemoteMileage<'a> {
    remote: Option<&'a Remote>,
}

impl<'a> RemoteMileage<'a> {
    pub const fn new(remote: Option<&'a Remote>) -> Self {
        Self { remote }
    }
}

impl MileageSource for RemoteMileage<'_> {
    fn today_mileage(&self) -> Result<f64, MileageUnavailable> {
        let Some(remote) = self.remote else {
            return Err(MileageUnavailable {
                reason: "no log service configured".to_string(),
            });
        };
        remote
            .block_on(remote.client().today_mileage())
            .map_err(|e| MileageUnavailable {
                reason: e.to_string(),
            })
    }
}

/// Collects the records of closed days for [`commit_closed_days`].
///
/// A date that already has a stored log is refused here, so a doomed close
/// fails before anything is written.
pub struct StagedStore<'a> {
    db: &'a Database,
    staged: Vec<DailyLogRecord>,
}

impl<'a> StagedStore<'a> {
    pub const fn new(db: &'a Database) -> Self {
        Self {
            db,
            staged: Vec::new(),
        }
    }

    pub fn into_staged(self) -> Vec<DailyLogRecord> {
        self.staged
    }
}

impl LogStore for StagedStore<'_> {
    fn save_log(&mut self, record: &DailyLogRecord) -> Result<DailyLogRecord, PersistenceFailure> {
        let stored = self
            .db
            .get_log(record.date())
            .map_err(|e| PersistenceFailure::new(e.to_string()))?;
        if stored.is_some() || self.staged.iter().any(|r| r.date() == record.date()) {
            return Err(PersistenceFailure::new(
                DbError::DuplicateLog(record.date()).to_string(),
            ));
        }
        self.staged.push(record.clone());
        Ok(record.clone())
    }

    fn list_logs(&self) -> Result<Vec<DailyLogRecord>, PersistenceFailure> {
        let mut logs = LogStore::list_logs(self.db)?;
        logs.extend(self.staged.iter().cloned());
        Ok(logs)
    }
}

/// Writes closed-day records and the next session in one transaction, then
/// pushes the records to the log service.
///
/// A failed write leaves the stored session untouched. A failed push leaves
/// the record unsynced for `hos sync` to retry. Returns how many records were
/// not pushed.
pub fn commit_closed_days(
    db: &mut Database,
    remote: Option<&Remote>,
    records: &[DailyLogRecord],
    next: &DaySession,
) -> Result<usize> {
    db.commit_closed_days(records, next)
        .context("daily log was not saved; the log day stays open")?;
    let Some(remote) = remote else {
        return Ok(0);
    };
    Ok(records
        .iter()
        .filter(|record| !push(db, remote, record))
        .count())
}

/// Pushes one record and marks it synced. Returns whether the push succeeded.
pub fn push(db: &mut Database, remote: &Remote, record: &DailyLogRecord) -> bool {
    match remote.block_on(remote.client().save_log(record)) {
        Ok(_) => {
            if let Err(e) = db.mark_synced(record.date(), Utc::now()) {
                tracing::warn!(date = %record.date(), error = %e, "failed to mark log synced");
            }
            true
        }
        Err(e) => {
            tracing::warn!(date = %record.date(), error = %e, "log service rejected daily log");
            false
        }
    }
}
