use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{error::StoreError, models::DeliveryRecord};

/// The delivery log: a single pretty-printed JSON array, rewritten in full on
/// every append.
///
/// Appends are serialized by an internal lock so concurrent requests cannot
/// lose each other's records. Reads never take the lock: the file is only
/// ever replaced by rename, so a reader sees either the old or the new array.
#[derive(Debug)]
pub struct LogStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

enum Contents {
    Missing,
    Records(Vec<DeliveryRecord>),
    Corrupt(serde_json::Error),
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored delivery in arrival order. A missing, unreadable or
    /// corrupt file reads as an empty log.
    pub fn load(&self) -> Vec<DeliveryRecord> {
        match self.read() {
            Ok(Contents::Records(records)) => records,
            Ok(Contents::Missing) => Vec::new(),
            Ok(Contents::Corrupt(e)) => {
                warn!(error = %e, path = %self.path.display(), "delivery log is malformed, showing it as empty");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "delivery log unreadable, showing it as empty");
                Vec::new()
            }
        }
    }

    /// The last `limit` deliveries, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<DeliveryRecord> {
        let mut records = self.load();
        let start = records.len().saturating_sub(limit);
        records.split_off(start)
    }

    /// Appends one delivery and returns the number of records now stored.
    pub fn append(&self, record: DeliveryRecord) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock();
        let mut records = match self.read()? {
            Contents::Records(records) => records,
            Contents::Missing => Vec::new(),
            Contents::Corrupt(e) => {
                warn!(error = %e, path = %self.path.display(), "delivery log is malformed, starting a new one");
                self.quarantine();
                Vec::new()
            }
        };
        records.push(record);
        self.replace(&records)?;
        debug!(path = %self.path.display(), total = records.len(), "delivery log saved");
        Ok(records.len())
    }

    fn read(&self) -> Result<Contents, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Contents::Missing),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Contents::Missing);
        }
        Ok(match serde_json::from_slice(&data) {
            Ok(records) => Contents::Records(records),
            Err(e) => Contents::Corrupt(e),
        })
    }

    fn replace(&self, records: &[DeliveryRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(records)?;
        let tmp = self.sibling("tmp");
        fs::write(&tmp, &json).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Rename {
            path: self.path.clone(),
            source,
        })
    }

    fn quarantine(&self) {
        let aside = self.free_corrupt_path();
        match fs::rename(&self.path, &aside) {
            Ok(()) => warn!(path = %aside.display(), "moved malformed delivery log aside"),
            Err(e) => warn!(error = %e, "could not move malformed delivery log aside"),
        }
    }

    /// `<log>.corrupt.N` with the lowest N not already taken.
    fn free_corrupt_path(&self) -> PathBuf {
        (1u32..)
            .map(|n| self.sibling(&format!("corrupt.{n}")))
            .find(|candidate| !candidate.exists())
            .unwrap_or_else(|| self.sibling("corrupt"))
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }
}
