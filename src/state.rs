//! Durable mirror state: remote path to last-downloaded date

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Mapping from fully-qualified remote path to the modification date
/// recorded after the last successful download.
///
/// A path is present only once its file has fully downloaded - never
/// for a partial transfer - and consulting it on later runs is what
/// makes repeated spidering idempotent. Serialized as a plain JSON
/// object of path/date pairs.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MirrorState {
    records: BTreeMap<String, NaiveDate>,
}

impl MirrorState {
    /// Load from `path`. A missing file is an empty state, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// True iff `path` was already downloaded at `modified` or newer.
    pub fn has_current_version(&self, path: &str, modified: NaiveDate) -> bool {
        self.records.get(path).is_some_and(|seen| *seen >= modified)
    }

    /// Note a completed download of `path` at `modified`.
    pub fn record(&mut self, path: impl Into<String>, modified: NaiveDate) {
        self.records.insert(path.into(), modified);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Persist to `path`. Called exactly once at the end of a run,
    /// aborted runs included, so progress already made is never lost.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = MirrorState::load(&dir.path().join("nope.json")).unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn round_trips_records() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("state.json");

        let mut state = MirrorState::default();
        state.record("/pub/author.msg", date(2002, 4, 3));
        state.record("/pub/sub/data.bin", date(2010, 6, 9));
        state.save(&file).unwrap();

        let loaded = MirrorState::load(&file).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.has_current_version("/pub/author.msg", date(2002, 4, 3)));
        assert!(loaded.has_current_version("/pub/sub/data.bin", date(2010, 6, 9)));
    }

    #[test]
    fn newer_remote_date_is_not_current() {
        let mut state = MirrorState::default();
        state.record("/a.txt", date(2020, 1, 1));
        assert!(state.has_current_version("/a.txt", date(2020, 1, 1)));
        assert!(state.has_current_version("/a.txt", date(2019, 12, 31)));
        assert!(!state.has_current_version("/a.txt", date(2020, 1, 2)));
        assert!(!state.has_current_version("/other.txt", date(2020, 1, 1)));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested/deeper/state.json");
        MirrorState::default().save(&file).unwrap();
        assert!(file.exists());
    }
}
