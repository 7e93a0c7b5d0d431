//! JSON report directory.
//!
//! One pretty-printed JSON document per reconciliation run, named
//! `<ASSET>_<YYYYmmdd_HHMMSS_mmm>.json`. Reports are write-once: saving never
//! replaces an existing file. Runs for one asset stamped in the same
//! millisecond get `_1`, `_2`, ... appended to the stamp.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use polepad_core::{AssetId, Report};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{ReportSink, StoreError};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";
/// Length of a formatted [`TIMESTAMP_FORMAT`] stamp.
const STAMP_LEN: usize = 19;
/// Highest tie-break suffix tried before giving up with `ReportExists`.
const MAX_SUFFIX: u32 = 9_999;

#[derive(Debug, Clone)]
pub struct ReportDir {
    dir: PathBuf,
}

impl ReportDir {
    /// Open (creating if needed) a report directory.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(report: &Report) -> String {
        Self::numbered_file_name(report, 0)
    }

    fn numbered_file_name(report: &Report, suffix: u32) -> String {
        let stem = report.asset_id.file_stem();
        let stamp = report.timestamp.format(TIMESTAMP_FORMAT);
        match suffix {
            0 => format!("{stem}_{stamp}.json"),
            n => format!("{stem}_{stamp}_{n}.json"),
        }
    }

    /// Report files for `asset`, oldest first.
    pub fn history(&self, asset: &AssetId) -> Result<Vec<PathBuf>, StoreError> {
        let prefix = format!("{}_", asset.file_stem());
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(stamp) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".json"))
            else {
                continue;
            };
            if let Some((stamp, suffix)) = parse_stamp(stamp) {
                found.push((stamp.to_string(), suffix, entry.path()));
            }
        }
        found.sort();
        Ok(found.into_iter().map(|(_, _, path)| path).collect())
    }

    pub fn load(path: &Path) -> Result<Report, StoreError> {
        if !path.exists() {
            return Err(StoreError::FileNotFound(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl ReportSink for ReportDir {
    fn save(&self, report: &Report) -> Result<PathBuf, StoreError> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(&mut tmp);
            serde_json::to_writer_pretty(&mut writer, report)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;

        let mut suffix = 0;
        loop {
            let path = self.dir.join(Self::numbered_file_name(report, suffix));
            match tmp.persist_noclobber(&path) {
                Ok(_) => {
                    info!(asset = %report.asset_id, path = %path.display(), "report saved");
                    return Ok(path);
                }
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    if suffix == MAX_SUFFIX {
                        return Err(StoreError::ReportExists(path));
                    }
                    debug!(path = %path.display(), "report name taken");
                    tmp = e.file;
                    suffix += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Split `YYYYmmdd_HHMMSS_mmm[_N]` into the stamp and its tie-break suffix
/// (0 when absent).
fn parse_stamp(s: &str) -> Option<(&str, u32)> {
    let (stamp, rest) = s.split_at_checked(STAMP_LEN)?;
    if !is_stamp(stamp) {
        return None;
    }
    if rest.is_empty() {
        return Some((stamp, 0));
    }
    let n = rest.strip_prefix('_')?;
    if n.is_empty() || n.starts_with('0') || !n.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((stamp, n.parse().ok()?))
}

/// `YYYYmmdd_HHMMSS_mmm`: digits with underscores at fixed positions.
fn is_stamp(s: &str) -> bool {
    s.len() == STAMP_LEN
        && s.bytes().enumerate().all(|(i, b)| match i {
            8 | 15 => b == b'_',
            _ => b.is_ascii_digit(),
        })
}
