use std::fs::{self, File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::entry::AppEntry;

#[derive(Debug, Error)]
pub enum PinError {
    #[error("failed to append to pin file {}: {source}", path.display())]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to rewrite pin file {}: {source}", path.display())]
    Rewrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One persisted pin: `name:exec:icon:desktop_file`, one record per line.
/// The descriptor path is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinnedRecord {
    pub name: String,
    pub exec: String,
    pub icon_path: String,
    pub desktop_file: String,
}

impl PinnedRecord {
    fn parse(line: &str) -> Option<PinnedRecord> {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 4 {
            return None;
        }
        Some(PinnedRecord {
            name: fields[0].to_string(),
            exec: fields[1].to_string(),
            icon_path: fields[2].to_string(),
            desktop_file: fields[3].to_string(),
        })
    }

    fn to_line(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.name, self.exec, self.icon_path, self.desktop_file
        )
    }

    fn into_entry(self) -> AppEntry {
        AppEntry {
            instance_count: 0,
            pinned: true,
            name: self.name,
            exec: self.exec,
            icon_path: self.icon_path,
            desktop_file: self.desktop_file,
            instances: Vec::new(),
        }
    }
}

/// Persistence for user-pinned entries. Pinning appends; unpinning rewrites
/// the store through a sibling temp file that is flushed and closed before
/// it atomically replaces the original, so a crash mid-write can never lose
/// the previously pinned records.
pub struct PinStore {
    path: PathBuf,
}

impl PinStore {
    pub fn new(path: PathBuf) -> PinStore { PinStore { path } }

    pub fn path(&self) -> &Path { &self.path }

    /// Reads all pinned records. A missing or unreadable file degrades to an
    /// empty list; malformed lines are skipped.
    pub fn load(&self) -> Vec<PinnedRecord> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("could not read pin file {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        text.lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match PinnedRecord::parse(line) {
                Some(record) => Some(record),
                None => {
                    warn!("skipping malformed pin record: {line:?}");
                    None
                }
            })
            .collect()
    }

    /// Appends one record for `entry`.
    pub fn add(&self, entry: &AppEntry) -> Result<(), PinError> {
        let record = PinnedRecord {
            name: entry.name.clone(),
            exec: entry.exec.clone(),
            icon_path: entry.icon_path.clone(),
            desktop_file: entry.desktop_file.clone(),
        };

        let append = |path: &Path| -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{}", record.to_line())?;
            Ok(())
        };

        append(&self.path).map_err(|source| PinError::Append {
            path: self.path.clone(),
            source,
        })?;
        debug!("pinned {:?}", entry.name);
        Ok(())
    }

    /// Removes the record whose descriptor path equals `desktop_file` by
    /// copying every other line to a temp file and renaming it into place.
    pub fn remove(&self, desktop_file: &str) -> Result<(), PinError> {
        let rewrite = |path: &Path| -> std::io::Result<()> {
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(e) => return Err(e),
            };

            let temp_path = path.with_extension("tmp");
            let mut temp = File::create(&temp_path)?;
            for line in text.lines().filter(|line| !line.trim().is_empty()) {
                let matches = PinnedRecord::parse(line)
                    .is_some_and(|record| record.desktop_file == desktop_file);
                if !matches {
                    writeln!(temp, "{line}")?;
                }
            }
            // The rename must only happen once the temp file is fully on disk.
            temp.sync_all()?;
            drop(temp);
            fs::rename(&temp_path, path)?;
            Ok(())
        };

        rewrite(&self.path).map_err(|source| PinError::Rewrite {
            path: self.path.clone(),
            source,
        })?;
        debug!("unpinned {desktop_file:?}");
        Ok(())
    }
}

/// Merges pinned records into the resolved live entries. Pinned entries lead
/// (absorbing the instances of a matching live entry), one separator follows
/// iff both blocks are non-empty, then the remaining live entries, then the
/// launcher entry last when one is configured.
pub fn merge(
    mut live: Vec<AppEntry>,
    pinned: Vec<PinnedRecord>,
    launcher: Option<AppEntry>,
) -> Vec<AppEntry> {
    let mut merged: Vec<AppEntry> = Vec::with_capacity(live.len() + pinned.len() + 2);

    for record in pinned {
        match live.iter().position(|entry| entry.name == record.name) {
            Some(idx) => {
                let mut entry = live.remove(idx);
                entry.pinned = true;
                merged.push(entry);
            }
            None => merged.push(record.into_entry()),
        }
    }

    if !merged.is_empty() && !live.is_empty() {
        merged.push(AppEntry::separator());
    }
    merged.append(&mut live);

    if let Some(launcher) = launcher {
        merged.push(launcher);
    }

    merged
}
