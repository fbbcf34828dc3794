use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, thread};

use notify::RecursiveMode;
use notify_debouncer_mini::{
    DebounceEventResult, DebouncedEvent, DebouncedEventKind, new_debouncer,
};
use tracing::{debug, info, trace, warn};

use crate::actor::dock::{self, Event as DockEvent};
use crate::common::collections::HashSet;
use crate::common::config::Settings;

const DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches the settings file and pushes a revalidated [`Settings`] to the
/// dock actor whenever it changes on disk. Symlinked config files are
/// followed through their canonical path and inode.
pub struct SettingsWatcher {
    file: PathBuf,
    real_file: Option<PathBuf>,
    real_file_id: Option<(u64, u64)>,
    dock_tx: dock::Sender,
}

impl SettingsWatcher {
    pub fn spawn(dock_tx: dock::Sender, settings_path: PathBuf) {
        thread::Builder::new()
            .name("settings-watcher".to_string())
            .spawn(move || {
                let file = settings_path;
                let real_file = fs::canonicalize(&file).ok();
                let real_file_id = real_file
                    .as_ref()
                    .and_then(|p| fs::metadata(p).ok())
                    .map(|m| (m.dev(), m.ino()));

                let watcher = SettingsWatcher {
                    file,
                    real_file,
                    real_file_id,
                    dock_tx,
                };
                if let Err(e) = watcher.run() {
                    warn!("settings-watcher: error: {e:?}");
                }
            })
            .expect("failed to spawn settings-watcher thread");
    }

    fn run(self) -> notify::Result<()> {
        let (tx, rx) = std::sync::mpsc::channel::<DebouncedEvent>();

        let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| {
            if let Ok(events) = res {
                for e in events {
                    if e.kind == DebouncedEventKind::Any {
                        _ = tx.send(e);
                    }
                }
            }
        })?;

        let watcher = debouncer.watcher();

        let mut parents: HashSet<PathBuf> = HashSet::default();
        if let Some(p) = self.file.parent() {
            parents.insert(p.to_path_buf());
        }
        if let Some(real) = &self.real_file
            && let Some(p) = real.parent()
        {
            parents.insert(p.to_path_buf());
        }

        for dir in parents.iter() {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
            info!("watching {:?}", dir);
        }

        while let Ok(event) = rx.recv() {
            if !self.is_relevant(&event.path) {
                continue;
            }

            trace!("change detected (debounced): {:?}", event.path);

            if let Some(settings) = read_valid(&self.file) {
                debug!("settings reloaded from disk");
                self.dock_tx.send(DockEvent::SettingsUpdated(settings));
            }
        }

        Ok(())
    }

    fn is_relevant(&self, changed: &Path) -> bool {
        if changed == self.file {
            return true;
        }

        if let Some(real) = &self.real_file {
            if changed == *real {
                return true;
            }

            if let Ok(ev_real) = fs::canonicalize(changed)
                && ev_real == *real
            {
                return true;
            }

            if let Ok(meta) = fs::metadata(changed)
                && let Some((dev, ino)) = self.real_file_id
                && meta.dev() == dev
                && meta.ino() == ino
            {
                return true;
            }
        }

        changed.file_name().is_some_and(|n| Some(n) == self.file.file_name())
    }
}

/// Re-reads the settings file; a file that fails to read or validate is not
/// applied and leaves the running configuration untouched.
fn read_valid(path: &Path) -> Option<Settings> {
    let settings = match Settings::read(path) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("failed to re-read settings file: {e:?}");
            return None;
        }
    };

    let issues = settings.validate();
    if !issues.is_empty() {
        warn!("not applying changed settings: {}", issues.join("; "));
        return None;
    }

    Some(settings)
}
