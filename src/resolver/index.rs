use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::common::collections::HashSet;

/// Environment inputs the search-path list derives from, separated from the
/// live process environment so the priority order is testable.
#[derive(Debug, Clone, Default)]
pub struct XdgPaths {
    pub home: Option<PathBuf>,
    pub data_home: Option<String>,
    pub data_dirs: Option<String>,
}

impl XdgPaths {
    pub fn from_env() -> XdgPaths {
        XdgPaths {
            home: dirs::home_dir(),
            data_home: std::env::var("XDG_DATA_HOME").ok(),
            data_dirs: std::env::var("XDG_DATA_DIRS").ok(),
        }
    }
}

/// Directories searched for desktop-entry files, highest priority first:
/// user-local paths before system paths, flatpak exports alongside each.
pub fn search_paths(xdg: &XdgPaths) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(home) = &xdg.home {
        paths.push(home.join(".local/share/applications"));
        paths.push(home.join(".local/share/flatpak/exports/share/applications"));
    }
    if let Some(data_home) = xdg.data_home.as_deref().filter(|d| !d.is_empty()) {
        paths.push(Path::new(data_home).join("applications"));
    }
    if let Some(data_dirs) = &xdg.data_dirs {
        for dir in data_dirs.split(':').filter(|d| !d.is_empty()) {
            paths.push(Path::new(dir).join("applications"));
        }
    }
    paths.push(PathBuf::from("/usr/local/share/applications"));
    paths.push(PathBuf::from("/usr/share/applications"));
    paths.push(PathBuf::from("/var/lib/flatpak/exports/share/applications"));

    let mut seen = HashSet::default();
    paths.retain(|path| seen.insert(path.clone()));
    paths
}

/// Discovers and caches the desktop-entry corpus. The scan runs once at
/// startup; resolution only ever reads the cached file list.
pub struct DesktopFileIndex {
    search_paths: Vec<PathBuf>,
    corpus: Vec<PathBuf>,
}

impl DesktopFileIndex {
    pub fn discover(xdg: &XdgPaths) -> DesktopFileIndex {
        Self::with_paths(search_paths(xdg))
    }

    pub fn with_paths(search_paths: Vec<PathBuf>) -> DesktopFileIndex {
        let corpus = scan_corpus(&search_paths);
        debug!(
            dirs = search_paths.len(),
            files = corpus.len(),
            "desktop-entry corpus ready"
        );
        DesktopFileIndex {
            search_paths,
            corpus,
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] { &self.search_paths }

    pub fn corpus(&self) -> &[PathBuf] { &self.corpus }
}

fn scan_corpus(search_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut corpus = Vec::new();
    for dir in search_paths {
        let Ok(entries) = fs::read_dir(dir) else {
            continue;
        };
        // Directory iteration order is filesystem-dependent; sort per
        // directory so the corpus order is stable across runs.
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "desktop"))
            .collect();
        files.sort();
        corpus.extend(files);
    }
    corpus
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn user_paths_take_priority_over_system_paths() {
        let xdg = XdgPaths {
            home: Some(PathBuf::from("/home/u")),
            data_home: Some("/home/u/.data".to_string()),
            data_dirs: Some("/opt/share:/usr/share".to_string()),
        };

        let paths = search_paths(&xdg);
        assert_eq!(
            vec![
                PathBuf::from("/home/u/.local/share/applications"),
                PathBuf::from("/home/u/.local/share/flatpak/exports/share/applications"),
                PathBuf::from("/home/u/.data/applications"),
                PathBuf::from("/opt/share/applications"),
                PathBuf::from("/usr/share/applications"),
                PathBuf::from("/usr/local/share/applications"),
                PathBuf::from("/var/lib/flatpak/exports/share/applications"),
            ],
            paths
        );
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let xdg = XdgPaths {
            home: None,
            data_home: None,
            data_dirs: Some("/usr/share:/usr/local/share:/usr/share".to_string()),
        };

        let paths = search_paths(&xdg);
        let usr_share = PathBuf::from("/usr/share/applications");
        assert_eq!(1, paths.iter().filter(|p| **p == usr_share).count());
        assert_eq!(usr_share, paths[0]);
    }

    #[test]
    fn missing_env_yields_system_defaults_only() {
        let paths = search_paths(&XdgPaths::default());
        assert_eq!(
            vec![
                PathBuf::from("/usr/local/share/applications"),
                PathBuf::from("/usr/share/applications"),
                PathBuf::from("/var/lib/flatpak/exports/share/applications"),
            ],
            paths
        );
    }

    #[test]
    fn corpus_collects_only_desktop_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("zz.desktop"), "").unwrap();
        fs::write(dir.path().join("aa.desktop"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let index = DesktopFileIndex::with_paths(vec![dir.path().to_path_buf()]);
        assert_eq!(
            vec![dir.path().join("aa.desktop"), dir.path().join("zz.desktop")],
            index.corpus().to_vec()
        );
    }

    #[test]
    fn missing_directories_are_skipped() {
        let index = DesktopFileIndex::with_paths(vec![PathBuf::from("/no/such/dir")]);
        assert!(index.corpus().is_empty());
    }
}
