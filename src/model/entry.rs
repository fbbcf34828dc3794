use serde::Serialize;

/// One live top-level window as reported by the window-list query. Captured
/// fresh on every poll; there is no stable window id, so change detection
/// compares title and fullscreen state positionally within a class group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowInstance {
    pub monitor: i32,
    pub title: String,
    pub class: String,
    pub fullscreen: bool,
    pub pid: i32,
}

/// Name of the synthetic entry drawn as the separator between the pinned
/// and unpinned blocks.
pub const SEPARATOR_NAME: &str = "line";

/// Display name of the synthetic launcher entry appended last.
pub const LAUNCHER_NAME: &str = "Launcher";

/// The dock's unit of display: one application aggregating zero or more
/// running windows of the same class. Rebuilt wholesale every poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppEntry {
    pub instance_count: usize,
    pub pinned: bool,
    pub name: String,
    pub exec: String,
    pub icon_path: String,
    pub desktop_file: String,
    pub instances: Vec<WindowInstance>,
}

impl AppEntry {
    pub fn separator() -> AppEntry {
        AppEntry {
            name: SEPARATOR_NAME.to_string(),
            ..AppEntry::default()
        }
    }

    pub fn launcher(cmd: &str, icon: &str) -> AppEntry {
        AppEntry {
            pinned: true,
            name: LAUNCHER_NAME.to_string(),
            exec: cmd.to_string(),
            icon_path: icon.to_string(),
            ..AppEntry::default()
        }
    }

    /// Separator entries take part in layout sizing but never in
    /// window-control actions.
    pub fn is_separator(&self) -> bool { self.name == SEPARATOR_NAME }

    pub fn is_running(&self) -> bool { self.instance_count > 0 }
}
