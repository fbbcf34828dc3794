use std::fs;
use std::path::Path;

use tracing::debug;

/// Desktop session family, decided once at startup and carried in the
/// process context instead of a global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    X11,
    Wayland,
    Hyprland,
}

impl SessionKind {
    pub fn detect() -> SessionKind {
        if std::env::var_os("HYPRLAND_INSTANCE_SIGNATURE").is_some() {
            return SessionKind::Hyprland;
        }
        match std::env::var("XDG_SESSION_TYPE").as_deref() {
            Ok("wayland") => SessionKind::Wayland,
            _ => SessionKind::X11,
        }
    }

    pub fn is_wayland(self) -> bool {
        matches!(self, SessionKind::Wayland | SessionKind::Hyprland)
    }
}

/// Counts the running processes whose argv[0] basename equals
/// `process_name`. Exactly one means this dock is the only instance, which
/// disables multi-monitor isolation.
pub fn is_only_instance(process_name: &str) -> bool {
    count_processes_named(Path::new("/proc"), process_name) == 1
}

fn count_processes_named(proc_root: &Path, process_name: &str) -> usize {
    let Ok(entries) = fs::read_dir(proc_root) else {
        debug!("could not read {}", proc_root.display());
        return 0;
    };

    let mut count = 0;
    for entry in entries.filter_map(|e| e.ok()) {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !name.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let Ok(cmdline) = fs::read(entry.path().join("cmdline")) else {
            continue;
        };
        // argv entries are NUL-separated; only argv[0] matters.
        let argv0 = cmdline.split(|b| *b == 0).next().unwrap_or_default();
        let argv0 = String::from_utf8_lossy(argv0);
        if Path::new(argv0.as_ref())
            .file_name()
            .is_some_and(|base| base == process_name)
        {
            count += 1;
        }
    }
    count
}
