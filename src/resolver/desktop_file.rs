use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Fields read from one desktop-entry file. A missing or unreadable file
/// parses to all-empty fields so a running window is never dropped from the
/// dock for lack of a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorRecord {
    pub name: String,
    pub exec: String,
    pub icon: String,
}

const MAIN_SECTION: &str = "[Desktop Entry]";

pub fn parse(path: &Path) -> DescriptorRecord {
    match fs::read_to_string(path) {
        Ok(text) => parse_str(&text),
        Err(e) => {
            debug!("could not read descriptor {}: {}", path.display(), e);
            DescriptorRecord::default()
        }
    }
}

/// Reads Name, Exec and Icon from the `[Desktop Entry]` section; all other
/// sections and keys are ignored.
pub fn parse_str(text: &str) -> DescriptorRecord {
    let mut record = DescriptorRecord::default();
    let mut in_main = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == MAIN_SECTION {
            in_main = true;
            continue;
        }
        if line.starts_with('[') {
            in_main = false;
            continue;
        }
        if !in_main {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key {
            "Name" => record.name = value.to_string(),
            "Exec" => record.exec = clean_exec(value),
            "Icon" => record.icon = value.to_string(),
            _ => {}
        }
    }

    record
}

/// Discards the first `%`-prefixed field-code placeholder and everything
/// after it, then trims surrounding whitespace.
pub fn clean_exec(raw: &str) -> String {
    let cut = match raw.find('%') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    cut.trim().to_string()
}

/// Icon-theme lookup collaborator. The actual theme engine belongs to the
/// renderer; [`NoThemeLookup`] stands in when none is attached.
pub trait IconLookup {
    fn lookup(&self, name: &str) -> Option<PathBuf>;
}

pub struct NoThemeLookup;

impl IconLookup for NoThemeLookup {
    fn lookup(&self, _name: &str) -> Option<PathBuf> { None }
}

const ICON_DIRS: &[&str] = &[
    "/usr/share/pixmaps",
    "/usr/share/icons/hicolor/48x48/apps",
    "/usr/share/icons/hicolor/scalable/apps",
    "/usr/share/icons/Adwaita/48x48/apps",
    "/usr/share/icons",
];

const ICON_EXTENSIONS: &[&str] = &["png", "svg", "xpm"];

/// Resolves a raw Icon value to a concrete file path: an existing path is
/// used as-is, then the theme lookup, then the fixed system icon
/// directories. An unresolvable icon degrades to the empty string.
pub fn find_icon(raw: &str, theme: &dyn IconLookup) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if Path::new(raw).exists() {
        return raw.to_string();
    }
    if let Some(path) = theme.lookup(raw) {
        return path.to_string_lossy().into_owned();
    }
    for dir in ICON_DIRS {
        for ext in ICON_EXTENSIONS {
            let candidate = Path::new(dir).join(format!("{raw}.{ext}"));
            if candidate.exists() {
                return candidate.to_string_lossy().into_owned();
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_main_section_fields() {
        let record = parse_str(
            "[Desktop Entry]\n\
             Name=Files\n\
             Exec=nautilus --new-window %U\n\
             Icon=org.gnome.Nautilus\n",
        );
        assert_eq!("Files", record.name);
        assert_eq!("nautilus --new-window", record.exec);
        assert_eq!("org.gnome.Nautilus", record.icon);
    }

    #[test]
    fn ignores_other_sections() {
        let record = parse_str(
            "[Desktop Entry]\n\
             Name=Files\n\
             [Desktop Action new-window]\n\
             Name=New Window\n\
             Exec=nautilus --new-window\n",
        );
        assert_eq!("Files", record.name);
        assert!(record.exec.is_empty());
    }

    #[test]
    fn ignores_keys_before_main_section() {
        let record = parse_str("Name=Stray\n[Desktop Entry]\nName=Real\n");
        assert_eq!("Real", record.name);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let record = parse_str("[Desktop Entry]\n# a comment\n\nName=App\n");
        assert_eq!("App", record.name);
    }

    #[test]
    fn missing_file_degrades_to_empty_record() {
        assert_eq!(
            DescriptorRecord::default(),
            parse(Path::new("/no/such/file.desktop"))
        );
    }

    #[test]
    fn clean_exec_strips_placeholder_and_tail() {
        assert_eq!("firefox", clean_exec("firefox %u"));
        assert_eq!("app --flag", clean_exec("app --flag %U --ignored"));
        assert_eq!("plain", clean_exec("  plain  "));
        assert_eq!("", clean_exec("%F"));
    }

    #[test]
    fn find_icon_prefers_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let icon = dir.path().join("app.png");
        std::fs::write(&icon, []).unwrap();

        let raw = icon.to_string_lossy().into_owned();
        assert_eq!(raw, find_icon(&raw, &NoThemeLookup));
    }

    #[test]
    fn find_icon_consults_theme_lookup() {
        struct Fixed(PathBuf);
        impl IconLookup for Fixed {
            fn lookup(&self, _name: &str) -> Option<PathBuf> { Some(self.0.clone()) }
        }

        let themed = find_icon("app", &Fixed(PathBuf::from("/theme/app.svg")));
        assert_eq!("/theme/app.svg", themed);
    }

    #[test]
    fn unresolvable_icon_is_empty() {
        assert_eq!("", find_icon("surely-no-such-icon-name", &NoThemeLookup));
        assert_eq!("", find_icon("", &NoThemeLookup));
    }
}
