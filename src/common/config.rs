use std::path::{Path, PathBuf};
use std::str::FromStr;

use strum_macros::{Display, EnumString};
use tracing::debug;

pub fn config_dir() -> PathBuf {
    dirs::home_dir().unwrap().join(".config").join("ledge")
}
pub fn settings_file() -> PathBuf { config_dir().join("settings.conf") }
pub fn pin_file() -> PathBuf { config_dir().join("pinned-apps") }
pub fn default_window_list_script() -> PathBuf { config_dir().join("list-windows.sh") }

/// Screen edge the dock rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Edge {
    Left,
    Top,
    Right,
    Bottom,
}

/// Axis the dock's entries are laid out along, and along which the
/// hide/show animation travels on the opposite axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Edge {
    pub fn axis(self) -> Axis {
        match self {
            Edge::Top | Edge::Bottom => Axis::Horizontal,
            Edge::Left | Edge::Right => Axis::Vertical,
        }
    }
}

/// Placement of the dock along its edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Alignment {
    Start,
    #[default]
    Center,
    End,
}

/// Startup options read from the flat `key:value` settings file. Unknown
/// keys are ignored, missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub icon_size: u32,
    pub padding: u32,
    pub hotspot_height: u32,
    pub autohide: bool,
    pub autohide_timeout_ms: u64,
    pub autohide_duration_ms: u64,
    pub edge_margin: u32,
    pub draw_launcher: bool,
    pub launcher_cmd: String,
    pub launcher_icon: String,
    pub isolated_to_monitor: bool,
    pub edge: Edge,
    pub alignment: Alignment,
    pub display_index: i32,
    pub window_list_cmd: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            icon_size: 48,
            padding: 6,
            hotspot_height: 2,
            autohide: false,
            autohide_timeout_ms: 500,
            autohide_duration_ms: 300,
            edge_margin: 8,
            draw_launcher: false,
            launcher_cmd: String::new(),
            launcher_icon: String::new(),
            isolated_to_monitor: false,
            edge: Edge::Bottom,
            alignment: Alignment::Center,
            display_index: 0,
            window_list_cmd: default_window_list_script().display().to_string(),
        }
    }
}

impl Settings {
    pub fn read(path: &Path) -> anyhow::Result<Settings> {
        let buf = std::fs::read_to_string(path)?;
        Ok(Self::parse(&buf))
    }

    pub fn parse(text: &str) -> Settings {
        let mut settings = Settings::default();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                debug!(line = idx + 1, "settings line without ':' ignored");
                continue;
            };
            settings.apply(key.trim(), value.trim(), idx + 1);
        }
        settings
    }

    fn apply(&mut self, key: &str, value: &str, line: usize) {
        match key {
            "icon_size" => set_parsed(&mut self.icon_size, key, value, line),
            "padding" => set_parsed(&mut self.padding, key, value, line),
            "hotspot_height" => set_parsed(&mut self.hotspot_height, key, value, line),
            "autohide" => set_bool(&mut self.autohide, key, value, line),
            "autohide_timeout" => set_parsed(&mut self.autohide_timeout_ms, key, value, line),
            "autohide_duration" => set_parsed(&mut self.autohide_duration_ms, key, value, line),
            "edge_margin" => set_parsed(&mut self.edge_margin, key, value, line),
            "draw_launcher" => set_bool(&mut self.draw_launcher, key, value, line),
            "launcher_cmd" => self.launcher_cmd = value.to_string(),
            "launcher_icon" => self.launcher_icon = value.to_string(),
            "isolated_to_monitor" => set_bool(&mut self.isolated_to_monitor, key, value, line),
            "edge" => set_parsed(&mut self.edge, key, value, line),
            "alignment" => set_parsed(&mut self.alignment, key, value, line),
            "display" => set_parsed(&mut self.display_index, key, value, line),
            "window_list_cmd" => self.window_list_cmd = value.to_string(),
            _ => debug!(key, line, "unrecognized settings key ignored"),
        }
    }

    /// Validates the settings and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.icon_size == 0 {
            issues.push("icon_size must be at least 1".to_string());
        }
        if self.autohide && self.autohide_duration_ms == 0 {
            issues.push("autohide_duration must be positive when autohide is enabled".to_string());
        }
        if self.hotspot_height == 0 {
            issues.push("hotspot_height must be at least 1".to_string());
        }
        if self.display_index < 0 {
            issues.push(format!("display ({}) must not be negative", self.display_index));
        }
        if self.draw_launcher && self.launcher_cmd.is_empty() {
            issues.push("launcher_cmd must be set when draw_launcher is enabled".to_string());
        }
        if self.window_list_cmd.is_empty() {
            issues.push("window_list_cmd must not be empty".to_string());
        }

        issues
    }

    /// Side length of the square slot behind each icon.
    pub fn icon_bg_size(&self) -> f64 { f64::from(self.icon_size) * (4.0 / 3.0) }
}

fn set_parsed<T: FromStr>(slot: &mut T, key: &str, value: &str, line: usize) {
    match value.parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => debug!(key, value, line, "unparsable settings value ignored"),
    }
}

fn set_bool(slot: &mut bool, key: &str, value: &str, line: usize) {
    match value {
        "1" | "true" => *slot = true,
        "0" | "false" => *slot = false,
        _ => debug!(key, value, line, "unparsable boolean settings value ignored"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_known_keys() {
        let settings = Settings::parse(
            "icon_size:64\n\
             padding:10\n\
             autohide:1\n\
             autohide_timeout:300\n\
             autohide_duration:250\n\
             edge:left\n\
             alignment:end\n\
             launcher_cmd:rofi -show drun\n",
        );
        assert_eq!(64, settings.icon_size);
        assert_eq!(10, settings.padding);
        assert!(settings.autohide);
        assert_eq!(300, settings.autohide_timeout_ms);
        assert_eq!(250, settings.autohide_duration_ms);
        assert_eq!(Edge::Left, settings.edge);
        assert_eq!(Alignment::End, settings.alignment);
        assert_eq!("rofi -show drun", settings.launcher_cmd);
    }

    #[test]
    fn ignores_unknown_keys_and_keeps_defaults() {
        let settings = Settings::parse("no_such_key:1\nicon_size:32\n");
        assert_eq!(32, settings.icon_size);
        assert_eq!(Settings::default().padding, settings.padding);
        assert_eq!(Settings::default().edge, settings.edge);
    }

    #[test]
    fn skips_blank_comment_and_malformed_lines() {
        let settings = Settings::parse("\n# a comment\nnot a setting\nicon_size:24\n");
        assert_eq!(24, settings.icon_size);
    }

    #[test]
    fn unparsable_value_keeps_default() {
        let settings = Settings::parse("icon_size:huge\nedge:diagonal\n");
        assert_eq!(Settings::default().icon_size, settings.icon_size);
        assert_eq!(Settings::default().edge, settings.edge);
    }

    #[test]
    fn value_may_contain_the_delimiter() {
        let settings = Settings::parse("launcher_cmd:env DISPLAY=:0 launcher\n");
        assert_eq!("env DISPLAY=:0 launcher", settings.launcher_cmd);
    }

    #[test]
    fn default_settings_validate_clean() {
        assert!(Settings::default().validate().is_empty());
    }

    #[test]
    fn validate_flags_degenerate_values() {
        let mut settings = Settings::default();
        settings.icon_size = 0;
        settings.autohide = true;
        settings.autohide_duration_ms = 0;
        settings.draw_launcher = true;
        let issues = settings.validate();
        assert!(issues.iter().any(|i| i.contains("icon_size")));
        assert!(issues.iter().any(|i| i.contains("autohide_duration")));
        assert!(issues.iter().any(|i| i.contains("launcher_cmd")));
    }

    #[test]
    fn edge_axis_split() {
        assert_eq!(Axis::Horizontal, Edge::Top.axis());
        assert_eq!(Axis::Horizontal, Edge::Bottom.axis());
        assert_eq!(Axis::Vertical, Edge::Left.axis());
        assert_eq!(Axis::Vertical, Edge::Right.axis());
    }
}
