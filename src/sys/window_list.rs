use std::process::Command;

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::entry::WindowInstance;

/// Field delimiter the window-list command emits between the five fields
/// `monitor -:- title -:- class -:- fullscreen -:- pid`.
pub const FIELD_DELIMITER: &str = "-:-";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected 5 fields, got {0}")]
    FieldCount(usize),
    #[error("invalid {field} field: {value:?}")]
    Integer { field: &'static str, value: String },
}

/// Runs the external window-list command and parses one window per line.
/// A malformed line is skipped, never fatal to the batch; a failed command
/// degrades to an empty snapshot.
pub struct WindowListQuery {
    cmd: String,
}

impl WindowListQuery {
    pub fn new(cmd: impl Into<String>) -> WindowListQuery {
        WindowListQuery { cmd: cmd.into() }
    }

    pub fn query(&self) -> Vec<WindowInstance> {
        let output = Command::new("sh").arg("-c").arg(&self.cmd).output();
        match output {
            Ok(out) if out.status.success() => parse_batch(&String::from_utf8_lossy(&out.stdout)),
            Ok(out) => {
                debug!(status = %out.status, cmd = %self.cmd, "window-list command failed");
                Vec::new()
            }
            Err(e) => {
                debug!(cmd = %self.cmd, "window-list command could not run: {e}");
                Vec::new()
            }
        }
    }
}

pub fn parse_batch(text: &str) -> Vec<WindowInstance> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match parse_line(line) {
            Ok(instance) => Some(instance),
            Err(e) => {
                warn!("skipping malformed window-list line {line:?}: {e}");
                None
            }
        })
        .collect()
}

pub fn parse_line(line: &str) -> Result<WindowInstance, ParseError> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() != 5 {
        return Err(ParseError::FieldCount(fields.len()));
    }

    Ok(WindowInstance {
        monitor: int_field("monitor", fields[0])?,
        title: fields[1].to_string(),
        class: fields[2].to_string(),
        fullscreen: int_field::<i32>("fullscreen", fields[3])? != 0,
        pid: int_field("pid", fields[4])?,
    })
}

fn int_field<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ParseError> {
    value.trim().parse().map_err(|_| ParseError::Integer {
        field,
        value: value.trim().to_string(),
    })
}
