use std::path::PathBuf;

use tracing::{debug, error, trace};

/// Splits a command line into argv parts, honoring single and double quotes
/// and backslash escapes inside quotes.
pub fn parse_command(command: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = command.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' => {
                in_quotes = !in_quotes;
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(current.clone());
                    current.clear();
                }
            }
            '\\' if in_quotes => {
                if let Some(next_ch) = chars.next() {
                    match next_ch {
                        'n' => current.push('\n'),
                        't' => current.push('\t'),
                        'r' => current.push('\r'),
                        '\\' => current.push('\\'),
                        '\'' => current.push('\''),
                        '"' => current.push('"'),
                        _ => {
                            current.push('\\');
                            current.push(next_ch);
                        }
                    }
                } else {
                    current.push('\\');
                }
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

/// Runs a command in the background without consuming its result. The exit
/// status is only logged; a dock action must never block or fail the caller.
pub fn spawn_detached(command: &str, cwd: Option<PathBuf>) {
    let parts = parse_command(command);
    let Some((cmd, args)) = parts.split_first() else {
        error!("refusing to spawn empty command");
        return;
    };

    let cmd_owned = cmd.to_string();
    let args_owned: Vec<String> = args.to_vec();
    let command_str = command.to_string();

    std::thread::spawn(move || {
        let mut process = std::process::Command::new(&cmd_owned);
        process.args(&args_owned);
        if let Some(dir) = cwd {
            process.current_dir(dir);
        }

        match process.output() {
            Ok(output) => {
                if output.status.success() {
                    trace!("command completed: {}", command_str);
                } else {
                    debug!("command failed with status {}: {}", output.status, command_str);
                    if !output.stderr.is_empty() {
                        debug!("stderr: {}", String::from_utf8_lossy(&output.stderr));
                    }
                }
            }
            Err(e) => {
                debug!("failed to execute command '{}': {}", command_str, e);
            }
        }
    });
}
