use std::process::Command;

use tracing::{debug, trace};

use super::session::SessionKind;
use crate::common::util;
use crate::model::entry::WindowInstance;

/// Fire-and-forget window actions, dispatched per session family: Hyprland
/// through `hyprctl`, X11 through `wmctrl`/`xdotool`. No result is consumed;
/// failures only reach the debug log.
pub struct WindowControl {
    session: SessionKind,
}

impl WindowControl {
    pub fn new(session: SessionKind) -> WindowControl { WindowControl { session } }

    /// Spawns an application command in the user's home directory.
    pub fn launch(&self, exec: &str) {
        if exec.is_empty() {
            debug!("launch requested for an entry without an exec command");
            return;
        }
        trace!(exec, "launching");
        util::spawn_detached(exec, dirs::home_dir());
    }

    /// Raises the window with the instance's title.
    pub fn focus(&self, instance: &WindowInstance) {
        match self.session {
            SessionKind::Hyprland => {
                run_tool("hyprctl", &[
                    "dispatch",
                    "focuswindow",
                    &format!("title:^({})$", instance.title),
                ]);
            }
            SessionKind::X11 => {
                run_tool("wmctrl", &["-a", &instance.title]);
            }
            SessionKind::Wayland => {
                debug!(title = %instance.title, "focus is unsupported on plain wayland");
            }
        }
    }

    /// Closes every given window.
    pub fn close(&self, instances: &[WindowInstance]) {
        match self.session {
            SessionKind::Hyprland => {
                if instances.len() > 1 {
                    // One dispatch per class closes the whole group.
                    run_tool("hyprctl", &[
                        "dispatch",
                        "closewindow",
                        &format!("class:^({})$", instances[0].class),
                    ]);
                } else if let Some(instance) = instances.first() {
                    run_tool("hyprctl", &[
                        "dispatch",
                        "closewindow",
                        &format!("title:^({})$", instance.title),
                    ]);
                }
            }
            SessionKind::X11 => {
                for instance in instances {
                    run_tool("xdotool", &["search", "--name", &instance.title, "windowclose"]);
                }
            }
            SessionKind::Wayland => {
                debug!("close is unsupported on plain wayland");
            }
        }
    }
}

fn run_tool(tool: &str, args: &[&str]) {
    trace!(tool, ?args, "window control");
    let tool = tool.to_string();
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    std::thread::spawn(move || {
        match Command::new(&tool).args(&args).output() {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                debug!(tool, status = %output.status, "window-control tool failed");
            }
            Err(e) => {
                debug!(tool, "window-control tool could not run: {e}");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    // The control commands themselves are fire-and-forget externals; only
    // the no-op paths are observable here.
    #[test]
    fn launch_without_exec_is_a_no_op() {
        let control = WindowControl::new(SessionKind::X11);
        control.launch("");
    }

    #[test]
    fn close_with_no_instances_is_a_no_op() {
        let control = WindowControl::new(SessionKind::Hyprland);
        control.close(&[]);
    }
}
