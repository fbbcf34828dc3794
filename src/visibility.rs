//! The dock's show/hide state machine. Pure and tick-driven: pointer
//! callbacks only record intent (`wanted` state and timestamps); every
//! transition and all animation progress happen in [`VisibilityMachine::tick`].

use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DockState {
    Hidden,
    Visible,
    Hiding,
    Showing,
}

/// Timing and geometry inputs. `extent` is the dock window's size along the
/// animated axis (height for top/bottom edges, width for left/right); it is
/// refreshed whenever the dock is rebuilt or the settings change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityParams {
    pub autohide: bool,
    pub timeout_ms: u64,
    pub duration_ms: u64,
    pub extent: f64,
    pub edge_margin: f64,
}

pub struct VisibilityMachine {
    state: DockState,
    wanted: DockState,
    t1: f64,
    t2: f64,
    last_leave_ms: u64,
    pointer_inside: bool,
    rearm_after_show: bool,
    params: VisibilityParams,
}

impl VisibilityMachine {
    /// The dock starts shown and immediately begins timing out unless the
    /// pointer is already over it.
    pub fn new(params: VisibilityParams) -> VisibilityMachine {
        VisibilityMachine {
            state: DockState::Visible,
            wanted: DockState::Hidden,
            t1: 0.0,
            t2: 0.0,
            last_leave_ms: 0,
            pointer_inside: false,
            rearm_after_show: false,
            params,
        }
    }

    pub fn state(&self) -> DockState { self.state }

    pub fn wanted_state(&self) -> DockState { self.wanted }

    pub fn set_params(&mut self, params: VisibilityParams) { self.params = params; }

    pub fn set_extent(&mut self, extent: f64) { self.params.extent = extent; }

    pub fn pointer_entered(&mut self) {
        self.pointer_inside = true;
        if self.state == DockState::Hiding || self.wanted == DockState::Hidden {
            self.wanted = DockState::Visible;
        }
    }

    pub fn pointer_left(&mut self, now_ms: u64) {
        self.pointer_inside = false;
        if self.state == DockState::Visible || self.state == DockState::Showing {
            self.last_leave_ms = now_ms;
            self.wanted = DockState::Hidden;
        }
    }

    /// Pointer motion in the edge hotspot while the dock is out of sight
    /// (X11 emulation, or the layer-shell hotspot strip on Wayland).
    pub fn pointer_near_edge(&mut self) {
        if self.state == DockState::Hidden || self.state == DockState::Hiding {
            self.wanted = DockState::Visible;
        }
    }

    /// Unconditionally reveals the dock, overriding any pending hide. Once
    /// fully shown with the pointer elsewhere, the hide countdown re-arms.
    pub fn force_reveal(&mut self) {
        self.wanted = DockState::Visible;
        self.rearm_after_show = true;
    }

    /// Advances the machine by one frame. Returns the offset to apply along
    /// the animated axis, or None when the dock is at rest. `frame_delta_ms`
    /// must be 0 on the first tick so a startup gap cannot jump the
    /// animation.
    pub fn tick(&mut self, now_ms: u64, frame_delta_ms: f64) -> Option<f64> {
        if self.rearm_after_show && self.state == DockState::Visible && !self.pointer_inside {
            self.rearm_after_show = false;
            self.last_leave_ms = now_ms;
            self.wanted = DockState::Hidden;
        }

        if self.params.autohide
            && self.wanted == DockState::Hidden
            && matches!(self.state, DockState::Visible | DockState::Showing)
            && now_ms.saturating_sub(self.last_leave_ms) > self.params.timeout_ms
        {
            self.state = DockState::Hiding;
        }

        if self.wanted == DockState::Visible
            && matches!(self.state, DockState::Hiding | DockState::Hidden)
        {
            self.state = DockState::Showing;
        }

        match self.state {
            DockState::Hiding => Some(self.advance_hide(frame_delta_ms)),
            DockState::Showing => Some(self.advance_show(frame_delta_ms)),
            DockState::Hidden | DockState::Visible => None,
        }
    }

    fn travel(&self) -> f64 { self.params.extent + self.params.edge_margin }

    fn advance_hide(&mut self, frame_delta_ms: f64) -> f64 {
        if self.t1 <= 1.0 {
            let offset = -self.travel() * self.t1;
            self.t1 += frame_delta_ms / self.params.duration_ms as f64;
            offset
        } else {
            self.t1 = 0.0;
            self.state = DockState::Hidden;
            -self.travel()
        }
    }

    fn advance_show(&mut self, frame_delta_ms: f64) -> f64 {
        if self.t2 <= 1.0 {
            let offset = -self.travel() * (1.0 - self.t2) + self.params.edge_margin;
            self.t2 += frame_delta_ms / self.params.duration_ms as f64;
            offset
        } else {
            self.t2 = 0.0;
            self.state = DockState::Visible;
            self.params.edge_margin
        }
    }
}
