//! Layout geometry and the rendering seam. Everything here is pure except
//! [`TraceSurface`]; the widget tree, icon painting, and the concrete window
//! placement (layer-shell margins on Wayland, a direct move on X11) live in
//! the display-server binding behind [`DockSurface`].

use tracing::{debug, trace};

use crate::common::config::{Alignment, Axis, Edge, Settings};
use crate::model::entry::AppEntry;

/// Extent a separator occupies along the dock's main axis, instead of a
/// full icon slot.
pub const SEPARATOR_EXTENT: f64 = 6.0;

/// Window and dock-box extents derived from the entry list and settings.
/// The dock box is centered inside a slightly larger input window; vertical
/// edges swap the axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockMetrics {
    pub win_w: f64,
    pub win_h: f64,
    pub dock_w: f64,
    pub dock_h: f64,
}

impl DockMetrics {
    /// Size along the axis the hide/show animation travels on.
    pub fn animated_extent(&self, edge: Edge) -> f64 {
        match edge.axis() {
            Axis::Horizontal => self.win_h,
            Axis::Vertical => self.win_w,
        }
    }
}

pub fn compute_metrics(entries: &[AppEntry], settings: &Settings) -> DockMetrics {
    let icon_bg = settings.icon_bg_size();
    let padding = f64::from(settings.padding);
    let slot = icon_bg + padding;

    let mut main = entries.len() as f64 * slot;
    if entries.iter().any(AppEntry::is_separator) {
        main -= slot - SEPARATOR_EXTENT;
    }

    let main_win = main + padding;
    let cross_win = icon_bg + 2.0 * padding;

    match settings.edge.axis() {
        Axis::Horizontal => DockMetrics {
            win_w: main_win,
            win_h: cross_win,
            dock_w: main,
            dock_h: icon_bg,
        },
        Axis::Vertical => DockMetrics {
            win_w: cross_win,
            win_h: main_win,
            dock_w: icon_bg,
            dock_h: main,
        },
    }
}

/// One monitor's geometry in global coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Top-left resting position of the dock window on `monitor`, independent
/// of how the display server applies it.
pub fn anchor_offset(
    edge: Edge,
    alignment: Alignment,
    monitor: MonitorGeometry,
    metrics: DockMetrics,
    margin: f64,
) -> (f64, f64) {
    let along = |span: f64, size: f64| match alignment {
        Alignment::Start => 0.0,
        Alignment::Center => (span - size) / 2.0,
        Alignment::End => span - size,
    };

    match edge {
        Edge::Top => (
            monitor.x + along(monitor.width, metrics.win_w),
            monitor.y + margin,
        ),
        Edge::Bottom => (
            monitor.x + along(monitor.width, metrics.win_w),
            monitor.y + monitor.height - metrics.win_h - margin,
        ),
        Edge::Left => (
            monitor.x + margin,
            monitor.y + along(monitor.height, metrics.win_h),
        ),
        Edge::Right => (
            monitor.x + monitor.width - metrics.win_w - margin,
            monitor.y + along(monitor.height, metrics.win_h),
        ),
    }
}

/// Whether a pointer position (in dock-window coordinates) falls inside the
/// hotspot strip along the configured edge.
pub fn in_hotspot(edge: Edge, metrics: &DockMetrics, hotspot: f64, x: f64, y: f64) -> bool {
    match edge {
        Edge::Bottom => y > metrics.win_h - hotspot,
        Edge::Top => y < hotspot,
        Edge::Left => x < hotspot,
        Edge::Right => x > metrics.win_w - hotspot,
    }
}

/// Rendering collaborator for the dock actor.
pub trait DockSurface {
    /// Replaces the widget state with a freshly resolved entry list. Must
    /// complete before the next tick renders.
    fn rebuild(&mut self, entries: &[AppEntry], metrics: &DockMetrics);

    /// Applies an animation offset along the configured edge's axis.
    fn apply_offset(&mut self, offset: f64);
}

/// Logging stand-in for a renderer, used by the headless binary.
pub struct TraceSurface;

impl DockSurface for TraceSurface {
    fn rebuild(&mut self, entries: &[AppEntry], metrics: &DockMetrics) {
        debug!(entries = entries.len(), ?metrics, "surface rebuild");
    }

    fn apply_offset(&mut self, offset: f64) {
        trace!(offset, "surface offset");
    }
}
