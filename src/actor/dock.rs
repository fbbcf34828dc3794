//! The dock actor owns the live entry list and the visibility machine. It
//! runs the foreground cycle (resolve, diff, rebuild), feeds pointer and
//! frame events into the state machine, and executes entry actions. All
//! heavy work (descriptor I/O, corpus matching) happens in the refresh
//! cycle; pointer and tick handlers only touch in-memory state.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::actor::{self, poller::SharedSnapshot};
use crate::common::config::Settings;
use crate::model::entry::AppEntry;
use crate::model::{diff, pin_store, pin_store::PinStore};
use crate::resolver::{MonitorFilter, ResolutionEngine};
use crate::sys::session::{self, SessionKind};
use crate::sys::window_control::WindowControl;
use crate::ui::{self, DockMetrics, DockSurface};
use crate::visibility::{DockState, VisibilityMachine, VisibilityParams};

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

/// Cadence of the foreground resolve/diff/rebuild cycle.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Cadence of the animation tick when no frame clock drives the surface.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Name this dock's processes go by in /proc, for single-instance detection.
const PROCESS_NAME: &str = "ledge";

#[derive(Debug)]
pub enum Event {
    /// Frame tick; the delta is computed from the previous tick's arrival.
    Tick,
    /// Foreground cycle: resolve the snapshot, diff, maybe rebuild.
    Refresh,
    PointerEntered,
    PointerLeft,
    /// Pointer motion in dock-window coordinates (X11 hotspot emulation).
    PointerMoved { x: f64, y: f64 },
    /// The Wayland hotspot strip reported the pointer.
    PointerNearEdge,
    Action(EntryAction),
    SettingsUpdated(Settings),
    Shutdown,
}

/// User actions on a dock entry, sent by the surface's menus and buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryAction {
    /// Primary click: focus the first instance, or launch when none runs.
    Activate { entry: usize },
    /// "New Window": launch another instance.
    LaunchNew { entry: usize },
    FocusInstance { entry: usize, instance: usize },
    CloseInstance { entry: usize, instance: usize },
    CloseAll { entry: usize },
    Pin { entry: usize },
    Unpin { entry: usize },
    Quit,
}

pub struct DockActor {
    settings: Settings,
    session: SessionKind,
    engine: ResolutionEngine,
    pins: PinStore,
    control: WindowControl,
    snapshot: SharedSnapshot,
    surface: Box<dyn DockSurface>,
    machine: VisibilityMachine,
    entries: Vec<AppEntry>,
    metrics: DockMetrics,
    started: Instant,
    last_tick_ms: Option<u64>,
}

impl DockActor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: Settings,
        session: SessionKind,
        engine: ResolutionEngine,
        pins: PinStore,
        control: WindowControl,
        snapshot: SharedSnapshot,
        surface: Box<dyn DockSurface>,
    ) -> DockActor {
        let metrics = ui::compute_metrics(&[], &settings);
        let machine = VisibilityMachine::new(visibility_params(
            &settings,
            metrics.animated_extent(settings.edge),
        ));
        DockActor {
            settings,
            session,
            engine,
            pins,
            control,
            snapshot,
            surface,
            machine,
            entries: Vec::new(),
            metrics,
            started: Instant::now(),
            last_tick_ms: None,
        }
    }

    pub async fn run(mut self, mut events: Receiver) {
        while let Some((_span, event)) = events.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }
        info!("dock actor stopped");
    }

    pub fn entries(&self) -> &[AppEntry] { &self.entries }

    pub fn visibility(&self) -> DockState { self.machine.state() }

    /// Returns false when the actor should stop.
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Tick => self.handle_tick(),
            Event::Refresh => self.handle_refresh(),
            Event::PointerEntered => self.machine.pointer_entered(),
            Event::PointerLeft => {
                let now = self.now_ms();
                self.machine.pointer_left(now);
            }
            Event::PointerMoved { x, y } => self.handle_pointer_moved(x, y),
            Event::PointerNearEdge => self.machine.pointer_near_edge(),
            Event::Action(action) => return self.handle_action(action),
            Event::SettingsUpdated(settings) => self.apply_settings(settings),
            Event::Shutdown => {
                info!("shutting down");
                return false;
            }
        }
        true
    }

    /// Rebuilds the entry list from the current snapshot and pin store. The
    /// resolved list fully replaces the live one only when the diff says the
    /// change is user-visible; a pure size change additionally reveals the
    /// dock.
    fn handle_refresh(&mut self) {
        let snapshot = self.snapshot.load();
        let live = self.engine.resolve(&snapshot, self.monitor_filter());
        let launcher = self
            .settings
            .draw_launcher
            .then(|| AppEntry::launcher(&self.settings.launcher_cmd, &self.settings.launcher_icon));
        let next = pin_store::merge(live, self.pins.load(), launcher);

        let outcome = diff::compare(&self.entries, &next);
        if outcome.force_visible {
            self.machine.force_reveal();
        }
        if outcome.changed {
            self.entries = next;
            self.metrics = ui::compute_metrics(&self.entries, &self.settings);
            self.machine.set_extent(self.metrics.animated_extent(self.settings.edge));
            self.surface.rebuild(&self.entries, &self.metrics);
            debug!(entries = self.entries.len(), "dock rebuilt");
        }
    }

    fn monitor_filter(&self) -> MonitorFilter {
        if !self.settings.isolated_to_monitor {
            return MonitorFilter::All;
        }
        // The only running dock instance sees every monitor's windows.
        if session::is_only_instance(PROCESS_NAME) {
            MonitorFilter::All
        } else {
            MonitorFilter::Only(self.settings.display_index)
        }
    }

    fn handle_tick(&mut self) {
        let now = self.now_ms();
        let delta = match self.last_tick_ms {
            Some(previous) => now.saturating_sub(previous) as f64,
            None => 0.0,
        };
        self.last_tick_ms = Some(now);

        if let Some(offset) = self.machine.tick(now, delta) {
            self.surface.apply_offset(offset);
        }
    }

    fn handle_pointer_moved(&mut self, x: f64, y: f64) {
        // On Wayland the hotspot strip is its own surface; motion inside the
        // dock window only matters for the X11 emulation.
        if self.session.is_wayland() {
            return;
        }
        let hotspot = f64::from(self.settings.hotspot_height);
        if ui::in_hotspot(self.settings.edge, &self.metrics, hotspot, x, y) {
            self.machine.pointer_near_edge();
        }
    }

    fn handle_action(&mut self, action: EntryAction) -> bool {
        match action {
            EntryAction::Activate { entry } => {
                let Some(entry) = self.actionable_entry(entry) else {
                    return true;
                };
                match entry.instances.first() {
                    Some(instance) => self.control.focus(instance),
                    None => self.control.launch(&entry.exec),
                }
            }
            EntryAction::LaunchNew { entry } => {
                if let Some(entry) = self.actionable_entry(entry) {
                    self.control.launch(&entry.exec);
                }
            }
            EntryAction::FocusInstance { entry, instance } => {
                if let Some(instance) =
                    self.actionable_entry(entry).and_then(|e| e.instances.get(instance))
                {
                    self.control.focus(instance);
                }
            }
            EntryAction::CloseInstance { entry, instance } => {
                if let Some(instance) = self
                    .actionable_entry(entry)
                    .and_then(|e| e.instances.get(instance))
                    .cloned()
                {
                    self.control.close(std::slice::from_ref(&instance));
                }
            }
            EntryAction::CloseAll { entry } => {
                if let Some(entry) = self.actionable_entry(entry) {
                    let instances = entry.instances.clone();
                    self.control.close(&instances);
                }
            }
            EntryAction::Pin { entry } => {
                if let Some(entry) = self.actionable_entry(entry).filter(|e| !e.pinned).cloned() {
                    if let Err(e) = self.pins.add(&entry) {
                        warn!("pin failed: {e}");
                    }
                    self.handle_refresh();
                }
            }
            EntryAction::Unpin { entry } => {
                if let Some(entry) = self.actionable_entry(entry).filter(|e| e.pinned).cloned() {
                    if let Err(e) = self.pins.remove(&entry.desktop_file) {
                        warn!("unpin failed: {e}");
                    }
                    self.handle_refresh();
                }
            }
            EntryAction::Quit => {
                info!("quit requested");
                return false;
            }
        }
        true
    }

    /// Entries addressed by an action; the separator is never actionable.
    fn actionable_entry(&self, index: usize) -> Option<&AppEntry> {
        let entry = self.entries.get(index);
        if entry.is_none() {
            warn!(index, "action for an entry that no longer exists");
        }
        entry.filter(|e| !e.is_separator())
    }

    fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.metrics = ui::compute_metrics(&self.entries, &self.settings);
        self.machine.set_params(visibility_params(
            &self.settings,
            self.metrics.animated_extent(self.settings.edge),
        ));
        self.surface.rebuild(&self.entries, &self.metrics);
        info!("settings applied");
    }

    fn now_ms(&self) -> u64 { self.started.elapsed().as_millis() as u64 }
}

fn visibility_params(settings: &Settings, extent: f64) -> VisibilityParams {
    VisibilityParams {
        autohide: settings.autohide,
        timeout_ms: settings.autohide_timeout_ms,
        duration_ms: settings.autohide_duration_ms,
        extent,
        edge_margin: f64::from(settings.edge_margin),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::model::entry::WindowInstance;
    use crate::resolver::DesktopFileIndex;
    use crate::resolver::desktop_file::NoThemeLookup;

    #[derive(Debug, Clone, PartialEq)]
    enum SurfaceCall {
        Rebuild(usize),
        Offset(f64),
    }

    #[derive(Clone)]
    struct RecordingSurface(Arc<Mutex<Vec<SurfaceCall>>>);

    impl DockSurface for RecordingSurface {
        fn rebuild(&mut self, entries: &[AppEntry], _metrics: &DockMetrics) {
            self.0.lock().push(SurfaceCall::Rebuild(entries.len()));
        }

        fn apply_offset(&mut self, offset: f64) {
            self.0.lock().push(SurfaceCall::Offset(offset));
        }
    }

    struct Fixture {
        actor: DockActor,
        snapshot: SharedSnapshot,
        calls: Arc<Mutex<Vec<SurfaceCall>>>,
        _dir: tempfile::TempDir,
    }

    fn fixture(settings: Settings) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let apps = dir.path().join("applications");
        fs::create_dir(&apps).unwrap();
        fs::write(
            apps.join("term.desktop"),
            "[Desktop Entry]\nName=Term\nExec=term\n",
        )
        .unwrap();
        fs::write(
            apps.join("files.desktop"),
            "[Desktop Entry]\nName=Files\nExec=files\n",
        )
        .unwrap();

        let engine = ResolutionEngine::new(
            DesktopFileIndex::with_paths(vec![apps]),
            Box::new(NoThemeLookup),
        );
        let pins = PinStore::new(dir.path().join("pinned-apps"));
        let snapshot = SharedSnapshot::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let actor = DockActor::new(
            settings,
            SessionKind::X11,
            engine,
            pins,
            WindowControl::new(SessionKind::X11),
            snapshot.clone(),
            Box::new(RecordingSurface(calls.clone())),
        );
        Fixture {
            actor,
            snapshot,
            calls,
            _dir: dir,
        }
    }

    fn window(title: &str, class: &str) -> WindowInstance {
        WindowInstance {
            monitor: 0,
            title: title.to_string(),
            class: class.to_string(),
            fullscreen: false,
            pid: 7,
        }
    }

    fn rebuild_count(calls: &Arc<Mutex<Vec<SurfaceCall>>>) -> usize {
        calls
            .lock()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::Rebuild(_)))
            .count()
    }

    #[test]
    fn refresh_rebuilds_only_on_change() {
        let mut fixture = fixture(Settings::default());
        fixture.snapshot.publish(vec![window("sh", "term")]);

        fixture.actor.handle_event(Event::Refresh);
        assert_eq!(1, rebuild_count(&fixture.calls));
        assert_eq!(1, fixture.actor.entries().len());
        assert_eq!("Term", fixture.actor.entries()[0].name);

        // Same snapshot again: diff is quiet, no rebuild.
        fixture.actor.handle_event(Event::Refresh);
        assert_eq!(1, rebuild_count(&fixture.calls));
    }

    #[test]
    fn new_application_forces_the_dock_visible() {
        let mut fixture = fixture(Settings {
            autohide: true,
            autohide_timeout_ms: 0,
            autohide_duration_ms: 50,
            ..Settings::default()
        });
        fixture.snapshot.publish(vec![window("sh", "term")]);
        fixture.actor.handle_event(Event::Refresh);

        // Let the dock time out and hide.
        std::thread::sleep(std::time::Duration::from_millis(5));
        for _ in 0..20 {
            std::thread::sleep(std::time::Duration::from_millis(5));
            fixture.actor.handle_event(Event::Tick);
        }
        assert_eq!(DockState::Hidden, fixture.actor.visibility());

        // A new class appears; the next refresh must start revealing.
        fixture
            .snapshot
            .publish(vec![window("sh", "term"), window("home", "files")]);
        fixture.actor.handle_event(Event::Refresh);
        fixture.actor.handle_event(Event::Tick);
        assert_eq!(DockState::Showing, fixture.actor.visibility());
    }

    #[test]
    fn tick_applies_offsets_while_animating() {
        let mut fixture = fixture(Settings {
            autohide: true,
            autohide_timeout_ms: 0,
            autohide_duration_ms: 50,
            ..Settings::default()
        });

        std::thread::sleep(std::time::Duration::from_millis(5));
        fixture.actor.handle_event(Event::Tick);
        assert_eq!(DockState::Hiding, fixture.actor.visibility());

        fixture.actor.handle_event(Event::Tick);
        assert!(
            fixture
                .calls
                .lock()
                .iter()
                .any(|c| matches!(c, SurfaceCall::Offset(_)))
        );
    }

    #[test]
    fn pin_action_moves_entry_into_the_pinned_block() {
        let mut fixture = fixture(Settings::default());
        fixture
            .snapshot
            .publish(vec![window("sh", "term"), window("home", "files")]);
        fixture.actor.handle_event(Event::Refresh);
        assert_eq!(2, fixture.actor.entries().len());

        let files_index = fixture
            .actor
            .entries()
            .iter()
            .position(|e| e.name == "Files")
            .unwrap();
        fixture
            .actor
            .handle_event(Event::Action(EntryAction::Pin { entry: files_index }));

        let entries = fixture.actor.entries();
        assert_eq!(3, entries.len());
        assert_eq!("Files", entries[0].name);
        assert!(entries[0].pinned);
        assert!(entries[1].is_separator());
        assert_eq!("Term", entries[2].name);
    }

    #[test]
    fn unpin_action_restores_the_plain_block() {
        let mut fixture = fixture(Settings::default());
        fixture.snapshot.publish(vec![window("sh", "term")]);
        fixture.actor.handle_event(Event::Refresh);
        fixture.actor.handle_event(Event::Action(EntryAction::Pin { entry: 0 }));
        assert!(fixture.actor.entries()[0].pinned);

        fixture.actor.handle_event(Event::Action(EntryAction::Unpin { entry: 0 }));
        let entries = fixture.actor.entries();
        assert_eq!(1, entries.len());
        assert!(!entries[0].pinned);
    }

    #[test]
    fn launcher_entry_is_appended_when_enabled() {
        let mut fixture = fixture(Settings {
            draw_launcher: true,
            launcher_cmd: "fuzzel".to_string(),
            ..Settings::default()
        });
        fixture.snapshot.publish(vec![window("sh", "term")]);
        fixture.actor.handle_event(Event::Refresh);

        let entries = fixture.actor.entries();
        assert_eq!("Launcher", entries.last().unwrap().name);
        assert_eq!("fuzzel", entries.last().unwrap().exec);
    }

    #[test]
    fn shutdown_and_quit_stop_the_actor() {
        let mut shutdown_fixture = fixture(Settings::default());
        assert!(!shutdown_fixture.actor.handle_event(Event::Shutdown));

        let mut quit_fixture = fixture(Settings::default());
        assert!(!quit_fixture.actor.handle_event(Event::Action(EntryAction::Quit)));
    }

    #[test]
    fn out_of_range_action_is_ignored() {
        let mut fixture = fixture(Settings::default());
        assert!(fixture.actor.handle_event(Event::Action(EntryAction::CloseAll { entry: 9 })));
    }

    #[test]
    fn settings_update_rebuilds_with_new_geometry() {
        let mut fixture = fixture(Settings::default());
        fixture.snapshot.publish(vec![window("sh", "term")]);
        fixture.actor.handle_event(Event::Refresh);
        let rebuilds = rebuild_count(&fixture.calls);

        let mut settings = Settings::default();
        settings.icon_size = 64;
        fixture.actor.handle_event(Event::SettingsUpdated(settings));
        assert_eq!(rebuilds + 1, rebuild_count(&fixture.calls));
    }
}
