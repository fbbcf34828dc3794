use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use ledge_dock::actor::dock::{self, DockActor};
use ledge_dock::actor::poller::{InstancePoller, SharedSnapshot};
use ledge_dock::actor::settings_watcher::SettingsWatcher;
use ledge_dock::common::config::{self, Edge, Settings};
use ledge_dock::common::log;
use ledge_dock::model::entry::AppEntry;
use ledge_dock::model::pin_store::{self, PinStore};
use ledge_dock::resolver::desktop_file::NoThemeLookup;
use ledge_dock::resolver::{DesktopFileIndex, MonitorFilter, ResolutionEngine, XdgPaths};
use ledge_dock::sys::session::{self, SessionKind};
use ledge_dock::sys::window_control::WindowControl;
use ledge_dock::sys::window_list::WindowListQuery;
use ledge_dock::ui::TraceSurface;
use tracing::{info, warn};

#[derive(Parser)]
struct Cli {
    /// Monitor index the dock is placed on (overrides the settings file).
    #[arg(long)]
    display: Option<i32>,

    /// Screen edge the dock rests on: left, top, right or bottom.
    #[arg(long)]
    edge: Option<Edge>,

    /// Path to the settings file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Check the settings file without starting the dock.
    #[arg(long)]
    validate: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the current window list once and print the entries as JSON.
    Dump,
}

fn main() {
    sigpipe::reset();
    let opt = Cli::parse();

    if std::env::var_os("RUST_BACKTRACE").is_none() {
        // SAFETY: We are single threaded at this point.
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }
    log::init_logging();
    install_panic_hook();

    let settings_path = opt.config.clone().unwrap_or_else(config::settings_file);
    let mut settings = if settings_path.exists() {
        match Settings::read(&settings_path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("failed to read {}: {}", settings_path.display(), e);
                process::exit(1);
            }
        }
    } else {
        Settings::default()
    };
    if let Some(display) = opt.display {
        settings.display_index = display;
    }
    if let Some(edge) = opt.edge {
        settings.edge = edge;
    }

    if opt.validate {
        let issues = settings.validate();
        if issues.is_empty() {
            println!("Settings validation passed");
        } else {
            for issue in issues {
                eprintln!("{}", issue);
            }
            process::exit(1);
        }
        return;
    }

    for issue in settings.validate() {
        warn!("settings: {}", issue);
    }

    let session = SessionKind::detect();
    let engine = ResolutionEngine::new(
        DesktopFileIndex::discover(&XdgPaths::from_env()),
        Box::new(NoThemeLookup),
    );
    let pins = PinStore::new(config::pin_file());

    if let Some(Commands::Dump) = opt.command {
        dump_entries(&settings, &engine, &pins);
        return;
    }

    info!(?session, edge = %settings.edge, "ledge starting");

    let snapshot = SharedSnapshot::new();
    let poller = InstancePoller::spawn(
        WindowListQuery::new(settings.window_list_cmd.clone()),
        snapshot.clone(),
    );

    let (dock_tx, dock_rx) = ledge_dock::actor::channel();

    SettingsWatcher::spawn(dock_tx.clone(), settings_path);

    let ctrlc_tx = dock_tx.clone();
    ctrlc::set_handler(move || {
        ctrlc_tx.send(dock::Event::Shutdown);
    })
    .expect("Error setting Ctrl+C handler");

    let actor = DockActor::new(
        settings,
        session,
        engine,
        pins,
        WindowControl::new(session),
        snapshot,
        Box::new(TraceSurface),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("failed to build tokio runtime");

    runtime.block_on(async move {
        let tick_tx = dock_tx.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(dock::FRAME_INTERVAL);
            loop {
                tick.tick().await;
                tick_tx.send(dock::Event::Tick);
            }
        });

        let refresh_tx = dock_tx.clone();
        tokio::spawn(async move {
            let mut refresh = tokio::time::interval(dock::REFRESH_INTERVAL);
            loop {
                refresh.tick().await;
                refresh_tx.send(dock::Event::Refresh);
            }
        });

        actor.run(dock_rx).await;
    });

    poller.stop();
    info!("ledge stopped");
}

/// One-shot resolution of the current window list, for debugging descriptor
/// matching and pin merging without a running dock.
fn dump_entries(settings: &Settings, engine: &ResolutionEngine, pins: &PinStore) {
    let instances = WindowListQuery::new(settings.window_list_cmd.clone()).query();
    let filter = if settings.isolated_to_monitor && !session::is_only_instance("ledge") {
        MonitorFilter::Only(settings.display_index)
    } else {
        MonitorFilter::All
    };
    let live = engine.resolve(&instances, filter);
    let launcher = settings
        .draw_launcher
        .then(|| AppEntry::launcher(&settings.launcher_cmd, &settings.launcher_icon));
    let entries = pin_store::merge(live, pins.load(), launcher);

    match serde_json::to_string_pretty(&entries) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("failed to serialize entries: {}", e);
            process::exit(1);
        }
    }
}

#[cfg(panic = "unwind")]
fn install_panic_hook() {
    // Abort on panic instead of propagating panics to the main thread.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        original_hook(info);
        std::process::abort();
    }));
}

#[cfg(not(panic = "unwind"))]
fn install_panic_hook() {}
