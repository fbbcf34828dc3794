use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::model::entry::WindowInstance;
use crate::sys::window_list::WindowListQuery;

pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The shared window snapshot. The poller publishes a fresh immutable batch
/// by swapping the inner Arc; readers clone it out under the lock and can
/// never observe a partially written list.
#[derive(Clone)]
pub struct SharedSnapshot {
    inner: Arc<Mutex<Arc<[WindowInstance]>>>,
}

impl SharedSnapshot {
    pub fn new() -> SharedSnapshot {
        SharedSnapshot {
            inner: Arc::new(Mutex::new(Arc::from(Vec::new()))),
        }
    }

    pub fn publish(&self, instances: Vec<WindowInstance>) {
        *self.inner.lock() = Arc::from(instances);
    }

    pub fn load(&self) -> Arc<[WindowInstance]> { self.inner.lock().clone() }
}

impl Default for SharedSnapshot {
    fn default() -> Self { Self::new() }
}

/// Background thread that refreshes the snapshot every [`POLL_INTERVAL`]
/// until stopped. Shutdown is cooperative: clear the flag, then join.
pub struct InstancePoller {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl InstancePoller {
    pub fn spawn(query: WindowListQuery, snapshot: SharedSnapshot) -> InstancePoller {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let thread = std::thread::Builder::new()
            .name("instance-poller".to_string())
            .spawn(move || {
                debug!("instance poller started");
                while flag.load(Ordering::Relaxed) {
                    let instances = query.query();
                    trace!(count = instances.len(), "window snapshot refreshed");
                    snapshot.publish(instances);
                    std::thread::sleep(POLL_INTERVAL);
                }
                debug!("instance poller stopped");
            })
            .expect("failed to spawn instance-poller thread");

        InstancePoller {
            running,
            thread: Some(thread),
        }
    }

    pub fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            _ = thread.join();
        }
    }
}
