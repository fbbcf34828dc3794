pub mod desktop_file;
pub mod engine;
pub mod index;

pub use engine::{MonitorFilter, ResolutionEngine};
pub use index::{DesktopFileIndex, XdgPaths};
