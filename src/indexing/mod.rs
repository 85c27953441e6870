//! Workspace discovery and the initial scan

pub mod progress;
pub mod scan;
pub mod walker;

pub use progress::{IndexStats, NoProgress, ScanPhase, ScanProgress};
pub use scan::scan_workspace;
pub use walker::{FileWalker, WorkspaceFiles};
