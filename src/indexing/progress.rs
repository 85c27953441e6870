//! Progress reporting for workspace scans

use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Maximum number of errors kept in [`IndexStats::errors`]
pub const MAX_RECORDED_ERRORS: usize = 100;

/// Phase of a workspace scan, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    Manifests,
    Fragments,
    Views,
    Scripts,
}

impl ScanPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Manifests => "manifests",
            Self::Fragments => "fragments",
            Self::Views => "views",
            Self::Scripts => "scripts",
        }
    }
}

/// Receives coarse progress of a scan.
pub trait ScanProgress {
    fn phase_started(&mut self, _phase: ScanPhase, _total: usize) {}

    fn file_done(&mut self, _path: &std::path::Path) {}
}

/// Progress sink that ignores every report
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ScanProgress for NoProgress {}

/// Statistics collected during a scan
#[derive(Debug, Default, Serialize)]
pub struct IndexStats {
    /// Number of files successfully indexed
    pub files_indexed: usize,

    /// Number of files that failed to index
    pub files_failed: usize,

    pub manifests_found: usize,

    /// Project classes parsed into the registry
    pub classes_found: usize,

    /// Set when the scan stopped early on request
    pub cancelled: bool,

    /// Time elapsed during indexing
    pub elapsed: Duration,

    /// Errors encountered (limited to the first [`MAX_RECORDED_ERRORS`])
    pub errors: Vec<(PathBuf, String)>,

    #[serde(skip)]
    start_time: Option<Instant>,
}

impl IndexStats {
    /// Create new stats and start timing
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Stop timing and record elapsed time
    pub fn stop_timing(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed = start.elapsed();
            self.start_time = None;
        }
    }

    pub fn add_error(&mut self, path: PathBuf, error: String) {
        if self.errors.len() < MAX_RECORDED_ERRORS {
            self.errors.push((path, error));
        }
        self.files_failed += 1;
    }

    /// Display the statistics in a human-readable format
    pub fn display(&self) {
        if self.cancelled {
            println!("\nIndexing cancelled:");
        } else {
            println!("\nIndexing complete:");
        }
        println!("  Files indexed: {}", self.files_indexed);
        println!("  Files failed: {}", self.files_failed);
        println!("  Manifests: {}", self.manifests_found);
        println!("  Classes: {}", self.classes_found);
        println!("  Time elapsed: {:.2}s", self.elapsed.as_secs_f64());

        if !self.errors.is_empty() {
            println!("\nErrors (showing first {}):", self.errors.len().min(5));
            for (path, error) in &self.errors[..5.min(self.errors.len())] {
                println!("  {}: {}", path.display(), error);
            }
            if self.errors.len() > 5 {
                println!("  ... and {} more errors", self.errors.len() - 5);
            }
        }
    }
}
