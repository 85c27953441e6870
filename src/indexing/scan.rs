//! Initial workspace scan
//!
//! One synchronous pass over the roots: manifests first (class names depend
//! on them), then fragments, views and finally scripts. Cancellation is
//! honoured between files; a failing file is recorded and skipped.

use super::progress::{IndexStats, ScanPhase, ScanProgress};
use super::walker::{FileWalker, WorkspaceFiles};
use crate::workspace::Workspace;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Index every manifest, view, fragment and script under `roots`.
pub fn scan_workspace(
    ws: &Workspace,
    roots: &[PathBuf],
    cancel: &CancellationToken,
    progress: &mut dyn ScanProgress,
) -> IndexStats {
    let mut stats = IndexStats::new();

    let walker = FileWalker::new(ws.shared_settings());
    let mut files = WorkspaceFiles::default();
    for root in roots {
        let found = walker.collect(root);
        debug!("{} workspace files under {}", found.len(), root.display());
        files.manifests.extend(found.manifests);
        files.fragments.extend(found.fragments);
        files.views.extend(found.views);
        files.scripts.extend(found.scripts);
    }

    let phases = [
        (ScanPhase::Manifests, &files.manifests),
        (ScanPhase::Fragments, &files.fragments),
        (ScanPhase::Views, &files.views),
        (ScanPhase::Scripts, &files.scripts),
    ];

    'phases: for (phase, paths) in phases {
        progress.phase_started(phase, paths.len());
        for path in paths {
            if cancel.is_cancelled() {
                stats.cancelled = true;
                break 'phases;
            }
            match index_file(ws, phase, path, &mut stats) {
                Ok(()) => stats.files_indexed += 1,
                Err(reason) => stats.add_error(path.clone(), reason),
            }
            progress.file_done(path);
        }
        if phase == ScanPhase::Manifests {
            // Class names may have moved with the new roots
            ws.reset_class_models();
        }
    }

    stats.stop_timing();
    info!(
        "Indexed {} files ({} failed, {} classes){}",
        stats.files_indexed,
        stats.files_failed,
        stats.classes_found,
        if stats.cancelled { ", cancelled" } else { "" }
    );
    stats
}

fn index_file(ws: &Workspace, phase: ScanPhase, path: &Path, stats: &mut IndexStats) -> Result<(), String> {
    let index = ws.index();
    match phase {
        ScanPhase::Manifests => {
            index.load_manifest(path).map_err(|e| e.to_string())?;
            stats.manifests_found += 1;
        }
        ScanPhase::Fragments | ScanPhase::Views => {
            index
                .load_document(path)
                .ok_or_else(|| "unreadable markup document".to_string())?;
        }
        ScanPhase::Scripts => {
            let Some(class_name) = index.resolve_class_name_for_path(path) else {
                debug!("{} is outside every manifest root", path.display());
                return Ok(());
            };
            let text = index
                .source()
                .read_to_string(path)
                .map_err(|e| e.to_string())?;
            ws.classes()
                .set_new_source(&class_name, path, text)
                .map_err(|e| e.to_string())?;
            stats.classes_found += 1;
        }
    }
    Ok(())
}
