//! Integration tests for class name to file path mapping and workspace events
//! against an in-memory source tree

use crate::common::TestProject;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ui5_atlas::workspace::{MemorySource, SourceKind, WorkspaceIndex};
use ui5_atlas::{Workspace, WorkspaceEvent};

const MANIFEST_PATH: &str = "/proj/webapp/manifest.json";
const PLAIN: &str = "/proj/webapp/controller/Main.js";
const CONTROLLER: &str = "/proj/webapp/controller/Main.controller.js";

fn memory_index(files: &[&str]) -> (Arc<MemorySource>, WorkspaceIndex) {
    let source = Arc::new(MemorySource::new());
    source.insert(MANIFEST_PATH, r#"{"sap.app": {"id": "App"}}"#);
    for file in files {
        source.insert(*file, "");
    }
    let index = WorkspaceIndex::new(source.clone());
    index.load_manifest(Path::new(MANIFEST_PATH)).unwrap();
    source.clear_probes();
    (source, index)
}

#[test]
fn test_script_probes_plain_name_before_controller_name() {
    let (source, index) = memory_index(&[CONTROLLER]);

    assert_eq!(
        index.resolve_fs_path("App.controller.Main", SourceKind::Script),
        Some(PathBuf::from(CONTROLLER))
    );
    assert_eq!(
        source.probes(),
        vec![PathBuf::from(PLAIN), PathBuf::from(CONTROLLER)]
    );
}

#[test]
fn test_plain_script_wins_when_both_exist() {
    let (source, index) = memory_index(&[PLAIN, CONTROLLER]);

    assert_eq!(
        index.resolve_fs_path("App.controller.Main", SourceKind::Script),
        Some(PathBuf::from(PLAIN))
    );
    assert_eq!(source.probes(), vec![PathBuf::from(PLAIN)]);
}

#[test]
fn test_missing_script_probes_both_candidates() {
    let (source, index) = memory_index(&[]);

    assert_eq!(
        index.resolve_fs_path("App.controller.Main", SourceKind::Script),
        None
    );
    assert_eq!(
        source.probes(),
        vec![PathBuf::from(PLAIN), PathBuf::from(CONTROLLER)]
    );

    // A class outside every component is never probed
    source.clear_probes();
    assert_eq!(index.resolve_fs_path("Other.Main", SourceKind::Script), None);
    assert!(source.probes().is_empty());
}

#[test]
fn test_nested_component_owns_its_classes() {
    let (source, index) = memory_index(&[]);
    source.insert(
        "/proj/webapp/reuse/manifest.json",
        r#"{"sap.app": {"id": "App.reuse"}}"#,
    );
    index
        .load_manifest(Path::new("/proj/webapp/reuse/manifest.json"))
        .unwrap();
    source.insert("/proj/webapp/reuse/util/Formatter.js", "");

    assert_eq!(
        index.resolve_fs_path("App.reuse.util.Formatter", SourceKind::Script),
        Some(PathBuf::from("/proj/webapp/reuse/util/Formatter.js"))
    );
    assert_eq!(
        index
            .resolve_class_name_for_path(Path::new("/proj/webapp/reuse/util/Formatter.js"))
            .as_deref(),
        Some("App.reuse.util.Formatter")
    );
}

const MAIN_SOURCE: &str = r#"sap.ui.define(["sap/ui/core/mvc/Controller"], function (Controller) {
	"use strict";
	return Controller.extend("App.controller.Main", {
		onPress: function () {}
	});
});
"#;

fn memory_workspace(project: &TestProject) -> (Arc<MemorySource>, Workspace) {
    let source = Arc::new(MemorySource::new());
    source.insert(MANIFEST_PATH, r#"{"sap.app": {"id": "App"}}"#);
    source.insert(CONTROLLER, MAIN_SOURCE);
    let ws = Workspace::with_source(project.settings(), source.clone()).unwrap();
    ws.handle_event(WorkspaceEvent::Created {
        path: PathBuf::from(MANIFEST_PATH),
    })
    .unwrap();
    (source, ws)
}

#[test]
fn test_classes_load_lazily_through_the_source() {
    let project = TestProject::new();
    let (_, ws) = memory_workspace(&project);

    assert!(ws.classes().is_empty());
    let def = ws.class("App.controller.Main").unwrap();
    assert!(def.is_project());
    assert_eq!(def.fs_path(), Some(Path::new(CONTROLLER)));
    assert!(def.has_member("onPress"));
    assert_eq!(ws.classes().build_count(), 1);
}

#[test]
fn test_script_events_replace_and_remove_classes() {
    let project = TestProject::new();
    let (source, ws) = memory_workspace(&project);
    ws.class("App.controller.Main").unwrap();

    let edited = MAIN_SOURCE.replace("onPress", "onSave");
    ws.handle_event(WorkspaceEvent::Changed {
        path: PathBuf::from(CONTROLLER),
        content: edited,
    })
    .unwrap();
    let def = ws.class("App.controller.Main").unwrap();
    assert!(def.has_member("onSave"));
    assert!(!def.has_member("onPress"));

    source.remove(Path::new(CONTROLLER));
    ws.handle_event(WorkspaceEvent::Deleted {
        path: PathBuf::from(CONTROLLER),
    })
    .unwrap();
    assert!(ws.class("App.controller.Main").is_none());
}

#[test]
fn test_scripts_outside_components_are_ignored() {
    let project = TestProject::new();
    let (_, ws) = memory_workspace(&project);

    ws.handle_event(WorkspaceEvent::Changed {
        path: PathBuf::from("/elsewhere/Tool.js"),
        content: MAIN_SOURCE.to_string(),
    })
    .unwrap();
    assert!(ws.classes().is_empty());
}

#[test]
fn test_manifest_removal_drops_class_models() {
    let project = TestProject::new();
    let (source, ws) = memory_workspace(&project);
    ws.class("App.controller.Main").unwrap();

    source.remove(Path::new(MANIFEST_PATH));
    ws.handle_event(WorkspaceEvent::Deleted {
        path: PathBuf::from(MANIFEST_PATH),
    })
    .unwrap();

    assert!(ws.index().manifests().is_empty());
    assert!(ws.classes().is_empty());
    assert!(ws.class("App.controller.Main").is_none());
}
