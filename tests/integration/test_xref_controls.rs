//! Integration tests for markup cross-references

use crate::common::{TestProject, sample_app, sample_project};
use std::collections::HashSet;
use std::sync::Arc;
use ui5_atlas::WorkspaceEvent;

const MAIN: &str = "App.controller.Main";

#[test]
fn test_control_id_resolves_with_single_tokenization() {
    let project = sample_project();
    let (ws, _) = project.open();
    let view_path = project.path("webapp/view/Main.view.xml");

    let view = ws.index().document(&view_path).unwrap();
    assert_eq!(view.controller_name.as_deref(), Some(MAIN));

    let xref = ws.xref();
    assert_eq!(
        xref.control_class_for_id(MAIN, "b1").as_deref(),
        Some("sap.m.Button")
    );
    assert_eq!(view.parse_count(), 1);

    // Repeated queries reuse the cached tags and id map
    assert_eq!(
        xref.control_class_for_id(MAIN, "b1").as_deref(),
        Some("sap.m.Button")
    );
    assert_eq!(
        xref.control_class_for_id(MAIN, "page").as_deref(),
        Some("sap.m.Page")
    );
    assert!(xref.is_event_handler(MAIN, "onPress"));
    assert_eq!(view.parse_count(), 1);
    assert!(Arc::ptr_eq(&view, &ws.index().document(&view_path).unwrap()));
}

#[test]
fn test_control_ids_reach_embedded_fragments() {
    let project = sample_project();
    let (ws, _) = project.open();

    let xref = ws.xref();
    assert_eq!(
        xref.control_class_for_id(MAIN, "nameInput").as_deref(),
        Some("sap.m.Input")
    );
    assert_eq!(xref.control_class_for_id(MAIN, "missing"), None);
    assert_eq!(
        xref.control_class_for_id("App.controller.BaseController", "b1"),
        None
    );
}

#[test]
fn test_changed_view_replaces_document() {
    let project = sample_project();
    let (ws, _) = project.open();
    let view_path = project.path("webapp/view/Main.view.xml");
    let before = ws.index().document(&view_path).unwrap();

    let edited = sample_app::MAIN_VIEW.replace(r#"id="b1""#, r#"id="b2""#);
    ws.handle_event(WorkspaceEvent::Changed {
        path: view_path.clone(),
        content: edited,
    })
    .unwrap();

    let after = ws.index().document(&view_path).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.parse_count(), 0);
    assert_eq!(ws.xref().control_class_for_id(MAIN, "b1"), None);
    assert_eq!(
        ws.xref().control_class_for_id(MAIN, "b2").as_deref(),
        Some("sap.m.Button")
    );
}

#[test]
fn test_malformed_view_keeps_tags_before_the_error() {
    let project = sample_project();
    project.add_file(
        "webapp/view/Broken.view.xml",
        r#"<mvc:View controllerName="App.controller.Main" xmlns:mvc="sap.ui.core.mvc" xmlns:m="sap.m">
	<m:Button id="early" press=".onPress"/>
	<m:Text id="late text="oops"#,
    );
    let (ws, _) = project.open();

    let doc = ws
        .index()
        .document(&project.path("webapp/view/Broken.view.xml"))
        .unwrap();
    assert_eq!(doc.class_for_id("early"), Some("sap.m.Button"));
    assert_eq!(doc.class_for_id("late"), None);
    assert_eq!(
        ws.xref().control_class_for_id(MAIN, "early").as_deref(),
        Some("sap.m.Button")
    );
}

const CONTROLLER: &str = r#"sap.ui.define(["sap/ui/core/mvc/Controller"], function (Controller) {
	"use strict";
	return Controller.extend("App.controller.Main", {
		onPress: function () {}
	});
});
"#;

const POPUP_OWNER: &str = r#"sap.ui.define([
	"sap/ui/core/mvc/Controller",
	"sap/ui/core/Fragment"
], function (Controller, Fragment) {
	"use strict";
	return Controller.extend("App.controller.Popups", {
		open: function () {
			return Fragment.load({ name: "App.view.Popup", controller: this });
		}
	});
});
"#;

const EXTENDED_MANIFEST: &str = r#"{
    "sap.app": { "id": "App" },
    "sap.ui5": {
        "extends": {
            "extensions": {
                "sap.ui.viewExtensions": {
                    "App.view.Main": {
                        "extraContent": {
                            "className": "sap.ui.core.Fragment",
                            "fragmentName": "App.ext.Extra",
                            "type": "XML"
                        }
                    }
                },
                "sap.ui.controllerReplacements": {
                    "App.controller.Main": "App.ext.MainExt"
                }
            }
        }
    }
}
"#;

const MAIN_EXT: &str = r#"sap.ui.define(["App/controller/Main"], function (Main) {
	"use strict";
	return Main.extend("App.ext.MainExt", {});
});
"#;

fn fragment(id: &str) -> String {
    format!(r#"<core:FragmentDefinition xmlns="sap.m" xmlns:core="sap.ui.core"><Text id="{id}"/></core:FragmentDefinition>"#)
}

/// A view including an outer fragment that includes an inner one, a
/// fragment only mentioned in a controller, and a fragment plugged in via
/// a manifest view extension
fn fragment_project() -> TestProject {
    let project = TestProject::new();
    project.add_file("webapp/manifest.json", EXTENDED_MANIFEST);
    project.add_file("webapp/controller/Main.controller.js", CONTROLLER);
    project.add_file("webapp/controller/Popups.controller.js", POPUP_OWNER);
    project.add_file("webapp/ext/MainExt.controller.js", MAIN_EXT);
    project.add_file(
        "webapp/view/Main.view.xml",
        r#"<mvc:View controllerName="App.controller.Main" xmlns:mvc="sap.ui.core.mvc" xmlns:core="sap.ui.core">
	<core:Fragment fragmentName="App.view.Outer" type="XML"/>
	<core:ExtensionPoint name="extraContent"/>
</mvc:View>
"#,
    );
    project.add_file(
        "webapp/view/Outer.fragment.xml",
        r#"<core:FragmentDefinition xmlns:core="sap.ui.core">
	<core:Fragment fragmentName="App.view.Inner" type="XML"/>
</core:FragmentDefinition>
"#,
    );
    project.add_file("webapp/view/Inner.fragment.xml", &fragment("inner"));
    project.add_file("webapp/view/Popup.fragment.xml", &fragment("popup"));
    project.add_file("webapp/ext/Extra.fragment.xml", &fragment("extra"));
    project.add_file("webapp/view/Orphan.fragment.xml", &fragment("orphan"));
    project
}

#[test]
fn test_fragment_controller_precedence() {
    let project = fragment_project();
    let (ws, stats) = project.open();
    assert_eq!(stats.files_failed, 0);

    let controller_of = |path: &str| ws.responsible_controller(&project.path(path));

    assert_eq!(controller_of("webapp/view/Main.view.xml").as_deref(), Some(MAIN));
    assert_eq!(controller_of("webapp/view/Outer.fragment.xml").as_deref(), Some(MAIN));
    assert_eq!(controller_of("webapp/view/Inner.fragment.xml").as_deref(), Some(MAIN));
    assert_eq!(
        controller_of("webapp/view/Popup.fragment.xml").as_deref(),
        Some("App.controller.Popups")
    );
    assert_eq!(
        controller_of("webapp/ext/Extra.fragment.xml").as_deref(),
        Some("App.ext.MainExt")
    );
    assert_eq!(controller_of("webapp/view/Orphan.fragment.xml"), None);
}

#[test]
fn test_fragment_controller_survives_inclusion_cycles() {
    let project = TestProject::new();
    project.add_file("webapp/manifest.json", sample_app::MANIFEST);
    project.add_file(
        "webapp/view/Ping.fragment.xml",
        r#"<core:FragmentDefinition xmlns:core="sap.ui.core"><core:Fragment fragmentName="App.view.Pong"/></core:FragmentDefinition>"#,
    );
    project.add_file(
        "webapp/view/Pong.fragment.xml",
        r#"<core:FragmentDefinition xmlns:core="sap.ui.core"><core:Fragment fragmentName="App.view.Ping"/></core:FragmentDefinition>"#,
    );
    let (ws, _) = project.open();

    let mut visited = HashSet::new();
    assert_eq!(ws.xref().fragment_controller("App.view.Ping", &mut visited), None);
    assert!(visited.contains("App.view.Ping"));
    assert!(visited.contains("App.view.Pong"));
}

#[test]
fn test_controller_ids_include_mentioned_fragments() {
    let project = fragment_project();
    let (ws, _) = project.open();

    let xref = ws.xref();
    assert_eq!(
        xref.control_class_for_id("App.controller.Popups", "popup").as_deref(),
        Some("sap.m.Text")
    );
    assert_eq!(
        xref.control_class_for_id(MAIN, "inner").as_deref(),
        Some("sap.m.Text")
    );
    assert_eq!(xref.control_class_for_id(MAIN, "popup"), None);
}

#[test]
fn test_documents_for_controller() {
    let project = fragment_project();
    let (ws, _) = project.open();

    let paths: Vec<_> = ws
        .xref()
        .documents_for_controller(MAIN)
        .iter()
        .map(|d| d.fs_path.clone())
        .collect();
    assert_eq!(
        paths,
        vec![
            project.path("webapp/view/Inner.fragment.xml"),
            project.path("webapp/view/Main.view.xml"),
            project.path("webapp/view/Outer.fragment.xml"),
        ]
    );
}

#[test]
fn test_fragment_mentions_match_the_whole_name() {
    let project = TestProject::new();
    project.add_file("webapp/manifest.json", sample_app::MANIFEST);
    project.add_file(
        "webapp/controller/Dialogs.controller.js",
        r#"sap.ui.define(["sap/ui/core/mvc/Controller", "sap/ui/core/Fragment"], function (Controller, Fragment) {
	"use strict";
	return Controller.extend("App.controller.Dialogs", {
		open: function () {
			return Fragment.load({ name: "App.view.DialogExtra", controller: this });
		}
	});
});
"#,
    );
    project.add_file("webapp/view/Dialog.fragment.xml", &fragment("dialog"));
    project.add_file("webapp/view/DialogExtra.fragment.xml", &fragment("extra"));
    let (ws, _) = project.open();

    let xref = ws.xref();
    let controller = "App.controller.Dialogs";
    assert_eq!(
        xref.control_class_for_id(controller, "extra").as_deref(),
        Some("sap.m.Text")
    );
    assert_eq!(xref.control_class_for_id(controller, "dialog"), None);
    assert_eq!(
        ws.responsible_controller(&project.path("webapp/view/DialogExtra.fragment.xml"))
            .as_deref(),
        Some(controller)
    );
    assert_eq!(
        ws.responsible_controller(&project.path("webapp/view/Dialog.fragment.xml")),
        None
    );
}
