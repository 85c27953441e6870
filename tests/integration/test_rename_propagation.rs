//! Integration tests for member rename propagation

use crate::common::{TestProject, offset_in, offset_of};
use std::fs;
use std::path::PathBuf;
use ui5_atlas::rename::{apply_edits, group_by_file};
use ui5_atlas::{Edit, Workspace, WorkspaceError, WorkspaceEvent};

const MANIFEST: &str = r#"{ "sap.app": { "id": "App" } }"#;

const MAIN: &str = r#"sap.ui.define([
	"sap/ui/core/mvc/Controller"
], function (Controller) {
	"use strict";

	return Controller.extend("App.controller.Main", {
		onPress: function (oEvent) {
		}
	});
});
"#;

const VIEW: &str = r#"<mvc:View controllerName="App.controller.Main" xmlns:mvc="sap.ui.core.mvc" xmlns:m="sap.m">
	<m:Button id="b1" text="Go" press="onPress"/>
</mvc:View>
"#;

const DETAIL: &str = r#"sap.ui.define([
	"./Main"
], function (Main) {
	"use strict";

	return Main.extend("App.controller.Detail", {
		onInit: function () {
			this.onPress();
			var oOther = this._unknown;
			oOther.onPress();
		}
	});
});
"#;

fn minimal_project() -> TestProject {
    let project = TestProject::new();
    project.add_file("webapp/manifest.json", MANIFEST);
    project.add_file("webapp/controller/Main.controller.js", MAIN);
    project.add_file("webapp/view/Main.view.xml", VIEW);
    project
}

fn main_path(project: &TestProject) -> PathBuf {
    project.path("webapp/controller/Main.controller.js")
}

fn view_path(project: &TestProject) -> PathBuf {
    project.path("webapp/view/Main.view.xml")
}

/// Write the edits to disk and tell the workspace about the new contents
fn apply_to_disk(ws: &Workspace, edits: &[Edit]) {
    for (path, file_edits) in group_by_file(edits) {
        let text = fs::read_to_string(&path).unwrap();
        let updated = apply_edits(&text, &file_edits);
        fs::write(&path, &updated).unwrap();
        ws.handle_event(WorkspaceEvent::Changed {
            path,
            content: updated,
        })
        .unwrap();
    }
}

#[test]
fn test_rename_handler_edits_declaration_and_binding() {
    let project = minimal_project();
    let (ws, _) = project.open();

    let target = ws
        .prepare_rename(&main_path(&project), offset_of(MAIN, "onPress"))
        .unwrap();
    assert_eq!(target.class_name, "App.controller.Main");
    assert_eq!(target.member_name, "onPress");
    assert_eq!(target.fs_path, main_path(&project));

    let edits = ws.rename(&target, "onClick");
    assert_eq!(edits.len(), 2);

    let declaration = offset_of(MAIN, "onPress");
    let binding = offset_of(VIEW, "onPress");
    assert!(edits.iter().any(|e| e.file_path == main_path(&project)
        && e.range.start == declaration
        && e.range.end == declaration + "onPress".len()));
    assert!(edits.iter().any(|e| e.file_path == view_path(&project)
        && e.range.start == binding
        && e.range.end == binding + "onPress".len()));
    assert!(edits.iter().all(|e| e.replacement == "onClick"));
}

#[test]
fn test_prepare_rename_from_markup_binding() {
    let project = minimal_project();
    let (ws, _) = project.open();

    let target = ws
        .prepare_rename(&view_path(&project), offset_of(VIEW, "onPress") + 2)
        .unwrap();
    assert_eq!(target.member_name, "onPress");
    assert_eq!(target.fs_path, main_path(&project));

    let location = ws
        .find_definition(&view_path(&project), offset_of(VIEW, "onPress"))
        .unwrap();
    assert_eq!(location.file_path, main_path(&project));
    assert_eq!(location.offset, offset_of(MAIN, "onPress"));
}

#[test]
fn test_prepare_rename_rejects_builtin_members() {
    let project = minimal_project();
    project.add_file(
        "webapp/controller/Other.controller.js",
        r#"sap.ui.define(["sap/ui/core/mvc/Controller"], function (Controller) {
	return Controller.extend("App.controller.Other", {
		onInit: function () {
			this.getView();
		}
	});
});
"#,
    );
    let (ws, _) = project.open();

    let path = project.path("webapp/controller/Other.controller.js");
    let result = ws.prepare_rename(&path, offset_in(&path, "getView"));
    assert!(matches!(result, Err(WorkspaceError::NothingToRename { .. })));

    // `sap` in `sap.ui.define` is an object, not a member
    let result = ws.prepare_rename(&path, 0);
    assert!(result.is_err());
}

#[test]
fn test_rename_follows_resolved_accesses_only() {
    let project = minimal_project();
    let detail_path = project.add_file("webapp/controller/Detail.controller.js", DETAIL);
    let (ws, _) = project.open();

    let target = ws
        .prepare_rename(&main_path(&project), offset_of(MAIN, "onPress"))
        .unwrap();
    let edits = ws.rename(&target, "onClick");

    // Declaration, view binding and the access on `this` in the subclass.
    // The access on an unresolved local is left alone.
    assert_eq!(edits.len(), 3);
    let in_detail: Vec<&Edit> = edits.iter().filter(|e| e.file_path == detail_path).collect();
    assert_eq!(in_detail.len(), 1);
    assert_eq!(in_detail[0].range.start, offset_of(DETAIL, "onPress"));
}

#[test]
fn test_rename_from_subclass_access_targets_declaration() {
    let project = minimal_project();
    let detail_path = project.add_file("webapp/controller/Detail.controller.js", DETAIL);
    let (ws, _) = project.open();

    let target = ws
        .prepare_rename(&detail_path, offset_of(DETAIL, "onPress") + 1)
        .unwrap();
    assert_eq!(target.class_name, "App.controller.Main");
    assert_eq!(target.fs_path, main_path(&project));
    assert_eq!(target.range.start, offset_of(MAIN, "onPress"));
}

#[test]
fn test_rename_round_trip_restores_sources() {
    let project = minimal_project();
    let (ws, _) = project.open();

    let target = ws
        .prepare_rename(&main_path(&project), offset_of(MAIN, "onPress"))
        .unwrap();
    let edits = ws.rename(&target, "onClick");
    apply_to_disk(&ws, &edits);

    let renamed = fs::read_to_string(main_path(&project)).unwrap();
    assert!(renamed.contains("onClick: function"));
    assert!(fs::read_to_string(view_path(&project))
        .unwrap()
        .contains(r#"press="onClick""#));
    assert!(ws.xref().is_event_handler("App.controller.Main", "onClick"));

    let target = ws
        .prepare_rename(&main_path(&project), offset_of(&renamed, "onClick"))
        .unwrap();
    let edits = ws.rename(&target, "onPress");
    assert_eq!(edits.len(), 2);
    apply_to_disk(&ws, &edits);

    assert_eq!(fs::read_to_string(main_path(&project)).unwrap(), MAIN);
    assert_eq!(fs::read_to_string(view_path(&project)).unwrap(), VIEW);
}

const BASE: &str = r#"sap.ui.define([
	"sap/ui/core/mvc/Controller"
], function (Controller) {
	"use strict";

	return Controller.extend("App.controller.Base", {
		onPress: function (oEvent) {
		}
	});
});
"#;

const INHERITING_MAIN: &str = r#"sap.ui.define([
	"./Base"
], function (Base) {
	"use strict";

	return Base.extend("App.controller.Main", {
		onInit: function () {
		}
	});
});
"#;

/// The Main view binds a handler that Main inherits from Base
fn inherited_handler_project() -> TestProject {
    let project = TestProject::new();
    project.add_file("webapp/manifest.json", MANIFEST);
    project.add_file("webapp/controller/Base.js", BASE);
    project.add_file("webapp/controller/Main.controller.js", INHERITING_MAIN);
    project.add_file("webapp/view/Main.view.xml", VIEW);
    project
}

#[test]
fn test_rename_inherited_handler_edits_subclass_view() {
    let project = inherited_handler_project();
    let (ws, _) = project.open();
    let base_path = project.path("webapp/controller/Base.js");

    let target = ws
        .prepare_rename(&view_path(&project), offset_of(VIEW, "onPress"))
        .unwrap();
    assert_eq!(target.class_name, "App.controller.Base");
    assert_eq!(target.fs_path, base_path);

    let edits = ws.rename(&target, "onClick");
    assert_eq!(edits.len(), 2);
    assert!(edits
        .iter()
        .any(|e| e.file_path == base_path && e.range.start == offset_of(BASE, "onPress")));
    assert!(edits
        .iter()
        .any(|e| e.file_path == view_path(&project) && e.range.start == offset_of(VIEW, "onPress")));

    // Starting from the declaration gives the same edit set
    let from_declaration = ws
        .prepare_rename(&base_path, offset_of(BASE, "onPress"))
        .unwrap();
    assert_eq!(from_declaration, target);
    assert_eq!(ws.rename(&from_declaration, "onClick").len(), 2);
}

#[test]
fn test_inherited_handler_is_flagged_on_declaring_class() {
    let project = inherited_handler_project();
    let (ws, _) = project.open();

    let members = ws.members_of("App.controller.Base").unwrap();
    let on_press = members.iter().find(|m| m.name == "onPress").unwrap();
    assert!(on_press.is_event_handler);
    assert!(ws.xref().is_event_handler("App.controller.Main", "onPress"));
}
