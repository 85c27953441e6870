//! Integration tests for expression and member type resolution

use crate::common::{TestProject, offset_of, sample_app, sample_project};
use std::sync::Arc;
use ui5_atlas::{MemberKind, TypeResolution, WorkspaceEvent};

const MAIN: &str = "App.controller.Main";

fn resolved(class_name: &str) -> TypeResolution {
    TypeResolution::resolved(class_name)
}

#[test]
fn test_scan_finds_sample_classes() {
    let project = sample_project();
    let (ws, stats) = project.open();

    assert_eq!(stats.manifests_found, 1);
    assert_eq!(stats.classes_found, 2);
    assert_eq!(stats.files_failed, 0);
    assert_eq!(
        ws.classes().project_class_names(),
        vec!["App.controller.BaseController", MAIN]
    );

    let main = ws.class(MAIN).unwrap();
    assert_eq!(
        main.parent_class_name.as_deref(),
        Some("App.controller.BaseController")
    );
    assert_eq!(
        main.resolve_alias("JSONModel"),
        Some("sap.ui.model.json.JSONModel")
    );
}

#[test]
fn test_local_variables_resolve_through_markup_and_inheritance() {
    let project = sample_project();
    let (ws, _) = project.open();
    let text = sample_app::MAIN_CONTROLLER;
    let resolver = ws.resolver();

    // byId on the controller goes through the view bound to it
    assert_eq!(
        resolver.type_of_expression_at(MAIN, offset_of(text, "oButton.setText")),
        resolved("sap.m.Button")
    );
    // byId on getView() reaches the fragment embedded in the view
    assert_eq!(
        resolver.type_of_expression_at(MAIN, offset_of(text, "oInput.setValue")),
        resolved("sap.m.Input")
    );
    // Return type inherited from BaseController, itself derived from builtins
    assert_eq!(
        resolver.type_of_expression_at(MAIN, offset_of(text, "oRouter.navTo")),
        resolved("sap.ui.core.routing.Router")
    );
    assert_eq!(
        resolver.type_of_expression_at(MAIN, offset_of(text, "MessageBox.show")),
        resolved("sap.m.MessageBox")
    );
}

#[test]
fn test_declaration_name_has_the_type_of_its_value() {
    let project = sample_project();
    let (ws, _) = project.open();
    let text = sample_app::MAIN_CONTROLLER;

    let at_name = ws
        .resolver()
        .type_of_expression_at(MAIN, offset_of(text, "oButton = "));
    assert_eq!(at_name, resolved("sap.m.Button"));
}

#[test]
fn test_conflicting_evidence_is_unresolved() {
    let project = sample_project();
    let (ws, _) = project.open();
    let text = sample_app::MAIN_CONTROLLER;

    // Button on one branch, Input on the other
    let result = ws
        .resolver()
        .type_of_expression_at(MAIN, offset_of(text, "oControl;"));
    assert_eq!(result, TypeResolution::Unresolved);
}

#[test]
fn test_member_types_and_event_handler_flags() {
    let project = sample_project();
    let (ws, _) = project.open();

    let members = ws.members_of(MAIN).unwrap();
    let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "onInit",
            "onPress",
            "getButton",
            "getModelRef",
            "getSelf",
            "pick",
            "showStatus",
            "_oModel"
        ]
    );

    let member = |name: &str| members.iter().find(|m| m.name == name).unwrap();
    assert_eq!(member("_oModel").kind, MemberKind::Field);
    assert_eq!(
        member("_oModel").inferred_type,
        resolved("sap.ui.model.json.JSONModel")
    );
    assert_eq!(member("getButton").inferred_type, resolved("sap.m.Button"));
    assert_eq!(
        member("getModelRef").inferred_type,
        resolved("sap.ui.model.json.JSONModel")
    );
    assert_eq!(member("pick").inferred_type, TypeResolution::Unresolved);
    assert_eq!(
        member("showStatus").inferred_type,
        resolved("sap.m.MessageToast")
    );
    assert_eq!(member("onInit").inferred_type, TypeResolution::Unresolved);

    assert!(member("onPress").is_event_handler);
    assert!(!member("onInit").is_event_handler);
    assert!(!member("getButton").is_event_handler);
}

#[test]
fn test_self_recursive_method_is_unresolved() {
    let project = sample_project();
    let (ws, _) = project.open();

    assert_eq!(
        ws.resolver().method_return_type(MAIN, "getSelf"),
        TypeResolution::Unresolved
    );
    // The in-progress marker was replaced by the final value
    assert_eq!(
        ws.resolver().method_return_type(MAIN, "getSelf"),
        TypeResolution::Unresolved
    );
}

#[test]
fn test_parent_edit_invalidates_inherited_return_type() {
    let project = sample_project();
    let (ws, _) = project.open();
    let text = sample_app::MAIN_CONTROLLER;
    let at_router = offset_of(text, "oRouter.navTo");

    assert_eq!(
        ws.resolver().type_of_expression_at(MAIN, at_router),
        resolved("sap.ui.core.routing.Router")
    );

    let edited = sample_app::BASE_CONTROLLER.replace(
        "return this.getOwnerComponent().getRouter();",
        "return this.getOwnerComponent();",
    );
    ws.handle_event(WorkspaceEvent::Changed {
        path: project.path("webapp/controller/BaseController.js"),
        content: edited,
    })
    .unwrap();

    assert_eq!(
        ws.resolver().type_of_expression_at(MAIN, at_router),
        resolved("sap.ui.core.UIComponent")
    );
}

#[test]
fn test_markup_edit_invalidates_controller_members() {
    let project = sample_project();
    let (ws, _) = project.open();

    assert_eq!(
        ws.resolver().method_return_type(MAIN, "getButton"),
        resolved("sap.m.Button")
    );

    let edited = sample_app::MAIN_VIEW.replace(
        r#"<m:Button id="b1" text="Go" press=".onPress"/>"#,
        r#"<m:Text id="b1" text="Go"/>"#,
    );
    ws.handle_event(WorkspaceEvent::Changed {
        path: project.path("webapp/view/Main.view.xml"),
        content: edited,
    })
    .unwrap();

    assert_eq!(
        ws.resolver().method_return_type(MAIN, "getButton"),
        resolved("sap.m.Text")
    );
}

#[test]
fn test_rebuilding_a_class_is_idempotent() {
    let project = sample_project();
    let (ws, _) = project.open();

    let first = ws.class(MAIN).unwrap();
    assert!(ws.classes().remove_class(MAIN));
    let second = ws.class(MAIN).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first.class_name, second.class_name);
    assert_eq!(first.parent_class_name, second.parent_class_name);
    assert_eq!(first.members, second.members);
    assert_eq!(first.aliases, second.aliases);
}

#[test]
fn test_unchanged_source_keeps_definition() {
    let project = sample_project();
    let (ws, _) = project.open();

    let before = ws.class(MAIN).unwrap();
    let builds = ws.classes().build_count();
    ws.handle_event(WorkspaceEvent::Changed {
        path: project.path("webapp/controller/Main.controller.js"),
        content: sample_app::MAIN_CONTROLLER.to_string(),
    })
    .unwrap();

    assert_eq!(ws.classes().build_count(), builds);
    assert!(Arc::ptr_eq(&before, &ws.class(MAIN).unwrap()));
}

const CYCLE_A: &str = r#"sap.ui.define(["./B"], function (B) {
	"use strict";
	return B.extend("App.model.A", {
		own: function () {}
	});
});
"#;

const CYCLE_B: &str = r#"sap.ui.define(["./A"], function (A) {
	"use strict";
	return A.extend("App.model.B", {});
});
"#;

#[test]
fn test_cyclic_inheritance_terminates() {
    let project = TestProject::new();
    project.add_file("webapp/manifest.json", sample_app::MANIFEST);
    project.add_file("webapp/model/A.js", CYCLE_A);
    project.add_file("webapp/model/B.js", CYCLE_B);
    let (ws, _) = project.open();

    let walk = ws.resolver().find_member("App.model.A", "missing");
    assert!(walk.found.is_none());
    assert_eq!(walk.visited, vec!["App.model.A", "App.model.B"]);

    assert_eq!(
        ws.resolver().find_member("App.model.B", "own").declaring_class(),
        Some("App.model.A")
    );
    assert_eq!(
        ws.resolver().method_return_type("App.model.B", "missing"),
        TypeResolution::Unresolved
    );
}

fn chain_link(name: &str, parent: &str, body: &str) -> String {
    format!(
        r#"sap.ui.define(["./{parent}"], function ({parent}) {{
	"use strict";
	return {parent}.extend("App.model.{name}", {{{body}}});
}});
"#
    )
}

#[test]
fn test_inheritance_walk_respects_hop_limit() {
    let project = TestProject::new();
    project.add_file("webapp/manifest.json", sample_app::MANIFEST);
    project.add_file("webapp/model/C0.js", &chain_link("C0", "C1", ""));
    project.add_file("webapp/model/C1.js", &chain_link("C1", "C2", ""));
    project.add_file("webapp/model/C2.js", &chain_link("C2", "C3", ""));
    project.add_file(
        "webapp/model/C3.js",
        r#"sap.ui.define(["sap/ui/base/Object"], function (BaseObject) {
	"use strict";
	return BaseObject.extend("App.model.C3", {
		deep: function () {}
	});
});
"#,
    );

    let (ws, _) = project.open();
    assert_eq!(
        ws.resolver().find_member("App.model.C0", "deep").declaring_class(),
        Some("App.model.C3")
    );

    let mut settings = project.settings();
    settings.resolution.max_inheritance_hops = 2;
    let limited = ui5_atlas::Workspace::open(settings).unwrap();
    ui5_atlas::scan_workspace(
        &limited,
        &[project.root()],
        &tokio_util::sync::CancellationToken::new(),
        &mut ui5_atlas::indexing::NoProgress,
    );
    let walk = limited.resolver().find_member("App.model.C0", "deep");
    assert!(walk.found.is_none());
    assert_eq!(
        walk.visited,
        vec!["App.model.C0", "App.model.C1", "App.model.C2"]
    );
}

const MUTUAL: &str = r#"sap.ui.define([
	"sap/ui/core/mvc/Controller",
	"sap/m/Button"
], function (Controller, Button) {
	"use strict";

	return Controller.extend("App.controller.Mutual", {
		a: function (bNew) {
			if (bNew) {
				return new Button();
			}
			return this.b();
		},

		b: function () {
			return this.a();
		}
	});
});
"#;

fn mutual_project() -> TestProject {
    let project = TestProject::new();
    project.add_file("webapp/manifest.json", sample_app::MANIFEST);
    project.add_file("webapp/controller/Mutual.controller.js", MUTUAL);
    project
}

#[test]
fn test_mutual_recursion_result_is_independent_of_query_order() {
    const MUTUAL_CLASS: &str = "App.controller.Mutual";

    let project = mutual_project();
    let (ws, _) = project.open();
    let b_first = ws.resolver().method_return_type(MUTUAL_CLASS, "b");
    let a_after = ws.resolver().method_return_type(MUTUAL_CLASS, "a");

    let project = mutual_project();
    let (ws, _) = project.open();
    let a_first = ws.resolver().method_return_type(MUTUAL_CLASS, "a");
    let b_after = ws.resolver().method_return_type(MUTUAL_CLASS, "b");

    assert_eq!(b_first, resolved("sap.m.Button"));
    assert_eq!(a_first, resolved("sap.m.Button"));
    assert_eq!(b_after, b_first);
    assert_eq!(a_after, a_first);
}

#[test]
fn test_depth_limited_type_is_not_memoized() {
    let project = sample_project();
    let mut settings = project.settings();
    settings.resolution.max_resolution_depth = 1;
    let limited = ui5_atlas::Workspace::open(settings).unwrap();
    ui5_atlas::scan_workspace(
        &limited,
        &[project.root()],
        &tokio_util::sync::CancellationToken::new(),
        &mut ui5_atlas::indexing::NoProgress,
    );

    // getModelRef reads the field, whose type needs a second level
    assert_eq!(
        limited.resolver().method_return_type(MAIN, "getModelRef"),
        TypeResolution::Unresolved
    );
    assert!(limited.type_memo().is_empty());
}
