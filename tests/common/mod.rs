use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use ui5_atlas::indexing::NoProgress;
use ui5_atlas::{IndexStats, Settings, Workspace, scan_workspace};

/// A UI5 project in a temporary directory, with its own builtin cache dir so
/// tests can run in parallel.
pub struct TestProject {
    pub dir: TempDir,
    cache: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            cache: TempDir::new().expect("Failed to create cache dir"),
        }
    }

    /// Project root. Kept below the temp dir so the scan root itself is
    /// never a hidden directory.
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("proj")
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.root().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self, path: &str) -> PathBuf {
        self.root().join(path)
    }

    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.cache.dir = Some(self.cache.path().to_path_buf());
        settings
    }

    /// Open a workspace on the project and run the initial scan
    pub fn open(&self) -> (Workspace, IndexStats) {
        let ws = Workspace::open(self.settings()).expect("Failed to open workspace");
        let stats = scan_workspace(&ws, &[self.root()], &CancellationToken::new(), &mut NoProgress);
        (ws, stats)
    }
}

/// Byte offset of the first occurrence of `needle` in `text`
pub fn offset_of(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("'{needle}' not found in fixture"))
}

/// Byte offset of `needle` in the file at `path`
pub fn offset_in(path: &Path, needle: &str) -> usize {
    let text = fs::read_to_string(path).expect("Failed to read fixture");
    offset_of(&text, needle)
}

pub mod sample_app {
    pub const MANIFEST: &str = r#"{
    "sap.app": {
        "id": "App",
        "type": "application"
    },
    "sap.ui5": {
        "rootView": {
            "viewName": "App.view.Main",
            "type": "XML"
        }
    }
}
"#;

    pub const BASE_CONTROLLER: &str = r#"sap.ui.define([
	"sap/ui/core/mvc/Controller"
], function (Controller) {
	"use strict";

	return Controller.extend("App.controller.BaseController", {
		getRouter: function () {
			return this.getOwnerComponent().getRouter();
		}
	});
});
"#;

    pub const MAIN_CONTROLLER: &str = r#"sap.ui.define([
	"./BaseController",
	"sap/ui/model/json/JSONModel",
	"sap/m/MessageBox"
], function (BaseController, JSONModel, MessageBox) {
	"use strict";

	return BaseController.extend("App.controller.Main", {
		onInit: function () {
			this._oModel = new JSONModel();
			var oRouter = this.getRouter();
			oRouter.navTo("detail");
		},

		onPress: function (oEvent) {
			var oButton = this.byId("b1");
			oButton.setText("Pressed");
			var oInput = this.getView().byId("nameInput");
			oInput.setValue("");
			MessageBox.show("Hello");
		},

		getButton: function () {
			return this.byId("b1");
		},

		getModelRef: function () {
			return this._oModel;
		},

		getSelf: function () {
			return this.getSelf();
		},

		pick: function (bFlag) {
			var oControl = bFlag ? this.byId("b1") : this.byId("nameInput");
			return oControl;
		},

		showStatus: function () {
			return sap.m.MessageToast;
		}
	});
});
"#;

    pub const MAIN_VIEW: &str = r#"<mvc:View controllerName="App.controller.Main"
	xmlns:mvc="sap.ui.core.mvc"
	xmlns:core="sap.ui.core"
	xmlns:m="sap.m">
	<m:Page id="page" title="Main">
		<m:Button id="b1" text="Go" press=".onPress"/>
		<core:Fragment fragmentName="App.view.Form" type="XML"/>
	</m:Page>
</mvc:View>
"#;

    pub const FORM_FRAGMENT: &str = r#"<core:FragmentDefinition xmlns="sap.m" xmlns:core="sap.ui.core">
	<Input id="nameInput" submit="onSubmit"/>
</core:FragmentDefinition>
"#;
}

/// The sample app written to disk: manifest, two controllers, a view and the
/// fragment it embeds.
pub fn sample_project() -> TestProject {
    let project = TestProject::new();
    project.add_file("webapp/manifest.json", sample_app::MANIFEST);
    project.add_file("webapp/controller/BaseController.js", sample_app::BASE_CONTROLLER);
    project.add_file("webapp/controller/Main.controller.js", sample_app::MAIN_CONTROLLER);
    project.add_file("webapp/view/Main.view.xml", sample_app::MAIN_VIEW);
    project.add_file("webapp/view/Form.fragment.xml", sample_app::FORM_FRAGMENT);
    project
}
