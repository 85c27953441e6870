//! Component descriptors (`manifest.json`)

use crate::error::{WorkspaceError, WorkspaceResult};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Default location of the localization bundle relative to the manifest root
pub const DEFAULT_I18N_PATH: &str = "i18n/i18n.properties";

/// A parsed component descriptor.
///
/// `component_name` is the dotted class-name prefix owned by this component;
/// `root_path` is the directory holding the descriptor.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub component_name: String,
    pub root_path: PathBuf,
    pub manifest_path: PathBuf,
    pub content: Value,
}

/// One `sap.ui.viewExtensions` entry: a fragment plugged into an extension
/// point of a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewExtension {
    pub view_name: String,
    pub extension_point: String,
    pub fragment_name: String,
}

impl Manifest {
    pub fn parse(manifest_path: &Path, text: &str) -> WorkspaceResult<Self> {
        let content: Value =
            serde_json::from_str(text).map_err(|e| WorkspaceError::ManifestParse {
                path: manifest_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let component_name = content
            .pointer("/sap.app/id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| WorkspaceError::ManifestParse {
                path: manifest_path.to_path_buf(),
                reason: "missing \"sap.app\".\"id\"".to_string(),
            })?
            .to_string();

        let root_path = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self {
            component_name,
            root_path,
            manifest_path: manifest_path.to_path_buf(),
            content,
        })
    }

    /// Whether `class_name` lives under this component's prefix.
    ///
    /// The prefix must end at a segment boundary: `App` owns `App.view.Main`
    /// but not `Application.Main`.
    pub fn owns_class(&self, class_name: &str) -> bool {
        class_name
            .strip_prefix(self.component_name.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }

    /// Absolute path of the localization bundle
    pub fn i18n_path(&self) -> PathBuf {
        let relative = match self.content.pointer("/sap.app/i18n") {
            Some(Value::String(path)) => path.as_str(),
            Some(Value::Object(obj)) => obj
                .get("bundleUrl")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_I18N_PATH),
            _ => DEFAULT_I18N_PATH,
        };
        self.root_path.join(relative)
    }

    fn extensions(&self) -> Option<&Value> {
        self.content.pointer("/sap.ui5/extends/extensions")
    }

    pub fn view_extensions(&self) -> Vec<ViewExtension> {
        let Some(Value::Object(views)) = self
            .extensions()
            .and_then(|ext| ext.get("sap.ui.viewExtensions"))
        else {
            return Vec::new();
        };

        let mut result = Vec::new();
        for (view_name, points) in views {
            let Value::Object(points) = points else {
                continue;
            };
            for (extension_point, target) in points {
                if let Some(fragment_name) = target.get("fragmentName").and_then(Value::as_str) {
                    result.push(ViewExtension {
                        view_name: view_name.clone(),
                        extension_point: extension_point.clone(),
                        fragment_name: fragment_name.to_string(),
                    });
                }
            }
        }
        result
    }

    /// Replacement declared for `controller_name`, if any.
    ///
    /// Both the plain string form and the `{ "controllerName": ... }` form
    /// are accepted.
    pub fn controller_replacement(&self, controller_name: &str) -> Option<String> {
        let replacement = self
            .extensions()?
            .get("sap.ui.controllerReplacements")?
            .get(controller_name)?;

        match replacement {
            Value::String(name) => Some(name.clone()),
            Value::Object(obj) => obj
                .get("controllerName")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }
}
