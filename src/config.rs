use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// Config file protractor is pointed at when nothing is configured.
pub const DEFAULT_CONFIG_PATH: &str = "protractor.conf.js";

/// Settings section clients nest the extension settings under.
pub const SETTINGS_SECTION: &str = "run-protractor";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Protractor config path, relative to the workspace root.
    #[serde(default)]
    pub protractor_configuration: Option<String>,
}

impl Settings {
    pub fn with_config(path: impl Into<String>) -> Self {
        Self {
            protractor_configuration: Some(path.into()),
        }
    }

    /// Read settings out of an LSP `initializationOptions` or
    /// `didChangeConfiguration` payload. Accepts both the bare object and one
    /// nested under `"run-protractor"`; anything unrecognized yields defaults.
    pub fn from_lsp_payload(payload: Option<&Value>) -> Self {
        let Some(payload) = payload else {
            return Self::default();
        };
        let section = payload
            .get("settings")
            .unwrap_or(payload)
            .get(SETTINGS_SECTION)
            .or_else(|| payload.get(SETTINGS_SECTION))
            .unwrap_or(payload);

        match serde_json::from_value::<Settings>(section.clone()) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("ignoring unreadable settings payload: {}", e);
                Self::default()
            }
        }
    }

    /// The configured path, treating an empty string as unset.
    pub fn configured_path(&self) -> Option<&str> {
        self.protractor_configuration
            .as_deref()
            .filter(|p| !p.is_empty())
    }
}

/// Resolve the config path protractor is invoked with.
///
/// A configured path is joined onto the workspace root; without a root or a
/// setting the literal default is used as-is.
pub fn resolve_config_path(workspace_root: Option<&Path>, settings: &Settings) -> String {
    match (workspace_root, settings.configured_path()) {
        (Some(root), Some(configured)) => root.join(configured).to_string_lossy().into_owned(),
        _ => DEFAULT_CONFIG_PATH.to_string(),
    }
}
