use super::request::PROTRACTOR_BIN;
use crate::error::LensError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Placeholder debuggers substitute with the workspace folder.
pub const WORKSPACE_FOLDER: &str = "${workspaceFolder}";

pub const DEBUG_SESSION_NAME: &str = "Debug Jasmine Tests";

/// Process-launch descriptor in the shape editor debuggers consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    #[serde(rename = "type")]
    pub launch_type: String,
    pub name: String,
    pub request: String,
    pub skip_files: Vec<String>,
    pub program: String,
    pub args: Vec<String>,
    pub resolve_source_map_locations: Vec<String>,
}

impl LaunchConfig {
    /// Node launch of the workspace's protractor with the given arguments.
    pub fn protractor(args: Vec<String>) -> Self {
        Self {
            launch_type: "node".to_string(),
            name: DEBUG_SESSION_NAME.to_string(),
            request: "launch".to_string(),
            skip_files: vec!["<node_internals>/**".to_string()],
            program: format!("{}/{}", WORKSPACE_FOLDER, PROTRACTOR_BIN),
            args,
            resolve_source_map_locations: vec![
                format!("{}/**", WORKSPACE_FOLDER),
                "!**/node_modules/**".to_string(),
            ],
        }
    }

    /// Copy with `${workspaceFolder}` replaced by `root`.
    pub fn resolve_workspace(&self, root: &Path) -> Self {
        let root = root.to_string_lossy();
        let subst = |s: &String| s.replace(WORKSPACE_FOLDER, &root);
        Self {
            program: subst(&self.program),
            args: self.args.iter().map(subst).collect(),
            resolve_source_map_locations: self
                .resolve_source_map_locations
                .iter()
                .map(subst)
                .collect(),
            ..self.clone()
        }
    }
}

/// Starts a debug session from a launch descriptor.
pub trait DebugLauncher {
    fn launch(&mut self, config: &LaunchConfig) -> Result<(), LensError>;
}

/// Launches the program under `node --inspect-brk` so any inspector client
/// can attach. Does not wait for the process.
#[derive(Debug, Clone)]
pub struct InspectLauncher {
    pub workspace_root: PathBuf,
    pub node: String,
}

impl InspectLauncher {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            workspace_root,
            node: "node".to_string(),
        }
    }

    /// Argument vector passed to node.
    pub fn node_args(&self, config: &LaunchConfig) -> Vec<String> {
        let resolved = config.resolve_workspace(&self.workspace_root);
        let mut args = vec!["--inspect-brk".to_string(), resolved.program];
        args.extend(resolved.args);
        args
    }
}

impl DebugLauncher for InspectLauncher {
    fn launch(&mut self, config: &LaunchConfig) -> Result<(), LensError> {
        let args = self.node_args(config);
        tracing::info!("launching {} {}", self.node, args.join(" "));

        let child = Command::new(&self.node)
            .args(&args)
            .current_dir(&self.workspace_root)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| LensError::Session(format!("failed to start {}: {}", self.node, e)))?;

        tracing::debug!("debuggee pid {}", child.id());
        Ok(())
    }
}
