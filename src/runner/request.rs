use super::launch::{LaunchConfig, WORKSPACE_FOLDER};
use crate::config::{resolve_config_path, Settings};
use crate::error::LensError;
use crate::scanner::ActionArgs;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Protractor entry point, relative to the workspace root.
pub const PROTRACTOR_BIN: &str = "node_modules/protractor/bin/protractor";

/// Everything needed to run or debug one lens action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub workspace_root: Option<PathBuf>,
    pub config_path: String,
    pub test_file: String,
    pub test_name: String,
}

impl RunRequest {
    pub fn new(args: &ActionArgs, workspace_root: Option<PathBuf>, config_path: String) -> Self {
        Self {
            workspace_root,
            config_path,
            test_file: args.test_file.clone(),
            test_name: args.test_name.clone(),
        }
    }

    /// Build a request, resolving the config path from `settings`.
    pub fn from_settings(
        args: &ActionArgs,
        workspace_root: Option<&Path>,
        settings: &Settings,
    ) -> Self {
        let config_path = resolve_config_path(workspace_root, settings);
        Self::new(args, workspace_root.map(Path::to_path_buf), config_path)
    }

    /// `cd "<root>"`, or nothing when no workspace is open.
    pub fn cd_line(&self) -> Option<String> {
        self.workspace_root
            .as_ref()
            .map(|root| format!("cd {}", double_quote(&root.to_string_lossy())))
    }

    /// Shell line running protractor filtered down to this test.
    pub fn protractor_line(&self) -> Result<String, LensError> {
        Ok(format!(
            "{} {} --disableChecks --specs={} --grep={}",
            PROTRACTOR_BIN,
            shell_quote(&self.config_path)?,
            shell_quote(&self.test_file)?,
            double_quote(&self.test_name),
        ))
    }

    /// Lines sent to the terminal, in order.
    pub fn command_lines(&self) -> Result<Vec<String>, LensError> {
        let mut lines: Vec<String> = self.cd_line().into_iter().collect();
        lines.push(self.protractor_line()?);
        Ok(lines)
    }

    /// Protractor arguments, without the program.
    pub fn protractor_args(&self) -> Vec<String> {
        vec![
            self.config_path.clone(),
            "--disableChecks".to_string(),
            format!("--specs={}", self.test_file),
            format!("--grep={}", self.test_name),
        ]
    }

    /// Direct invocation, program first, for spawning without a shell.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![PROTRACTOR_BIN.to_string()];
        argv.extend(self.protractor_args());
        argv
    }

    /// Debug descriptor for this request.
    pub fn launch_config(&self) -> LaunchConfig {
        let mut args = self.protractor_args();
        if Path::new(&self.config_path).is_relative() {
            args[0] = format!("{}/{}", WORKSPACE_FOLDER, self.config_path);
        }
        LaunchConfig::protractor(args)
    }
}

fn shell_quote(value: &str) -> Result<Cow<'_, str>, LensError> {
    shlex::try_quote(value).map_err(|_| LensError::Quote(value.to_string()))
}

/// Wrap in double quotes, escaping what a POSIX shell would still expand.
fn double_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}
