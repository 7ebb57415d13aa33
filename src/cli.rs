//! Command-line arguments and subcommand handlers.

use crate::config::{resolve_config_path, Settings};
use crate::error::LensError;
use crate::runner::{
    send_request, DebugLauncher, InspectLauncher, RunRequest, ShellOutput, ShellSession,
};
use crate::scanner::{ActionArgs, LensRegistry};
use crate::{logging, lsp};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "protractor-lens",
    version,
    about = "Run and debug individual protractor tests from editor code lenses."
)]
pub struct LensArgs {
    /// Append logs to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the lenses found in a spec file.
    Lenses {
        file: PathBuf,
        /// Emit a JSON array instead of one line per lens.
        #[arg(long)]
        json: bool,
        /// Language identifier the file is scanned as.
        #[arg(long, default_value = "javascript")]
        language: String,
    },
    /// Run one test (or group) through protractor in a shell session.
    Run {
        file: PathBuf,
        test_name: String,
        #[command(flatten)]
        workspace: WorkspaceArgs,
        /// Print the command lines instead of running them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the debug launch descriptor for one test.
    Debug {
        file: PathBuf,
        test_name: String,
        #[command(flatten)]
        workspace: WorkspaceArgs,
        /// Start `node --inspect-brk` instead of printing the descriptor.
        #[arg(long)]
        launch: bool,
    },
    /// Serve code lenses over the Language Server Protocol on stdio.
    Lsp,
}

#[derive(Debug, Clone, Args)]
pub struct WorkspaceArgs {
    /// Workspace root protractor runs from [default: current directory].
    #[arg(long)]
    pub workspace: Option<PathBuf>,
    /// Protractor config, relative to the workspace root.
    #[arg(long = "config")]
    pub config: Option<String>,
}

impl WorkspaceArgs {
    pub fn root(&self) -> Result<PathBuf, LensError> {
        match &self.workspace {
            Some(root) => Ok(root.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            protractor_configuration: self.config.clone(),
        }
    }

    pub fn request(&self, file: &Path, test_name: &str) -> Result<RunRequest, LensError> {
        let root = self.root()?;
        let args = ActionArgs {
            test_file: file.to_string_lossy().into_owned(),
            test_name: test_name.to_string(),
        };
        let config_path = resolve_config_path(Some(&root), &self.settings());
        Ok(RunRequest::new(&args, Some(root), config_path))
    }
}

/// Parse arguments, set up logging and run the selected subcommand.
pub fn run() -> Result<i32, LensError> {
    let args = LensArgs::parse();
    logging::init(args.log_file.as_deref())?;
    tracing::debug!("{:?}", args);

    match args.command {
        Command::Lenses {
            file,
            json,
            language,
        } => handle_lenses(&file, json, &language),
        Command::Run {
            file,
            test_name,
            workspace,
            dry_run,
        } => handle_run(&file, &test_name, &workspace, dry_run),
        Command::Debug {
            file,
            test_name,
            workspace,
            launch,
        } => handle_debug(&file, &test_name, &workspace, launch),
        Command::Lsp => {
            lsp::run_lsp_mode()?;
            Ok(0)
        }
    }
}

fn handle_lenses(file: &Path, json: bool, language: &str) -> Result<i32, LensError> {
    let contents = fs::read_to_string(file)?;
    let lines: Vec<&str> = contents.lines().collect();
    let path = file.to_string_lossy();

    let registry = LensRegistry::protractor();
    let annotations = registry.provide(language, &lines, &path).unwrap_or_else(|| {
        tracing::warn!("no lens provider for language {:?}", language);
        Vec::new()
    });

    if json {
        println!("{}", serde_json::to_string_pretty(&annotations)?);
    } else {
        for a in &annotations {
            println!(
                "{}:{}\t{}\t{:?}",
                path,
                a.line() + 1,
                a.label,
                a.args.test_name
            );
        }
    }
    Ok(0)
}

fn handle_run(
    file: &Path,
    test_name: &str,
    workspace: &WorkspaceArgs,
    dry_run: bool,
) -> Result<i32, LensError> {
    let request = workspace.request(file, test_name)?;

    if dry_run {
        for line in request.command_lines()? {
            println!("{}", line);
        }
        return Ok(0);
    }

    // The CLI owns its shell, so it waits for it to drain before exiting.
    let mut session = ShellSession::start(ShellOutput::Inherit)?;
    send_request(&mut session, &request)?;
    session.finish()
}

fn handle_debug(
    file: &Path,
    test_name: &str,
    workspace: &WorkspaceArgs,
    launch: bool,
) -> Result<i32, LensError> {
    let request = workspace.request(file, test_name)?;
    let config = request.launch_config();

    if launch {
        let mut launcher = InspectLauncher::new(workspace.root()?);
        launcher.launch(&config)?;
        eprintln!("Debuggee started; attach an inspector client to continue.");
    } else {
        println!("{}", serde_json::to_string_pretty(&config)?);
    }
    Ok(0)
}
