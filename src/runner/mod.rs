mod launch;
mod request;
mod session;

pub use launch::{
    DebugLauncher, InspectLauncher, LaunchConfig, DEBUG_SESSION_NAME, WORKSPACE_FOLDER,
};
pub use request::{RunRequest, PROTRACTOR_BIN};
pub use session::{
    send_request, CommandDispatcher, ReusingSessionProvider, SessionProvider, ShellOutput,
    ShellSession, TerminalSession,
};
