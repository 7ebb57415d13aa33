use super::request::RunRequest;
use crate::error::LensError;
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;

#[cfg(windows)]
const LINE_END: &str = "\r\n";
#[cfg(not(windows))]
const LINE_END: &str = "\n";

/// An interactive shell that accepts command lines.
pub trait TerminalSession {
    fn send_text(&mut self, text: &str) -> Result<(), LensError>;

    /// Whether the session can still accept input.
    fn is_alive(&mut self) -> bool;
}

/// Hands out the terminal session a run request is sent to.
pub trait SessionProvider {
    fn session(&mut self) -> Result<&mut dyn TerminalSession, LensError>;
}

impl<P: SessionProvider + ?Sized> SessionProvider for Box<P> {
    fn session(&mut self) -> Result<&mut dyn TerminalSession, LensError> {
        (**self).session()
    }
}

type SessionFactory = Box<dyn FnMut() -> Result<Box<dyn TerminalSession>, LensError> + Send>;

/// Reuses the session it opened first, opening a new one only when there is
/// none or the previous one has exited. Sessions are never closed here.
pub struct ReusingSessionProvider {
    current: Option<Box<dyn TerminalSession>>,
    factory: SessionFactory,
    opened: usize,
}

impl ReusingSessionProvider {
    pub fn new<F>(factory: F) -> Self
    where
        F: FnMut() -> Result<Box<dyn TerminalSession>, LensError> + Send + 'static,
    {
        Self {
            current: None,
            factory: Box::new(factory),
            opened: 0,
        }
    }

    /// Provider backed by [`ShellSession`]s whose output goes to the log.
    pub fn logging_shell() -> Self {
        Self::new(|| {
            let session = ShellSession::start(ShellOutput::Log)?;
            Ok(Box::new(session) as Box<dyn TerminalSession>)
        })
    }

    /// Number of sessions opened so far.
    pub fn opened(&self) -> usize {
        self.opened
    }
}

impl SessionProvider for ReusingSessionProvider {
    fn session(&mut self) -> Result<&mut dyn TerminalSession, LensError> {
        let reusable = match self.current.as_mut() {
            Some(session) => session.is_alive(),
            None => false,
        };

        if !reusable {
            if self.current.is_some() {
                tracing::info!("terminal session exited, opening a new one");
            }
            self.current = Some((self.factory)()?);
            self.opened += 1;
        }

        match self.current.as_deref_mut() {
            Some(session) => Ok(session),
            None => Err(LensError::Session("no terminal session".to_string())),
        }
    }
}

/// Sends run requests to whatever session the provider hands out.
pub struct CommandDispatcher<P> {
    provider: P,
}

impl<P: SessionProvider> CommandDispatcher<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Submit the request's command lines. Returns once they are written;
    /// the test run itself is not awaited.
    pub fn dispatch(&mut self, request: &RunRequest) -> Result<(), LensError> {
        let session = self.provider.session()?;
        send_request(session, request)
    }
}

/// Write the request's command lines to `session`, `cd` first.
pub fn send_request(
    session: &mut dyn TerminalSession,
    request: &RunRequest,
) -> Result<(), LensError> {
    for line in request.command_lines()? {
        tracing::info!("$ {}", line);
        session.send_text(&line)?;
    }
    Ok(())
}

/// Where a shell session's output ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellOutput {
    /// Shares the parent's stdout/stderr.
    Inherit,
    /// Each output line is forwarded to `tracing`; stdout stays untouched.
    Log,
}

/// A persistent shell child process fed through its stdin.
pub struct ShellSession {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl ShellSession {
    pub fn start(output: ShellOutput) -> Result<Self, LensError> {
        let mut command = shell_command();
        command.stdin(Stdio::piped());
        match output {
            ShellOutput::Inherit => {
                command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            ShellOutput::Log => {
                command.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }

        let mut child = command
            .spawn()
            .map_err(|e| LensError::Session(format!("failed to start shell: {}", e)))?;
        tracing::debug!("shell session started (pid {})", child.id());

        if let Some(stdout) = child.stdout.take() {
            forward_to_log(stdout, "stdout");
        }
        if let Some(stderr) = child.stderr.take() {
            forward_to_log(stderr, "stderr");
        }

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LensError::Session("shell has no stdin".to_string()))?;

        Ok(Self {
            child,
            stdin: Some(stdin),
        })
    }

    /// Close stdin and wait for the shell to run out of input.
    pub fn finish(mut self) -> Result<i32, LensError> {
        drop(self.stdin.take());
        let status = self.child.wait()?;
        Ok(status.code().unwrap_or(1))
    }
}

impl TerminalSession for ShellSession {
    fn send_text(&mut self, text: &str) -> Result<(), LensError> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| LensError::Session("shell input already closed".to_string()))?;
        stdin.write_all(text.as_bytes())?;
        stdin.write_all(LINE_END.as_bytes())?;
        stdin.flush()?;
        Ok(())
    }

    fn is_alive(&mut self) -> bool {
        self.stdin.is_some() && matches!(self.child.try_wait(), Ok(None))
    }
}

#[cfg(windows)]
fn shell_command() -> Command {
    let mut command = Command::new("cmd");
    command.arg("/Q");
    command
}

#[cfg(not(windows))]
fn shell_command() -> Command {
    Command::new("sh")
}

fn forward_to_log<R: Read + Send + 'static>(stream: R, name: &'static str) {
    thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            match line {
                Ok(line) => tracing::info!(target: "protractor", stream = name, "{}", line),
                Err(e) => {
                    tracing::debug!("stopped reading shell {}: {}", name, e);
                    break;
                }
            }
        }
    });
}
