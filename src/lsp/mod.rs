mod protocol;
mod server;

use crate::error::LensError;
use crate::runner::{ReusingSessionProvider, SessionProvider};
use crate::scanner::LensRegistry;
use std::io::{self, BufRead, Write};

pub use protocol::{read_message, write_message, RpcContent, RpcError, RpcMessage};
pub use server::{uri_to_path, Flow, LspServer, OpenDocument};

/// Serve LSP over stdio until the client sends `exit` or closes the stream.
pub fn run_lsp_mode() -> Result<(), LensError> {
    tracing::info!("LSP server starting");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();

    let mut server = LspServer::new(
        stdout.lock(),
        LensRegistry::protractor(),
        ReusingSessionProvider::logging_shell(),
    );
    serve(&mut input, &mut server)?;

    tracing::info!("LSP server exiting");
    Ok(())
}

/// Read loop shared by stdio mode and tests.
pub fn serve<R, W, P>(input: &mut R, server: &mut LspServer<W, P>) -> Result<(), LensError>
where
    R: BufRead,
    W: Write,
    P: SessionProvider,
{
    let mut msg_count = 0usize;

    loop {
        let msg = match read_message(input) {
            Ok(Some(msg)) => msg,
            Ok(None) => {
                tracing::info!("client closed the stream after {} messages", msg_count);
                break;
            }
            Err(LensError::Json(e)) => {
                tracing::warn!("skipping undecodable message: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        };
        msg_count += 1;

        if server.handle(msg)? == Flow::Exit {
            tracing::info!("exit after {} messages", msg_count);
            break;
        }
    }

    Ok(())
}
