//! Code lenses for running and debugging single protractor tests.
//!
//! [`scanner`] finds `it(...)`/`describe(...)` openings in a document and
//! turns them into lenses; [`runner`] turns a clicked lens into a shell
//! command or a debug launch descriptor; [`lsp`] serves both to an editor.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod lsp;
pub mod runner;
pub mod scanner;

pub use error::LensError;
