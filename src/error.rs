use std::io;

use thiserror::Error;

/// Failures surfaced by the store codec.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),

    #[error("record checksum mismatch (expected {expected:08x}, found {found:08x})")]
    Corrupt { expected: u32, found: u32 },

    #[error("unrecognized value kind tag: {0:#04x}")]
    BadKindTag(u8),

    #[error("record text is not valid UTF-8")]
    BadName,
}

/// User-facing command failures. Every variant maps to exit code 1;
/// the messages match what the binary prints on stderr.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Could not open file: \"{0}\".")]
    FileOpen(String),

    #[error("Could not read file as a record store: \"{0}\".")]
    StoreRead(String),

    #[error("Unknown action: \"{0}\".")]
    UnknownAction(String),

    #[error("No given action.")]
    NoActionGiven,

    #[error("Invalid syntax: {0}.")]
    InvalidSyntax(&'static str),

    #[error("Internal parser inconsistency. This is a bug.")]
    Unknown,

    #[error("{0}")]
    Io(#[from] io::Error),
}
