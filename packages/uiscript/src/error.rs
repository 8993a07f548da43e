//! Error type shared by the bridge operations.

use std::path::PathBuf;

use rhai::{EvalAltResult, ParseError};
use thiserror::Error;

use crate::references::FunctionReference;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("script runtime is not running")]
    NotRunning,

    #[error("could not read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not compile '{chunk}': {source}")]
    Compile {
        chunk: String,
        #[source]
        source: ParseError,
    },

    #[error("error running '{chunk}': {source}")]
    Runtime {
        chunk: String,
        #[source]
        source: Box<EvalAltResult>,
    },

    #[error("script calls nested more than {0} deep")]
    TooDeep(usize),

    #[error("stack slot {index} holds {found}, not a function")]
    NotCallable { index: usize, found: String },

    #[error("unknown function reference {0}")]
    InvalidReference(FunctionReference),
}

impl BridgeError {
    /// Chunk name the error relates to, if any.
    pub fn chunk(&self) -> Option<&str> {
        match self {
            BridgeError::Compile { chunk, .. } | BridgeError::Runtime { chunk, .. } => Some(chunk),
            _ => None,
        }
    }
}
