//! Agent error type

use pentago_core::{BoardError, MoveError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid board: {0}")]
    Board(#[from] BoardError),

    #[error("invalid move: {0}")]
    Move(#[from] MoveError),

    #[error("no legal moves in this position")]
    NoLegalMoves,

    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
