//! Error types for the endgame trainer.
//!
//! This crate uses `thiserror` to provide a single enumeration of the
//! failures that may occur while talking to the rules engine, the
//! tablebase, or while loading configuration. Most public operations
//! of the trainer never surface these to the player: they are logged
//! and converted into a safe fallback state instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainerError {
    /// The provided FEN string could not be parsed.
    #[error("Invalid FEN: {0}")]
    InvalidFen(#[from] shakmaty::fen::ParseFenError),

    /// A parsed position is invalid from the perspective of `shakmaty`.
    #[error("Invalid Chess Position: {0}")]
    InvalidPosition(#[from] shakmaty::PositionError<shakmaty::Chess>),

    /// The rules engine rejected a move. Carries the engine's message.
    #[error("{0}")]
    IllegalMove(String),

    /// The knowledge base answered, but not with anything usable.
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    /// Wraps a transport error from the tablebase HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configuration file could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A caller supplied callback reported a failure.
    #[error("Callback failed: {0}")]
    Callback(String),
}
