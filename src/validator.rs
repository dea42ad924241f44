use tracing::debug;

use crate::{
    rules::RulesEngine,
    types::{MoveInput, TurnState},
};

const INVALID_MOVE: &str = "Invalid move";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveValidation {
    pub is_valid: bool,
    pub error_message: Option<String>,
}

impl MoveValidation {
    fn valid() -> Self {
        Self {
            is_valid: true,
            error_message: None,
        }
    }

    fn invalid(message: String) -> Self {
        Self {
            is_valid: false,
            error_message: Some(message),
        }
    }
}

/// Whether the player may submit a move right now.
pub fn validate_turn(turn: &TurnState) -> bool {
    turn.is_player_turn && !turn.is_opponent_thinking
}

/// Ask the rules engine whether `candidate` is legal.
///
/// Engine errors never escape; they become an invalid result carrying
/// the engine's message.
pub fn validate_move<R: RulesEngine + ?Sized>(
    rules: &R,
    candidate: &MoveInput,
) -> MoveValidation {
    match rules.check_move(candidate) {
        Ok(()) => MoveValidation::valid(),
        Err(e) => {
            debug!(%candidate, error = %e, "move rejected by rules engine");
            let message = e.to_string();
            if message.is_empty() {
                MoveValidation::invalid(INVALID_MOVE.to_owned())
            } else {
                MoveValidation::invalid(message)
            }
        }
    }
}
