//! Core of a tablebase-backed chess endgame trainer.
//!
//!
//! The player practises a known endgame against an opponent that always
//! answers with the tablebase's best reply. Every player move is judged
//! by comparing the win/draw/loss verdict before and after it; a move
//! that changes the game-theoretic outcome opens a corrective dialog,
//! while a promotion that decides the game ends the session at once.
//!
//! The principal type is [`EndgameTrainer`], which drives a
//! [`SessionHandle`] through the player's moves and schedules the
//! opponent's replies. The chess rules and the tablebase are supplied
//! through the [`RulesEngine`] and [`KnowledgeBase`] traits, with
//! [`ShakmatyRules`] and [`LichessTablebase`] as ready-made
//! implementations.
//!
//! The library re‑exports `shakmaty` to make position construction easy.

mod config;
mod dialog;
mod error;
mod knowledge;
mod messages;
mod opponent;
mod promotion;
mod quality;
mod rules;
mod session;
mod tablebase;
mod trainer;
mod types;
mod validator;
mod wdl;

#[cfg(test)]
mod testing;

/// Player-side orchestration.
pub use trainer::{EndgameTrainer, PlayerMoveOutcome};

/// Shared training state and the completion hook.
pub use session::{SessionHandle, TrainingCompletion, TrainingState};

/// Delayed opponent replies.
pub use opponent::{MoveCompleteCallback, OpponentTurnManager, ScheduleOptions, SchedulerPhase};

/// Move judgement and the promotion shortcut.
pub use promotion::{check_promotion, evaluate_promotion_outcome, handle_auto_win};
pub use quality::MoveQualityEvaluator;
pub use validator::{MoveValidation, validate_move, validate_turn};

/// Collaborator seams and their default implementations.
pub use knowledge::KnowledgeBase;
pub use rules::{RulesEngine, ShakmatyRules};
pub use tablebase::{LichessTablebase, MAX_PIECES};

/// Dialog and toast state exposed to the presentation layer.
pub use dialog::{
    DialogManager, DialogState, MoveErrorDialog, MoveSuccessDialog, Toast, ToastKind,
};
pub use messages::{Locale, Messages};

/// Configuration loaded from TOML.
pub use config::{DEFAULT_TABLEBASE_URL, TablebaseConfig, TrainerConfig};

/// Error type produced by library operations.
pub use error::TrainerError;

/// Data structures passed between the components.
pub use types::{
    AppliedMove, BeforeEvaluation, Evaluation, GameEnd, MoveInput, MoveQualityResult,
    PromotionInfo, PromotionPiece, RankedMove, TrainingBaseline, TurnState,
};
pub use wdl::{EvalCategory, OutcomeCategory, Wdl};

/// Re-export of `shakmaty` for convenience when building positions.
pub use shakmaty;
