//! Move quality evaluation.
//!
//! Compares the tablebase verdict before and after a player's move and
//! decides whether the move threw away part of the result. Both values
//! are converted to the mover's perspective before they are compared:
//! the side to move is the mover in `fen_before` but the opponent in
//! `fen_after`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::TrainerError,
    knowledge::KnowledgeBase,
    types::{AppliedMove, BeforeEvaluation, Evaluation, MoveQualityResult, RankedMove},
    wdl::OutcomeCategory,
};

pub struct MoveQualityEvaluator {
    knowledge_base: Arc<dyn KnowledgeBase>,
    top_moves_limit: usize,
}

impl MoveQualityEvaluator {
    pub fn new(knowledge_base: Arc<dyn KnowledgeBase>, top_moves_limit: usize) -> Self {
        Self {
            knowledge_base,
            top_moves_limit: top_moves_limit.max(1),
        }
    }

    /// Judge `played`, which led from `fen_before` to `fen_after`.
    ///
    /// Never fails: when the tablebase cannot answer, the neutral
    /// [`MoveQualityResult::default`] is returned.
    pub async fn evaluate_move_quality(
        &self,
        fen_before: &str,
        fen_after: &str,
        played: &AppliedMove,
        before: &BeforeEvaluation,
    ) -> MoveQualityResult {
        let mover = played.color;

        let (eval_before, eval_after) = tokio::join!(
            self.knowledge_base.evaluation(fen_before),
            self.knowledge_base.evaluation(fen_after),
        );
        let (Some(eval_before), Some(eval_after)) = (
            available(fen_before, eval_before),
            available(fen_after, eval_after),
        ) else {
            return MoveQualityResult::default();
        };

        let wdl_before = match before {
            BeforeEvaluation::Baseline(baseline) => baseline.wdl.for_side(mover),
            BeforeEvaluation::FreshQuery => eval_before.wdl.for_side(mover),
        };
        let wdl_after = eval_after.wdl.for_side(mover);
        let outcome_changed =
            OutcomeCategory::from_value(wdl_before) != OutcomeCategory::from_value(wdl_after);

        let best = self.best_move(fen_before).await;
        let was_optimal = best
            .as_ref()
            .is_some_and(|best| same_move(&best.san, &played.san));

        debug!(
            san = %played.san,
            wdl_before,
            wdl_after,
            outcome_changed,
            was_optimal,
            "move evaluated"
        );

        MoveQualityResult {
            should_show_error_dialog: !was_optimal && outcome_changed,
            wdl_before: Some(wdl_before),
            wdl_after: Some(wdl_after),
            best_move: best.map(|best| best.san),
            was_optimal,
            outcome_changed,
        }
    }

    async fn best_move(&self, fen: &str) -> Option<RankedMove> {
        match self.knowledge_base.top_moves(fen, self.top_moves_limit).await {
            Ok(Some(moves)) => moves.into_iter().next(),
            Ok(None) => {
                debug!(fen, "no candidate moves available");
                None
            }
            Err(e) => {
                warn!(fen, error = %e, "candidate move lookup failed");
                None
            }
        }
    }
}

fn available(fen: &str, lookup: Result<Option<Evaluation>, TrainerError>) -> Option<Evaluation> {
    match lookup {
        Ok(Some(evaluation)) => Some(evaluation),
        Ok(None) => {
            debug!(fen, "evaluation unavailable");
            None
        }
        Err(e) => {
            warn!(fen, error = %e, "evaluation lookup failed");
            None
        }
    }
}

/// SAN equality, ignoring check, mate and annotation suffixes.
fn same_move(a: &str, b: &str) -> bool {
    let strip = |san: &str| san.trim_end_matches(['+', '#', '!', '?']).to_owned();
    strip(a) == strip(b)
}
