//! Pawn promotion detection and the auto-win shortcut.
//!
//! A promotion that mates, or that leaves a position the tablebase
//! scores as decided for the promoting side, ends the training session
//! immediately.

use shakmaty::{Color, fen::Fen};
use tracing::{debug, info, warn};

use crate::{
    dialog::{DialogManager, ToastKind},
    knowledge::KnowledgeBase,
    rules::RulesEngine,
    session::{SessionHandle, TrainingCompletion},
    types::{AppliedMove, PromotionInfo, PromotionPiece, TurnState},
};

/// Inspect `mv` for a promotion designator.
pub fn check_promotion(mv: &AppliedMove) -> PromotionInfo {
    let Some(role) = mv.promotion else {
        return PromotionInfo::default();
    };
    PromotionInfo {
        is_promotion: true,
        promotion_piece: PromotionPiece::try_from(role).ok(),
        from: Some(mv.from),
        to: Some(mv.to),
        is_auto_win: false,
        move_description: Some(mv.san.clone()),
    }
}

/// Decide whether the position reached by a promotion is already won
/// for `promoting`.
///
/// Malformed positions are rejected before either collaborator is
/// consulted. Every failure resolves to `false`.
pub async fn evaluate_promotion_outcome<R: RulesEngine>(
    knowledge_base: &dyn KnowledgeBase,
    fen: &str,
    promoting: Color,
) -> bool {
    if let Err(e) = fen.parse::<Fen>() {
        warn!(fen, error = %e, "promotion check on malformed position");
        return false;
    }

    let rules = match R::from_fen(fen) {
        Ok(rules) => rules,
        Err(e) => {
            warn!(fen, error = %e, "rules engine refused promotion position");
            return false;
        }
    };
    if rules.is_game_over() && rules.is_checkmate() {
        debug!(fen, "promotion delivered mate");
        return true;
    }

    let evaluation = match knowledge_base.evaluation(fen).await {
        Ok(Some(evaluation)) => evaluation,
        Ok(None) => {
            debug!(fen, "no evaluation for promotion position");
            return false;
        }
        Err(e) => {
            warn!(fen, error = %e, "promotion evaluation failed");
            return false;
        }
    };

    let wdl = evaluation.wdl.for_side(promoting);
    let category = evaluation.category_for(promoting);
    debug!(fen, wdl, ?category, "promotion evaluated");
    wdl > 0 && category.is_decisive()
}

/// Close the session as won: open the success dialog and report to the
/// completion collaborator.
pub fn handle_auto_win<R: RulesEngine>(
    session: &SessionHandle<R>,
    dialogs: &DialogManager,
    promotion: &PromotionInfo,
    completion: &dyn TrainingCompletion,
) {
    info!(
        description = promotion.move_description.as_deref().unwrap_or_default(),
        "promotion wins the training"
    );
    session.update(|state| {
        dialogs.show_promotion_success(&mut state.ui, promotion);
        let piece = state.ui.move_success.promotion_piece.clone().unwrap_or_default();
        let description = promotion.move_description.clone().unwrap_or_default();
        let message = dialogs.messages().promotion_success(&piece, &description);
        dialogs.show_toast(&mut state.ui, message, ToastKind::Success);
        state.turn = TurnState::finished();
    });
    completion.complete(true);
}
