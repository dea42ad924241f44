//! The player's side of a training session.
//!
//! [`EndgameTrainer::play_move`] runs one player move through the whole
//! pipeline: turn and legality checks, the move itself, quality and
//! promotion evaluation, and finally either the corrective dialog or a
//! scheduled opponent reply.

use std::sync::Arc;

use shakmaty::Color;
use tracing::{debug, info, warn};

use crate::{
    config::TrainerConfig,
    dialog::{DialogManager, ToastKind},
    error::TrainerError,
    knowledge::KnowledgeBase,
    opponent::{MoveCompleteCallback, OpponentTurnManager, ScheduleOptions, SchedulerPhase},
    promotion::{check_promotion, evaluate_promotion_outcome, handle_auto_win},
    quality::MoveQualityEvaluator,
    rules::RulesEngine,
    session::{SessionHandle, TrainingCompletion},
    types::{
        AppliedMove, BeforeEvaluation, GameEnd, MoveInput, MoveQualityResult, PromotionInfo,
        TrainingBaseline, TurnState,
    },
    validator::{validate_move, validate_turn},
    wdl::Wdl,
};

/// What happened to a submitted player move.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerMoveOutcome {
    /// The move was not played.
    Rejected { message: String },
    /// The move stands and the opponent reply is scheduled.
    OpponentToMove(MoveQualityResult),
    /// The move gave away part of the result; the error dialog is open
    /// and the board is held until [`EndgameTrainer::take_back`] or
    /// [`EndgameTrainer::continue_after_error`].
    MistakeFlagged(MoveQualityResult),
    PromotionWin(PromotionInfo),
    GameFinished(GameEnd),
}

pub struct EndgameTrainer<R> {
    session: SessionHandle<R>,
    knowledge_base: Arc<dyn KnowledgeBase>,
    evaluator: MoveQualityEvaluator,
    opponent: OpponentTurnManager,
    dialogs: DialogManager,
    completion: Arc<dyn TrainingCompletion>,
    config: TrainerConfig,
    player: Color,
    baseline: Option<TrainingBaseline>,
    /// Anchor that replaces `baseline` once a flagged mistake is accepted
    accepted_baseline: Option<TrainingBaseline>,
}

impl<R: RulesEngine> EndgameTrainer<R> {
    /// The player is whoever is to move in the session's starting position.
    pub fn new(
        session: SessionHandle<R>,
        knowledge_base: Arc<dyn KnowledgeBase>,
        completion: Arc<dyn TrainingCompletion>,
        config: TrainerConfig,
    ) -> Self {
        let dialogs = DialogManager::new(config.locale);
        let player = session.read(|state| state.rules.side_to_move());
        Self {
            evaluator: MoveQualityEvaluator::new(
                Arc::clone(&knowledge_base),
                config.top_moves_limit,
            ),
            opponent: OpponentTurnManager::new(
                Arc::clone(&knowledge_base),
                dialogs,
                config.top_moves_limit,
            ),
            session,
            knowledge_base,
            dialogs,
            completion,
            config,
            player,
            baseline: None,
            accepted_baseline: None,
        }
    }

    pub fn session(&self) -> &SessionHandle<R> {
        &self.session
    }

    pub fn dialogs(&self) -> &DialogManager {
        &self.dialogs
    }

    pub fn player(&self) -> Color {
        self.player
    }

    pub fn baseline(&self) -> Option<&TrainingBaseline> {
        self.baseline.as_ref()
    }

    pub fn opponent_phase(&self) -> SchedulerPhase {
        self.opponent.phase()
    }

    /// Anchor later move comparisons to the current position's value.
    pub async fn establish_baseline(&mut self) -> Option<TrainingBaseline> {
        let fen = self.session.current_position();
        match self.knowledge_base.evaluation(&fen).await {
            Ok(Some(evaluation)) => {
                let baseline = TrainingBaseline {
                    wdl: evaluation.wdl,
                    fen,
                };
                info!(
                    fen = %baseline.fen,
                    wdl = baseline.wdl.for_side(self.player),
                    "baseline established"
                );
                self.baseline = Some(baseline.clone());
                Some(baseline)
            }
            Ok(None) => {
                debug!(fen = %fen, "no evaluation for baseline");
                None
            }
            Err(e) => {
                warn!(fen = %fen, error = %e, "baseline lookup failed");
                None
            }
        }
    }

    pub async fn play_move(&mut self, input: impl Into<MoveInput>) -> PlayerMoveOutcome {
        let input = input.into();
        let messages = *self.dialogs.messages();

        let accepted = self.session.update(|state| {
            if !validate_turn(&state.turn) {
                return Err(messages.not_your_turn.to_owned());
            }
            let validation = validate_move(&state.rules, &input);
            if !validation.is_valid {
                return Err(validation
                    .error_message
                    .unwrap_or_else(|| messages.invalid_move.to_owned()));
            }
            let Some(applied) = state.rules.apply_move(&input) else {
                return Err(messages.invalid_move.to_owned());
            };
            let game_end = state.record_move(applied.clone());
            state.turn = TurnState::opponent_thinking();
            Ok((applied, game_end))
        });
        let (applied, game_end) = match accepted {
            Ok(accepted) => accepted,
            Err(message) => {
                debug!(%input, %message, "player move rejected");
                return PlayerMoveOutcome::Rejected { message };
            }
        };
        debug!(san = %applied.san, "player move applied");

        let promotion = check_promotion(&applied);
        let before = match &self.baseline {
            Some(baseline) => BeforeEvaluation::Baseline(baseline.clone()),
            None => BeforeEvaluation::FreshQuery,
        };
        let knowledge_base = self.knowledge_base.as_ref();
        let (quality, auto_win) = tokio::join!(
            self.evaluator.evaluate_move_quality(
                &applied.fen_before,
                &applied.fen_after,
                &applied,
                &before,
            ),
            async {
                promotion.is_promotion
                    && evaluate_promotion_outcome::<R>(
                        knowledge_base,
                        &applied.fen_after,
                        applied.color,
                    )
                    .await
            },
        );

        if auto_win {
            let promotion = PromotionInfo {
                is_auto_win: true,
                ..promotion
            };
            handle_auto_win(&self.session, &self.dialogs, &promotion, self.completion.as_ref());
            return PlayerMoveOutcome::PromotionWin(promotion);
        }

        if let Some(end) = game_end {
            self.finish(end);
            return PlayerMoveOutcome::GameFinished(end);
        }

        if quality.should_show_error_dialog {
            self.session.update(|state| {
                self.dialogs.show_move_error_dialog(
                    &mut state.ui,
                    quality.wdl_before.unwrap_or_default(),
                    quality.wdl_after.unwrap_or_default(),
                    quality.best_move.clone(),
                );
            });
            self.accepted_baseline = self.baseline.as_ref().and(quality.wdl_after).map(|after| {
                TrainingBaseline {
                    wdl: Wdl::new(after, applied.color),
                    fen: applied.fen_after.clone(),
                }
            });
            info!(san = %applied.san, best = ?quality.best_move, "mistake flagged");
            return PlayerMoveOutcome::MistakeFlagged(quality);
        }

        self.report_imprecision(&quality);
        self.schedule_opponent();
        PlayerMoveOutcome::OpponentToMove(quality)
    }

    /// Dismiss the error dialog and let the opponent answer the move.
    ///
    /// The accepted position becomes the new baseline, so later moves are
    /// judged against the outcome the player chose to keep playing.
    /// Must be called from within a tokio runtime.
    pub fn continue_after_error(&mut self) {
        let was_open = self.session.update(|state| {
            let was_open = state.ui.move_error.is_open;
            self.dialogs.close_move_error_dialog(&mut state.ui);
            if was_open {
                state.turn = TurnState::opponent_thinking();
            }
            was_open
        });
        if was_open {
            if let Some(accepted) = self.accepted_baseline.take() {
                debug!(fen = %accepted.fen, "baseline moved to the accepted position");
                self.baseline = Some(accepted);
            }
            self.schedule_opponent();
        }
    }

    pub fn close_success_dialog(&self) {
        self.session.update(|state| self.dialogs.close_move_success_dialog(&mut state.ui));
    }

    /// Undo back to and including the player's latest move.
    ///
    /// A finished session stays finished: its completion was already
    /// reported.
    pub fn take_back(&mut self) -> Option<AppliedMove> {
        if self.session.turn() == TurnState::finished() {
            debug!("take back refused, training already finished");
            return None;
        }
        self.opponent.cancel();
        self.accepted_baseline = None;
        let player = self.player;
        let dialogs = self.dialogs;
        self.session.update(|state| {
            dialogs.close_move_error_dialog(&mut state.ui);
            let mut undone = None;
            while let Some(applied) = state.take_back() {
                let by_player = applied.color == player;
                undone = Some(applied);
                if by_player {
                    break;
                }
            }
            state.turn = TurnState::player();
            undone
        })
    }

    pub fn cancel_opponent(&mut self) {
        self.opponent.cancel();
    }

    fn schedule_opponent(&mut self) {
        let session = self.session.clone();
        let completion = Arc::clone(&self.completion);
        let dialogs = self.dialogs;
        let on_complete: MoveCompleteCallback =
            Arc::new(move |applied: &AppliedMove| -> Result<(), TrainerError> {
                let ended = session.update(|state| {
                    let end = state.game_end?;
                    dialogs.show_toast(
                        &mut state.ui,
                        dialogs.messages().training_lost,
                        ToastKind::Error,
                    );
                    Some(end)
                });
                if let Some(end) = ended {
                    info!(san = %applied.san, ?end, "opponent reply ended the game");
                    completion.complete(false);
                }
                Ok(())
            });

        self.opponent.schedule(
            &self.session,
            self.config.opponent_delay(),
            ScheduleOptions {
                on_opponent_move_complete: Some(on_complete),
            },
        );
    }

    fn report_imprecision(&self, quality: &MoveQualityResult) {
        let (Some(before), Some(after)) = (quality.wdl_before, quality.wdl_after) else {
            return;
        };
        if quality.was_optimal
            || !DialogManager::is_significant_wdl_change(
                f64::from(before),
                f64::from(after),
                self.config.significant_wdl_threshold,
            )
        {
            return;
        }
        let message = format!(
            "{} ({})",
            self.dialogs
                .move_quality_description(quality.was_optimal, quality.outcome_changed),
            self.dialogs.format_wdl_change(f64::from(before), f64::from(after)),
        );
        self.session
            .update(|state| self.dialogs.show_toast(&mut state.ui, message, ToastKind::Info));
    }

    fn finish(&self, end: GameEnd) {
        let success = end == GameEnd::Checkmate {
            winner: self.player,
        };
        let messages = *self.dialogs.messages();
        self.session.update(|state| {
            state.turn = TurnState::finished();
            let (message, kind) = if success {
                (messages.training_won, ToastKind::Success)
            } else {
                (messages.training_lost, ToastKind::Error)
            };
            self.dialogs.show_toast(&mut state.ui, message, kind);
        });
        info!(?end, success, "training finished");
        self.completion.complete(success);
    }
}
