//! Delayed, cancellable opponent replies.
//!
//! [`OpponentTurnManager`] owns at most one pending reply. The reply is a
//! tokio task that sleeps for the configured delay, then asks the
//! tablebase for the best move and plays it. A reply can be cancelled
//! while it is still waiting; once it has started executing it runs to
//! the end so the turn state is never left half-updated.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    dialog::{DialogManager, ToastKind},
    error::TrainerError,
    knowledge::KnowledgeBase,
    rules::RulesEngine,
    session::SessionHandle,
    types::{AppliedMove, MoveInput, TurnState},
};

pub type MoveCompleteCallback =
    Arc<dyn Fn(&AppliedMove) -> Result<(), TrainerError> + Send + Sync>;

#[derive(Clone, Default)]
pub struct ScheduleOptions {
    /// Invoked after the reply was played and the turn handed back
    pub on_opponent_move_complete: Option<MoveCompleteCallback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Scheduled,
    Executing,
    Cancelled,
}

struct PendingReply {
    phase: Arc<Mutex<SchedulerPhase>>,
    task: JoinHandle<()>,
}

pub struct OpponentTurnManager {
    knowledge_base: Arc<dyn KnowledgeBase>,
    dialogs: DialogManager,
    top_moves_limit: usize,
    pending: Option<PendingReply>,
    /// A reply that had already started when it was cancelled or replaced
    running: Option<PendingReply>,
}

impl OpponentTurnManager {
    pub fn new(
        knowledge_base: Arc<dyn KnowledgeBase>,
        dialogs: DialogManager,
        top_moves_limit: usize,
    ) -> Self {
        Self {
            knowledge_base,
            dialogs,
            top_moves_limit: top_moves_limit.max(1),
            pending: None,
            running: None,
        }
    }

    /// Arm a reply that fires after `delay`, replacing any pending one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<R: RulesEngine>(
        &mut self,
        session: &SessionHandle<R>,
        delay: Duration,
        options: ScheduleOptions,
    ) {
        self.cancel();

        let phase = Arc::new(Mutex::new(SchedulerPhase::Scheduled));
        let reply = OpponentReply {
            session: session.clone(),
            knowledge_base: Arc::clone(&self.knowledge_base),
            dialogs: self.dialogs,
            top_moves_limit: self.top_moves_limit,
            options,
        };
        let task_phase = Arc::clone(&phase);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut phase = task_phase.lock();
                if *phase != SchedulerPhase::Scheduled {
                    return;
                }
                *phase = SchedulerPhase::Executing;
            }
            reply.run().await;
            *task_phase.lock() = SchedulerPhase::Idle;
        });

        debug!(delay_ms = delay.as_millis() as u64, "opponent reply scheduled");
        self.pending = Some(PendingReply { phase, task });
    }

    /// Drop the pending reply if it has not started yet. Safe to call at
    /// any time.
    pub fn cancel(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let executing = {
            let mut phase = pending.phase.lock();
            if *phase == SchedulerPhase::Scheduled {
                pending.task.abort();
                *phase = SchedulerPhase::Cancelled;
                debug!("pending opponent reply cancelled");
            }
            *phase == SchedulerPhase::Executing
        };
        if executing {
            debug!("opponent reply already executing, letting it finish");
            self.running = Some(pending);
        }
    }

    /// `Scheduled` while a reply waits, `Executing` while any reply runs.
    pub fn phase(&self) -> SchedulerPhase {
        let current = |reply: &Option<PendingReply>| reply.as_ref().map(|r| *r.phase.lock());
        match current(&self.pending) {
            Some(phase @ (SchedulerPhase::Scheduled | SchedulerPhase::Executing)) => phase,
            _ => match current(&self.running) {
                Some(SchedulerPhase::Executing) => SchedulerPhase::Executing,
                _ => SchedulerPhase::Idle,
            },
        }
    }

    pub fn is_pending(&self) -> bool {
        self.phase() == SchedulerPhase::Scheduled
    }
}

impl Drop for OpponentTurnManager {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Everything a fired reply needs, moved into the task.
struct OpponentReply<R> {
    session: SessionHandle<R>,
    knowledge_base: Arc<dyn KnowledgeBase>,
    dialogs: DialogManager,
    top_moves_limit: usize,
    options: ScheduleOptions,
}

impl<R: RulesEngine> OpponentReply<R> {
    async fn run(self) {
        let fen = self.session.read(|state| {
            state
                .turn
                .is_opponent_turn()
                .then(|| state.rules.current_position())
        });
        let Some(fen) = fen else {
            debug!("turn reclaimed before the opponent reply fired");
            return;
        };

        let best = match self.knowledge_base.top_moves(&fen, self.top_moves_limit).await {
            Ok(Some(moves)) => moves.into_iter().next(),
            Ok(None) => None,
            Err(e) => {
                warn!(fen = %fen, error = %e, "opponent move lookup failed");
                None
            }
        };
        let Some(best) = best else {
            warn!(fen = %fen, "no opponent move available, returning turn to player");
            self.session.update(|state| {
                state.turn = TurnState::player();
                let message = self.dialogs.messages().opponent_unavailable;
                self.dialogs.show_toast(&mut state.ui, message, ToastKind::Error);
            });
            return;
        };

        let played = self.session.update(|state| {
            if !state.turn.is_opponent_turn() {
                debug!(san = %best.san, "turn reclaimed while the opponent was thinking");
                return None;
            }
            let input = best
                .uci
                .clone()
                .map(MoveInput::Notation)
                .unwrap_or_else(|| MoveInput::Notation(best.san.clone()));
            let Some(applied) = state.rules.apply_move(&input) else {
                error!(fen = %fen, san = %best.san, "rules engine rejected the opponent move");
                let message = self.dialogs.messages().opponent_move_rejected;
                state.error = Some(format!("{message}: {}", best.san));
                state.turn = TurnState::player();
                self.dialogs.show_toast(&mut state.ui, message, ToastKind::Error);
                return None;
            };
            let game_end = state.record_move(applied.clone());
            state.turn = if game_end.is_some() {
                TurnState::finished()
            } else {
                TurnState::player()
            };
            Some(applied)
        });
        let Some(applied) = played else {
            return;
        };
        info!(san = %applied.san, "opponent replied");

        if let Some(callback) = &self.options.on_opponent_move_complete {
            if let Err(e) = callback(&applied) {
                warn!(error = %e, "opponent move callback failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rules::ShakmatyRules,
        testing::{MockKnowledgeBase, ranked},
    };
    use shakmaty::Color;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Black to move after 1. e8=Q.
    const QUEENED: &str = "4Q3/8/8/8/8/8/k7/4K3 b - - 0 1";
    const DELAY: Duration = Duration::from_millis(500);

    fn setup(
        kb: MockKnowledgeBase,
    ) -> (
        Arc<MockKnowledgeBase>,
        OpponentTurnManager,
        SessionHandle<ShakmatyRules>,
    ) {
        let kb = Arc::new(kb);
        let manager = OpponentTurnManager::new(kb.clone(), DialogManager::default(), 3);
        let session = SessionHandle::<ShakmatyRules>::from_fen(QUEENED).unwrap();
        session.update(|state| state.turn = TurnState::opponent_thinking());
        (kb, manager, session)
    }

    async fn settle() {
        tokio::time::sleep(DELAY * 2).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn replies() -> MockKnowledgeBase {
        MockKnowledgeBase::new().with_moves(
            QUEENED,
            vec![ranked("Kb2", -2, Color::Black), ranked("Kb3", -2, Color::Black)],
        )
    }

    #[tokio::test(start_paused = true)]
    async fn plays_top_move_after_delay() {
        let (kb, mut manager, session) = setup(replies());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        manager.schedule(
            &session,
            DELAY,
            ScheduleOptions {
                on_opponent_move_complete: Some(Arc::new(
                    move |applied: &AppliedMove| -> Result<(), TrainerError> {
                        assert_eq!(applied.san, "Kb2");
                        seen.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    },
                )),
            },
        );
        assert!(manager.is_pending());
        assert!(session.read(|state| state.history.is_empty()));

        settle().await;

        assert_eq!(kb.top_move_calls(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.phase(), SchedulerPhase::Idle);
        session.read(|state| {
            assert_eq!(state.turn, TurnState::player());
            assert_eq!(state.history.len(), 1);
            assert_eq!(state.rules.side_to_move(), Color::White);
        });
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_delay_does_nothing() {
        let (kb, mut manager, session) = setup(replies());
        let fen = session.current_position();

        manager.schedule(&session, DELAY, ScheduleOptions::default());
        manager.cancel();
        assert_eq!(manager.phase(), SchedulerPhase::Idle);
        settle().await;

        assert_eq!(kb.calls(), 0);
        assert_eq!(session.current_position(), fen);
        assert!(session.turn().is_opponent_turn());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let (_, mut manager, _) = setup(replies());
        manager.cancel();
        manager.cancel();
        assert_eq!(manager.phase(), SchedulerPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_keeps_a_single_reply() {
        let (kb, mut manager, session) = setup(replies());

        manager.schedule(&session, DELAY, ScheduleOptions::default());
        manager.schedule(&session, DELAY, ScheduleOptions::default());
        settle().await;

        assert_eq!(kb.top_move_calls(), 1);
        assert_eq!(session.read(|state| state.history.len()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_reply_leaves_session_untouched() {
        let (kb, mut manager, session) = setup(replies());
        let fen = session.current_position();

        manager.schedule(&session, DELAY, ScheduleOptions::default());
        session.update(|state| state.turn = TurnState::player());
        settle().await;

        assert_eq!(kb.calls(), 0);
        assert_eq!(session.current_position(), fen);
        session.read(|state| {
            assert_eq!(state.turn, TurnState::player());
            assert!(state.ui.toasts.is_empty());
        });
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_tablebase_hands_turn_back() {
        for kb in [MockKnowledgeBase::new(), MockKnowledgeBase::new().failing(QUEENED)] {
            let (_, mut manager, session) = setup(kb);
            manager.schedule(&session, DELAY, ScheduleOptions::default());
            settle().await;

            session.read(|state| {
                assert_eq!(state.turn, TurnState::player());
                assert_eq!(state.ui.last_toast().map(|t| t.kind), Some(ToastKind::Error));
                assert!(state.history.is_empty());
            });
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_reply_sets_error_state() {
        let kb =
            MockKnowledgeBase::new().with_moves(QUEENED, vec![ranked("Ka8", -2, Color::Black)]);
        let (_, mut manager, session) = setup(kb);

        manager.schedule(&session, DELAY, ScheduleOptions::default());
        settle().await;

        session.read(|state| {
            assert!(state.error.as_deref().is_some_and(|e| e.contains("Ka8")));
            assert_eq!(state.turn, TurnState::player());
            assert!(state.history.is_empty());
        });
    }

    #[tokio::test(start_paused = true)]
    async fn failing_callback_does_not_block_handoff() {
        let (_, mut manager, session) = setup(replies());

        manager.schedule(
            &session,
            DELAY,
            ScheduleOptions {
                on_opponent_move_complete: Some(Arc::new(
                    |_: &AppliedMove| -> Result<(), TrainerError> {
                        Err(TrainerError::Callback("listener gone".to_owned()))
                    },
                )),
            },
        );
        settle().await;

        assert_eq!(session.turn(), TurnState::player());
    }

    #[tokio::test(start_paused = true)]
    async fn executing_reply_survives_cancel_and_reports_its_phase() {
        let (_, mut manager, session) = setup(replies().with_latency(DELAY * 2));

        manager.schedule(&session, DELAY, ScheduleOptions::default());
        tokio::time::sleep(DELAY + Duration::from_millis(10)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(manager.phase(), SchedulerPhase::Executing);

        manager.cancel();
        assert_eq!(manager.phase(), SchedulerPhase::Executing);
        assert!(!manager.is_pending());

        settle().await;
        settle().await;

        assert_eq!(manager.phase(), SchedulerPhase::Idle);
        session.read(|state| {
            assert_eq!(state.turn, TurnState::player());
            assert_eq!(state.history.len(), 1);
        });
    }
}
