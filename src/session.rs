//! In-memory training session shared between the player's move path and
//! the opponent scheduler.
//!
//! All access goes through [`SessionHandle::update`] / [`SessionHandle::read`].
//! The closure runs to completion under the lock, so a mutation is never
//! interleaved with another one; closures must not block or await.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    dialog::DialogState,
    error::TrainerError,
    rules::RulesEngine,
    types::{AppliedMove, GameEnd, TurnState},
};

/// Receives the final verdict of a training session.
pub trait TrainingCompletion: Send + Sync {
    fn complete(&self, success: bool);
}

pub struct TrainingState<R> {
    pub rules: R,
    pub turn: TurnState,
    pub ui: DialogState,
    /// Last unrecoverable problem reported during the session
    pub error: Option<String>,
    pub game_end: Option<GameEnd>,
    pub history: Vec<AppliedMove>,
}

impl<R: RulesEngine> TrainingState<R> {
    pub fn new(rules: R) -> Self {
        Self {
            rules,
            turn: TurnState::player(),
            ui: DialogState::default(),
            error: None,
            game_end: None,
            history: Vec::new(),
        }
    }

    /// Append a played move and derive whether it ended the game.
    pub fn record_move(&mut self, applied: AppliedMove) -> Option<GameEnd> {
        let mover = applied.color;
        self.history.push(applied);
        self.game_end = if self.rules.is_checkmate() {
            Some(GameEnd::Checkmate { winner: mover })
        } else if self.rules.is_game_over() {
            Some(GameEnd::Draw)
        } else {
            None
        };
        self.game_end
    }

    /// Drop the latest move from both the engine and the history.
    pub fn take_back(&mut self) -> Option<AppliedMove> {
        let applied = self.rules.undo_move()?;
        self.history.pop();
        self.game_end = None;
        Some(applied)
    }
}

pub struct SessionHandle<R> {
    inner: Arc<Mutex<TrainingState<R>>>,
}

impl<R> Clone for SessionHandle<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RulesEngine> SessionHandle<R> {
    pub fn new(rules: R) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TrainingState::new(rules))),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, TrainerError> {
        Ok(Self::new(R::from_fen(fen)?))
    }

    pub fn update<T>(&self, f: impl FnOnce(&mut TrainingState<R>) -> T) -> T {
        let mut state = self.inner.lock();
        f(&mut *state)
    }

    pub fn read<T>(&self, f: impl FnOnce(&TrainingState<R>) -> T) -> T {
        let state = self.inner.lock();
        f(&*state)
    }

    pub fn turn(&self) -> TurnState {
        self.read(|state| state.turn)
    }

    pub fn current_position(&self) -> String {
        self.read(|state| state.rules.current_position())
    }
}
