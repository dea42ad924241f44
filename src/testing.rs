//! Test doubles for the external collaborators.

use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use shakmaty::Color;

use crate::{
    error::TrainerError,
    knowledge::KnowledgeBase,
    session::TrainingCompletion,
    types::{Evaluation, RankedMove},
    wdl::{EvalCategory, Wdl},
};

pub(crate) fn eval(value: i32, side: Color) -> Evaluation {
    let category = match value.signum() {
        1 => EvalCategory::Win,
        0 => EvalCategory::Draw,
        _ => EvalCategory::Loss,
    };
    Evaluation::new(Wdl::new(value, side), category)
}

pub(crate) fn ranked(san: &str, value: i32, side: Color) -> RankedMove {
    let evaluation = eval(value, side);
    RankedMove {
        san: san.to_owned(),
        uci: None,
        wdl: evaluation.wdl,
        category: evaluation.category,
        dtm: None,
        dtz: None,
    }
}

/// Knowledge base answering from fixed tables and counting its calls.
#[derive(Default)]
pub(crate) struct MockKnowledgeBase {
    evaluations: HashMap<String, Evaluation>,
    moves: HashMap<String, Vec<RankedMove>>,
    failing: HashSet<String>,
    latency: Option<Duration>,
    evaluation_calls: AtomicUsize,
    top_move_calls: AtomicUsize,
}

impl MockKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_evaluation(mut self, fen: &str, evaluation: Evaluation) -> Self {
        self.evaluations.insert(fen.to_owned(), evaluation);
        self
    }

    pub fn with_moves(mut self, fen: &str, moves: Vec<RankedMove>) -> Self {
        self.moves.insert(fen.to_owned(), moves);
        self
    }

    /// Every lookup for `fen` fails with a transport-style error.
    pub fn failing(mut self, fen: &str) -> Self {
        self.failing.insert(fen.to_owned());
        self
    }

    /// Every lookup waits `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn evaluation_calls(&self) -> usize {
        self.evaluation_calls.load(Ordering::SeqCst)
    }

    pub fn top_move_calls(&self) -> usize {
        self.top_move_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.evaluation_calls() + self.top_move_calls()
    }

    async fn check(&self, fen: &str) -> Result<(), TrainerError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.contains(fen) {
            Err(TrainerError::KnowledgeBase(format!("lookup failed for {fen}")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KnowledgeBase for MockKnowledgeBase {
    async fn evaluation(&self, fen: &str) -> Result<Option<Evaluation>, TrainerError> {
        self.evaluation_calls.fetch_add(1, Ordering::SeqCst);
        self.check(fen).await?;
        Ok(self.evaluations.get(fen).cloned())
    }

    async fn top_moves(
        &self,
        fen: &str,
        limit: usize,
    ) -> Result<Option<Vec<RankedMove>>, TrainerError> {
        self.top_move_calls.fetch_add(1, Ordering::SeqCst);
        self.check(fen).await?;
        Ok(self
            .moves
            .get(fen)
            .map(|moves| moves.iter().take(limit).cloned().collect()))
    }
}

#[derive(Default)]
pub(crate) struct RecordingCompletion {
    results: Mutex<Vec<bool>>,
}

impl RecordingCompletion {
    pub fn results(&self) -> Vec<bool> {
        self.results.lock().clone()
    }
}

impl TrainingCompletion for RecordingCompletion {
    fn complete(&self, success: bool) {
        self.results.lock().push(success);
    }
}
