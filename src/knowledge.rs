use async_trait::async_trait;

use crate::{
    error::TrainerError,
    types::{Evaluation, RankedMove},
};

/// The endgame knowledge base collaborator.
///
/// Both lookups distinguish "the knowledge base has no data for this
/// position" (`Ok(None)`) from a failed call (`Err`). Callers in this
/// crate treat the two the same way, but implementations should not
/// invent errors for positions they simply do not cover.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Outcome of `fen`, relative to the side to move.
    async fn evaluation(&self, fen: &str) -> Result<Option<Evaluation>, TrainerError>;

    /// Up to `limit` moves for the side to move in `fen`, best first.
    async fn top_moves(
        &self,
        fen: &str,
        limit: usize,
    ) -> Result<Option<Vec<RankedMove>>, TrainerError>;
}
