//! [`KnowledgeBase`] backed by the Lichess tablebase HTTP API.
//!
//! The API answers for positions with at most seven pieces. Categories
//! in the response are relative to the side to move; each listed move's
//! category is relative to the side to move *after* that move, so the
//! mapping below flips it back to the player of the move.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use shakmaty::{Color, Position};
use tracing::{debug, warn};

use crate::{
    config::TablebaseConfig,
    error::TrainerError,
    knowledge::KnowledgeBase,
    rules::parse_position,
    types::{Evaluation, RankedMove},
    wdl::{EvalCategory, Wdl},
};

/// Largest piece count the tablebase covers.
pub const MAX_PIECES: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum LichessCategory {
    Win,
    SyzygyWin,
    MaybeWin,
    CursedWin,
    Draw,
    BlessedLoss,
    MaybeLoss,
    SyzygyLoss,
    Loss,
    #[serde(other)]
    Unknown,
}

impl LichessCategory {
    fn wdl(self) -> i32 {
        match self {
            LichessCategory::Win | LichessCategory::SyzygyWin => 2,
            LichessCategory::MaybeWin | LichessCategory::CursedWin => 1,
            LichessCategory::Draw | LichessCategory::Unknown => 0,
            LichessCategory::BlessedLoss | LichessCategory::MaybeLoss => -1,
            LichessCategory::Loss | LichessCategory::SyzygyLoss => -2,
        }
    }

    fn category(self) -> EvalCategory {
        if self == LichessCategory::Unknown {
            return EvalCategory::Unknown;
        }
        match self.wdl().signum() {
            1 => EvalCategory::Win,
            0 => EvalCategory::Draw,
            _ => EvalCategory::Loss,
        }
    }

    fn is_precise(self) -> bool {
        !matches!(
            self,
            LichessCategory::MaybeWin | LichessCategory::MaybeLoss | LichessCategory::Unknown
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TablebaseResponse {
    pub category: LichessCategory,
    pub dtz: Option<i32>,
    pub dtm: Option<i32>,
    #[serde(default)]
    pub checkmate: bool,
    #[serde(default)]
    pub moves: Vec<TablebaseMove>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TablebaseMove {
    pub uci: String,
    pub san: String,
    pub category: LichessCategory,
    pub dtz: Option<i32>,
    pub dtm: Option<i32>,
}

impl TablebaseResponse {
    pub(crate) fn evaluation(&self, turn: Color) -> Evaluation {
        let (wdl, category) = if self.checkmate {
            (LichessCategory::Loss.wdl(), EvalCategory::Mate)
        } else {
            (self.category.wdl(), self.category.category())
        };
        Evaluation {
            wdl: Wdl::new(wdl, turn),
            category,
            dtm: self.dtm,
            dtz: self.dtz,
            precise: self.category.is_precise(),
        }
    }

    pub(crate) fn ranked_moves(&self, turn: Color, limit: usize) -> Vec<RankedMove> {
        self.moves
            .iter()
            .take(limit)
            .map(|m| RankedMove {
                san: m.san.clone(),
                uci: Some(m.uci.clone()),
                wdl: Wdl::new(m.category.wdl(), turn.other()).flipped(),
                category: m.category.category().flipped(),
                dtm: m.dtm,
                dtz: m.dtz,
            })
            .collect()
    }
}

pub struct LichessTablebase {
    client: Client,
    base_url: Url,
}

impl LichessTablebase {
    pub fn new(config: &TablebaseConfig) -> Result<Self, TrainerError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| TrainerError::KnowledgeBase(format!("bad tablebase url: {e}")))?;
        Ok(Self { client, base_url })
    }

    /// Returns the side to move and the raw response, or `None` when the
    /// tablebase has nothing for this position.
    async fn lookup(&self, fen: &str) -> Result<Option<(Color, TablebaseResponse)>, TrainerError> {
        let position = parse_position(fen)?;
        let pieces = position.board().occupied().count();
        if pieces > MAX_PIECES {
            debug!(fen, pieces, "position outside tablebase range");
            return Ok(None);
        }

        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("fen", fen);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            warn!(fen, status = %response.status(), "tablebase lookup unavailable");
            return Ok(None);
        }

        let body: TablebaseResponse = response.json().await?;
        Ok(Some((position.turn(), body)))
    }
}

#[async_trait]
impl KnowledgeBase for LichessTablebase {
    async fn evaluation(&self, fen: &str) -> Result<Option<Evaluation>, TrainerError> {
        Ok(self
            .lookup(fen)
            .await?
            .map(|(turn, response)| response.evaluation(turn)))
    }

    async fn top_moves(
        &self,
        fen: &str,
        limit: usize,
    ) -> Result<Option<Vec<RankedMove>>, TrainerError> {
        Ok(self
            .lookup(fen)
            .await?
            .map(|(turn, response)| response.ranked_moves(turn, limit)))
    }
}
