//! Perspective-aware tablebase values.
//!
//! Tablebases report every value from the point of view of the side to
//! move in the queried position. A move hands the turn to the other
//! side, so the evaluation before a move and the evaluation after it are
//! expressed for *opposite* colors and cannot be compared as bare
//! numbers. [`Wdl`] carries the color it is relative to, and the only
//! way to read a comparable number out of it is [`Wdl::for_side`].

use serde::Deserialize;
use shakmaty::Color;

/// Three-way classification derived from the sign of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeCategory {
    Win,
    Draw,
    Loss,
}

impl OutcomeCategory {
    pub fn from_value(value: i32) -> Self {
        match value.signum() {
            1 => OutcomeCategory::Win,
            0 => OutcomeCategory::Draw,
            _ => OutcomeCategory::Loss,
        }
    }
}

/// Category label attached to a tablebase evaluation.
///
/// Like the numeric value, the label is relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalCategory {
    Win,
    Draw,
    Loss,
    Mate,
    Unknown,
}

impl EvalCategory {
    /// The same label seen from the other side of the board.
    pub fn flipped(self) -> Self {
        match self {
            EvalCategory::Win => EvalCategory::Loss,
            EvalCategory::Loss => EvalCategory::Win,
            other => other,
        }
    }

    /// Whether the label settles the game one way or the other.
    pub fn is_decisive(self) -> bool {
        matches!(self, EvalCategory::Win | EvalCategory::Mate)
    }
}

/// A signed win/draw/loss value together with the color it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Wdl {
    value: i32,
    side: Color,
}

impl Wdl {
    /// `value` as reported for `side`.
    pub fn new(value: i32, side: Color) -> Self {
        Self { value, side }
    }

    /// The color the stored value is relative to.
    pub fn side(&self) -> Color {
        self.side
    }

    /// The value from the perspective of `side`.
    ///
    /// Negates when `side` is not the color the value was reported for.
    pub fn for_side(&self, side: Color) -> i32 {
        if side == self.side {
            self.value
        } else {
            -self.value
        }
    }

    /// The same fact, re-expressed for the other color.
    pub fn flipped(&self) -> Self {
        Self {
            value: -self.value,
            side: self.side.other(),
        }
    }

    pub fn outcome_for(&self, side: Color) -> OutcomeCategory {
        OutcomeCategory::from_value(self.for_side(side))
    }
}
