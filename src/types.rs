use std::fmt;

use shakmaty::{Color, Role, Square};

use crate::wdl::{EvalCategory, Wdl};

/// Tablebase evaluation of a single position.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Win/draw/loss value for the side to move in the evaluated position
    pub wdl: Wdl,
    /// Category label, relative to `wdl.side()`
    pub category: EvalCategory,
    pub dtm: Option<i32>,
    pub dtz: Option<i32>,
    pub precise: bool,
}

impl Evaluation {
    pub fn new(wdl: Wdl, category: EvalCategory) -> Self {
        Self {
            wdl,
            category,
            dtm: None,
            dtz: None,
            precise: true,
        }
    }

    /// Category label as seen by `side`.
    pub fn category_for(&self, side: Color) -> EvalCategory {
        if side == self.wdl.side() {
            self.category
        } else {
            self.category.flipped()
        }
    }
}

/// One candidate move from the tablebase, ranked best first.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMove {
    pub san: String,
    pub uci: Option<String>,
    /// Value of the move for the side that plays it
    pub wdl: Wdl,
    pub category: EvalCategory,
    pub dtm: Option<i32>,
    pub dtz: Option<i32>,
}

/// A move that the rules engine has already legalized and played.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    #[cfg_attr(feature = "serde", serde(serialize_with = "ser::square"))]
    pub from: Square,
    #[cfg_attr(feature = "serde", serde(serialize_with = "ser::square"))]
    pub to: Square,
    /// Standard algebraic notation, including check or mate suffix
    pub san: String,
    #[cfg_attr(feature = "serde", serde(serialize_with = "ser::color"))]
    pub color: Color,
    #[cfg_attr(feature = "serde", serde(serialize_with = "ser::opt_role"))]
    pub promotion: Option<Role>,
    pub fen_before: String,
    pub fen_after: String,
}

/// A move as submitted by the player, before the rules engine saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveInput {
    Coordinates {
        from: Square,
        to: Square,
        promotion: Option<Role>,
    },
    /// SAN (`"Kd2"`, `"e8=Q+"`) or UCI (`"e7e8q"`)
    Notation(String),
}

impl MoveInput {
    pub fn coordinates(from: Square, to: Square) -> Self {
        MoveInput::Coordinates {
            from,
            to,
            promotion: None,
        }
    }
}

impl From<&str> for MoveInput {
    fn from(notation: &str) -> Self {
        MoveInput::Notation(notation.to_owned())
    }
}

impl From<String> for MoveInput {
    fn from(notation: String) -> Self {
        MoveInput::Notation(notation)
    }
}

impl fmt::Display for MoveInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveInput::Coordinates {
                from,
                to,
                promotion,
            } => {
                write!(f, "{from}{to}")?;
                if let Some(role) = promotion {
                    write!(f, "{}", role.char())?;
                }
                Ok(())
            }
            MoveInput::Notation(notation) => f.write_str(notation),
        }
    }
}

/// Verdict on a single player move.
///
/// `Default` is the "no opinion" result used whenever the tablebase
/// could not answer.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveQualityResult {
    pub should_show_error_dialog: bool,
    /// Value before the move, from the mover's perspective
    pub wdl_before: Option<i32>,
    /// Value after the move, from the mover's perspective
    pub wdl_after: Option<i32>,
    pub best_move: Option<String>,
    pub was_optimal: bool,
    pub outcome_changed: bool,
}

/// The four pieces a pawn may promote to.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromotionPiece {
    Queen,
    Rook,
    Knight,
    Bishop,
}

impl TryFrom<Role> for PromotionPiece {
    type Error = Role;

    fn try_from(role: Role) -> Result<Self, Self::Error> {
        match role {
            Role::Queen => Ok(PromotionPiece::Queen),
            Role::Rook => Ok(PromotionPiece::Rook),
            Role::Knight => Ok(PromotionPiece::Knight),
            Role::Bishop => Ok(PromotionPiece::Bishop),
            other => Err(other),
        }
    }
}

impl From<PromotionPiece> for Role {
    fn from(piece: PromotionPiece) -> Self {
        match piece {
            PromotionPiece::Queen => Role::Queen,
            PromotionPiece::Rook => Role::Rook,
            PromotionPiece::Knight => Role::Knight,
            PromotionPiece::Bishop => Role::Bishop,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionInfo {
    pub is_promotion: bool,
    pub promotion_piece: Option<PromotionPiece>,
    #[cfg_attr(feature = "serde", serde(serialize_with = "ser::opt_square"))]
    pub from: Option<Square>,
    #[cfg_attr(feature = "serde", serde(serialize_with = "ser::opt_square"))]
    pub to: Option<Square>,
    pub is_auto_win: bool,
    pub move_description: Option<String>,
}

/// Anchor evaluation established earlier in the session.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingBaseline {
    pub wdl: Wdl,
    pub fen: String,
}

/// Where the "before" value of a move comparison comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum BeforeEvaluation {
    /// Compare against the session anchor instead of the fresh query
    Baseline(TrainingBaseline),
    FreshQuery,
}

/// Whose turn it is within the training session.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnState {
    pub is_player_turn: bool,
    pub is_opponent_thinking: bool,
}

impl Default for TurnState {
    fn default() -> Self {
        Self::player()
    }
}

impl TurnState {
    pub fn player() -> Self {
        Self {
            is_player_turn: true,
            is_opponent_thinking: false,
        }
    }

    pub fn opponent_thinking() -> Self {
        Self {
            is_player_turn: false,
            is_opponent_thinking: true,
        }
    }

    /// Neither side may move; the session is over.
    pub fn finished() -> Self {
        Self {
            is_player_turn: false,
            is_opponent_thinking: false,
        }
    }

    pub fn is_opponent_turn(&self) -> bool {
        !self.is_player_turn && self.is_opponent_thinking
    }
}

/// How a game ended on the board.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnd {
    Checkmate {
        #[cfg_attr(feature = "serde", serde(serialize_with = "ser::color"))]
        winner: Color,
    },
    Draw,
}

/// `shakmaty` board types serialized through their notation.
#[cfg(feature = "serde")]
mod ser {
    use serde::Serializer;
    use shakmaty::{Color, Role, Square};

    pub fn square<S: Serializer>(square: &Square, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(square)
    }

    pub fn opt_square<S: Serializer>(
        square: &Option<Square>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match square {
            Some(square) => serializer.serialize_some(&square.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn color<S: Serializer>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match color {
            Color::White => "white",
            Color::Black => "black",
        })
    }

    pub fn opt_role<S: Serializer>(role: &Option<Role>, serializer: S) -> Result<S::Ok, S::Error> {
        match role {
            Some(role) => serializer.serialize_some(&role.char()),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn applied_move_serializes_in_notation() {
        let applied = AppliedMove {
            from: Square::E7,
            to: Square::E8,
            san: "e8=Q".to_owned(),
            color: Color::White,
            promotion: Some(Role::Queen),
            fen_before: "8/4P3/8/8/8/8/k7/4K3 w - - 0 1".to_owned(),
            fen_after: "4Q3/8/8/8/8/8/k7/4K3 b - - 0 1".to_owned(),
        };

        let value = serde_json::to_value(&applied).unwrap();
        assert_eq!(value["from"], json!("e7"));
        assert_eq!(value["to"], json!("e8"));
        assert_eq!(value["color"], json!("white"));
        assert_eq!(value["promotion"], json!("q"));
    }

    #[test]
    fn game_end_and_promotion_info_serialize() {
        let end = serde_json::to_value(GameEnd::Checkmate {
            winner: Color::Black,
        })
        .unwrap();
        assert_eq!(end, json!({ "Checkmate": { "winner": "black" } }));

        let info = serde_json::to_value(PromotionInfo::default()).unwrap();
        assert_eq!(info["from"], json!(null));
        assert_eq!(info["promotion_piece"], json!(null));
    }
}
