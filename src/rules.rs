use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, Move, Position, Role, Setup,
    fen::Fen,
    san::{San, SanPlus, Suffix},
    uci::UciMove,
};

use crate::{
    error::TrainerError,
    types::{AppliedMove, MoveInput},
};

/// The chess rules collaborator.
///
/// The trainer never decides legality itself; it asks an implementation
/// of this trait. [`ShakmatyRules`] is the bundled one.
pub trait RulesEngine: Send + 'static {
    /// Load a position from FEN.
    fn from_fen(fen: &str) -> Result<Self, TrainerError>
    where
        Self: Sized;

    fn current_position(&self) -> String;

    fn side_to_move(&self) -> Color;

    /// Check whether `mv` is legal in the current position without playing it.
    fn check_move(&self, mv: &MoveInput) -> Result<(), TrainerError>;

    /// Play `mv`. Returns `None` if the engine rejects it.
    fn apply_move(&mut self, mv: &MoveInput) -> Option<AppliedMove>;

    /// Take back the most recent move, if any.
    fn undo_move(&mut self) -> Option<AppliedMove>;

    fn is_game_over(&self) -> bool;

    fn is_checkmate(&self) -> bool;
}

/// Parse a FEN string into a playable position.
pub(crate) fn parse_position(fen: &str) -> Result<Chess, TrainerError> {
    let setup: Setup = fen.parse::<Fen>()?.into_setup();
    let position: Chess = setup.position(CastlingMode::Standard)?;
    Ok(position)
}

fn to_fen(position: &Chess) -> String {
    Fen::from_position(position, EnPassantMode::Legal).to_string()
}

/// [`RulesEngine`] backed by `shakmaty`.
#[derive(Debug, Clone)]
pub struct ShakmatyRules {
    position: Chess,
    history: Vec<(Chess, AppliedMove)>,
}

impl ShakmatyRules {
    pub fn new(position: Chess) -> Self {
        Self {
            position,
            history: Vec::new(),
        }
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    fn resolve(&self, mv: &MoveInput) -> Result<Move, TrainerError> {
        match mv {
            MoveInput::Coordinates {
                from,
                to,
                promotion,
            } => {
                let mut candidates = self.position.legal_moves().into_iter().filter(|m| {
                    matches!(
                        m.to_uci(CastlingMode::Standard),
                        UciMove::Normal { from: f, to: t, .. } if f == *from && t == *to
                    )
                });
                // Without a designator a promotion resolves to the queen.
                let wanted = promotion.unwrap_or(Role::Queen);
                candidates
                    .find(|m| m.promotion().is_none() || m.promotion() == Some(wanted))
                    .ok_or_else(|| TrainerError::IllegalMove(format!("Illegal move: {mv}")))
            }
            MoveInput::Notation(notation) => {
                if let Ok(san) = notation.parse::<SanPlus>() {
                    if let Ok(m) = san.san.to_move(&self.position) {
                        return Ok(m);
                    }
                }
                let uci: UciMove = notation
                    .parse()
                    .map_err(|_| TrainerError::IllegalMove(format!("Illegal move: {notation}")))?;
                uci.to_move(&self.position)
                    .map_err(|_| TrainerError::IllegalMove(format!("Illegal move: {notation}")))
            }
        }
    }
}

impl RulesEngine for ShakmatyRules {
    fn from_fen(fen: &str) -> Result<Self, TrainerError> {
        Ok(Self::new(parse_position(fen)?))
    }

    fn current_position(&self) -> String {
        to_fen(&self.position)
    }

    fn side_to_move(&self) -> Color {
        self.position.turn()
    }

    fn check_move(&self, mv: &MoveInput) -> Result<(), TrainerError> {
        self.resolve(mv).map(|_| ())
    }

    fn apply_move(&mut self, mv: &MoveInput) -> Option<AppliedMove> {
        let m = self.resolve(mv).ok()?;
        let UciMove::Normal { from, to, promotion } = m.to_uci(CastlingMode::Standard) else {
            return None;
        };

        let before = self.position.clone();
        let san = San::from_move(&before, m.clone());
        let after = before.clone().play(m).ok()?;
        let san = SanPlus {
            san,
            suffix: Suffix::from_position(&after),
        };

        let applied = AppliedMove {
            from,
            to,
            san: san.to_string(),
            color: before.turn(),
            promotion,
            fen_before: to_fen(&before),
            fen_after: to_fen(&after),
        };
        self.history.push((before, applied.clone()));
        self.position = after;
        Some(applied)
    }

    fn undo_move(&mut self) -> Option<AppliedMove> {
        let (previous, applied) = self.history.pop()?;
        self.position = previous;
        Some(applied)
    }

    fn is_game_over(&self) -> bool {
        self.position.is_game_over()
    }

    fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Square;

    const KPK: &str = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";

    #[test]
    fn applies_san_and_reports_promotion() {
        let mut rules = ShakmatyRules::from_fen(KPK).unwrap();
        let applied = rules.apply_move(&"e8=Q".into()).unwrap();

        assert_eq!(applied.from, Square::E7);
        assert_eq!(applied.to, Square::E8);
        assert_eq!(applied.color, Color::White);
        assert_eq!(applied.promotion, Some(Role::Queen));
        assert_eq!(applied.fen_before, KPK);
        assert_eq!(rules.side_to_move(), Color::Black);
        assert_eq!(rules.position().turn(), Color::Black);
        assert_eq!(rules.current_position(), applied.fen_after);
    }

    #[test]
    fn coordinates_default_to_queen_promotion() {
        let mut rules = ShakmatyRules::from_fen(KPK).unwrap();
        let applied = rules
            .apply_move(&MoveInput::coordinates(Square::E7, Square::E8))
            .unwrap();
        assert_eq!(applied.promotion, Some(Role::Queen));
        assert_eq!(applied.san, "e8=Q");
    }

    #[test]
    fn accepts_uci_notation() {
        let mut rules = ShakmatyRules::from_fen(KPK).unwrap();
        let applied = rules.apply_move(&"e7e8n".into()).unwrap();
        assert_eq!(applied.promotion, Some(Role::Knight));
    }

    #[test]
    fn rejects_illegal_moves_without_changing_position() {
        let mut rules = ShakmatyRules::from_fen(KPK).unwrap();
        assert!(rules.check_move(&"Kd2".into()).is_ok());
        assert!(rules.check_move(&"Qh5".into()).is_err());
        assert!(rules.apply_move(&"e1e3".into()).is_none());
        assert_eq!(rules.current_position(), KPK);
    }

    #[test]
    fn undo_restores_previous_position() {
        let mut rules = ShakmatyRules::from_fen(KPK).unwrap();
        let applied = rules.apply_move(&"Kd2".into()).unwrap();
        assert_eq!(rules.undo_move(), Some(applied));
        assert_eq!(rules.current_position(), KPK);
        assert!(rules.undo_move().is_none());
    }

    #[test]
    fn detects_mate_by_promotion() {
        let mut rules = ShakmatyRules::from_fen("k7/7P/1K6/8/8/8/8/8 w - - 0 1").unwrap();
        let applied = rules.apply_move(&"h8=Q".into()).unwrap();
        assert_eq!(applied.san, "h8=Q#");
        assert!(rules.is_game_over());
        assert!(rules.is_checkmate());
    }

    #[test]
    fn stalemate_is_over_but_not_mate() {
        let rules = ShakmatyRules::from_fen("k7/8/1Q6/8/8/8/8/7K b - - 0 1").unwrap();
        assert!(rules.is_game_over());
        assert!(!rules.is_checkmate());
    }

    #[test]
    fn rejects_malformed_fen() {
        assert!(matches!(
            ShakmatyRules::from_fen("not a fen"),
            Err(TrainerError::InvalidFen(_))
        ));
    }
}
