//! Localized strings shown to the player.

use serde::Deserialize;

use crate::types::PromotionPiece;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    De,
}

/// Fixed message table for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    pub locale: Locale,
    pub queen: &'static str,
    pub rook: &'static str,
    pub knight: &'static str,
    pub bishop: &'static str,
    pub invalid_move: &'static str,
    pub not_your_turn: &'static str,
    pub optimal_move: &'static str,
    pub outcome_changed: &'static str,
    pub suboptimal_move: &'static str,
    pub opponent_unavailable: &'static str,
    pub opponent_move_rejected: &'static str,
    pub promotion_auto_queen: &'static str,
    pub training_won: &'static str,
    pub training_lost: &'static str,
}

const EN: Messages = Messages {
    locale: Locale::En,
    queen: "Queen",
    rook: "Rook",
    knight: "Knight",
    bishop: "Bishop",
    invalid_move: "Invalid move",
    not_your_turn: "Please wait for your turn",
    optimal_move: "Optimal move!",
    outcome_changed: "This move changes the game outcome",
    suboptimal_move: "Good move, but there was a better one",
    opponent_unavailable: "The opponent could not find a move. It is your turn again.",
    opponent_move_rejected: "The opponent's move was rejected",
    promotion_auto_queen: "Pawn promoted to a queen",
    training_won: "Training won!",
    training_lost: "Training failed",
};

const DE: Messages = Messages {
    locale: Locale::De,
    queen: "Dame",
    rook: "Turm",
    knight: "Springer",
    bishop: "Läufer",
    invalid_move: "Ungültiger Zug",
    not_your_turn: "Bitte warte, bis du am Zug bist",
    optimal_move: "Optimaler Zug!",
    outcome_changed: "Dieser Zug verändert das Spielergebnis",
    suboptimal_move: "Guter Zug, aber es gab einen besseren",
    opponent_unavailable: "Der Gegner konnte keinen Zug finden. Du bist wieder am Zug.",
    opponent_move_rejected: "Der Zug des Gegners wurde abgelehnt",
    promotion_auto_queen: "Bauer wurde in eine Dame umgewandelt",
    training_won: "Training gewonnen!",
    training_lost: "Training nicht bestanden",
};

impl Messages {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => EN,
            Locale::De => DE,
        }
    }

    pub fn piece_name(&self, piece: PromotionPiece) -> &'static str {
        match piece {
            PromotionPiece::Queen => self.queen,
            PromotionPiece::Rook => self.rook,
            PromotionPiece::Knight => self.knight,
            PromotionPiece::Bishop => self.bishop,
        }
    }

    /// "improved by N" / "worsened by N" / "unchanged".
    pub fn wdl_change(&self, difference: f64, amount: &str) -> String {
        match self.locale {
            Locale::En if difference > 0.0 => format!("Evaluation improved by {amount} points"),
            Locale::En if difference < 0.0 => format!("Evaluation worsened by {amount} points"),
            Locale::En => "Evaluation unchanged".to_owned(),
            Locale::De if difference > 0.0 => format!("Bewertung verbessert um {amount} Punkte"),
            Locale::De if difference < 0.0 => {
                format!("Bewertung verschlechtert um {amount} Punkte")
            }
            Locale::De => "Bewertung unverändert".to_owned(),
        }
    }

    pub fn promotion_success(&self, piece_name: &str, description: &str) -> String {
        match self.locale {
            Locale::En => format!("Promotion to {piece_name} ({description}) wins the game!"),
            Locale::De => format!("Umwandlung in {piece_name} ({description}) gewinnt die Partie!"),
        }
    }
}

impl Default for Messages {
    fn default() -> Self {
        EN
    }
}
