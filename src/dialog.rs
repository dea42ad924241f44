//! Dialog and toast state for the training screen.
//!
//! Nothing here performs I/O; the functions only reshape [`DialogState`].

use tracing::info;

use crate::{
    messages::{Locale, Messages},
    types::{PromotionInfo, PromotionPiece},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveErrorDialog {
    pub is_open: bool,
    pub wdl_before: i32,
    pub wdl_after: i32,
    pub best_move: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveSuccessDialog {
    pub is_open: bool,
    pub promotion_piece: Option<String>,
    pub move_description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogState {
    pub move_error: MoveErrorDialog,
    pub move_success: MoveSuccessDialog,
    pub toasts: Vec<Toast>,
}

impl DialogState {
    pub fn last_toast(&self) -> Option<&Toast> {
        self.toasts.last()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DialogManager {
    messages: Messages,
}

impl DialogManager {
    pub fn new(locale: Locale) -> Self {
        Self {
            messages: Messages::for_locale(locale),
        }
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn show_move_error_dialog(
        &self,
        ui: &mut DialogState,
        wdl_before: i32,
        wdl_after: i32,
        best_move: Option<String>,
    ) {
        ui.move_error = MoveErrorDialog {
            is_open: true,
            wdl_before,
            wdl_after,
            best_move,
        };
    }

    pub fn close_move_error_dialog(&self, ui: &mut DialogState) {
        ui.move_error = MoveErrorDialog::default();
    }

    pub fn show_toast(&self, ui: &mut DialogState, message: impl Into<String>, kind: ToastKind) {
        ui.toasts.push(Toast {
            message: message.into(),
            kind,
        });
    }

    pub fn show_promotion_success(&self, ui: &mut DialogState, promotion: &PromotionInfo) {
        let piece = self
            .messages
            .piece_name(promotion.promotion_piece.unwrap_or(PromotionPiece::Queen));
        ui.move_success = MoveSuccessDialog {
            is_open: true,
            promotion_piece: Some(piece.to_owned()),
            move_description: promotion.move_description.clone(),
        };
    }

    pub fn close_move_success_dialog(&self, ui: &mut DialogState) {
        ui.move_success = MoveSuccessDialog::default();
    }

    /// Describe how the value moved, rounded to one decimal.
    pub fn format_wdl_change(&self, before: f64, after: f64) -> String {
        let difference = after - before;
        let amount = (difference.abs() * 10.0).round() / 10.0;
        let amount = if amount.fract() == 0.0 {
            format!("{amount:.0}")
        } else {
            format!("{amount:.1}")
        };
        self.messages.wdl_change(difference, &amount)
    }

    pub fn is_significant_wdl_change(before: f64, after: f64, threshold: f64) -> bool {
        (after - before).abs() >= threshold
    }

    pub fn move_quality_description(
        &self,
        was_optimal: bool,
        outcome_changed: bool,
    ) -> &'static str {
        if was_optimal {
            self.messages.optimal_move
        } else if outcome_changed {
            self.messages.outcome_changed
        } else {
            self.messages.suboptimal_move
        }
    }

    /// Pick the promotion piece. There is no interactive choice in the
    /// training flow: the queen is taken and the player is told so.
    pub fn resolve_promotion_choice(&self, ui: &mut DialogState) -> PromotionPiece {
        info!("promotion resolved to queen");
        self.show_toast(ui, self.messages.promotion_auto_queen, ToastKind::Info);
        PromotionPiece::Queen
    }

    /// Confirmation prompts always resolve to "yes" after an info toast.
    pub fn confirm(&self, ui: &mut DialogState, message: &str) -> bool {
        info!(message, "confirmation auto-accepted");
        self.show_toast(ui, message, ToastKind::Info);
        true
    }
}
