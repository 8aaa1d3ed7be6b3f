use serde::{Deserialize, Serialize};

use crate::classifier::GestureLabel;
use crate::engine::{Color, RulesEngine};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    English,
    Dutch,
}

impl Locale {
    fn side(&self, color: Color) -> &'static str {
        match (self, color) {
            (Locale::English, Color::White) => "White",
            (Locale::English, Color::Black) => "Black",
            (Locale::Dutch, Color::White) => "Wit",
            (Locale::Dutch, Color::Black) => "Zwart",
        }
    }
}

/// Snapshot of the engine's status queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStatus {
    pub turn: Color,
    pub in_check: bool,
    pub in_checkmate: bool,
    pub in_draw: bool,
}

impl GameStatus {
    pub fn of<E: RulesEngine + ?Sized>(engine: &E) -> Self {
        Self {
            turn: engine.turn(),
            in_check: engine.in_check(),
            in_checkmate: engine.in_checkmate(),
            in_draw: engine.in_draw(),
        }
    }

    /// Side that delivered mate, if the game is over by checkmate.
    pub fn winner(&self) -> Option<Color> {
        self.in_checkmate.then(|| self.turn.opponent())
    }

    pub fn is_over(&self) -> bool {
        self.in_checkmate || self.in_draw
    }

    pub fn text(&self, locale: Locale) -> String {
        if let Some(winner) = self.winner() {
            return match locale {
                Locale::English => format!("Checkmate! {} wins!", locale.side(winner)),
                Locale::Dutch => format!("Schaakmat! {} wint!", locale.side(winner)),
            };
        }
        if self.in_draw {
            return match locale {
                Locale::English => "Draw!".to_string(),
                Locale::Dutch => "Remise!".to_string(),
            };
        }

        let mut text = match locale {
            Locale::English => format!("{} to move", locale.side(self.turn)),
            Locale::Dutch => format!("{} aan zet", locale.side(self.turn)),
        };
        if self.in_check {
            text.push_str(match locale {
                Locale::English => " (Check!)",
                Locale::Dutch => " (Schaak!)",
            });
        }
        text
    }
}

/// On-screen feedback line for the last accepted gesture.
pub fn gesture_text(label: Option<GestureLabel>, locale: Locale) -> String {
    let shown = label.map_or_else(|| "-".to_string(), |l| l.to_string());
    match locale {
        Locale::English => format!("Detected gesture: {shown}"),
        Locale::Dutch => format!("Gedetecteerd gebaar: {shown}"),
    }
}
