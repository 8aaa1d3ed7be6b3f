use std::collections::BTreeSet;

use crate::engine::{Piece, RulesEngine};
use crate::interaction::InteractionState;
use crate::square::Square;

/// Everything the renderer needs for one board redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualProjection {
    pub selected: Option<Square>,
    pub highlighted: BTreeSet<Square>,
    /// Indexed by [`Square::index`].
    pub pieces: [Option<Piece>; 64],
}

impl VisualProjection {
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pieces[square.index()]
    }

    pub fn is_highlighted(&self, square: Square) -> bool {
        self.highlighted.contains(&square)
    }
}

/// Recomputed after every accepted transition; never cached across moves.
pub fn project<E: RulesEngine + ?Sized>(state: &InteractionState, engine: &E) -> VisualProjection {
    let (selected, highlighted) = match state {
        InteractionState::Idle => (None, BTreeSet::new()),
        InteractionState::Selected {
            square,
            legal_moves,
        } => (Some(*square), legal_moves.iter().map(|m| m.to).collect()),
    };

    let mut pieces = [None; 64];
    for square in Square::all() {
        pieces[square.index()] = engine.piece_at(square);
    }

    VisualProjection {
        selected,
        highlighted,
        pieces,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Color, PieceKind, StandardChess};

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn idle_has_no_highlights() {
        let engine = StandardChess::new();
        let view = project(&InteractionState::Idle, &engine);
        assert_eq!(view.selected, None);
        assert!(view.highlighted.is_empty());
        assert_eq!(view.pieces.iter().flatten().count(), 32);
        assert_eq!(
            view.piece_at(sq("e1")),
            Some(Piece {
                color: Color::White,
                kind: PieceKind::King
            })
        );
    }

    #[test]
    fn selected_highlights_destinations() {
        let engine = StandardChess::new();
        let state = InteractionState::Selected {
            square: sq("b1"),
            legal_moves: engine.legal_moves_from(sq("b1")),
        };
        let view = project(&state, &engine);
        assert_eq!(view.selected, Some(sq("b1")));
        assert_eq!(
            view.highlighted,
            [sq("a3"), sq("c3")].into_iter().collect::<BTreeSet<_>>()
        );
        assert!(view.is_highlighted(sq("c3")));
        assert!(!view.is_highlighted(sq("b1")));
    }

    #[test]
    fn promotions_collapse_to_one_destination() {
        let engine = StandardChess::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        let state = InteractionState::Selected {
            square: sq("a7"),
            legal_moves: engine.legal_moves_from(sq("a7")),
        };
        let view = project(&state, &engine);
        assert_eq!(view.highlighted.len(), 1);
    }
}
