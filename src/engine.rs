//! Contract with the chess rules collaborator, plus a standard-chess adapter.
//!
//! The interaction layer never builds moves itself; it only hands back moves
//! that came out of [`RulesEngine::legal_moves`] or
//! [`RulesEngine::legal_moves_from`].

use serde::{Deserialize, Serialize};
use itertools::Itertools;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{fen::Fen, CastlingMode, Chess, EnPassantMode, Position};
use tracing::warn;

use crate::error::EngineError;
use crate::square::Square;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn as_char(&self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    pub fn opponent(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub fn as_char(&self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

/// A legal move as reported by the rules engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
}

impl Move {
    /// Long algebraic form, e.g. `e2e4` or `e7e8q`.
    pub fn uci(&self) -> String {
        match self.promotion {
            Some(kind) => format!("{}{}{}", self.from, self.to, kind.as_char()),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

pub trait RulesEngine {
    /// All legal moves for the side to move.
    fn legal_moves(&self) -> Vec<Move>;

    /// Legal moves whose origin is `square`.
    fn legal_moves_from(&self, square: Square) -> Vec<Move> {
        self.legal_moves()
            .into_iter()
            .filter(|m| m.from == square)
            .collect()
    }

    /// Returns false and leaves the position untouched if `mv` is not legal.
    fn apply_move(&mut self, mv: &Move) -> bool;

    fn piece_at(&self, square: Square) -> Option<Piece>;

    fn turn(&self) -> Color;

    fn in_check(&self) -> bool;

    fn in_checkmate(&self) -> bool;

    fn in_draw(&self) -> bool;
}

/// Standard chess backed by `shakmaty`.
#[derive(Debug, Clone)]
pub struct StandardChess {
    position: Chess,
    /// Hash of every position reached so far, the current one last.
    history: Vec<Zobrist64>,
}

impl Default for StandardChess {
    fn default() -> Self {
        Self::with_position(Chess::default())
    }
}

impl StandardChess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        let setup = fen
            .parse::<Fen>()
            .map_err(|e| EngineError::InvalidFen(e.to_string()))?;
        let position: Chess = setup
            .into_position(CastlingMode::Standard)
            .map_err(|e| EngineError::InvalidFen(e.to_string()))?;
        Ok(Self::with_position(position))
    }

    fn with_position(position: Chess) -> Self {
        let history = vec![position.zobrist_hash::<Zobrist64>(EnPassantMode::Legal)];
        Self { position, history }
    }

    /// Some position has occurred three times.
    pub fn is_threefold_repetition(&self) -> bool {
        self.history.iter().counts().values().any(|&n| n >= 3)
    }

    fn convert(&self, m: &shakmaty::Move) -> Option<Move> {
        let from = to_square(m.from()?)?;
        let to = match m {
            // shakmaty encodes castling as king-takes-rook
            shakmaty::Move::Castle { king, rook } => {
                let king_sq = to_square(*king)?;
                let file = if to_square(*rook)?.file_char() > king_sq.file_char() {
                    6
                } else {
                    2
                };
                Square::new(file, king_sq.rank())?
            }
            _ => to_square(m.to())?,
        };
        Some(Move {
            from,
            to,
            piece: from_role(m.role()),
            captured: m.capture().map(from_role),
            promotion: m.promotion().map(from_role),
        })
    }
}

impl RulesEngine for StandardChess {
    fn legal_moves(&self) -> Vec<Move> {
        self.position
            .legal_moves()
            .iter()
            .filter_map(|m| self.convert(m))
            .collect()
    }

    fn apply_move(&mut self, mv: &Move) -> bool {
        let found = self
            .position
            .legal_moves()
            .into_iter()
            .find(|m| self.convert(m).as_ref() == Some(mv));
        match found {
            Some(m) => {
                self.position.play_unchecked(&m);
                self.history
                    .push(self.position.zobrist_hash::<Zobrist64>(EnPassantMode::Legal));
                true
            }
            None => {
                warn!(mv = %mv.uci(), "engine rejected move");
                false
            }
        }
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        let sq: shakmaty::Square = square.to_string().parse().ok()?;
        self.position.board().piece_at(sq).map(|p| Piece {
            color: from_color(p.color),
            kind: from_role(p.role),
        })
    }

    fn turn(&self) -> Color {
        from_color(self.position.turn())
    }

    fn in_check(&self) -> bool {
        self.position.is_check()
    }

    fn in_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    fn in_draw(&self) -> bool {
        self.position.is_stalemate()
            || self.position.is_insufficient_material()
            || self.position.halfmoves() >= 100
            || self.is_threefold_repetition()
    }
}

fn to_square(sq: shakmaty::Square) -> Option<Square> {
    sq.to_string().parse().ok()
}

fn from_color(c: shakmaty::Color) -> Color {
    match c {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

fn from_role(r: shakmaty::Role) -> PieceKind {
    match r {
        shakmaty::Role::Pawn => PieceKind::Pawn,
        shakmaty::Role::Knight => PieceKind::Knight,
        shakmaty::Role::Bishop => PieceKind::Bishop,
        shakmaty::Role::Rook => PieceKind::Rook,
        shakmaty::Role::Queen => PieceKind::Queen,
        shakmaty::Role::King => PieceKind::King,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn starting_position_has_twenty_moves() {
        let engine = StandardChess::new();
        assert_eq!(engine.legal_moves().len(), 20);
        assert_eq!(engine.turn(), Color::White);
        assert!(!engine.in_check());
        assert!(!engine.in_checkmate());
        assert!(!engine.in_draw());
    }

    #[test]
    fn moves_from_square() {
        let engine = StandardChess::new();
        let moves = engine.legal_moves_from(sq("g1"));
        let mut targets: Vec<String> = moves.iter().map(|m| m.to.to_string()).collect();
        targets.sort();
        assert_eq!(targets, vec!["f3", "h3"]);
        assert!(moves.iter().all(|m| m.piece == PieceKind::Knight));
        assert!(engine.legal_moves_from(sq("e4")).is_empty());
    }

    #[test]
    fn apply_legal_move_flips_turn() {
        let mut engine = StandardChess::new();
        let e4 = engine
            .legal_moves_from(sq("e2"))
            .into_iter()
            .find(|m| m.to == sq("e4"))
            .unwrap();
        assert!(engine.apply_move(&e4));
        assert_eq!(engine.turn(), Color::Black);
        assert_eq!(
            engine.piece_at(sq("e4")),
            Some(Piece {
                color: Color::White,
                kind: PieceKind::Pawn
            })
        );
        assert_eq!(engine.piece_at(sq("e2")), None);
    }

    #[test]
    fn apply_stale_move_is_rejected() {
        let mut engine = StandardChess::new();
        let e4 = engine
            .legal_moves_from(sq("e2"))
            .into_iter()
            .find(|m| m.to == sq("e4"))
            .unwrap();
        assert!(engine.apply_move(&e4));
        assert!(!engine.apply_move(&e4));
        assert_eq!(engine.turn(), Color::Black);
    }

    #[test]
    fn checkmate_from_fen() {
        let engine = StandardChess::from_fen(
            "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4",
        )
        .unwrap();
        assert!(engine.in_checkmate());
        assert!(engine.in_check());
        assert_eq!(engine.turn(), Color::Black);
        assert!(engine.legal_moves().is_empty());
    }

    #[test]
    fn stalemate_is_a_draw() {
        let engine = StandardChess::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(engine.in_draw());
        assert!(!engine.in_checkmate());
        assert!(engine.legal_moves().is_empty());
    }

    #[test]
    fn castling_reports_king_destination() {
        let engine =
            StandardChess::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mut targets: Vec<String> = engine
            .legal_moves_from(sq("e1"))
            .iter()
            .map(|m| m.to.to_string())
            .collect();
        targets.sort();
        assert!(targets.contains(&"g1".to_string()));
        assert!(targets.contains(&"c1".to_string()));
    }

    #[test]
    fn promotion_is_in_uci() {
        let engine = StandardChess::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        let promos: Vec<String> = engine
            .legal_moves_from(sq("a7"))
            .iter()
            .map(Move::uci)
            .collect();
        assert!(promos.contains(&"a7a8q".to_string()));
        assert_eq!(promos.len(), 4);
    }

    fn play(engine: &mut StandardChess, from: &str, to: &str) {
        let mv = engine
            .legal_moves_from(sq(from))
            .into_iter()
            .find(|m| m.to == sq(to))
            .unwrap();
        assert!(engine.apply_move(&mv));
    }

    #[test]
    fn knight_shuffle_draws_by_repetition() {
        let mut engine = StandardChess::new();
        for round in 0..2 {
            play(&mut engine, "g1", "f3");
            play(&mut engine, "g8", "f6");
            play(&mut engine, "f3", "g1");
            assert!(!engine.in_draw(), "round {round}");
            play(&mut engine, "f6", "g8");
        }
        assert!(engine.is_threefold_repetition());
        assert!(engine.in_draw());
        assert_eq!(engine.turn(), Color::White);
    }

    #[test]
    fn repetition_counts_from_a_fen_start() {
        let mut engine =
            StandardChess::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        for _ in 0..2 {
            play(&mut engine, "a1", "a2");
            play(&mut engine, "e8", "d8");
            play(&mut engine, "a2", "a1");
            play(&mut engine, "d8", "e8");
        }
        assert!(engine.in_draw());
    }

    #[test]
    fn invalid_fen_is_an_error() {
        assert!(matches!(
            StandardChess::from_fen("not a fen"),
            Err(EngineError::InvalidFen(_))
        ));
    }
}
