use tracing::{debug, info, warn};

use crate::classifier::GestureLabel;
use crate::coalescer::GestureEvent;
use crate::engine::{Move, RulesEngine};
use crate::picker::MovePicker;
use crate::square::Square;

/// Selection state. `legal_moves` is never empty while `Selected` is entered
/// and always reflects the engine as of the last query for `square`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Selected {
        square: Square,
        legal_moves: Vec<Move>,
    },
}

/// What handling one gesture event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Ignored,
    /// SELECT while idle, but the side to move has no legal moves.
    NoLegalMoves,
    Selected(Square),
    /// GRAB while selected: no state change, highlights are redrawn.
    Confirmed,
    Moved(Move),
    /// The engine refused the move; the selection is kept and re-queried.
    MoveRejected(Move),
}

impl Transition {
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, Transition::Ignored | Transition::NoLegalMoves)
    }
}

pub struct InteractionMachine {
    state: InteractionState,
    picker: Box<dyn MovePicker>,
}

impl InteractionMachine {
    pub fn new(picker: Box<dyn MovePicker>) -> Self {
        Self {
            state: InteractionState::Idle,
            picker,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn selected_square(&self) -> Option<Square> {
        match &self.state {
            InteractionState::Idle => None,
            InteractionState::Selected { square, .. } => Some(*square),
        }
    }

    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
    }

    pub fn handle<E: RulesEngine + ?Sized>(
        &mut self,
        event: &GestureEvent,
        engine: &mut E,
    ) -> Transition {
        let transition = match (event.label, self.state.clone()) {
            (GestureLabel::Select, InteractionState::Idle) => self.select(engine),
            (GestureLabel::Grab, InteractionState::Selected { .. }) => Transition::Confirmed,
            (GestureLabel::Place, InteractionState::Selected { square, legal_moves }) => {
                self.place(engine, square, &legal_moves)
            }
            _ => Transition::Ignored,
        };
        debug!(label = %event.label, ?transition, "gesture handled");
        transition
    }

    /// Re-query the cached moves after the board changed outside this machine.
    pub fn refresh<E: RulesEngine + ?Sized>(&mut self, engine: &E) {
        if let InteractionState::Selected { square, legal_moves } = &mut self.state {
            *legal_moves = engine.legal_moves_from(*square);
        }
    }

    fn select<E: RulesEngine + ?Sized>(&mut self, engine: &E) -> Transition {
        let all = engine.legal_moves();
        let Some(origin) = self.picker.pick(&all).map(|m| m.from) else {
            info!("select ignored: no legal moves");
            return Transition::NoLegalMoves;
        };

        let legal_moves = engine.legal_moves_from(origin);
        if legal_moves.is_empty() {
            warn!(%origin, "engine returned no moves for a legal origin");
            return Transition::NoLegalMoves;
        }

        info!(%origin, targets = legal_moves.len(), "square selected");
        self.state = InteractionState::Selected {
            square: origin,
            legal_moves,
        };
        Transition::Selected(origin)
    }

    fn place<E: RulesEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        square: Square,
        legal_moves: &[Move],
    ) -> Transition {
        let Some(mv) = self.picker.pick(legal_moves).cloned() else {
            return Transition::Ignored;
        };

        if engine.apply_move(&mv) {
            info!(mv = %mv.uci(), "move committed");
            self.state = InteractionState::Idle;
            Transition::Moved(mv)
        } else {
            warn!(mv = %mv.uci(), %square, "move rejected, keeping selection");
            self.refresh(engine);
            Transition::MoveRejected(mv)
        }
    }
}
