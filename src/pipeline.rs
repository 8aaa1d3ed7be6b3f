use std::time::Duration;
use tracing::debug;

use crate::classifier::{classify, ClassifierConfig, GestureLabel};
use crate::coalescer::{EventCoalescer, GestureEvent};
use crate::config::Config;
use crate::engine::RulesEngine;
use crate::error::ConfigError;
use crate::interaction::{InteractionMachine, InteractionState, Transition};
use crate::landmarks::DetectedFrame;
use crate::picker::MovePicker;
use crate::projection::{project, VisualProjection};
use crate::recording::RecordingManager;
use crate::status::{gesture_text, GameStatus, Locale};

/// What a single detector result did to the pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameOutcome {
    /// Per-frame classification; `None` when no hand was tracked.
    pub label: Option<GestureLabel>,
    pub event: Option<GestureEvent>,
    pub transition: Option<Transition>,
    pub recorded: bool,
    /// Label whose recording window closed while handling this frame.
    pub recording_finished: Option<String>,
}

impl FrameOutcome {
    pub fn needs_redraw(&self) -> bool {
        self.event.is_some()
            || self.recorded
            || self.recording_finished.is_some()
            || self.transition.as_ref().is_some_and(Transition::needs_redraw)
    }
}

/// Owns all mutable interaction and recording state.
///
/// Every inbound event goes through one `&mut self` method, so handlers run
/// to completion one after another.
pub struct GesturePipeline<E: RulesEngine> {
    classifier: ClassifierConfig,
    coalescer: EventCoalescer,
    machine: InteractionMachine,
    recorder: RecordingManager,
    engine: E,
    locale: Locale,
}

impl<E: RulesEngine> GesturePipeline<E> {
    pub fn new(engine: E, picker: Box<dyn MovePicker>, config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            classifier: config.classifier,
            coalescer: EventCoalescer::new(config.cooldown()),
            machine: InteractionMachine::new(picker),
            recorder: RecordingManager::new(config.recording_window()),
            engine,
            locale: config.locale,
        })
    }

    pub fn on_frame(&mut self, frame: &DetectedFrame) -> FrameOutcome {
        let now = frame.at;
        let mut outcome = FrameOutcome {
            recording_finished: self.recorder.expire(now),
            ..FrameOutcome::default()
        };

        let Some(hand) = &frame.hand else {
            return outcome;
        };

        outcome.recorded = self.recorder.on_frame(hand, now);

        let label = classify(hand, &self.classifier);
        outcome.label = Some(label);
        outcome.event = self.coalescer.on_label(label, now);

        if let Some(event) = &outcome.event {
            outcome.transition = Some(self.machine.handle(event, &mut self.engine));
        }
        outcome
    }

    /// Timer path: closes an expired recording window even when no frames arrive.
    pub fn on_tick(&mut self, now: Duration) -> Option<String> {
        self.recorder.expire(now)
    }

    pub fn start_recording(&mut self, label: &str, now: Duration) -> bool {
        self.recorder.start_recording(label, now)
    }

    /// Swap in a fresh game; selection and debouncing state carry no history over.
    pub fn new_game(&mut self, engine: E) {
        debug!("new game");
        self.engine = engine;
        self.machine.reset();
        self.coalescer = EventCoalescer::new(self.coalescer.cooldown());
    }

    pub fn projection(&self) -> VisualProjection {
        project(self.machine.state(), &self.engine)
    }

    pub fn status(&self) -> GameStatus {
        GameStatus::of(&self.engine)
    }

    pub fn status_text(&self) -> String {
        self.status().text(self.locale)
    }

    pub fn gesture_text(&self) -> String {
        gesture_text(self.coalescer.last_gesture(), self.locale)
    }

    pub fn last_gesture(&self) -> Option<GestureLabel> {
        self.coalescer.last_gesture()
    }

    pub fn state(&self) -> &InteractionState {
        self.machine.state()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn recorder(&self) -> &RecordingManager {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut RecordingManager {
        &mut self.recorder
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Color, StandardChess};
    use crate::landmarks::{fixtures::hand, Point3D};
    use crate::picker::FirstPicker;
    use assert_matches::assert_matches;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn pose(label: GestureLabel, at: u64) -> DetectedFrame {
        let wrist = Point3D::new(0.5, 0.6, 0.0);
        let (thumb, index) = match label {
            GestureLabel::Select => (Point3D::new(0.2, 0.2, 0.0), Point3D::new(0.5, 0.3, 0.0)),
            GestureLabel::Place => (Point3D::new(0.2, 0.9, 0.0), Point3D::new(0.5, 0.9, 0.0)),
            GestureLabel::Grab => (Point3D::new(0.52, 0.6, 0.0), Point3D::new(0.5, 0.6, 0.0)),
            GestureLabel::None => (Point3D::new(0.1, 0.6, 0.0), Point3D::new(0.5, 0.6, 0.0)),
        };
        DetectedFrame {
            at: ms(at),
            hand: Some(hand(wrist, thumb, index)),
        }
    }

    fn pipeline() -> GesturePipeline<StandardChess> {
        GesturePipeline::new(StandardChess::new(), Box::new(FirstPicker), &Config::default()).unwrap()
    }

    #[test]
    fn poses_classify_as_intended() {
        let cfg = ClassifierConfig::default();
        for label in GestureLabel::ALL {
            let frame = pose(label, 0);
            assert_eq!(classify(frame.hand.as_ref().unwrap(), &cfg), label);
        }
    }

    #[test]
    fn absent_hand_changes_nothing() {
        let mut p = pipeline();
        let outcome = p.on_frame(&DetectedFrame {
            at: ms(0),
            hand: None,
        });
        assert_eq!(outcome, FrameOutcome::default());
        assert!(!outcome.needs_redraw());
        assert_eq!(*p.state(), InteractionState::Idle);
    }

    #[test]
    fn select_then_place_commits_a_move() {
        let mut p = pipeline();
        let first = p.on_frame(&pose(GestureLabel::Select, 0));
        assert_matches!(first.transition, Some(Transition::Selected(_)));
        assert!(p.projection().selected.is_some());
        assert!(!p.projection().highlighted.is_empty());

        // still cooling down
        let blocked = p.on_frame(&pose(GestureLabel::Place, 100));
        assert_eq!(blocked.label, Some(GestureLabel::Place));
        assert!(blocked.event.is_none());

        let placed = p.on_frame(&pose(GestureLabel::Place, 600));
        assert_matches!(placed.transition, Some(Transition::Moved(_)));
        assert_eq!(p.status().turn, Color::Black);
        assert_eq!(p.status_text(), "Black to move");
        assert_eq!(p.gesture_text(), "Detected gesture: PLACE");
        assert!(p.projection().highlighted.is_empty());
    }

    #[test]
    fn recording_taps_frames_independently() {
        let mut p = pipeline();
        assert!(p.start_recording("select", ms(0)));
        assert!(!p.start_recording("select", ms(10)));
        let o = p.on_frame(&pose(GestureLabel::Select, 20));
        assert!(o.recorded);
        assert_eq!(p.recorder().buffer("select").len(), 1);

        assert_eq!(p.on_tick(ms(3000)), Some("select".to_string()));
        let o = p.on_frame(&pose(GestureLabel::Select, 3100));
        assert!(!o.recorded);
        assert_eq!(p.recorder().buffer("select").len(), 1);
    }

    #[test]
    fn window_closing_is_reported_on_the_next_frame() {
        let mut p = pipeline();
        p.start_recording("grab", ms(0));
        let o = p.on_frame(&DetectedFrame {
            at: ms(3500),
            hand: None,
        });
        assert_eq!(o.recording_finished.as_deref(), Some("grab"));
        assert!(o.needs_redraw());
    }

    #[test]
    fn new_game_resets_selection_and_debounce() {
        let mut p = pipeline();
        p.on_frame(&pose(GestureLabel::Select, 0));
        p.new_game(StandardChess::new());
        assert_eq!(*p.state(), InteractionState::Idle);
        assert_eq!(p.last_gesture(), None);
        let o = p.on_frame(&pose(GestureLabel::Select, 10));
        assert!(o.event.is_some());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = Config {
            cooldown_ms: 0,
            ..Config::default()
        };
        assert!(GesturePipeline::new(StandardChess::new(), Box::new(FirstPicker), &config).is_err());
    }

    #[test]
    fn dutch_locale_flows_through() {
        let config = Config {
            locale: Locale::Dutch,
            ..Config::default()
        };
        let p = GesturePipeline::new(StandardChess::new(), Box::new(FirstPicker), &config).unwrap();
        assert_eq!(p.status_text(), "Wit aan zet");
        assert_eq!(p.locale(), Locale::Dutch);
    }
}
