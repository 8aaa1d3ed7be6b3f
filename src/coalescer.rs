use std::time::Duration;
use tracing::debug;

use crate::classifier::GestureLabel;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(500);

/// A label that survived debouncing, stamped with the time it was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureEvent {
    pub label: GestureLabel,
    pub accepted_at: Duration,
}

/// Turns the per-frame label stream into sparse events.
///
/// After every accepted event all labels are dropped until the cool-down
/// elapses, whichever label they carry. Outside the cool-down a label equal
/// to the last accepted one is dropped as a repeat. `NONE` is treated like
/// any other label and can itself start a cool-down.
#[derive(Debug, Clone)]
pub struct EventCoalescer {
    cooldown: Duration,
    last_gesture: Option<GestureLabel>,
    cooldown_until: Option<Duration>,
}

impl Default for EventCoalescer {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl EventCoalescer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_gesture: None,
            cooldown_until: None,
        }
    }

    pub fn on_label(&mut self, label: GestureLabel, now: Duration) -> Option<GestureEvent> {
        if self.in_cooldown(now) {
            debug!(%label, ?now, "gesture dropped during cool-down");
            return None;
        }
        if self.last_gesture == Some(label) {
            return None;
        }

        self.last_gesture = Some(label);
        self.cooldown_until = Some(now + self.cooldown);
        debug!(%label, ?now, "gesture accepted");
        Some(GestureEvent {
            label,
            accepted_at: now,
        })
    }

    pub fn in_cooldown(&self, now: Duration) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Last accepted label, shown as on-screen feedback.
    pub fn last_gesture(&self) -> Option<GestureLabel> {
        self.last_gesture
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}
