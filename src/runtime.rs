use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use tracing::{trace, warn};

use crate::landmarks::{parse_record, DetectedFrame};

/// Unified event type consumed by the single app loop
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Frame(DetectedFrame),
    /// The landmark stream reached end of input.
    StreamEnded,
    Resize,
    Tick,
}

/// Bound on queued events. Frames beyond this are dropped, never buffered.
pub const EVENT_QUEUE_BOUND: usize = 4;

/// Source of app events (keyboard, landmark frames, resize)
pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// One bounded queue with any number of producer threads feeding it.
pub struct ChannelEventSource {
    tx: SyncSender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl ChannelEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::sync_channel(EVENT_QUEUE_BOUND);
        Self { tx, rx }
    }

    pub fn sender(&self) -> SyncSender<AppEvent> {
        self.tx.clone()
    }
}

impl Default for ChannelEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Forward terminal keys and resizes. Keys are never dropped.
pub fn spawn_terminal_reader(tx: SyncSender<AppEvent>) -> JoinHandle<()> {
    thread::spawn(move || loop {
        let evt = match event::read() {
            Ok(CtEvent::Key(key)) => AppEvent::Key(key),
            Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
            Ok(_) => continue,
            Err(_) => break,
        };
        if tx.send(evt).is_err() {
            break;
        }
    })
}

/// Read a JSON-lines landmark stream on its own thread.
///
/// Each frame is stamped with the time elapsed since `clock` when it was read,
/// so frames and ticks share one time base. A frame that finds the queue full
/// is dropped: detection results are skipped rather than backlogged.
pub fn spawn_frame_reader<R>(reader: R, tx: SyncSender<AppEvent>, clock: Instant) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for (idx, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(%err, "landmark stream read failed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let mut frame = match parse_record(&line, idx + 1) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(%err, "skipping landmark record");
                    continue;
                }
            };
            frame.at = clock.elapsed();
            match tx.try_send(AppEvent::Frame(frame)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => trace!(line = idx + 1, "frame dropped, consumer busy"),
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
        let _ = tx.send(AppEvent::StreamEnded);
    })
}

/// Events pushed into a plain channel by the caller. Drives the loop in
/// headless runs and tests, where no terminal or frame reader exists.
pub struct ScriptedSource {
    rx: Receiver<AppEvent>,
}

impl ScriptedSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for ScriptedSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// The consumer side of the loop.
///
/// `tick` bounds how long one step waits for a key or frame. When nothing
/// arrives in time the step yields [`AppEvent::Tick`], which is what closes a
/// recording window while the hand is out of view.
pub struct Runner<S: AppEventSource> {
    source: S,
    tick: Duration,
}

impl<S: AppEventSource> Runner<S> {
    pub fn new(source: S, tick: Duration) -> Self {
        Self { source, tick }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    pub fn step(&self) -> AppEvent {
        match self.source.recv_timeout(self.tick) {
            Ok(ev) => ev,
            // producers gone: keep ticking so timers still fire
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        }
    }
}
