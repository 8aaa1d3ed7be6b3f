//! Headless driver: push a recorded landmark stream through the pipeline
//! using the stream's own timestamps and report what happened.

use std::io::{self, BufRead, Write};
use tracing::warn;

use crate::engine::RulesEngine;
use crate::interaction::Transition;
use crate::landmarks::parse_record;
use crate::pipeline::GesturePipeline;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub hands: usize,
    pub skipped: usize,
    pub events: usize,
    pub moves: usize,
}

pub fn replay<E, R, W>(
    pipeline: &mut GesturePipeline<E>,
    reader: R,
    out: &mut W,
) -> io::Result<ReplaySummary>
where
    E: RulesEngine,
    R: BufRead,
    W: Write,
{
    let mut summary = ReplaySummary::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame = match parse_record(&line, idx + 1) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(%err, "skipping landmark record");
                summary.skipped += 1;
                continue;
            }
        };

        summary.frames += 1;
        if frame.hand.is_some() {
            summary.hands += 1;
        }

        let outcome = pipeline.on_frame(&frame);
        if let Some(label) = outcome.recording_finished {
            writeln!(out, "{:>7}ms  recording '{}' finished", frame.at.as_millis(), label)?;
        }
        let Some(event) = outcome.event else {
            continue;
        };
        summary.events += 1;

        let detail = match outcome.transition {
            Some(Transition::Selected(square)) => format!("selected {square}"),
            Some(Transition::Confirmed) => "selection confirmed".to_string(),
            Some(Transition::Moved(mv)) => {
                summary.moves += 1;
                format!("played {}", mv.uci())
            }
            Some(Transition::MoveRejected(mv)) => format!("rejected {}", mv.uci()),
            Some(Transition::NoLegalMoves) => "no legal moves".to_string(),
            Some(Transition::Ignored) | None => "ignored".to_string(),
        };
        writeln!(
            out,
            "{:>7}ms  {:<6}  {}",
            event.accepted_at.as_millis(),
            event.label,
            detail
        )?;
    }

    writeln!(out, "{}", pipeline.status_text())?;
    Ok(summary)
}
