//! Labeled landmark capture for building a gesture dataset.
//!
//! One recording window may be active at a time. Starting another while a
//! window is open is rejected, never queued. A window closes by itself once
//! its deadline passes; frames are appended to the active label's buffer
//! only while the window is open.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::ExportError;
use crate::landmarks::LandmarkFrame;

pub const DEFAULT_WINDOW: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSession {
    pub active_label: Option<String>,
    pub deadline: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct RecordingManager {
    window: Duration,
    session: RecordingSession,
    buffers: BTreeMap<String, Vec<LandmarkFrame>>,
}

impl Default for RecordingManager {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl RecordingManager {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            session: RecordingSession::default(),
            buffers: BTreeMap::new(),
        }
    }

    /// Open a window for `label`. Returns false if one is already open.
    pub fn start_recording(&mut self, label: &str, now: Duration) -> bool {
        self.expire(now);
        if let Some(active) = &self.session.active_label {
            warn!(requested = label, %active, "recording already in progress");
            return false;
        }

        info!(label, window_ms = self.window.as_millis() as u64, "recording started");
        self.buffers.entry(label.to_string()).or_default();
        self.session = RecordingSession {
            active_label: Some(label.to_string()),
            deadline: Some(now + self.window),
        };
        true
    }

    /// Append `frame` to the active buffer. Returns whether it was recorded.
    pub fn on_frame(&mut self, frame: &LandmarkFrame, now: Duration) -> bool {
        self.expire(now);
        let Some(label) = &self.session.active_label else {
            return false;
        };
        self.buffers
            .entry(label.clone())
            .or_default()
            .push(frame.clone());
        true
    }

    /// Close the window if its deadline has passed, returning the label that stopped.
    pub fn expire(&mut self, now: Duration) -> Option<String> {
        match self.session.deadline {
            Some(deadline) if now >= deadline => {
                let label = self.session.active_label.take();
                self.session.deadline = None;
                if let Some(label) = &label {
                    info!(
                        label = label.as_str(),
                        frames = self.buffer(label).len(),
                        "recording finished"
                    );
                }
                label
            }
            _ => None,
        }
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn is_recording(&self) -> bool {
        self.session.active_label.is_some()
    }

    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        self.session.deadline.map(|d| d.saturating_sub(now))
    }

    pub fn buffer(&self, label: &str) -> &[LandmarkFrame] {
        self.buffers.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Frame counts per label, in label order.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.buffers
            .iter()
            .map(|(label, frames)| (label.as_str(), frames.len()))
            .collect()
    }

    /// Drop every buffer and close any open window.
    pub fn reset(&mut self) {
        self.buffers.clear();
        self.session = RecordingSession::default();
    }

    pub fn export_dataset(&self) -> Dataset {
        Dataset {
            exported_at: Local::now(),
            window_ms: self.window.as_millis() as u64,
            gestures: self.buffers.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Exportable document: gesture label to the frames captured for it, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub exported_at: DateTime<Local>,
    pub window_ms: u64,
    pub gestures: BTreeMap<String, Vec<LandmarkFrame>>,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    label: &'a str,
    frame: usize,
    point: usize,
    x: f64,
    y: f64,
    z: f64,
}

impl Dataset {
    pub fn frame_count(&self) -> usize {
        self.gestures.values().map(Vec::len).sum()
    }

    pub fn write_json(&self, path: &Path) -> Result<(), ExportError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// One row per landmark point.
    pub fn write_csv(&self, path: &Path) -> Result<(), ExportError> {
        let mut wtr = csv::Writer::from_path(path)?;
        for (label, frames) in &self.gestures {
            for (frame_idx, frame) in frames.iter().enumerate() {
                for (point_idx, p) in frame.points().iter().enumerate() {
                    wtr.serialize(CsvRow {
                        label,
                        frame: frame_idx,
                        point: point_idx,
                        x: p.x,
                        y: p.y,
                        z: p.z,
                    })?;
                }
            }
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn read_json(path: &Path) -> Result<Self, ExportError> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write into `dir` under a timestamped name and return the file path.
    /// An existing file is never overwritten; a numeric suffix is added instead.
    pub fn save(&self, dir: &Path, format: ExportFormat) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(dir)?;
        let stem = format!(
            "gesture_dataset_{}",
            self.exported_at.format("%Y%m%dT%H%M%S%.3f")
        );
        let mut path = dir.join(format!("{stem}.{}", format.extension()));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("{stem}_{n}.{}", format.extension()));
            n += 1;
        }
        match format {
            ExportFormat::Json => self.write_json(&path)?,
            ExportFormat::Csv => self.write_csv(&path)?,
        }
        info!(path = %path.display(), frames = self.frame_count(), "dataset exported");
        Ok(path)
    }
}
