//! Hand keypoints as delivered by the external landmark detector.
//!
//! The detector reports 21 points per tracked hand in its own normalized
//! space: `x`/`y` roughly in `[0, 1]` relative to the video frame and `z` a
//! relative depth. Indices follow the MediaPipe hand model.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{FrameParseError, GestureError, Result};

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Point3D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// One detected hand: exactly [`LANDMARK_COUNT`] points, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Point3D>", try_from = "Vec<Point3D>")]
pub struct LandmarkFrame {
    points: Vec<Point3D>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Point3D>) -> Result<Self> {
        if points.len() != LANDMARK_COUNT {
            return Err(GestureError::InvalidInput {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point3D] {
        &self.points
    }

    pub fn wrist(&self) -> Point3D {
        self.points[WRIST]
    }

    pub fn thumb_tip(&self) -> Point3D {
        self.points[THUMB_TIP]
    }

    pub fn index_tip(&self) -> Point3D {
        self.points[INDEX_TIP]
    }
}

impl From<LandmarkFrame> for Vec<Point3D> {
    fn from(frame: LandmarkFrame) -> Self {
        frame.points
    }
}

impl TryFrom<Vec<Point3D>> for LandmarkFrame {
    type Error = GestureError;

    fn try_from(points: Vec<Point3D>) -> Result<Self> {
        Self::new(points)
    }
}

/// A single line of a JSON-lines landmark stream.
///
/// `landmarks` is `null` (or absent) when no hand was tracked in that frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub t_ms: u64,
    #[serde(default)]
    pub landmarks: Option<Vec<Point3D>>,
}

/// A detector result ready for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedFrame {
    pub at: Duration,
    pub hand: Option<LandmarkFrame>,
}

impl FrameRecord {
    pub fn into_detected(self) -> Result<DetectedFrame> {
        let hand = self.landmarks.map(LandmarkFrame::new).transpose()?;
        Ok(DetectedFrame {
            at: Duration::from_millis(self.t_ms),
            hand,
        })
    }
}

/// Parse one line of the stream. `line` is 1-based and only used for error reporting.
pub fn parse_record(text: &str, line: usize) -> Result<DetectedFrame, FrameParseError> {
    let record: FrameRecord =
        serde_json::from_str(text).map_err(|source| FrameParseError::Json { line, source })?;
    record
        .into_detected()
        .map_err(|source| FrameParseError::Shape { line, source })
}


#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn frame_requires_exactly_21_points() {
        let err = LandmarkFrame::new(vec![Point3D::default(); 20]).unwrap_err();
        assert_eq!(
            err,
            GestureError::InvalidInput {
                expected: 21,
                actual: 20
            }
        );
        assert!(LandmarkFrame::new(vec![Point3D::default(); 21]).is_ok());
        assert!(LandmarkFrame::try_from(vec![Point3D::default(); 22]).is_err());
    }

    #[test]
    fn distance_is_euclidean_in_three_dimensions() {
        let a = Point3D::new(0.0, 0.0, 0.0);
        let b = Point3D::new(2.0, 3.0, 6.0);
        assert!((a.distance(&b) - 7.0).abs() < 1e-6);
    }

    #[test]
    fn parse_record_with_hand() {
        let points: Vec<String> = (0..21)
            .map(|i| format!(r#"{{"x":{}.0,"y":0.5,"z":0.0}}"#, i))
            .collect();
        let line = format!(r#"{{"t_ms":120,"landmarks":[{}]}}"#, points.join(","));
        let frame = parse_record(&line, 1).unwrap();
        assert_eq!(frame.at, Duration::from_millis(120));
        let hand = frame.hand.unwrap();
        assert_eq!(hand.index_tip().x, 8.0);
        assert_eq!(hand.thumb_tip().x, 4.0);
    }

    #[test]
    fn parse_record_without_hand() {
        let frame = parse_record(r#"{"t_ms":5,"landmarks":null}"#, 1).unwrap();
        assert!(frame.hand.is_none());
        let frame = parse_record(r#"{"t_ms":6}"#, 2).unwrap();
        assert!(frame.hand.is_none());
    }

    #[test]
    fn parse_record_errors_carry_line_number() {
        assert_matches!(
            parse_record("not json", 7),
            Err(FrameParseError::Json { line: 7, .. })
        );
        assert_matches!(
            parse_record(r#"{"t_ms":0,"landmarks":[{"x":0,"y":0,"z":0}]}"#, 3),
            Err(FrameParseError::Shape { line: 3, .. })
        );
    }

    #[test]
    fn frame_serializes_as_point_list() {
        let frame = LandmarkFrame::new(vec![Point3D::new(0.1, 0.2, 0.3); 21]).unwrap();
        let json = serde_json::to_value(&frame).unwrap();
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 21);
        assert!(arr[0].get("x").is_some());

        let back: LandmarkFrame = serde_json::from_value(json).unwrap();
        assert_eq!(back, frame);
        assert!(serde_json::from_str::<LandmarkFrame>("[]").is_err());
    }
}
