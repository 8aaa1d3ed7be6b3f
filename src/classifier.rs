use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::landmarks::LandmarkFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum GestureLabel {
    /// Index fingertip well above the wrist.
    Select,
    /// Thumb and index fingertip pinched together.
    Grab,
    /// Index fingertip well below the wrist.
    Place,
    None,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 4] = [
        GestureLabel::Select,
        GestureLabel::Grab,
        GestureLabel::Place,
        GestureLabel::None,
    ];

    /// Lowercase name used as a recording label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Grab => "grab",
            Self::Place => "place",
            Self::None => "none",
        }
    }
}

/// Calibration constants, in normalized detector units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// `index_tip.y - wrist.y` strictly below this is SELECT.
    pub select_below: f64,
    /// `index_tip.y - wrist.y` strictly above this is PLACE.
    pub place_above: f64,
    /// Thumb-to-index distance strictly below this is GRAB.
    pub pinch_below: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            select_below: -0.15,
            place_above: 0.15,
            pinch_below: 0.1,
        }
    }
}

impl ClassifierConfig {
    /// SELECT and PLACE must never both qualify for the same finger height.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("select_below", self.select_below),
            ("place_above", self.place_above),
            ("pinch_below", self.pinch_below),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidValue {
                    field,
                    message: format!("{value} is not finite"),
                });
            }
        }
        if self.select_below >= self.place_above {
            return Err(ConfigError::OverlappingThresholds {
                select_below: self.select_below,
                place_above: self.place_above,
            });
        }
        if self.pinch_below <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "pinch_below",
                message: format!("{} must be positive", self.pinch_below),
            });
        }
        Ok(())
    }
}

/// Classify one frame. Height checks win over the pinch check.
pub fn classify(frame: &LandmarkFrame, config: &ClassifierConfig) -> GestureLabel {
    let finger_height = frame.index_tip().y - frame.wrist().y;
    let pinch_distance = frame.thumb_tip().distance(&frame.index_tip());

    if finger_height < config.select_below {
        GestureLabel::Select
    } else if finger_height > config.place_above {
        GestureLabel::Place
    } else if pinch_distance < config.pinch_below {
        GestureLabel::Grab
    } else {
        GestureLabel::None
    }
}

/// Classify raw points, rejecting anything that is not a full hand.
pub fn classify_points(
    points: &[crate::landmarks::Point3D],
    config: &ClassifierConfig,
) -> Result<GestureLabel> {
    let frame = LandmarkFrame::new(points.to_vec())?;
    Ok(classify(&frame, config))
}
