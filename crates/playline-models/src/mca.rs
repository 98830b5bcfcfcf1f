//! MCA (most common annotation) records.
//!
//! Administrators attach reference curves or point sets to a video, used by
//! players as an overlay signal independent of viewer-generated data.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shape of an annotation's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum McaKind {
    /// A sampled curve over the video's duration.
    Curve,
    /// A set of discrete media-time points.
    Point,
}

impl McaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            McaKind::Curve => "curve",
            McaKind::Point => "point",
        }
    }
}

impl fmt::Display for McaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for an unrecognized annotation type string.
#[derive(Debug, Error)]
#[error("unknown annotation type: {0}")]
pub struct ParseMcaKindError(pub String);

impl FromStr for McaKind {
    type Err = ParseMcaKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "curve" => Ok(McaKind::Curve),
            "point" => Ok(McaKind::Point),
            other => Err(ParseMcaKindError(other.to_string())),
        }
    }
}

/// One named annotation attached to a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct McaAnnotation {
    /// Curve or point set.
    #[serde(rename = "type")]
    pub kind: McaKind,

    /// Ordered samples (curve) or media-time points.
    pub data: Vec<f64>,

    /// Relative weight when combined with other signals.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl McaAnnotation {
    pub fn new(kind: McaKind, data: Vec<f64>, weight: f64) -> Self {
        Self { kind, data, weight }
    }
}

fn default_weight() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        assert_eq!("curve".parse::<McaKind>().unwrap(), McaKind::Curve);
        assert_eq!("point".parse::<McaKind>().unwrap(), McaKind::Point);
        assert!("spline".parse::<McaKind>().is_err());
    }

    #[test]
    fn test_annotation_json_shape() {
        let ann = McaAnnotation::new(McaKind::Curve, vec![0.0, 0.5, 1.0], 2.0);
        let json = serde_json::to_value(&ann).unwrap();
        assert_eq!(json["type"], "curve");
        assert_eq!(json["weight"], 2.0);
    }

    #[test]
    fn test_weight_defaults_to_one() {
        let ann: McaAnnotation =
            serde_json::from_str(r#"{"type":"point","data":[1.0,2.0]}"#).unwrap();
        assert_eq!(ann.weight, 1.0);
    }
}
