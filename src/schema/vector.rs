use crate::schema::paint::StrokeCap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WindingRule {
    #[default]
    Nonzero,
    Evenodd,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorPath {
    #[serde(default)]
    pub winding_rule: WindingRule,
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorVertex {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_cap: Option<StrokeCap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSegment {
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tangent_start: Option<crate::schema::paint::Vector2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tangent_end: Option<crate::schema::paint::Vector2>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorRegion {
    #[serde(default)]
    pub winding_rule: WindingRule,
    pub loops: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorNetwork {
    pub vertices: Vec<VectorVertex>,
    pub segments: Vec<VectorSegment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<VectorRegion>,
}

impl VectorNetwork {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcData {
    pub starting_angle: f64,
    pub ending_angle: f64,
    pub inner_radius: f64,
}

impl ArcData {
    pub const FULL: ArcData = ArcData {
        starting_angle: 0.0,
        ending_angle: std::f64::consts::TAU,
        inner_radius: 0.0,
    };

    pub fn is_full(&self) -> bool {
        self.starting_angle == 0.0
            && (self.ending_angle - std::f64::consts::TAU).abs() < 1e-9
            && self.inner_radius == 0.0
    }
}

/// VECTOR-only attributes, flattened into the node object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_paths: Option<Vec<VectorPath>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_network: Option<VectorNetwork>,
}

/// ELLIPSE, POLYGON and STAR attributes, flattened into the node object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arc_data: Option<ArcData>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_winding_rule_defaults_to_nonzero() {
        let path: VectorPath = serde_json::from_value(json!({"data": "M 0 0 L 10 10 Z"})).unwrap();
        assert_eq!(path.winding_rule, WindingRule::Nonzero);
        let path: VectorPath =
            serde_json::from_value(json!({"windingRule": "EVENODD", "data": "M 0 0 Z"})).unwrap();
        assert_eq!(path.winding_rule, WindingRule::Evenodd);
    }

    #[test]
    fn test_full_arc() {
        assert!(ArcData::FULL.is_full());
        let half = ArcData {
            starting_angle: 0.0,
            ending_angle: std::f64::consts::PI,
            inner_radius: 0.0,
        };
        assert!(!half.is_full());
    }

    #[test]
    fn test_network_without_regions() {
        let network: VectorNetwork = serde_json::from_value(json!({
            "vertices": [{"x": 0, "y": 0}, {"x": 10, "y": 0}],
            "segments": [{"start": 0, "end": 1}]
        }))
        .unwrap();
        assert_eq!(network.vertices.len(), 2);
        assert!(network.regions.is_empty());
        assert!(!network.is_empty());
    }
}
