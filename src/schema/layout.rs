use crate::schema::paint::Rgba;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintType {
    #[default]
    Min,
    Center,
    Max,
    Stretch,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub horizontal: ConstraintType,
    pub vertical: ConstraintType,
}

impl Constraints {
    pub fn is_default(&self) -> bool {
        *self == Constraints::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutMode {
    #[default]
    None,
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrimaryAxisAlign {
    #[default]
    Min,
    Center,
    Max,
    SpaceBetween,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterAxisAlign {
    #[default]
    Min,
    Center,
    Max,
    Baseline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SizingMode {
    Fixed,
    #[default]
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutWrap {
    #[default]
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutAlign {
    #[default]
    Inherit,
    Stretch,
    Min,
    Center,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutPositioning {
    #[default]
    Auto,
    Absolute,
}

/// Auto-layout block of a container, flattened into the node object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoLayout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_mode: Option<LayoutMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_bottom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_axis_align_items: Option<PrimaryAxisAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_axis_align_items: Option<CounterAxisAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_axis_sizing_mode: Option<SizingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_axis_sizing_mode: Option<SizingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_wrap: Option<LayoutWrap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_axis_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_reverse_z_index: Option<bool>,
}

impl AutoLayout {
    pub fn is_enabled(&self) -> bool {
        matches!(
            self.layout_mode,
            Some(LayoutMode::Horizontal) | Some(LayoutMode::Vertical)
        )
    }
}

/// Properties a node carries as the child of an auto-layout container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutChild {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_grow: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_align: Option<LayoutAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_positioning: Option<LayoutPositioning>,
}

impl LayoutChild {
    pub fn is_empty(&self) -> bool {
        self.layout_grow.is_none()
            && self.layout_align.is_none()
            && self.layout_positioning.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GridPattern {
    Columns,
    Rows,
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GridAlignment {
    Min,
    Max,
    Stretch,
    Center,
}

/// Layout grid. Kept untyped on the node (see `DesignNode::layout_grids`)
/// so one malformed entry only drops the grid group, not the whole tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGrid {
    pub pattern: GridPattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<GridAlignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gutter_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GuideAxis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub axis: GuideAxis,
    pub offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportFormat {
    Png,
    Jpg,
    Svg,
    Pdf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportConstraintType {
    Scale,
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportConstraint {
    #[serde(rename = "type")]
    pub constraint_type: ExportConstraintType,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSetting {
    pub format: ExportFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<ExportConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents_only: Option<bool>,
}
