use crate::error::{BridgeError, Result};
use crate::mappers::path::parse_path_data;
use crate::scene::paint::{Paint, SceneEffect};
use crate::scene::text::TextContent;
use crate::schema::layout::{
    Constraints, CounterAxisAlign, ExportSetting, GridAlignment, GridPattern, Guide, LayoutAlign,
    LayoutGrid, LayoutMode, LayoutPositioning, LayoutWrap, PrimaryAxisAlign, SizingMode,
};
use crate::schema::node::{
    BooleanOperationType, ComponentPropertyDefinition, OverrideRecord,
};
use crate::schema::paint::{
    BlendMode, StrokeAlign, StrokeCap, StrokeJoin, Transform, DEFAULT_MITER_LIMIT,
    DEFAULT_STROKE_WEIGHT,
};
use crate::schema::vector::{ArcData, VectorNetwork, VectorPath};
use crate::schema::NodeType;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Host-assigned identifier of a live node, displayed as `"1:<n>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1:{}", self.0)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for NodeId {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let local = s.strip_prefix("1:").unwrap_or(s);
        local
            .parse::<u64>()
            .map(NodeId)
            .map_err(|_| BridgeError::NodeNotFound(s.to_string()))
    }
}

/// Property groups a live node may or may not support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Children,
    Geometry,
    Corners,
    IndependentCorners,
    Constraints,
    Container,
    Text,
    VectorPaths,
    Shape,
    Component,
    Instance,
    BooleanOperation,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::Children => "children",
            Capability::Geometry => "fills and strokes",
            Capability::Corners => "corner radius",
            Capability::IndependentCorners => "independent corners",
            Capability::Constraints => "constraints",
            Capability::Container => "auto-layout and grids",
            Capability::Text => "text",
            Capability::VectorPaths => "vector paths",
            Capability::Shape => "shape parameters",
            Capability::Component => "component data",
            Capability::Instance => "instance data",
            Capability::BooleanOperation => "boolean operation",
        }
    }

    pub fn supported_by(self, node_type: NodeType) -> bool {
        use NodeType::*;
        match self {
            Capability::Children => node_type.holds_children(),
            Capability::Geometry => node_type != Group,
            Capability::Corners => matches!(
                node_type,
                Frame | Rectangle | Polygon | Star | Vector | Component | ComponentSet | Instance
            ),
            Capability::IndependentCorners => {
                matches!(node_type, Frame | Rectangle | Component | ComponentSet | Instance)
            }
            Capability::Constraints => !matches!(node_type, Group | BooleanOperation | Section),
            Capability::Container => {
                matches!(node_type, Frame | Component | ComponentSet | Instance)
            }
            Capability::Text => node_type == Text,
            Capability::VectorPaths => node_type == Vector,
            Capability::Shape => matches!(node_type, Ellipse | Polygon | Star),
            Capability::Component => node_type == Component,
            Capability::Instance => node_type == Instance,
            Capability::BooleanOperation => node_type == BooleanOperation,
        }
    }
}

/// Default stroke alignment a freshly created node of this type starts with
pub fn default_stroke_align(node_type: NodeType) -> StrokeAlign {
    match node_type {
        NodeType::Line | NodeType::Vector => StrokeAlign::Center,
        _ => StrokeAlign::Inside,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub fills: Vec<Paint>,
    pub strokes: Vec<Paint>,
    pub stroke_weight: f64,
    pub stroke_align: StrokeAlign,
    pub stroke_cap: StrokeCap,
    pub stroke_join: StrokeJoin,
    pub dash_pattern: Vec<f64>,
    pub stroke_miter_limit: f64,
}

impl Geometry {
    fn new(node_type: NodeType) -> Self {
        Self {
            fills: Vec::new(),
            strokes: Vec::new(),
            stroke_weight: DEFAULT_STROKE_WEIGHT,
            stroke_align: default_stroke_align(node_type),
            stroke_cap: StrokeCap::default(),
            stroke_join: StrokeJoin::default(),
            dash_pattern: Vec::new(),
            stroke_miter_limit: DEFAULT_MITER_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corners {
    pub independent: bool,
    pub top_left: f64,
    pub top_right: f64,
    pub bottom_left: f64,
    pub bottom_right: f64,
    pub smoothing: f64,
}

impl Corners {
    pub fn set_uniform(&mut self, radius: f64) {
        self.top_left = radius;
        self.top_right = radius;
        self.bottom_left = radius;
        self.bottom_right = radius;
    }

    /// Single radius when all four corners agree
    pub fn uniform(&self) -> Option<f64> {
        let all = [self.top_left, self.top_right, self.bottom_left, self.bottom_right];
        if all.iter().all(|r| *r == self.top_left) {
            Some(self.top_left)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AutoLayoutState {
    pub mode: LayoutMode,
    pub item_spacing: f64,
    pub padding_left: f64,
    pub padding_right: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub primary_axis_align: PrimaryAxisAlign,
    pub counter_axis_align: CounterAxisAlign,
    pub primary_axis_sizing: SizingMode,
    pub counter_axis_sizing: SizingMode,
    pub wrap: LayoutWrap,
    pub counter_axis_spacing: f64,
    pub reverse_z_index: bool,
}

impl AutoLayoutState {
    pub fn is_enabled(&self) -> bool {
        self.mode != LayoutMode::None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub clips_content: bool,
    pub auto_layout: AutoLayoutState,
    pub layout_grids: Vec<LayoutGrid>,
    pub guides: Vec<Guide>,
}

impl Default for Container {
    fn default() -> Self {
        Self {
            clips_content: true,
            auto_layout: AutoLayoutState::default(),
            layout_grids: Vec::new(),
            guides: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutChildState {
    pub grow: f64,
    pub align: LayoutAlign,
    pub positioning: LayoutPositioning,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorContent {
    pub paths: Vec<VectorPath>,
    pub network: Option<VectorNetwork>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeContent {
    pub point_count: u32,
    pub inner_radius: f64,
    pub arc_data: ArcData,
}

impl ShapeContent {
    fn new(node_type: NodeType) -> Self {
        Self {
            point_count: if node_type == NodeType::Star { 5 } else { 3 },
            inner_radius: 0.382,
            arc_data: ArcData::FULL,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentContent {
    pub key: String,
    pub description: String,
    pub property_definitions: BTreeMap<String, ComponentPropertyDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceContent {
    pub main_component: Option<NodeId>,
    pub property_values: BTreeMap<String, JsonValue>,
    pub overrides: Vec<OverrideRecord>,
}

/// A live object on the canvas
///
/// Capability blocks (`geometry`, `corners`, `container`, ...) are `Some`
/// exactly when the node type supports them, so "does this node support X"
/// is a variant query on the block rather than a runtime check.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub node_type: NodeType,
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,

    pub x: f64,
    pub y: f64,
    width: f64,
    height: f64,
    pub rotation: f64,

    pub visible: bool,
    pub locked: bool,
    opacity: f64,
    pub blend_mode: BlendMode,
    pub is_mask: bool,

    pub effects: Vec<SceneEffect>,
    pub export_settings: Vec<ExportSetting>,
    pub layout_child: LayoutChildState,
    pub constraints: Option<Constraints>,

    pub geometry: Option<Geometry>,
    pub corners: Option<Corners>,
    pub container: Option<Container>,
    pub text: Option<TextContent>,
    pub vector: Option<VectorContent>,
    pub shape: Option<ShapeContent>,
    pub component: Option<ComponentContent>,
    pub instance: Option<InstanceContent>,
    pub boolean_operation: Option<BooleanOperationType>,
}

impl SceneNode {
    pub fn new(id: NodeId, node_type: NodeType) -> Self {
        let has = |capability: Capability| capability.supported_by(node_type);
        let blend_mode = if node_type.holds_children() {
            BlendMode::PassThrough
        } else {
            BlendMode::Normal
        };

        Self {
            id,
            node_type,
            name: default_name(node_type).to_string(),
            parent: None,
            children: Vec::new(),
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            visible: true,
            locked: false,
            opacity: 1.0,
            blend_mode,
            is_mask: false,
            effects: Vec::new(),
            export_settings: Vec::new(),
            layout_child: LayoutChildState::default(),
            constraints: has(Capability::Constraints).then(Constraints::default),
            geometry: has(Capability::Geometry).then(|| Geometry::new(node_type)),
            corners: has(Capability::Corners).then(|| Corners {
                independent: has(Capability::IndependentCorners),
                ..Corners::default()
            }),
            container: has(Capability::Container).then(Container::default),
            text: has(Capability::Text).then(TextContent::default),
            vector: has(Capability::VectorPaths).then(VectorContent::default),
            shape: has(Capability::Shape).then(|| ShapeContent::new(node_type)),
            component: has(Capability::Component).then(ComponentContent::default),
            instance: has(Capability::Instance).then(InstanceContent::default),
            boolean_operation: has(Capability::BooleanOperation)
                .then_some(BooleanOperationType::Union),
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        capability.supported_by(self.node_type)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Opacity is clamped into `[0, 1]`
    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
    }

    /// Resize the node. Only lines may have a zero height.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        let min_height = if self.node_type == NodeType::Line { 0.0 } else { 0.01 };
        if !width.is_finite() || !height.is_finite() || width < 0.01 || height < min_height {
            return Err(BridgeError::invalid(
                "size",
                format!("{} x {} is not a valid size for {}", width, height, self.node_type),
            ));
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Bounds are derived from children for groups and boolean results
    pub(crate) fn set_derived_bounds(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
    }

    /// Transform relative to the parent: `[[cos, sin, x], [-sin, cos, y]]`
    pub fn relative_transform(&self) -> Transform {
        let radians = self.rotation.to_radians();
        let (sin, cos) = radians.sin_cos();
        [[cos, sin, self.x], [-sin, cos, self.y]]
    }

    /// Set position and rotation from a 2x3 matrix. Skew and scale are dropped.
    pub fn set_relative_transform(&mut self, transform: &Transform) -> Result<()> {
        if transform.iter().flatten().any(|v| !v.is_finite()) {
            return Err(BridgeError::invalid("relativeTransform", "non-finite component"));
        }
        self.x = transform[0][2];
        self.y = transform[1][2];
        let rotation = transform[0][1].atan2(transform[0][0]).to_degrees();
        self.rotation = if rotation.abs() < 1e-9 { 0.0 } else { rotation };
        Ok(())
    }

    /// Assign fills; text nodes also restyle every character
    pub fn set_fills(&mut self, fills: Vec<Paint>) -> Result<()> {
        if let Some(text) = self.text.as_mut() {
            text.set_fills(&fills);
        }
        let node_type = self.node_type;
        let geometry = self
            .geometry
            .as_mut()
            .ok_or_else(|| unsupported(node_type, Capability::Geometry))?;
        geometry.fills = fills;
        Ok(())
    }

    pub fn set_strokes(&mut self, strokes: Vec<Paint>) -> Result<()> {
        let node_type = self.node_type;
        let geometry = self
            .geometry
            .as_mut()
            .ok_or_else(|| unsupported(node_type, Capability::Geometry))?;
        geometry.strokes = strokes;
        Ok(())
    }

    pub fn set_layout_grids(&mut self, grids: Vec<LayoutGrid>) -> Result<()> {
        for grid in &grids {
            validate_grid(grid)?;
        }
        let node_type = self.node_type;
        let container = self
            .container
            .as_mut()
            .ok_or_else(|| unsupported(node_type, Capability::Container))?;
        container.layout_grids = grids;
        Ok(())
    }

    pub fn set_vector_paths(&mut self, paths: Vec<VectorPath>) -> Result<()> {
        for path in &paths {
            parse_path_data(&path.data)?;
        }
        let node_type = self.node_type;
        let vector = self
            .vector
            .as_mut()
            .ok_or_else(|| unsupported(node_type, Capability::VectorPaths))?;
        vector.paths = paths;
        Ok(())
    }

    pub fn set_vector_network(&mut self, network: VectorNetwork) -> Result<()> {
        let vertex_count = network.vertices.len();
        if let Some(segment) = network
            .segments
            .iter()
            .find(|s| s.start >= vertex_count || s.end >= vertex_count)
        {
            return Err(BridgeError::invalid(
                "vectorNetwork",
                format!(
                    "segment {} -> {} references a missing vertex ({} vertices)",
                    segment.start, segment.end, vertex_count
                ),
            ));
        }
        let segment_count = network.segments.len();
        if network
            .regions
            .iter()
            .flat_map(|r| r.loops.iter().flatten())
            .any(|index| *index >= segment_count)
        {
            return Err(BridgeError::invalid(
                "vectorNetwork",
                "region loop references a missing segment",
            ));
        }
        let node_type = self.node_type;
        let vector = self
            .vector
            .as_mut()
            .ok_or_else(|| unsupported(node_type, Capability::VectorPaths))?;
        vector.network = Some(network);
        Ok(())
    }

    pub fn set_point_count(&mut self, count: u32) -> Result<()> {
        if count < 3 {
            return Err(BridgeError::invalid("pointCount", format!("{} is below 3", count)));
        }
        let node_type = self.node_type;
        let shape = self.shape.as_mut().ok_or_else(|| unsupported(node_type, Capability::Shape))?;
        shape.point_count = count;
        Ok(())
    }
}

fn default_name(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Frame => "Frame",
        NodeType::Group => "Group",
        NodeType::Section => "Section",
        NodeType::Rectangle => "Rectangle",
        NodeType::Ellipse => "Ellipse",
        NodeType::Line => "Line",
        NodeType::Polygon => "Polygon",
        NodeType::Star => "Star",
        NodeType::Vector => "Vector",
        NodeType::Text => "Text",
        NodeType::Component => "Component",
        NodeType::ComponentSet => "Component Set",
        NodeType::Instance => "Instance",
        NodeType::BooleanOperation => "Boolean",
    }
}

pub(crate) fn unsupported(node_type: NodeType, capability: Capability) -> BridgeError {
    BridgeError::Unsupported {
        node_type: node_type.to_string(),
        capability: capability.name(),
    }
}

fn validate_grid(grid: &LayoutGrid) -> Result<()> {
    match grid.pattern {
        GridPattern::Grid => match grid.section_size {
            Some(size) if size > 0.0 => Ok(()),
            _ => Err(BridgeError::invalid(
                "layoutGrids",
                "GRID pattern needs a positive sectionSize",
            )),
        },
        GridPattern::Columns | GridPattern::Rows => {
            if grid.count == Some(0) {
                return Err(BridgeError::invalid("layoutGrids", "count must be at least 1"));
            }
            let stretches = grid.alignment == Some(GridAlignment::Stretch);
            if !stretches && !grid.section_size.is_some_and(|size| size > 0.0) {
                return Err(BridgeError::invalid(
                    "layoutGrids",
                    "non-stretch column/row grids need a positive sectionSize",
                ));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::vector::{VectorSegment, VectorVertex, WindingRule};

    #[test]
    fn test_node_id_display_and_parse() {
        let id = NodeId(42);
        assert_eq!(id.to_string(), "1:42");
        assert_eq!("1:42".parse::<NodeId>().unwrap(), id);
        assert_eq!("42".parse::<NodeId>().unwrap(), id);
        assert!("abc".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_capability_blocks_follow_type() {
        let group = SceneNode::new(NodeId(1), NodeType::Group);
        assert!(group.geometry.is_none());
        assert!(group.constraints.is_none());
        assert!(group.supports(Capability::Children));

        let rect = SceneNode::new(NodeId(2), NodeType::Rectangle);
        assert!(rect.geometry.is_some());
        assert!(rect.corners.as_ref().unwrap().independent);
        assert!(rect.container.is_none());

        let star = SceneNode::new(NodeId(3), NodeType::Star);
        assert!(!star.corners.as_ref().unwrap().independent);
        assert_eq!(star.shape.as_ref().unwrap().point_count, 5);

        let frame = SceneNode::new(NodeId(4), NodeType::Frame);
        assert!(frame.container.as_ref().unwrap().clips_content);
        assert_eq!(frame.blend_mode, BlendMode::PassThrough);
    }

    #[test]
    fn test_opacity_is_clamped() {
        let mut node = SceneNode::new(NodeId(1), NodeType::Rectangle);
        node.set_opacity(1.7);
        assert_eq!(node.opacity(), 1.0);
        node.set_opacity(-0.2);
        assert_eq!(node.opacity(), 0.0);
    }

    #[test]
    fn test_resize_rules() {
        let mut line = SceneNode::new(NodeId(1), NodeType::Line);
        assert!(line.resize(120.0, 0.0).is_ok());
        let mut rect = SceneNode::new(NodeId(2), NodeType::Rectangle);
        assert!(rect.resize(120.0, 0.0).is_err());
        assert!(rect.resize(f64::NAN, 10.0).is_err());
        assert!(rect.resize(10.0, 20.0).is_ok());
        assert_eq!((rect.width(), rect.height()), (10.0, 20.0));
    }

    #[test]
    fn test_relative_transform_round_trip() {
        let mut node = SceneNode::new(NodeId(1), NodeType::Rectangle);
        node.x = 10.0;
        node.y = 20.0;
        node.rotation = 90.0;
        let transform = node.relative_transform();

        let mut other = SceneNode::new(NodeId(2), NodeType::Rectangle);
        other.set_relative_transform(&transform).unwrap();
        assert_eq!(other.x, 10.0);
        assert_eq!(other.y, 20.0);
        assert!((other.rotation - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_layout_grid_validation() {
        let mut frame = SceneNode::new(NodeId(1), NodeType::Frame);
        let bad = LayoutGrid {
            pattern: GridPattern::Grid,
            section_size: None,
            visible: None,
            color: None,
            alignment: None,
            gutter_size: None,
            offset: None,
            count: None,
        };
        assert!(frame.set_layout_grids(vec![bad.clone()]).is_err());

        let good = LayoutGrid {
            section_size: Some(8.0),
            ..bad
        };
        assert!(frame.set_layout_grids(vec![good]).is_ok());
        assert_eq!(frame.container.as_ref().unwrap().layout_grids.len(), 1);
    }

    #[test]
    fn test_vector_network_validation() {
        let mut vector = SceneNode::new(NodeId(1), NodeType::Vector);
        let vertex = VectorVertex {
            x: 0.0,
            y: 0.0,
            stroke_cap: None,
            corner_radius: None,
        };
        let network = VectorNetwork {
            vertices: vec![vertex],
            segments: vec![VectorSegment {
                start: 0,
                end: 3,
                tangent_start: None,
                tangent_end: None,
            }],
            regions: Vec::new(),
        };
        assert!(vector.set_vector_network(network).is_err());
    }

    #[test]
    fn test_vector_paths_validation() {
        let mut vector = SceneNode::new(NodeId(1), NodeType::Vector);
        let bad = VectorPath {
            winding_rule: WindingRule::Nonzero,
            data: "M 0 0 L 10".to_string(),
        };
        assert!(vector.set_vector_paths(vec![bad]).is_err());
        assert!(vector.vector.as_ref().unwrap().paths.is_empty());
    }

    #[test]
    fn test_point_count_minimum() {
        let mut polygon = SceneNode::new(NodeId(1), NodeType::Polygon);
        assert!(polygon.set_point_count(2).is_err());
        assert!(polygon.set_point_count(6).is_ok());
        let mut rect = SceneNode::new(NodeId(2), NodeType::Rectangle);
        assert!(matches!(rect.set_point_count(6), Err(BridgeError::Unsupported { .. })));
    }

    #[test]
    fn test_corners_uniform_detection() {
        let mut corners = Corners::default();
        corners.set_uniform(8.0);
        assert_eq!(corners.uniform(), Some(8.0));
        corners.bottom_right = 2.0;
        assert_eq!(corners.uniform(), None);
    }
}
