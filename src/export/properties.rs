//! Extractors turning a live node back into its serialized description
//!
//! Each extractor writes only values that differ from the documented default,
//! so that a freshly created node exports as little more than its type, name
//! and bounds. Paints, children and anything needing the host are filled in
//! by the exporter.

use crate::export::text_runs::text_segments;
use crate::mappers::effect::scene_to_effect;
use crate::scene::node::{default_stroke_align, SceneNode};
use crate::schema::layout::{
    CounterAxisAlign, LayoutAlign, LayoutPositioning, LayoutWrap, PrimaryAxisAlign, SizingMode,
};
use crate::schema::paint::{StrokeCap, StrokeJoin, DEFAULT_MITER_LIMIT, DEFAULT_STROKE_WEIGHT};
use crate::schema::text::{
    TextAlignHorizontal, TextAlignVertical, TextCase, TextDecoration, TextTruncation,
};
use crate::schema::{DesignNode, NodeType};
use serde_json::Value as JsonValue;
use tracing::warn;

/// `Some(value)` unless it equals `default`
fn non_default<T: PartialEq>(value: T, default: T) -> Option<T> {
    (value != default).then_some(value)
}

fn non_empty<T: Clone>(values: &[T]) -> Option<Vec<T>> {
    (!values.is_empty()).then(|| values.to_vec())
}

/// Every synchronous property group of `node`
///
/// # Arguments
/// * `node` - The live node
/// * `parent_auto_layout` - Whether its parent lays it out; gates the layout-child fields
pub fn extract(node: &SceneNode, parent_auto_layout: bool) -> DesignNode {
    let mut design = DesignNode::new(node.node_type.as_str());
    extract_common(node, &mut design);
    extract_stroke_style(node, &mut design);
    extract_corners(node, &mut design);
    extract_container(node, &mut design);
    if parent_auto_layout {
        extract_layout_child(node, &mut design);
    }
    extract_text(node, &mut design);
    extract_vector(node, &mut design);
    extract_shape(node, &mut design);
    extract_component(node, &mut design);
    extract_instance(node, &mut design);
    design.boolean_operation = node.boolean_operation;
    design
}

pub fn extract_common(node: &SceneNode, design: &mut DesignNode) {
    design.name = Some(node.name.clone());
    design.x = Some(node.x);
    design.y = Some(node.y);
    design.width = Some(node.width());
    design.height = Some(node.height());
    design.rotation = non_default(node.rotation, 0.0);

    design.visible = non_default(node.visible, true);
    design.locked = non_default(node.locked, false);
    design.opacity = non_default(node.opacity(), 1.0);
    design.blend_mode = (!node.blend_mode.is_default()).then_some(node.blend_mode);
    design.is_mask = non_default(node.is_mask, false);

    if !node.effects.is_empty() {
        design.effects = Some(node.effects.iter().map(scene_to_effect).collect());
    }
    design.constraints = node.constraints.filter(|c| !c.is_default());
    design.export_settings = non_empty(&node.export_settings);
}

pub fn extract_stroke_style(node: &SceneNode, design: &mut DesignNode) {
    let Some(geometry) = &node.geometry else {
        return;
    };
    design.stroke_weight = non_default(geometry.stroke_weight, DEFAULT_STROKE_WEIGHT);
    design.stroke_align = non_default(geometry.stroke_align, default_stroke_align(node.node_type));
    design.stroke_cap = non_default(geometry.stroke_cap, StrokeCap::default());
    design.stroke_join = non_default(geometry.stroke_join, StrokeJoin::default());
    design.dash_pattern = non_empty(&geometry.dash_pattern);
    design.stroke_miter_limit = non_default(geometry.stroke_miter_limit, DEFAULT_MITER_LIMIT);
}

/// Four equal corners export as `cornerRadius`, anything else as the four fields
pub fn extract_corners(node: &SceneNode, design: &mut DesignNode) {
    let Some(corners) = &node.corners else {
        return;
    };
    match corners.uniform() {
        Some(radius) => design.corner_radius = non_default(radius, 0.0),
        None => {
            design.top_left_radius = Some(corners.top_left);
            design.top_right_radius = Some(corners.top_right);
            design.bottom_left_radius = Some(corners.bottom_left);
            design.bottom_right_radius = Some(corners.bottom_right);
        }
    }
    design.corner_smoothing = non_default(corners.smoothing, 0.0);
}

pub fn extract_container(node: &SceneNode, design: &mut DesignNode) {
    let Some(container) = &node.container else {
        return;
    };
    design.clips_content = non_default(container.clips_content, true);

    let state = &container.auto_layout;
    if state.is_enabled() {
        let layout = &mut design.auto_layout;
        layout.layout_mode = Some(state.mode);
        layout.item_spacing = non_default(state.item_spacing, 0.0);
        layout.padding_left = non_default(state.padding_left, 0.0);
        layout.padding_right = non_default(state.padding_right, 0.0);
        layout.padding_top = non_default(state.padding_top, 0.0);
        layout.padding_bottom = non_default(state.padding_bottom, 0.0);
        layout.primary_axis_align_items =
            non_default(state.primary_axis_align, PrimaryAxisAlign::Min);
        layout.counter_axis_align_items =
            non_default(state.counter_axis_align, CounterAxisAlign::Min);
        layout.primary_axis_sizing_mode = non_default(state.primary_axis_sizing, SizingMode::Auto);
        layout.counter_axis_sizing_mode = non_default(state.counter_axis_sizing, SizingMode::Auto);
        layout.layout_wrap = non_default(state.wrap, LayoutWrap::NoWrap);
        layout.counter_axis_spacing = non_default(state.counter_axis_spacing, 0.0);
        layout.item_reverse_z_index = non_default(state.reverse_z_index, false);
    }

    if !container.layout_grids.is_empty() {
        let grids: Vec<JsonValue> = container
            .layout_grids
            .iter()
            .filter_map(|grid| match serde_json::to_value(grid) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Skipping layout grid on {:?}: {}", node.name, e);
                    None
                }
            })
            .collect();
        design.layout_grids = non_empty(&grids);
    }
    design.guides = non_empty(&container.guides);
}

pub fn extract_layout_child(node: &SceneNode, design: &mut DesignNode) {
    let child = &node.layout_child;
    design.layout_child.layout_grow = non_default(child.grow, 0.0);
    design.layout_child.layout_align = non_default(child.align, LayoutAlign::Inherit);
    design.layout_child.layout_positioning =
        non_default(child.positioning, LayoutPositioning::Auto);
}

pub fn extract_text(node: &SceneNode, design: &mut DesignNode) {
    let Some(text) = &node.text else {
        return;
    };
    let style = text.node_style();
    let props = &mut design.text;

    props.characters = Some(text.characters());
    props.font_name = Some(style.font_name.clone());
    props.font_size = Some(style.font_size);
    props.text_case = non_default(style.text_case, TextCase::Original);
    props.text_decoration = non_default(style.text_decoration, TextDecoration::None);
    props.line_height = (!style.line_height.is_auto()).then_some(style.line_height);
    props.letter_spacing = (!style.letter_spacing.is_zero()).then_some(style.letter_spacing);
    props.hyperlink = style.hyperlink.clone();

    props.text_align_horizontal = non_default(text.align_horizontal, TextAlignHorizontal::Left);
    props.text_align_vertical = non_default(text.align_vertical, TextAlignVertical::Top);
    props.paragraph_indent = non_default(text.paragraph_indent, 0.0);
    props.paragraph_spacing = non_default(text.paragraph_spacing, 0.0);
    props.text_truncation = non_default(text.truncation, TextTruncation::Disabled);
    props.max_lines = text.max_lines;
    props.text_auto_resize = Some(text.auto_resize);
    props.text_segments = text_segments(text);
}

pub fn extract_vector(node: &SceneNode, design: &mut DesignNode) {
    let Some(vector) = &node.vector else {
        return;
    };
    design.vector.vector_paths = non_empty(&vector.paths);
    design.vector.vector_network = vector.network.clone();
}

pub fn extract_shape(node: &SceneNode, design: &mut DesignNode) {
    let Some(shape) = &node.shape else {
        return;
    };
    match node.node_type {
        NodeType::Polygon => design.shape.point_count = Some(shape.point_count),
        NodeType::Star => {
            design.shape.point_count = Some(shape.point_count);
            design.shape.inner_radius = Some(shape.inner_radius);
        }
        NodeType::Ellipse => {
            design.shape.arc_data = (!shape.arc_data.is_full()).then_some(shape.arc_data);
        }
        _ => {}
    }
}

pub fn extract_component(node: &SceneNode, design: &mut DesignNode) {
    let Some(component) = &node.component else {
        return;
    };
    design.component.key = Some(component.key.clone());
    design.component.description =
        (!component.description.is_empty()).then(|| component.description.clone());
    design.component.component_property_definitions = (!component.property_definitions.is_empty())
        .then(|| component.property_definitions.clone());
}

/// The main component key needs a host lookup and is set by the exporter
pub fn extract_instance(node: &SceneNode, design: &mut DesignNode) {
    let Some(instance) = &node.instance else {
        return;
    };
    design.instance.main_component_id = instance.main_component.map(|id| id.to_string());
    design.instance.component_properties =
        (!instance.property_values.is_empty()).then(|| instance.property_values.clone());
    design.instance.overrides = non_empty(&instance.overrides);
}
