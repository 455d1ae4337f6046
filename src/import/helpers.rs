//! Property groups applied onto a freshly created node
//!
//! Every group is independent: it no-ops when the node lacks the capability,
//! and a failure inside one group is logged and leaves the others untouched.

use crate::error::{BridgeError, Result};
use crate::mappers::effect::effects_to_scene;
use crate::scene::node::{unsupported, Capability, SceneNode};
use crate::scene::paint::Paint;
use crate::schema::layout::{AutoLayout, LayoutGrid};
use crate::schema::DesignNode;
use tracing::{debug, warn};

/// Apply every synchronous property group in order
///
/// # Arguments
/// * `node` - The live node, already placed under its parent
/// * `design` - The serialized description
/// * `parent_auto_layout` - Whether the live parent has auto-layout enabled
pub fn apply_base(node: &mut SceneNode, design: &DesignNode, parent_auto_layout: bool) {
    guarded(node, design, "common", apply_common);
    guarded(node, design, "size", apply_size);
    guarded(node, design, "constraints", apply_constraints);
    guarded(node, design, "stroke style", apply_stroke_style);
    guarded(node, design, "corner radius", apply_corners);
    guarded(node, design, "effects", apply_effects);
    guarded(node, design, "clipsContent", apply_clips_content);
    guarded(node, design, "auto-layout", apply_auto_layout);
    guarded(node, design, "layout child", |node, design| {
        apply_layout_child(node, design, parent_auto_layout)
    });
    guarded(node, design, "layoutGrids", apply_layout_grids);
    guarded(node, design, "guides", apply_guides);
    guarded(node, design, "exportSettings", apply_export_settings);
    report_rejected(node, design);
}

/// Wire values dropped while parsing, each logged like a failed property group
pub fn report_rejected(node: &SceneNode, design: &DesignNode) {
    for rejected in &design.rejected {
        warn!(
            "Skipping {} on {} {:?}: {}",
            rejected.property, node.node_type, node.name, rejected.reason
        );
    }
}

/// Assign already-resolved paints; `None` leaves the current paints alone
pub fn apply_paints(node: &mut SceneNode, fills: Option<Vec<Paint>>, strokes: Option<Vec<Paint>>) {
    if let Some(fills) = fills {
        let result = node.set_fills(fills);
        report(node, "fills", result);
    }
    if let Some(strokes) = strokes {
        let result = node.set_strokes(strokes);
        report(node, "strokes", result);
    }
}

/// Run one property group, logging instead of propagating its failure
pub fn guarded<F>(node: &mut SceneNode, design: &DesignNode, group: &str, apply: F)
where
    F: FnOnce(&mut SceneNode, &DesignNode) -> Result<()>,
{
    let result = apply(node, design);
    report(node, group, result);
}

fn report(node: &SceneNode, group: &str, result: Result<()>) {
    match result {
        Ok(()) => {}
        Err(BridgeError::Unsupported { .. }) => {
            debug!("{} {:?} has no {}, skipped", node.node_type, node.name, group);
        }
        Err(e) => warn!("Skipping {} on {} {:?}: {}", group, node.node_type, node.name, e),
    }
}

fn finite(property: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(BridgeError::invalid(property, format!("{} is not a finite number", value)))
    }
}

fn non_negative(property: &'static str, value: f64) -> Result<f64> {
    if finite(property, value)? < 0.0 {
        return Err(BridgeError::invalid(property, format!("{} is negative", value)));
    }
    Ok(value)
}

pub fn apply_common(node: &mut SceneNode, design: &DesignNode) -> Result<()> {
    if let Some(name) = &design.name {
        node.name = name.clone();
    }
    if let Some(visible) = design.visible {
        node.visible = visible;
    }
    if let Some(locked) = design.locked {
        node.locked = locked;
    }
    if let Some(opacity) = design.opacity {
        node.set_opacity(opacity);
    }
    if let Some(blend_mode) = design.blend_mode {
        node.blend_mode = blend_mode;
    }
    if let Some(is_mask) = design.is_mask {
        node.is_mask = is_mask;
    }
    if let Some(x) = design.x {
        node.x = finite("x", x)?;
    }
    if let Some(y) = design.y {
        node.y = finite("y", y)?;
    }
    if let Some(rotation) = design.rotation {
        node.rotation = finite("rotation", rotation)?;
    }
    // the matrix wins over x/y/rotation when both are given
    if let Some(transform) = &design.relative_transform {
        node.set_relative_transform(transform)?;
    }
    Ok(())
}

pub fn apply_size(node: &mut SceneNode, design: &DesignNode) -> Result<()> {
    if design.width.is_none() && design.height.is_none() {
        return Ok(());
    }
    let width = design.width.unwrap_or(node.width());
    let height = design.height.unwrap_or(node.height());
    node.resize(width, height)
}

pub fn apply_constraints(node: &mut SceneNode, design: &DesignNode) -> Result<()> {
    let Some(constraints) = design.constraints else {
        return Ok(());
    };
    let node_type = node.node_type;
    let target = node
        .constraints
        .as_mut()
        .ok_or_else(|| unsupported(node_type, Capability::Constraints))?;
    *target = constraints;
    Ok(())
}

pub fn apply_stroke_style(node: &mut SceneNode, design: &DesignNode) -> Result<()> {
    let any = design.stroke_weight.is_some()
        || design.stroke_align.is_some()
        || design.stroke_cap.is_some()
        || design.stroke_join.is_some()
        || design.dash_pattern.is_some()
        || design.stroke_miter_limit.is_some();
    if !any {
        return Ok(());
    }

    let weight = design.stroke_weight.map(|w| non_negative("strokeWeight", w)).transpose()?;
    let miter = design.stroke_miter_limit.map(|m| non_negative("strokeMiterLimit", m)).transpose()?;
    if let Some(dashes) = &design.dash_pattern {
        for dash in dashes {
            non_negative("dashPattern", *dash)?;
        }
    }

    let node_type = node.node_type;
    let geometry = node
        .geometry
        .as_mut()
        .ok_or_else(|| unsupported(node_type, Capability::Geometry))?;
    if let Some(weight) = weight {
        geometry.stroke_weight = weight;
    }
    if let Some(align) = design.stroke_align {
        geometry.stroke_align = align;
    }
    if let Some(cap) = design.stroke_cap {
        geometry.stroke_cap = cap;
    }
    if let Some(join) = design.stroke_join {
        geometry.stroke_join = join;
    }
    if let Some(dashes) = &design.dash_pattern {
        geometry.dash_pattern = dashes.clone();
    }
    if let Some(miter) = miter {
        geometry.stroke_miter_limit = miter;
    }
    Ok(())
}

/// Four independent corners win over the uniform radius whenever any is given
pub fn apply_corners(node: &mut SceneNode, design: &DesignNode) -> Result<()> {
    let independent = design.has_independent_corners();
    if !independent && design.corner_radius.is_none() && design.corner_smoothing.is_none() {
        return Ok(());
    }

    let uniform = design.corner_radius.map(|r| non_negative("cornerRadius", r)).transpose()?;
    let corner = |value: Option<f64>| -> Result<Option<f64>> {
        value.map(|r| non_negative("cornerRadius", r)).transpose()
    };
    let top_left = corner(design.top_left_radius)?;
    let top_right = corner(design.top_right_radius)?;
    let bottom_left = corner(design.bottom_left_radius)?;
    let bottom_right = corner(design.bottom_right_radius)?;

    let node_type = node.node_type;
    let corners = node
        .corners
        .as_mut()
        .ok_or_else(|| unsupported(node_type, Capability::Corners))?;

    if independent && corners.independent {
        let base = uniform.unwrap_or(0.0);
        corners.top_left = top_left.unwrap_or(base);
        corners.top_right = top_right.unwrap_or(base);
        corners.bottom_left = bottom_left.unwrap_or(base);
        corners.bottom_right = bottom_right.unwrap_or(base);
    } else if independent {
        let radius = uniform
            .or(top_left)
            .or(top_right)
            .or(bottom_left)
            .or(bottom_right)
            .unwrap_or(0.0);
        debug!("{} takes a single corner radius, using {}", node_type, radius);
        corners.set_uniform(radius);
    } else if let Some(radius) = uniform {
        corners.set_uniform(radius);
    }

    if let Some(smoothing) = design.corner_smoothing {
        corners.smoothing = finite("cornerSmoothing", smoothing)?.clamp(0.0, 1.0);
    }
    Ok(())
}

pub fn apply_effects(node: &mut SceneNode, design: &DesignNode) -> Result<()> {
    if let Some(effects) = &design.effects {
        node.effects = effects_to_scene(effects);
    }
    Ok(())
}

pub fn apply_clips_content(node: &mut SceneNode, design: &DesignNode) -> Result<()> {
    let Some(clips) = design.clips_content else {
        return Ok(());
    };
    let node_type = node.node_type;
    let container = node
        .container
        .as_mut()
        .ok_or_else(|| unsupported(node_type, Capability::Container))?;
    container.clips_content = clips;
    Ok(())
}

pub fn apply_auto_layout(node: &mut SceneNode, design: &DesignNode) -> Result<()> {
    let layout = &design.auto_layout;
    if *layout == AutoLayout::default() {
        return Ok(());
    }

    let spacing = layout.item_spacing.map(|s| finite("itemSpacing", s)).transpose()?;
    let counter_spacing = layout
        .counter_axis_spacing
        .map(|s| finite("counterAxisSpacing", s))
        .transpose()?;
    let padding = |value: Option<f64>| value.map(|p| non_negative("padding", p)).transpose();
    let (left, right, top, bottom) = (
        padding(layout.padding_left)?,
        padding(layout.padding_right)?,
        padding(layout.padding_top)?,
        padding(layout.padding_bottom)?,
    );

    let node_type = node.node_type;
    let container = node
        .container
        .as_mut()
        .ok_or_else(|| unsupported(node_type, Capability::Container))?;
    let state = &mut container.auto_layout;

    if let Some(mode) = layout.layout_mode {
        state.mode = mode;
    }
    if let Some(spacing) = spacing {
        state.item_spacing = spacing;
    }
    if let Some(left) = left {
        state.padding_left = left;
    }
    if let Some(right) = right {
        state.padding_right = right;
    }
    if let Some(top) = top {
        state.padding_top = top;
    }
    if let Some(bottom) = bottom {
        state.padding_bottom = bottom;
    }
    if let Some(align) = layout.primary_axis_align_items {
        state.primary_axis_align = align;
    }
    if let Some(align) = layout.counter_axis_align_items {
        state.counter_axis_align = align;
    }
    if let Some(sizing) = layout.primary_axis_sizing_mode {
        state.primary_axis_sizing = sizing;
    }
    if let Some(sizing) = layout.counter_axis_sizing_mode {
        state.counter_axis_sizing = sizing;
    }
    if let Some(wrap) = layout.layout_wrap {
        state.wrap = wrap;
    }
    if let Some(spacing) = counter_spacing {
        state.counter_axis_spacing = spacing;
    }
    if let Some(reverse) = layout.item_reverse_z_index {
        state.reverse_z_index = reverse;
    }
    Ok(())
}

/// Grow/align/positioning only mean something inside an auto-layout parent
pub fn apply_layout_child(
    node: &mut SceneNode,
    design: &DesignNode,
    parent_auto_layout: bool,
) -> Result<()> {
    let child = &design.layout_child;
    if child.is_empty() {
        return Ok(());
    }
    if !parent_auto_layout {
        debug!(
            "Skipping layout-child properties of {:?}: parent has no auto-layout",
            node.name
        );
        return Ok(());
    }

    if let Some(grow) = child.layout_grow {
        node.layout_child.grow = non_negative("layoutGrow", grow)?;
    }
    if let Some(align) = child.layout_align {
        node.layout_child.align = align;
    }
    if let Some(positioning) = child.layout_positioning {
        node.layout_child.positioning = positioning;
    }
    Ok(())
}

pub fn apply_layout_grids(node: &mut SceneNode, design: &DesignNode) -> Result<()> {
    let Some(raw) = &design.layout_grids else {
        return Ok(());
    };
    if !node.supports(Capability::Container) {
        return Err(unsupported(node.node_type, Capability::Container));
    }
    let grids = raw
        .iter()
        .map(|value| serde_json::from_value::<LayoutGrid>(value.clone()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    node.set_layout_grids(grids)
}

pub fn apply_guides(node: &mut SceneNode, design: &DesignNode) -> Result<()> {
    let Some(guides) = &design.guides else {
        return Ok(());
    };
    for guide in guides {
        finite("guides", guide.offset)?;
    }
    let node_type = node.node_type;
    let container = node
        .container
        .as_mut()
        .ok_or_else(|| unsupported(node_type, Capability::Container))?;
    container.guides = guides.clone();
    Ok(())
}

pub fn apply_export_settings(node: &mut SceneNode, design: &DesignNode) -> Result<()> {
    let Some(settings) = &design.export_settings else {
        return Ok(());
    };
    if let Some(constraint) = settings
        .iter()
        .filter_map(|s| s.constraint)
        .find(|c| c.value.is_nan() || c.value <= 0.0)
    {
        return Err(BridgeError::invalid(
            "exportSettings",
            format!("constraint value {} must be positive", constraint.value),
        ));
    }
    node.export_settings = settings.clone();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::node::NodeId;
    use crate::scene::paint::SceneEffect;
    use crate::schema::layout::{LayoutAlign, LayoutMode, PrimaryAxisAlign};
    use crate::schema::paint::{BlendMode, StrokeAlign, StrokeJoin};
    use crate::schema::NodeType;
    use serde_json::json;

    fn design(value: serde_json::Value) -> DesignNode {
        serde_json::from_value(value).unwrap()
    }

    fn node(node_type: NodeType) -> SceneNode {
        SceneNode::new(NodeId(1), node_type)
    }

    #[test]
    fn test_common_properties_and_clamped_opacity() {
        let mut rect = node(NodeType::Rectangle);
        apply_base(
            &mut rect,
            &design(json!({
                "type": "RECTANGLE",
                "name": "Box",
                "x": 10, "y": 20, "width": 30, "height": 40,
                "rotation": 15,
                "visible": false,
                "locked": true,
                "opacity": 2.5,
                "blendMode": "MULTIPLY",
                "isMask": true
            })),
            false,
        );

        assert_eq!(rect.name, "Box");
        assert_eq!((rect.x, rect.y), (10.0, 20.0));
        assert_eq!((rect.width(), rect.height()), (30.0, 40.0));
        assert_eq!(rect.rotation, 15.0);
        assert!(!rect.visible);
        assert!(rect.locked);
        assert_eq!(rect.opacity(), 1.0);
        assert_eq!(rect.blend_mode, BlendMode::Multiply);
        assert!(rect.is_mask);
    }

    #[test]
    fn test_relative_transform_overrides_position() {
        let mut rect = node(NodeType::Rectangle);
        apply_common(
            &mut rect,
            &design(json!({"x": 1, "y": 2, "relativeTransform": [[1, 0, 50], [0, 1, 60]]})),
        )
        .unwrap();
        assert_eq!((rect.x, rect.y), (50.0, 60.0));
    }

    #[test]
    fn test_independent_corners_preferred() {
        let mut rect = node(NodeType::Rectangle);
        apply_corners(
            &mut rect,
            &design(json!({"cornerRadius": 4, "topLeftRadius": 12, "cornerSmoothing": 3})),
        )
        .unwrap();
        let corners = rect.corners.unwrap();
        assert_eq!(corners.top_left, 12.0);
        assert_eq!(corners.top_right, 4.0);
        assert_eq!(corners.bottom_right, 4.0);
        assert_eq!(corners.smoothing, 1.0);
    }

    #[test]
    fn test_star_collapses_independent_corners() {
        let mut star = node(NodeType::Star);
        apply_corners(&mut star, &design(json!({"bottomLeftRadius": 6}))).unwrap();
        assert_eq!(star.corners.unwrap().uniform(), Some(6.0));
    }

    #[test]
    fn test_missing_capability_is_a_silent_no_op() {
        let mut ellipse = node(NodeType::Ellipse);
        let before = ellipse.clone();
        apply_base(
            &mut ellipse,
            &design(json!({"cornerRadius": 8, "layoutMode": "HORIZONTAL", "clipsContent": false})),
            false,
        );
        assert_eq!(ellipse, before);
    }

    #[test]
    fn test_invalid_group_does_not_block_others() {
        let mut rect = node(NodeType::Rectangle);
        apply_base(
            &mut rect,
            &design(json!({
                "strokeWeight": -3,
                "strokeJoin": "ROUND",
                "cornerRadius": 5,
                "effects": [{"type": "LAYER_BLUR", "radius": 4}]
            })),
            false,
        );
        let geometry = rect.geometry.as_ref().unwrap();
        assert_eq!(geometry.stroke_weight, 1.0);
        assert_eq!(geometry.stroke_join, StrokeJoin::Miter);
        assert_eq!(rect.corners.as_ref().unwrap().uniform(), Some(5.0));
        assert!(matches!(rect.effects[0], SceneEffect::LayerBlur(_)));
    }

    #[test]
    fn test_stroke_style() {
        let mut line = node(NodeType::Line);
        apply_stroke_style(
            &mut line,
            &design(json!({"strokeWeight": 2, "strokeAlign": "OUTSIDE", "dashPattern": [4, 2]})),
        )
        .unwrap();
        let geometry = line.geometry.unwrap();
        assert_eq!(geometry.stroke_weight, 2.0);
        assert_eq!(geometry.stroke_align, StrokeAlign::Outside);
        assert_eq!(geometry.dash_pattern, vec![4.0, 2.0]);
    }

    #[test]
    fn test_auto_layout() {
        let mut frame = node(NodeType::Frame);
        apply_auto_layout(
            &mut frame,
            &design(json!({
                "layoutMode": "VERTICAL",
                "itemSpacing": 12,
                "paddingLeft": 16,
                "primaryAxisAlignItems": "SPACE_BETWEEN"
            })),
        )
        .unwrap();
        let state = frame.container.unwrap().auto_layout;
        assert_eq!(state.mode, LayoutMode::Vertical);
        assert_eq!(state.item_spacing, 12.0);
        assert_eq!(state.padding_left, 16.0);
        assert_eq!(state.padding_right, 0.0);
        assert_eq!(state.primary_axis_align, PrimaryAxisAlign::SpaceBetween);
    }

    #[test]
    fn test_layout_child_requires_auto_layout_parent() {
        let child = design(json!({"layoutGrow": 1, "layoutAlign": "STRETCH"}));

        let mut outside = node(NodeType::Rectangle);
        apply_layout_child(&mut outside, &child, false).unwrap();
        assert_eq!(outside.layout_child.grow, 0.0);
        assert_eq!(outside.layout_child.align, LayoutAlign::Inherit);

        let mut inside = node(NodeType::Rectangle);
        apply_layout_child(&mut inside, &child, true).unwrap();
        assert_eq!(inside.layout_child.grow, 1.0);
        assert_eq!(inside.layout_child.align, LayoutAlign::Stretch);
    }

    #[test]
    fn test_malformed_layout_grid_is_skipped() {
        let mut frame = node(NodeType::Frame);
        let result = apply_layout_grids(
            &mut frame,
            &design(json!({"layoutGrids": [{"pattern": "COLUMNS", "count": "many"}]})),
        );
        assert!(result.is_err());
        assert!(frame.container.as_ref().unwrap().layout_grids.is_empty());

        apply_layout_grids(
            &mut frame,
            &design(json!({"layoutGrids": [
                {"pattern": "COLUMNS", "alignment": "STRETCH", "count": 12, "gutterSize": 20}
            ]})),
        )
        .unwrap();
        assert_eq!(frame.container.as_ref().unwrap().layout_grids.len(), 1);
    }

    #[test]
    fn test_export_settings_validation() {
        let mut rect = node(NodeType::Rectangle);
        let bad = design(json!({"exportSettings": [
            {"format": "PNG", "constraint": {"type": "SCALE", "value": 0}}
        ]}));
        assert!(apply_export_settings(&mut rect, &bad).is_err());

        let good = design(json!({"exportSettings": [
            {"format": "PNG", "suffix": "@2x", "constraint": {"type": "SCALE", "value": 2}}
        ]}));
        apply_export_settings(&mut rect, &good).unwrap();
        assert_eq!(rect.export_settings.len(), 1);
    }

    #[test]
    fn test_apply_paints_on_group_is_ignored() {
        let mut group = node(NodeType::Group);
        apply_paints(&mut group, Some(vec![Paint::solid(crate::schema::paint::Rgb::BLACK)]), None);
        assert!(group.geometry.is_none());
    }
}
