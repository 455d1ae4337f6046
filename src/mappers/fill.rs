use crate::error::{BridgeError, Result};
use crate::scene::paint::{GradientKind, Paint, PaintKind};
use crate::schema::paint::{BlendMode, Fill, PaintType, IDENTITY_TRANSFORM};
use tracing::warn;

/// Convert a serialized fill into a host paint without touching the host
///
/// Image fills must already carry an `imageHash`; fills that still need
/// decoding or fetching go through `mappers::image::resolve_fill` instead.
///
/// # Returns
/// * `Ok(Paint)` - The host paint
/// * `Err(BridgeError::InvalidProperty)` - If the kind-specific payload is missing
pub fn fill_to_paint(fill: &Fill) -> Result<Paint> {
    let kind = match fill.paint_type {
        PaintType::Solid => PaintKind::Solid {
            color: fill
                .color
                .ok_or_else(|| BridgeError::invalid("fills", "SOLID paint without color"))?,
        },
        PaintType::GradientLinear
        | PaintType::GradientRadial
        | PaintType::GradientAngular
        | PaintType::GradientDiamond => {
            let stops = fill.gradient_stops.clone().unwrap_or_default();
            if stops.is_empty() {
                return Err(BridgeError::invalid("fills", "gradient paint without stops"));
            }
            PaintKind::Gradient {
                kind: gradient_kind(fill.paint_type),
                stops,
                transform: fill.gradient_transform.unwrap_or(IDENTITY_TRANSFORM),
            }
        }
        PaintType::Image => PaintKind::Image {
            image_hash: fill
                .image_hash
                .clone()
                .ok_or_else(|| {
                    BridgeError::invalid("fills", "IMAGE paint without a resolved hash")
                })?,
            scale_mode: fill.scale_mode.unwrap_or_default(),
            transform: fill.image_transform,
            scaling_factor: fill.scaling_factor,
            rotation: fill.rotation.unwrap_or(0.0),
            filters: fill.filters.unwrap_or_default(),
        },
    };

    Ok(Paint {
        kind,
        opacity: fill.opacity.map(|o| o.clamp(0.0, 1.0)).unwrap_or(1.0),
        visible: fill.visible.unwrap_or(true),
        blend_mode: fill.blend_mode.unwrap_or(BlendMode::Normal),
    })
}

/// Synchronous mapping of a paint list; unmappable entries are skipped
pub fn fills_to_paints(fills: &[Fill]) -> Vec<Paint> {
    fills
        .iter()
        .filter_map(|fill| match fill_to_paint(fill) {
            Ok(paint) => Some(paint),
            Err(e) => {
                warn!("Skipping {:?} paint: {}", fill.paint_type, e);
                None
            }
        })
        .collect()
}

/// Convert a host paint back into its serialized form, omitting defaults
pub fn paint_to_fill(paint: &Paint) -> Fill {
    let mut fill = match &paint.kind {
        PaintKind::Solid { color } => Fill::solid(*color),
        PaintKind::Gradient {
            kind,
            stops,
            transform,
        } => {
            let mut fill = Fill::of_type(gradient_paint_type(*kind));
            fill.gradient_stops = Some(stops.clone());
            fill.gradient_transform = (*transform != IDENTITY_TRANSFORM).then_some(*transform);
            fill
        }
        PaintKind::Image {
            image_hash,
            scale_mode,
            transform,
            scaling_factor,
            rotation,
            filters,
        } => {
            let mut fill = Fill::of_type(PaintType::Image);
            fill.image_hash = Some(image_hash.clone());
            fill.scale_mode = (*scale_mode != Default::default()).then_some(*scale_mode);
            fill.image_transform = *transform;
            fill.scaling_factor = *scaling_factor;
            fill.rotation = (*rotation != 0.0).then_some(*rotation);
            fill.filters = (!filters.is_neutral()).then_some(*filters);
            fill
        }
    };

    fill.opacity = (paint.opacity != 1.0).then_some(paint.opacity);
    fill.visible = (!paint.visible).then_some(false);
    fill.blend_mode = (!paint.blend_mode.is_default()).then_some(paint.blend_mode);
    fill
}

fn gradient_kind(paint_type: PaintType) -> GradientKind {
    match paint_type {
        PaintType::GradientRadial => GradientKind::Radial,
        PaintType::GradientAngular => GradientKind::Angular,
        PaintType::GradientDiamond => GradientKind::Diamond,
        _ => GradientKind::Linear,
    }
}

fn gradient_paint_type(kind: GradientKind) -> PaintType {
    match kind {
        GradientKind::Linear => PaintType::GradientLinear,
        GradientKind::Radial => PaintType::GradientRadial,
        GradientKind::Angular => PaintType::GradientAngular,
        GradientKind::Diamond => PaintType::GradientDiamond,
    }
}
