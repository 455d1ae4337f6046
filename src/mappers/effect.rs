use crate::error::{BridgeError, Result};
use crate::scene::paint::{Blur, SceneEffect, Shadow};
use crate::schema::paint::{BlendMode, Effect, EffectType, Rgba, Vector2};
use tracing::warn;

const DEFAULT_SHADOW_COLOR: Rgba = Rgba {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 0.25,
};

const DEFAULT_SHADOW_OFFSET: Vector2 = Vector2 { x: 0.0, y: 4.0 };

/// Convert a serialized effect into a host effect
///
/// Shadows missing a color or offset get the host's defaults (25% black,
/// 4px down).
pub fn effect_to_scene(effect: &Effect) -> Result<SceneEffect> {
    if !effect.radius.is_finite() || effect.radius < 0.0 {
        return Err(BridgeError::invalid(
            "effects",
            format!("radius {} must be a non-negative number", effect.radius),
        ));
    }

    let visible = effect.visible.unwrap_or(true);
    let shadow = || Shadow {
        color: effect.color.unwrap_or(DEFAULT_SHADOW_COLOR),
        offset: effect.offset.unwrap_or(DEFAULT_SHADOW_OFFSET),
        radius: effect.radius,
        spread: effect.spread.unwrap_or(0.0),
        visible,
        blend_mode: effect.blend_mode.unwrap_or(BlendMode::Normal),
        show_shadow_behind_node: effect.show_shadow_behind_node.unwrap_or(false),
    };
    let blur = || Blur {
        radius: effect.radius,
        visible,
    };

    Ok(match effect.effect_type {
        EffectType::DropShadow => SceneEffect::DropShadow(shadow()),
        EffectType::InnerShadow => SceneEffect::InnerShadow(shadow()),
        EffectType::LayerBlur => SceneEffect::LayerBlur(blur()),
        EffectType::BackgroundBlur => SceneEffect::BackgroundBlur(blur()),
    })
}

/// Map an effect list, skipping invalid entries
pub fn effects_to_scene(effects: &[Effect]) -> Vec<SceneEffect> {
    effects
        .iter()
        .filter_map(|effect| match effect_to_scene(effect) {
            Ok(mapped) => Some(mapped),
            Err(e) => {
                warn!("Skipping {:?} effect: {}", effect.effect_type, e);
                None
            }
        })
        .collect()
}

/// Convert a host effect back into its serialized form, omitting defaults
pub fn scene_to_effect(effect: &SceneEffect) -> Effect {
    let blank = |effect_type: EffectType, radius: f64, visible: bool| Effect {
        effect_type,
        visible: (!visible).then_some(false),
        radius,
        spread: None,
        color: None,
        offset: None,
        blend_mode: None,
        show_shadow_behind_node: None,
    };

    match effect {
        SceneEffect::DropShadow(shadow) | SceneEffect::InnerShadow(shadow) => {
            let effect_type = if matches!(effect, SceneEffect::DropShadow(_)) {
                EffectType::DropShadow
            } else {
                EffectType::InnerShadow
            };
            Effect {
                spread: (shadow.spread != 0.0).then_some(shadow.spread),
                color: Some(shadow.color),
                offset: Some(shadow.offset),
                blend_mode: (!shadow.blend_mode.is_default()).then_some(shadow.blend_mode),
                show_shadow_behind_node: shadow.show_shadow_behind_node.then_some(true),
                ..blank(effect_type, shadow.radius, shadow.visible)
            }
        }
        SceneEffect::LayerBlur(blur) => blank(EffectType::LayerBlur, blur.radius, blur.visible),
        SceneEffect::BackgroundBlur(blur) => {
            blank(EffectType::BackgroundBlur, blur.radius, blur.visible)
        }
    }
}
