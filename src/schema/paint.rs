use serde::{Deserialize, Serialize};

/// 2x3 affine matrix `[[a, b, tx], [c, d, ty]]`
pub type Transform = [[f64; 3]; 2];

pub const IDENTITY_TRANSFORM: Transform = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

/// Opaque color with channels in the 0.0-1.0 range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

/// Color with alpha, used by gradient stops, shadows and grids
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "default_alpha")]
    pub a: f64,
}

fn default_alpha() -> f64 {
    1.0
}

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlendMode {
    PassThrough,
    Normal,
    Darken,
    Multiply,
    LinearBurn,
    ColorBurn,
    Lighten,
    Screen,
    LinearDodge,
    ColorDodge,
    Overlay,
    SoftLight,
    HardLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// NORMAL and PASS_THROUGH are both treated as "no blending" on export
    pub fn is_default(self) -> bool {
        matches!(self, BlendMode::Normal | BlendMode::PassThrough)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaintType {
    Solid,
    GradientLinear,
    GradientRadial,
    GradientAngular,
    GradientDiamond,
    Image,
}

impl PaintType {
    pub fn is_gradient(self) -> bool {
        matches!(
            self,
            PaintType::GradientLinear
                | PaintType::GradientRadial
                | PaintType::GradientAngular
                | PaintType::GradientDiamond
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f64,
    pub color: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleMode {
    #[default]
    Fill,
    Fit,
    Crop,
    Tile,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFilters {
    #[serde(default)]
    pub exposure: f64,
    #[serde(default)]
    pub contrast: f64,
    #[serde(default)]
    pub saturation: f64,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub tint: f64,
    #[serde(default)]
    pub highlights: f64,
    #[serde(default)]
    pub shadows: f64,
}

impl ImageFilters {
    pub fn is_neutral(&self) -> bool {
        *self == ImageFilters::default()
    }
}

/// Serialized paint. Reused for both `fills` and `strokes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    #[serde(rename = "type")]
    pub paint_type: PaintType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<BlendMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient_stops: Option<Vec<ColorStop>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient_transform: Option<Transform>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_mode: Option<ScaleMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_transform: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<ImageFilters>,
}

impl Fill {
    /// Bare fill of the given kind with every optional field unset
    pub fn of_type(paint_type: PaintType) -> Self {
        Self {
            paint_type,
            visible: None,
            opacity: None,
            blend_mode: None,
            color: None,
            gradient_stops: None,
            gradient_transform: None,
            image_hash: None,
            image_url: None,
            image_data: None,
            scale_mode: None,
            image_transform: None,
            scaling_factor: None,
            rotation: None,
            filters: None,
        }
    }

    pub fn solid(color: Rgb) -> Self {
        Self {
            color: Some(color),
            ..Self::of_type(PaintType::Solid)
        }
    }

    /// True when the paint needs a host round-trip (decode or fetch) before it can be assigned
    pub fn needs_image_resolution(&self) -> bool {
        self.paint_type == PaintType::Image
            && (self.image_data.is_some() || self.image_url.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrokeAlign {
    Inside,
    Outside,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrokeCap {
    #[default]
    None,
    Round,
    Square,
    ArrowLines,
    ArrowEquilateral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrokeJoin {
    #[default]
    Miter,
    Bevel,
    Round,
}

pub const DEFAULT_STROKE_WEIGHT: f64 = 1.0;
pub const DEFAULT_MITER_LIMIT: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectType {
    DropShadow,
    InnerShadow,
    LayerBlur,
    BackgroundBlur,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

/// Serialized effect. Shadow-only fields are ignored for blurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    #[serde(rename = "type")]
    pub effect_type: EffectType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default)]
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Vector2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<BlendMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_shadow_behind_node: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_solid_fill_omits_unset_fields() {
        let fill = Fill::solid(Rgb::new(1.0, 0.0, 0.0));
        let value = serde_json::to_value(&fill).unwrap();
        assert_eq!(
            value,
            json!({"type": "SOLID", "color": {"r": 1.0, "g": 0.0, "b": 0.0}})
        );
    }

    #[test]
    fn test_gradient_stop_alpha_defaults_to_one() {
        let stop: ColorStop =
            serde_json::from_value(json!({"position": 0.5, "color": {"r": 0, "g": 0, "b": 1}}))
                .unwrap();
        assert_eq!(stop.color.a, 1.0);
        assert_eq!(stop.color.b, 1.0);
    }

    #[test]
    fn test_blend_mode_defaults() {
        assert!(BlendMode::Normal.is_default());
        assert!(BlendMode::PassThrough.is_default());
        assert!(!BlendMode::Multiply.is_default());
        let parsed: BlendMode = serde_json::from_value(json!("SOFT_LIGHT")).unwrap();
        assert_eq!(parsed, BlendMode::SoftLight);
    }

    #[test]
    fn test_image_fill_resolution_need() {
        let mut fill = Fill::of_type(PaintType::Image);
        fill.image_hash = Some("abc".to_string());
        assert!(!fill.needs_image_resolution());
        fill.image_url = Some("https://example.com/a.png".to_string());
        assert!(fill.needs_image_resolution());
    }

    #[test]
    fn test_effect_parses_blur_without_shadow_fields() {
        let effect: Effect =
            serde_json::from_value(json!({"type": "LAYER_BLUR", "radius": 4})).unwrap();
        assert_eq!(effect.effect_type, EffectType::LayerBlur);
        assert_eq!(effect.radius, 4.0);
        assert!(effect.color.is_none());
    }
}
