use crate::schema::paint::{
    BlendMode, ColorStop, ImageFilters, Rgb, Rgba, ScaleMode, Transform, Vector2,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientKind {
    Linear,
    Radial,
    Angular,
    Diamond,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintKind {
    Solid {
        color: Rgb,
    },
    Gradient {
        kind: GradientKind,
        stops: Vec<ColorStop>,
        transform: Transform,
    },
    Image {
        image_hash: String,
        scale_mode: ScaleMode,
        transform: Option<Transform>,
        scaling_factor: Option<f64>,
        rotation: f64,
        filters: ImageFilters,
    },
}

/// Host-native paint attached to a live node
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub kind: PaintKind,
    pub opacity: f64,
    pub visible: bool,
    pub blend_mode: BlendMode,
}

impl Paint {
    pub fn solid(color: Rgb) -> Self {
        Self {
            kind: PaintKind::Solid { color },
            opacity: 1.0,
            visible: true,
            blend_mode: BlendMode::Normal,
        }
    }

    pub fn image_hash(&self) -> Option<&str> {
        match &self.kind {
            PaintKind::Image { image_hash, .. } => Some(image_hash),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub color: Rgba,
    pub offset: Vector2,
    pub radius: f64,
    pub spread: f64,
    pub visible: bool,
    pub blend_mode: BlendMode,
    pub show_shadow_behind_node: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Blur {
    pub radius: f64,
    pub visible: bool,
}

/// Host-native effect attached to a live node
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEffect {
    DropShadow(Shadow),
    InnerShadow(Shadow),
    LayerBlur(Blur),
    BackgroundBlur(Blur),
}
