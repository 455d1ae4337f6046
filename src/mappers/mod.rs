/// Converters between serialized descriptions and host-native values
///
/// - `fill`: Fill <-> Paint, synchronous
/// - `effect`: Effect <-> SceneEffect
/// - `image`: asynchronous image-paint resolution and the image caches
/// - `path`: SVG-style path data parsing for vector paths
pub mod effect;
pub mod fill;
pub mod image;
pub mod path;

// Re-export commonly used items
pub use effect::{effect_to_scene, effects_to_scene, scene_to_effect};
pub use fill::{fill_to_paint, fills_to_paints, paint_to_fill};
pub use image::{resolve_fill, resolve_fills, EmbeddedImages, ImageCache};
pub use path::{parse_path_data, PathCommand};
