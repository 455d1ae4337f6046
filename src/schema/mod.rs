/// Serialized design-node model exchanged with the command layer
///
/// - `node`: the `DesignNode` tree and payload parsing
/// - `node_type`: discriminant normalization
/// - `paint`: fills, strokes and effects
/// - `layout`: constraints, auto-layout, grids, guides, export settings
/// - `text`: text attributes and styled segments
/// - `vector`: path data, vector networks and shape parameters
pub mod layout;
pub mod node;
pub mod node_type;
pub mod paint;
pub mod text;
pub mod vector;

// Re-export commonly used items
pub use node::{order_by_layer_index, parse_design_nodes, BooleanOperationType, DesignNode};
pub use node_type::NodeType;
pub use paint::{BlendMode, Effect, Fill, PaintType, Rgb, Rgba, Transform};
pub use text::{FontName, TextSegment};
