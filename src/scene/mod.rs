/// Live object graph of the hosting design tool
///
/// - `host`: the `Host` trait, the boundary to the design tool
/// - `node`: `SceneNode` and its capability blocks
/// - `paint`: host-native paints and effects
/// - `text`: per-character text styling
/// - `memory`: `MemoryHost`, an in-process host used by the CLI and tests
pub mod host;
pub mod memory;
pub mod node;
pub mod paint;
pub mod text;

// Re-export commonly used items
pub use host::Host;
pub use memory::MemoryHost;
pub use node::{Capability, NodeId, SceneNode};
pub use paint::{Paint, PaintKind, SceneEffect};
