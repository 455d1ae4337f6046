//! # design-bridge
//!
//! Translates between a JSON design-node tree and the live object graph of a
//! vector-design canvas, in both directions.
//!
//! ## Example
//!
//! ```no_run
//! use design_bridge::{MemoryHost, Translator};
//! use futures::executor::block_on;
//!
//! let json = std::fs::read_to_string("card.json").unwrap();
//! let mut translator = Translator::new(MemoryHost::new());
//!
//! // Build live nodes; the created roots become the selection
//! let imported = block_on(translator.import_json(&json));
//! println!("{}", imported.message);
//!
//! // Walk them back into design nodes
//! let exported = block_on(translator.export_selection());
//! println!("Exported {} root(s)", exported.nodes.len());
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod mappers;
pub mod scene;
pub mod schema;
pub mod translator;
pub mod types;

// Re-export commonly used items
pub use config::TranslatorConfig;
pub use error::{BridgeError, Result};
pub use scene::{Host, MemoryHost, NodeId};
pub use schema::{parse_design_nodes, DesignNode, NodeType};
pub use translator::Translator;
pub use types::{ExportOutcome, ImportOutcome};
