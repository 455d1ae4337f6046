use crate::error::Result;
use crate::import::Importer;
use crate::scene::host::Host;
use crate::scene::node::NodeId;
use crate::schema::{DesignNode, NodeType};
use tracing::warn;

impl<'t, H: Host> Importer<'t, H> {
    /// Vectors take their outline from `vectorPaths` first, then `vectorNetwork`
    ///
    /// A vector without usable geometry is imported as a rectangle carrying
    /// the same name, bounds and paints.
    pub(crate) async fn create_vector(
        &mut self,
        design: &DesignNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let paths = design.vector.vector_paths.as_ref().filter(|p| !p.is_empty());
        let network = design.vector.vector_network.as_ref().filter(|n| !n.is_empty());
        if paths.is_none() && network.is_none() {
            warn!(
                "Vector {:?} has no path data, using a placeholder rectangle",
                design.display_name()
            );
            return self.create_primitive(NodeType::Rectangle, design, parent).await;
        }

        let id = self.spawn(NodeType::Vector, parent)?;
        self.apply_base(id, design)?;
        self.apply_paints(id, design).await?;

        let node = self.node_mut(id)?;
        let mut outline = None;
        if let Some(paths) = paths {
            match node.set_vector_paths(paths.clone()) {
                Ok(()) => outline = Some("vectorPaths"),
                Err(e) => warn!("Rejected vectorPaths on {:?}: {}", design.display_name(), e),
            }
        }
        if outline.is_none() {
            if let Some(network) = network {
                match node.set_vector_network(network.clone()) {
                    Ok(()) => outline = Some("vectorNetwork"),
                    Err(e) => warn!("Rejected vectorNetwork on {:?}: {}", design.display_name(), e),
                }
            }
        }

        if outline.is_none() {
            self.host.remove_node(id)?;
            warn!(
                "Vector {:?} has no usable path data, using a placeholder rectangle",
                design.display_name()
            );
            return self.create_primitive(NodeType::Rectangle, design, parent).await;
        }
        Ok(id)
    }
}
