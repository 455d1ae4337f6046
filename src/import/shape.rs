use crate::error::{BridgeError, Result};
use crate::import::helpers::guarded;
use crate::import::Importer;
use crate::scene::host::Host;
use crate::scene::node::{unsupported, Capability, NodeId, SceneNode};
use crate::scene::paint::Paint;
use crate::schema::paint::Rgb;
use crate::schema::{DesignNode, NodeType};
use tracing::debug;

impl<'t, H: Host> Importer<'t, H> {
    /// Rectangles cannot hold children; one that carries some is rebuilt as a frame
    pub(crate) async fn create_rectangle(
        &mut self,
        design: &DesignNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        if !design.children().is_empty() {
            debug!(
                "Rectangle {:?} has children, creating a frame instead",
                design.display_name()
            );
            return self.create_container(NodeType::Frame, design, parent).await;
        }
        self.create_primitive(NodeType::Rectangle, design, parent).await
    }

    /// Leaf shapes: rectangles, ellipses, polygons and stars
    pub(crate) async fn create_primitive(
        &mut self,
        node_type: NodeType,
        design: &DesignNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let id = self.spawn(node_type, parent)?;
        self.apply_base(id, design)?;
        self.apply_paints(id, design).await?;
        guarded(self.node_mut(id)?, design, "shape parameters", apply_shape);
        Ok(id)
    }

    /// Lines are zero-height and only visible through their strokes
    pub(crate) async fn create_line(
        &mut self,
        design: &DesignNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let id = self.spawn(NodeType::Line, parent)?;
        self.apply_base(id, design)?;

        let width = design
            .width
            .unwrap_or_else(|| self.host.node(id).map_or(100.0, SceneNode::width));
        let node = self.node_mut(id)?;
        if let Err(e) = node.resize(width, 0.0) {
            debug!("Keeping default line length for {:?}: {}", design.display_name(), e);
        }

        let strokes = match (&design.strokes, &design.fills) {
            (Some(strokes), _) if !strokes.is_empty() => self.paints(strokes).await,
            (_, Some(fills)) if !fills.is_empty() => self.paints(fills).await,
            _ => vec![Paint::solid(Rgb::BLACK)],
        };
        let node = self.node_mut(id)?;
        node.set_fills(Vec::new())?;
        node.set_strokes(strokes)?;
        Ok(id)
    }
}

/// pointCount, innerRadius and arcData, each honored only by the types that have it
fn apply_shape(node: &mut SceneNode, design: &DesignNode) -> Result<()> {
    let node_type = node.node_type;
    if let Some(count) = design.shape.point_count {
        if matches!(node_type, NodeType::Polygon | NodeType::Star) {
            node.set_point_count(count)?;
        }
    }

    let shape = match node.shape.as_mut() {
        Some(shape) => shape,
        None if design.shape.inner_radius.is_some() || design.shape.arc_data.is_some() => {
            return Err(unsupported(node_type, Capability::Shape));
        }
        None => return Ok(()),
    };

    if let (Some(ratio), NodeType::Star) = (design.shape.inner_radius, node_type) {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(BridgeError::invalid("innerRadius", format!("{} is outside [0, 1]", ratio)));
        }
        shape.inner_radius = ratio;
    }

    if let (Some(arc), NodeType::Ellipse) = (design.shape.arc_data, node_type) {
        let values = [arc.starting_angle, arc.ending_angle, arc.inner_radius];
        if values.iter().any(|v| !v.is_finite()) || !(0.0..=1.0).contains(&arc.inner_radius) {
            return Err(BridgeError::invalid(
                "arcData",
                "angles must be finite and innerRadius in [0, 1]",
            ));
        }
        shape.arc_data = arc;
    }
    Ok(())
}
