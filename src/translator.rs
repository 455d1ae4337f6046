use crate::config::TranslatorConfig;
use crate::error::Result;
use crate::export::Exporter;
use crate::import::{ComponentRegistry, FontCache, Importer};
use crate::mappers::image::ImageCache;
use crate::scene::host::Host;
use crate::scene::node::NodeId;
use crate::schema::{parse_design_nodes, DesignNode};
use crate::types::{ExportOutcome, ImportOutcome};
use tracing::{info, warn};

/// Translation engine bound to one host
///
/// Owns the state that outlives a single call: the component registry
/// (cleared at the start of each import), the loaded-font cache and the
/// url -> bitmap cache.
pub struct Translator<H: Host> {
    host: H,
    config: TranslatorConfig,
    registry: ComponentRegistry,
    fonts: FontCache,
    images: ImageCache,
}

impl<H: Host> Translator<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, TranslatorConfig::default())
    }

    pub fn with_config(host: H, config: TranslatorConfig) -> Self {
        Self {
            host,
            config,
            registry: ComponentRegistry::new(),
            fonts: FontCache::default(),
            images: ImageCache::default(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn fonts(&self) -> &FontCache {
        &self.fonts
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    /// Create live nodes for `roots` under `parent` (the page when `None`)
    ///
    /// Individual nodes may be dropped or replaced by frames; the call only
    /// fails when there is nothing to import or nothing could be created.
    /// The created roots become the selection.
    pub async fn import(&mut self, roots: &[DesignNode], parent: Option<NodeId>) -> ImportOutcome {
        if roots.is_empty() {
            return ImportOutcome::failure("No nodes to import");
        }

        let created = {
            let mut importer = Importer::new(
                &mut self.host,
                &self.config,
                &mut self.registry,
                &mut self.fonts,
                &mut self.images,
            );
            importer.import(roots, parent).await
        };

        if created.is_empty() {
            warn!("None of the {} root node(s) could be created", roots.len());
            return ImportOutcome::failure("No nodes could be created");
        }

        self.host.set_selection(&created);
        let message = format!("Imported {} of {} root node(s)", created.len(), roots.len());
        info!("{}", message);
        ImportOutcome::success(created, message)
    }

    /// Parse a JSON payload (one node or an array) and import it onto the page
    pub async fn import_json(&mut self, json: &str) -> ImportOutcome {
        match parse_design_nodes(json) {
            Ok(roots) => self.import(&roots, None).await,
            Err(e) => {
                warn!("Rejected import payload: {}", e);
                ImportOutcome::failure(format!("Invalid design payload: {}", e))
            }
        }
    }

    /// Serialize the given live nodes
    pub async fn export(&mut self, ids: &[NodeId]) -> ExportOutcome {
        if ids.is_empty() {
            return ExportOutcome::failure("Nothing to export");
        }

        let nodes = Exporter::new(&mut self.host, &self.config).export(ids).await;
        if nodes.is_empty() {
            warn!("None of the {} node(s) could be exported", ids.len());
            return ExportOutcome::failure("No nodes could be exported");
        }

        let message = format!("Exported {} node(s)", nodes.len());
        info!("{}", message);
        ExportOutcome::success(nodes, message)
    }

    pub async fn export_selection(&mut self) -> ExportOutcome {
        let selection = self.host.selection();
        self.export(&selection).await
    }

    /// Export `ids` as a JSON array
    ///
    /// # Returns
    /// * `Ok(String)` - The serialized trees, pretty-printed when `pretty` is set
    /// * `Err(BridgeError::EmptyInput)` - If nothing could be exported
    pub async fn export_json(&mut self, ids: &[NodeId], pretty: bool) -> Result<String> {
        let outcome = self.export(ids).await;
        if !outcome.success {
            return Err(crate::error::BridgeError::EmptyInput("no nodes could be exported"));
        }
        let json = if pretty {
            serde_json::to_string_pretty(&outcome.nodes)?
        } else {
            serde_json::to_string(&outcome.nodes)?
        };
        Ok(json)
    }
}
