use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use design_bridge::{
    parse_design_nodes, DesignNode, MemoryHost, NodeType, Translator, TranslatorConfig,
};
use futures::executor::block_on;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "design-bridge")]
#[command(version, about = "Translate design-node JSON through a canvas scene")]
#[command(long_about = "Translate design-node JSON through a canvas scene\n\n\
    JSON output is pretty-printed by default with indentation.\n\n\
    Import a tree into an in-memory canvas and export it back:\n  \
    design-bridge roundtrip input.json [-o output.json] [--config config.json] [--compact] [-v]\n\n\
    Canonicalize node type tags without touching the canvas:\n  \
    design-bridge normalize input.json [-o output.json] [--compact]")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Import a design tree into an in-memory canvas, then export the result
    Roundtrip {
        /// Input JSON file (a node object or an array of nodes)
        input: PathBuf,

        /// Output JSON file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Translator settings as JSON (fonts, SVG proxy, image embedding)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Compact JSON output (default is pretty-printed with indentation)
        #[arg(long)]
        compact: bool,
    },
    /// Rewrite every node type tag into its canonical spelling
    Normalize {
        /// Input JSON file (a node object or an array of nodes)
        input: PathBuf,

        /// Output JSON file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compact JSON output (default is pretty-printed with indentation)
        #[arg(long)]
        compact: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Roundtrip {
            input,
            output,
            config,
            compact,
        } => {
            let config = match config {
                Some(path) => TranslatorConfig::load(&path)
                    .with_context(|| format!("Failed to load config file: {}", path.display()))?,
                None => TranslatorConfig::default(),
            };
            let json = read_input(&input)?;

            let mut translator = Translator::with_config(MemoryHost::new(), config);
            let imported = block_on(translator.import_json(&json));
            if !imported.success {
                bail!("Import failed: {}", imported.message);
            }
            debug!("Canvas holds {} node(s)", translator.host().node_count());

            let exported = block_on(translator.export_selection());
            if !exported.success {
                bail!("Export failed: {}", exported.message);
            }
            write_output(&exported.nodes, output.as_deref(), compact)
        }
        Command::Normalize {
            input,
            output,
            compact,
        } => {
            let json = read_input(&input)?;
            let mut nodes = parse_design_nodes(&json).context("Failed to parse design nodes")?;
            for node in &mut nodes {
                normalize_types(node)?;
            }
            write_output(&nodes, output.as_deref(), compact)
        }
    }
}

/// Log to stderr; `RUST_LOG` overrides the default level
fn init_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}

fn read_input(path: &Path) -> Result<String> {
    info!("Reading input file: {}", path.display());
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))
}

fn normalize_types(node: &mut DesignNode) -> Result<()> {
    let node_type = NodeType::normalize(&node.node_type, node)
        .with_context(|| format!("Cannot normalize node {:?}", node.display_name()))?;
    node.node_type = node_type.as_str().to_string();
    if let Some(children) = node.children.as_mut() {
        for child in children {
            normalize_types(child)?;
        }
    }
    Ok(())
}

fn write_output(nodes: &[DesignNode], path: Option<&Path>, compact: bool) -> Result<()> {
    // Format output (pretty by default, compact if flag is set)
    let output = if compact {
        serde_json::to_string(nodes)?
    } else {
        serde_json::to_string_pretty(nodes)?
    };

    match path {
        Some(path) => {
            fs::write(path, &output)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!("Wrote {} node(s) to {}", nodes.len(), path.display());
        }
        None => println!("{}", output),
    }
    Ok(())
}
