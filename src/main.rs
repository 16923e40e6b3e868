use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use callflow_core::config::EditorConfig;
use callflow_core::types::WorkflowState;
use callflow_core::UuidIds;
use callflow_graph::{EdgePath, Editor, GraphStore};

#[derive(Parser)]
#[command(name = "callflow", version, about = "Call-flow script editor core")]
struct Cli {
    /// Path to an editor config file (TOML)
    #[arg(short, long, global = true, env = "CALLFLOW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the starting workflow and its edge curves as JSON
    Demo {
        /// Print compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

/// What a render layer would read after startup.
#[derive(Serialize)]
struct RenderView {
    workflow: WorkflowState,
    edges: Vec<EdgeView>,
}

#[derive(Serialize)]
struct EdgeView {
    #[serde(flatten)]
    edge: EdgePath,
    svg: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = EditorConfig::load_or_default(cli.config.as_deref())?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Demo { compact } => run_demo(&config, compact),
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn run_demo(config: &EditorConfig, compact: bool) -> Result<()> {
    let editor = Editor::new(GraphStore::new(config, Box::new(UuidIds)));
    let workflow = editor.store().snapshot();
    info!(
        nodes = workflow.nodes.len(),
        connections = workflow.connections.len(),
        "Workflow loaded"
    );

    let edges = editor
        .edge_paths()
        .into_iter()
        .map(|edge| EdgeView {
            svg: edge.path.to_svg(),
            edge,
        })
        .collect();
    let view = RenderView { workflow, edges };

    let json = if compact {
        serde_json::to_string(&view)?
    } else {
        serde_json::to_string_pretty(&view)?
    };
    println!("{json}");
    Ok(())
}
