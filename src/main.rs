use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use waypoint_rs::kit::EngineError;
use waypoint_rs::waypoint::config::EngineConfig;
use waypoint_rs::waypoint::process::ProcessRegistry;
use waypoint_rs::waypoint::store::MemoryRepository;
use waypoint_rs::waypoint::workflow::context::DataContext;
use waypoint_rs::waypoint::workflow::engine::WorkflowEngine;
use waypoint_rs::waypoint::workflow::registry::DefinitionStore;
use waypoint_rs::waypoint::workflow::resolver::NodeResolver;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory scanned for workflow definitions (overrides WAYPOINT_WORKFLOW_DIR)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Prefix prepended to workflow names (overrides WAYPOINT_WORKFLOW_PREFIX)
    #[arg(short, long, global = true)]
    prefix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List loaded workflows
    List,
    /// Print a parsed workflow definition as JSON
    Show {
        /// Workflow name
        #[arg(short, long)]
        name: String,
    },
    /// Print the node that follows `node` for the given data
    Resolve {
        /// Workflow name
        #[arg(short, long)]
        name: String,

        /// Current node
        #[arg(long)]
        node: String,

        /// Per-node input as JSON
        #[arg(short, long, default_value = "{}")]
        input: String,

        /// Output as JSON
        #[arg(short, long, default_value = "{}")]
        output: String,
    },
    /// Save input on a node and advance, against an in-memory store
    Simulate {
        /// Workflow name
        #[arg(short, long)]
        name: String,

        /// External data id
        #[arg(long)]
        data_id: String,

        /// Acting user id
        #[arg(short, long, default_value_t = 1)]
        user: i64,

        /// Node to save input on
        #[arg(long)]
        node: String,

        /// Input as JSON
        #[arg(short, long, default_value = "{}")]
        input: String,

        /// Output passed to the advance step, as JSON
        #[arg(short, long, default_value = "{}")]
        output: String,
    },
}

fn parse_json(label: &str, raw: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("--{} is not valid JSON", label))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let mut config = EngineConfig::from_env()?;
    if let Some(dir) = args.dir {
        config.workflow_dir = dir;
    }
    if let Some(prefix) = args.prefix {
        config.prefix = prefix;
    }

    let definitions = DefinitionStore::new();
    let count = definitions
        .load_dir(&config.workflow_dir, &config.prefix)
        .await?;
    log::info!(
        "Loaded {} workflow(s) from {}",
        count,
        config.workflow_dir.display()
    );

    match args.command {
        Commands::List => {
            for name in definitions.names().await {
                let def = definitions.select(&name).await?;
                println!("{}\t{} nodes", name, def.len());
            }
        }
        Commands::Show { name } => {
            let def = definitions.select(&name).await?;
            println!("{}", serde_json::to_string_pretty(def.as_ref())?);
        }
        Commands::Resolve {
            name,
            node,
            input,
            output,
        } => {
            let def = definitions.select(&name).await?;
            let ctx = DataContext::new(&parse_json("input", &input)?, &parse_json("output", &output)?);
            let next = NodeResolver::new(&def)
                .next(&node, &ctx)
                .map_err(EngineError::from)?;
            println!("{}", next.name);
        }
        Commands::Simulate {
            name,
            data_id,
            user,
            node,
            input,
            output,
        } => {
            let engine = WorkflowEngine::new(
                name,
                definitions,
                Arc::new(MemoryRepository::new()),
                Arc::new(ProcessRegistry::with_builtins()),
            )
            .with_assignment_timeout(config.assignment_timeout);

            let saved = engine
                .save(user, &node, data_id, parse_json("input", &input)?, None)
                .await?;
            let id = saved
                .id
                .context("repository returned an instance without an id")?;
            let advanced = engine.next(user, &id, parse_json("output", &output)?).await?;
            println!("{}", serde_json::to_string_pretty(&advanced)?);
        }
    }

    Ok(())
}
