use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use glam::IVec2;
use rhai::{Dynamic, Engine, Scope};

use crate::bindings::default_bindings;
use crate::bridge::ScriptBridge;
use crate::config::BridgeConfig;
use crate::host::{Core, Document, ScriptSource};
use crate::plugin::{ScriptPlugin, DOCUMENT_TAG};
use crate::script_log::stringify_dynamic;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load scripts into a document and optionally dispatch events
    Run {
        /// Script files, loaded in order into the same document
        #[arg(required = true)]
        scripts: Vec<PathBuf>,

        /// Bridge configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Name of the context holding the document
        #[arg(long, default_value = "main")]
        context: String,

        #[arg(long, default_value_t = 1024)]
        width: i32,

        #[arg(long, default_value_t = 768)]
        height: i32,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Dispatch an event after loading, as `element-id:event` (repeatable)
        #[arg(long = "dispatch", value_name = "ID:EVENT")]
        dispatches: Vec<String>,
    },
    /// Evaluate an expression and print the result
    Eval {
        expression: String,

        /// Bridge configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the type bindings registered at startup
    Bindings,
}

/// Parse the command line and run it. Returns the process exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scripts,
            config,
            context,
            width,
            height,
            title,
            dispatches,
        } => {
            let config = load_config(config)?;
            run_scripts(
                config,
                &scripts,
                &context,
                IVec2::new(width, height),
                title.as_deref(),
                &dispatches,
            )
        }
        Commands::Eval { expression, config } => {
            let config = load_config(config)?;
            eval_expression(config, &expression)?;
            Ok(0)
        }
        Commands::Bindings => {
            for binding in default_bindings() {
                match binding.parent {
                    Some(parent) => println!("{} : {}", binding.name, parent),
                    None => println!("{}", binding.name),
                }
            }
            Ok(0)
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<BridgeConfig> {
    match path {
        Some(path) => BridgeConfig::from_json_file(&path),
        None => Ok(BridgeConfig::default()),
    }
}

fn parse_dispatch(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once(':') {
        Some((id, event)) if !id.is_empty() && !event.is_empty() => Ok((id, event)),
        _ => bail!("invalid --dispatch '{}': expected ID:EVENT", arg),
    }
}

fn dispatch(document: &Document, arg: &str) -> Result<()> {
    let (id, event) = parse_dispatch(arg)?;
    let element = if document.id() == id {
        Some(document.as_element().clone())
    } else {
        document.get_element_by_id(id)
    };
    let element = element.ok_or_else(|| anyhow!("no element with id '{}'", id))?;
    log::info!("Dispatching '{}' at #{}", event, id);
    element.dispatch_event(event, Default::default(), true);
    Ok(())
}

fn run_scripts(
    config: BridgeConfig,
    scripts: &[PathBuf],
    context_name: &str,
    dimensions: IVec2,
    title: Option<&str>,
    dispatches: &[String],
) -> Result<i32> {
    let core = Core::new();
    let bridge = ScriptPlugin::initialise(&core, config);
    core.initialise();

    let result = (|| -> Result<()> {
        let context = core
            .create_context(context_name, dimensions)
            .ok_or_else(|| anyhow!("could not create context '{}'", context_name))?;
        let document = context
            .create_document(DOCUMENT_TAG)
            .ok_or_else(|| anyhow!("could not create a document"))?;
        if let Some(title) = title {
            document.set_title(title);
        }

        for script in scripts {
            document.load_script(&ScriptSource::File(script.clone()));
        }
        for arg in dispatches {
            dispatch(&document, arg)?;
        }
        Ok(())
    })();

    let diagnostics = bridge.take_diagnostics();
    core.shutdown();
    bridge.shutdown();
    result?;

    for diagnostic in &diagnostics {
        println!("{}", serde_json::to_string(diagnostic)?);
    }
    Ok(if diagnostics.is_empty() { 0 } else { 1 })
}

fn eval_expression(config: BridgeConfig, expression: &str) -> Result<()> {
    let core = Core::new();
    let bridge = ScriptBridge::new(&core, config, default_bindings());
    bridge.startup();

    let value = bridge
        .eval(expression, "eval")
        .map_err(|e| anyhow!(e.to_string()))?;
    let engine = bridge.engine().map_err(|e| anyhow!(e.to_string()))?;
    println!("{}", display_value(&engine, value));

    bridge.shutdown();
    Ok(())
}

/// Render a value through its script-side `to_string`, so host types print
/// the way scripts see them.
fn display_value(engine: &Engine, value: Dynamic) -> String {
    let fallback = stringify_dynamic(&value);
    let mut scope = Scope::new();
    scope.push_dynamic("value", value);
    engine
        .eval_with_scope::<String>(&mut scope, "value.to_string()")
        .unwrap_or(fallback)
}
