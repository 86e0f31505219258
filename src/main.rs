use std::path::PathBuf;

use clap::{Parser, Subcommand};
use context_registry::{ContextRegistry, MemorySettings, RecordingRouter, SettingsError};
use itertools::Itertools;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Inspect the contexts declared in a settings file.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Settings file (.json or .toml).
    settings: PathBuf,
    /// Log registry decisions to stderr.
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the route groups a boot would register.
    Plan,
    /// Look up a configuration value.
    Config {
        /// Dotted key, e.g. `route.domain`.
        key: String,
        /// Context to read from (defaults to the active one).
        #[arg(long)]
        context: Option<String>,
        /// Fallback JSON when the key is missing.
        #[arg(long)]
        default: Option<String>,
    },
    /// List declared contexts.
    Contexts {
        /// Only enabled contexts.
        #[arg(long)]
        enabled: bool,
    },
}

fn main() {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("context_registry=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("context_registry=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), SettingsError> {
    let settings = MemorySettings::from_path(&args.settings)?;
    let options = settings.options()?;
    let registry = ContextRegistry::new(settings).with_options(options);

    match args.command {
        Command::Plan => {
            let mut router = RecordingRouter::new();
            match registry.register_all_enabled(&mut router) {
                Ok(()) => {}
                Err(never) => match never {},
            }
            print_json(&serde_json::to_value(router.groups())?)?;
        }
        Command::Config { key, context, default } => {
            let default = match default {
                // Anything that is not valid JSON is taken as a plain string
                Some(d) => serde_json::from_str(&d).unwrap_or(Value::String(d)),
                None => Value::Null,
            };
            let value = match context {
                Some(name) => registry.context_config_value(&name, key.as_str(), default),
                None => registry.config_value(key.as_str(), default),
            };
            print_json(&value)?;
        }
        Command::Contexts { enabled } => {
            let declared = if enabled {
                registry.enabled()
            } else {
                registry.declared().clone()
            };
            let lines = declared
                .iter()
                .map(|(name, on)| format!("{name}\t{}", if on { "enabled" } else { "disabled" }))
                .join("\n");
            if !lines.is_empty() {
                println!("{lines}");
            }
        }
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<(), SettingsError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
