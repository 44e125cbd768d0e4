//! # confscout demo application
//!
//! A small CLI that exercises confscout end to end: discovery, typed lookup,
//! diffing, and the `encrypt|decrypt|convert` file subcommands.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example confscout_cli -- show myapp
//! cargo run --example confscout_cli -- show myapp server.port --strategy project
//! cargo run --example confscout_cli -- diff old.yaml new.json
//! cargo run --example confscout_cli -- encrypt config/ --recursive --glob '*.json'
//! cargo run --example confscout_cli -- decrypt config/app.json.encrypted --key base64:...
//! cargo run --example confscout_cli -- convert app.yaml app.toml
//! RUST_LOG=confscout=debug cargo run --example confscout_cli -- show myapp
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use confscout::{ConfigArgs, ConfigStore, ConfigSubcommand, ConfscoutError, Strategy};

/// confscout demo: find, inspect, and transform config files.
#[derive(Parser, Debug)]
#[command(name = "confscout")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for a module's config and print it (or one key).
    Show {
        module: String,
        /// Dotted key to print instead of the whole tree.
        key: Option<String>,
        /// Directory to start searching from (default: cwd).
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = StrategyArg::None)]
        strategy: StrategyArg,
        /// Expand ${VAR} placeholders from the environment.
        #[arg(long)]
        interpolate: bool,
    },
    /// Show the leaf-level differences between two config files.
    Diff { original: PathBuf, modified: PathBuf },
    #[command(flatten)]
    File(ConfigSubcommand),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    None,
    Project,
    Global,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::None => Strategy::None,
            StrategyArg::Project => Strategy::Project,
            StrategyArg::Global => Strategy::Global,
        }
    }
}

fn show(
    module: &str,
    key: Option<&str>,
    dir: Option<PathBuf>,
    strategy: Strategy,
    interpolate: bool,
) -> Result<(), ConfscoutError> {
    let mut store = ConfigStore::builder().strategy(strategy).build();
    let Some(result) = store.search(module, dir.as_deref())? else {
        eprintln!("No configuration found for '{module}'");
        return Ok(());
    };
    eprintln!("# {}", result.filepath.display());

    let key = key.unwrap_or("");
    let value = if interpolate {
        store.get_interpolated(module, key, serde_json::Value::Null)
    } else {
        store.get_or(module, key, serde_json::Value::Null)
    };
    println!("{}", pretty(&value));
    Ok(())
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn run(cli: Cli) -> Result<(), ConfscoutError> {
    match cli.command {
        Commands::Show {
            module,
            key,
            dir,
            strategy,
            interpolate,
        } => show(&module, key.as_deref(), dir, strategy.into(), interpolate),
        Commands::Diff { original, modified } => {
            let diff = ConfigStore::new().diff_files(&original, &modified)?;
            if diff.is_empty() {
                println!("No differences");
            } else {
                println!("{diff}");
            }
            Ok(())
        }
        Commands::File(action) => ConfigStore::new().handle_and_print(&ConfigArgs { action }.into_action()),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
