mod advisory;
mod allocation;
mod config;
mod display;
mod error;
mod export;
mod inventory;
mod pdf_extract;
mod sources;
mod state;

use allocation::AllocationMode;
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::Config;
use sources::SourcePaths;
use state::AppState;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "article-allocation", about = "Plan article transfers from the godown to stores")]
struct Cli {
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the input tables and show a preview and summary
    Extract {
        #[command(flatten)]
        sources: SourceArgs,
        /// Write the resolved source paths back into the config file
        #[arg(long)]
        save: bool,
    },
    /// Plan one store against the full godown stock
    Allocate {
        #[command(flatten)]
        sources: SourceArgs,
        /// Store to plan; defaults to the first store in the capacity table
        #[arg(long)]
        store: Option<String>,
        /// Save `<store>_allocation.csv` into the output directory
        #[arg(long)]
        export: bool,
        /// Skip the advisory request
        #[arg(long)]
        no_advice: bool,
    },
    /// Plan every store
    Report {
        #[command(flatten)]
        sources: SourceArgs,
        #[arg(long, value_enum, default_value_t = ModeArg::Independent)]
        mode: ModeArg,
        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Write all allocations to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[derive(Debug, Args, Clone)]
struct SourceArgs {
    /// Godown stock table (.pdf, .csv or .txt)
    #[arg(long)]
    stock: Option<PathBuf>,
    /// Supply history table
    #[arg(long)]
    supply: Option<PathBuf>,
    /// Store capacity table
    #[arg(long)]
    capacity: Option<PathBuf>,
}

impl From<SourceArgs> for SourcePaths {
    fn from(args: SourceArgs) -> Self {
        Self {
            stock: args.stock,
            supply: args.supply,
            capacity: args.capacity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Independent,
    SharedPool,
}

impl From<ModeArg> for AllocationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Independent => AllocationMode::Independent,
            ModeArg::SharedPool => AllocationMode::SharedPool,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logs go to stderr, tables and CSV/JSON to stdout
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!(error = %e, "Aborted");
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load_or_default(&cli.config)?;
    info!(config = %cli.config.display(), backend = ?cfg.llm.backend, "Configuration loaded");

    match cli.command {
        Command::Extract { sources, save } => {
            let paths = cfg.sources.merged(&sources.into());
            let state = AppState::load(&paths)?;
            print!("{}", display::render_preview(&state));
            print!("{}", display::render_summary(&state));

            if save {
                Config::update_sources(&cli.config, &paths)?;
                info!(config = %cli.config.display(), "Source paths saved");
            }
        }

        Command::Allocate {
            sources,
            store,
            export,
            no_advice,
        } => {
            let state = AppState::load(&cfg.sources.merged(&sources.into()))?;
            let Some(store) = store.or_else(|| state.stores().next().map(str::to_string)) else {
                return Err("no stores in the capacity table".into());
            };

            let result = allocation::plan_store(&state, &store);
            print!("{}", display::render_store_metrics(&state, &result));

            if !no_advice {
                let api_key = std::env::var(&cfg.llm.api_key_env).ok();
                let advice = advisory::advise_from_config(&cfg.llm, api_key, &result).await;
                print!("{}", display::render_advice(&advice));
            }

            print!("{}", display::render_allocation_summary(&store));
            print!("{}", display::render_allocation_table(&result));
            print!("{}", display::render_charts(&result));

            if export {
                let path = export::export_allocation(&cfg.output.dir, &result)?;
                println!("\nSaved {}", path.display());
            }
        }

        Command::Report {
            sources,
            mode,
            json,
            export,
        } => {
            let state = AppState::load(&cfg.sources.merged(&sources.into()))?;
            let report = allocation::plan_all(&state, mode.into());
            info!(
                stores = report.stores.len(),
                allocated = report.total_allocated(),
                mode = ?report.mode,
                "Report computed"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", display::render_report(&report));
            }

            if let Some(path) = export {
                export::export_report(&path, &report)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from([
            "article-allocation",
            "allocate",
            "--store",
            "DUKE RO",
            "--stock",
            "stock.csv",
            "--no-advice",
        ]);
        assert_eq!(cli.config, PathBuf::from(config::DEFAULT_CONFIG_PATH));
        let Command::Allocate {
            sources,
            store,
            export,
            no_advice,
        } = cli.command
        else {
            panic!("expected allocate");
        };
        assert_eq!(store.as_deref(), Some("DUKE RO"));
        assert!(!export);
        assert!(no_advice);
        assert_eq!(SourcePaths::from(sources).stock, Some(PathBuf::from("stock.csv")));
    }

    #[test]
    fn test_report_mode_flag() {
        let cli = Cli::parse_from(["article-allocation", "report", "--mode", "shared-pool", "--json"]);
        let Command::Report { mode, json, .. } = cli.command else {
            panic!("expected report");
        };
        assert_eq!(AllocationMode::from(mode), AllocationMode::SharedPool);
        assert!(json);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
