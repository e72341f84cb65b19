use clap::{Parser, Subcommand};
use cost_forecast::compare::{active_scenario, compare_scenarios};
use cost_forecast::config::{db_path, ensure_initialized, load_config};
use cost_forecast::error::AppError;
use cost_forecast::forecast::generate_forecast_from_today;
use cost_forecast::models::CostScenario;
use cost_forecast::report::{self, parse_format, OutputFormat};
use cost_forecast::storage::Storage;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cost-forecast")]
#[command(about = "Recurring cost normalization, forecasts and scenario comparison")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Init,
    /// Import a scenario (or an array of scenarios) from a JSON file.
    Import {
        file: PathBuf,
        #[arg(long)]
        activate: bool,
    },
    List,
    Activate {
        name: String,
    },
    Delete {
        name: String,
    },
    Summary {
        name: Option<String>,
        #[arg(long, default_value = "text")]
        format: String,
    },
    Forecast {
        name: Option<String>,
        #[arg(long)]
        periods: Option<u32>,
        #[arg(long, default_value = "text")]
        format: String,
    },
    Compare {
        baseline: String,
        #[arg(required = true)]
        others: Vec<String>,
        #[arg(long, default_value = "text")]
        format: String,
    },
    Export {
        name: String,
    },
}

const ALL_FORMATS: [OutputFormat; 3] = [OutputFormat::Text, OutputFormat::Json, OutputFormat::Csv];

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("COST_FORECAST_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_storage() -> Result<Storage, AppError> {
    ensure_initialized()?;
    Storage::open(&db_path()?)
}

/// Named scenario, or the active one when no name is given.
fn resolve_scenario(storage: &Storage, name: Option<String>) -> Result<CostScenario, AppError> {
    let name = match name {
        Some(name) => name,
        None => storage.active_scenario_name()?.ok_or_else(|| {
            AppError::Config("No scenario name given and no active scenario set.".into())
        })?,
    };
    storage.load_scenario(&name)
}

fn read_scenario_file(path: &Path) -> Result<Vec<CostScenario>, AppError> {
    let raw = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let scenarios = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    active_scenario(&scenarios)?;
    Ok(scenarios)
}

fn main() -> Result<(), AppError> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            ensure_initialized()?;
            println!("Initialized cost-forecast config and data directories.");
        }
        Commands::Import { file, activate } => {
            let mut scenarios = read_scenario_file(&file)?;
            if activate {
                if scenarios.len() != 1 {
                    return Err(AppError::Config(
                        "--activate needs a file with exactly one scenario.".into(),
                    ));
                }
                scenarios[0].active = true;
            }
            let mut storage = open_storage()?;
            for scenario in &scenarios {
                storage.save_scenario(scenario)?;
                println!("Scenario '{}' imported.", scenario.name);
            }
        }
        Commands::List => {
            let storage = open_storage()?;
            for entry in storage.list_scenarios()? {
                let marker = if entry.active { "*" } else { " " };
                println!("{marker} {}  {}", entry.name, entry.created_at.to_rfc3339());
            }
        }
        Commands::Activate { name } => {
            let mut storage = open_storage()?;
            storage.set_active(&name)?;
            println!("Scenario '{name}' is now active.");
        }
        Commands::Delete { name } => {
            let mut storage = open_storage()?;
            storage.delete_scenario(&name)?;
            println!("Scenario '{name}' deleted.");
        }
        Commands::Summary { name, format } => {
            let format = parse_format(&format, &[OutputFormat::Text, OutputFormat::Json])?;
            let cfg = load_config()?;
            let storage = open_storage()?;
            let scenario = resolve_scenario(&storage, name)?;
            let summary = report::summarize(&scenario, &cfg.currency)?;
            print!("{}", report::render_summary(&summary, format)?);
        }
        Commands::Forecast {
            name,
            periods,
            format,
        } => {
            let format = parse_format(&format, &ALL_FORMATS)?;
            let cfg = load_config()?;
            let storage = open_storage()?;
            let scenario = resolve_scenario(&storage, name)?;
            let periods = generate_forecast_from_today(
                &scenario.categories,
                periods.unwrap_or(cfg.default_periods),
            )?;
            print!(
                "{}",
                report::render_forecast(&periods, format, &cfg.currency)?
            );
        }
        Commands::Compare {
            baseline,
            others,
            format,
        } => {
            let format = parse_format(&format, &ALL_FORMATS)?;
            let cfg = load_config()?;
            let storage = open_storage()?;
            let baseline = storage.load_scenario(&baseline)?;
            let others = others
                .iter()
                .map(|name| storage.load_scenario(name))
                .collect::<Result<Vec<_>, _>>()?;
            let rows = compare_scenarios(&baseline, &others)?;
            print!(
                "{}",
                report::render_comparison(&rows, format, &cfg.currency)?
            );
        }
        Commands::Export { name } => {
            let storage = open_storage()?;
            let scenario = storage.load_scenario(&name)?;
            println!("{}", serde_json::to_string_pretty(&scenario)?);
        }
    }

    Ok(())
}
