use anyhow::{bail, Context, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use lab_indicators::config::{default_config_path, find_config_file, load_config, Config};
use lab_indicators::indicators::{IndicatorRegistry, IndicatorSnapshot, IndicatorValue};
use lab_indicators::models::QuartileRanking;
use lab_indicators::ranking::{
    core_portal, scimago, wos, ConferenceRankingUpdate, JournalQuartiles, JournalRankingUpdate,
    OnlineScimagoPlatform, RankingUpdater, ScimagoPlatform,
};
use lab_indicators::sources::{InMemoryLabData, LabDataset};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Lab Indicators - Bibliometric indicators and journal rankings of a research laboratory
#[derive(Parser, Debug)]
#[command(name = "lab-indicators")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compute laboratory indicators and reconcile journal rankings", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

/// Ranking platform of a table
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Platform {
    #[value(name = "scimago")]
    Scimago,
    #[value(name = "wos")]
    Wos,
    #[value(name = "core")]
    Core,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the indicators of an organization
    #[command(alias = "c")]
    Compute {
        /// Laboratory dataset (JSON)
        dataset: PathBuf,

        /// Organization identifier or acronym
        #[arg(long, short = 'g')]
        organization: String,

        /// Indicator keys to display, separated by commas (default: configured ones, or all)
        #[arg(long, short)]
        keys: Option<String>,

        /// Number of years of the annual indicators
        #[arg(long, short)]
        years: Option<u32>,

        /// Do not count the members of sub-organizations
        #[arg(long)]
        no_sub_organizations: bool,

        /// Save the computed values as a JSON snapshot
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// List the keys of the standard indicators
    Indicators,

    /// Read the quartile of a journal from its Scimago picture
    #[command(name = "scimago-quartile")]
    ScimagoQuartile {
        /// Scimago journal identifier
        journal_id: String,
    },

    /// Show the Scimago ranking table of a year
    #[command(name = "scimago-table")]
    ScimagoTable {
        /// Reference year (default: last year)
        #[arg(long, short)]
        year: Option<i32>,

        /// Read the table from a downloaded CSV file instead of the website
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Only show the quartiles of this journal
        #[arg(long, short)]
        journal: Option<String>,
    },

    /// Show a Web of Science ranking table
    #[command(name = "wos-table")]
    WosTable {
        /// Journal Citation Reports CSV export
        file: PathBuf,

        /// Only show the quartiles of the journal with this ISSN
        #[arg(long, short)]
        issn: Option<String>,
    },

    /// Propose, and optionally record, journal quartiles or conference ranks
    /// for a year
    #[command(name = "update-rankings")]
    UpdateRankings {
        /// Laboratory dataset (JSON)
        dataset: PathBuf,

        /// Platform the ranks come from
        #[arg(long, short, value_enum)]
        platform: Platform,

        /// Reference year (default: last year)
        #[arg(long, short)]
        year: Option<i32>,

        /// Ranking table (required for WoS and CORE, optional for Scimago)
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Record the selected ranks in the dataset
        #[arg(long)]
        write: bool,
    },

    /// Write a configuration file with the default settings
    #[command(name = "init-config")]
    InitConfig {
        /// Destination (default: the per-user configuration file)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Print all available environment variables
fn print_env_vars() {
    println!("Lab Indicators - Environment Variables");
    println!();
    println!("Indicators:");
    println!("  LAB_INDICATORS_INDICATORS__YEAR_COUNT                  Years of the annual indicators (default: 5)");
    println!("  LAB_INDICATORS_INDICATORS__INCLUDE_SUB_ORGANIZATIONS   Count members of sub-organizations (default: true)");
    println!("  LAB_INDICATORS_INDICATORS__TODAY                       Reference date, e.g. 2024-01-15 (default: today)");
    println!("  LAB_INDICATORS_INDICATORS__VISIBLE                     Comma-separated keys to display");
    println!();
    println!("Scimago:");
    println!("  LAB_INDICATORS_SCIMAGO__BASE_URL                Scimago website (default: https://www.scimagojr.com/)");
    println!("  LAB_INDICATORS_SCIMAGO__SEARCH_COLUMNS_BY_NAME  Find table columns by header (default: true)");
    println!("  LAB_INDICATORS_SCIMAGO__TIMEOUT_SECONDS         Request timeout (default: 30)");
    println!();
    println!("Logging:");
    println!("  LAB_INDICATORS_LOGGING__LEVEL  Default log level (default: warn)");
    println!("  LAB_INDICATORS_LOGGING__JSON   Emit JSON logs (default: false)");
    println!("  RUST_LOG                       Rust logging filter (e.g., debug, lab_indicators=trace)");
    println!();
    println!("Example:");
    println!("  export LAB_INDICATORS_INDICATORS__YEAR_COUNT=\"3\"");
    std::process::exit(0);
}

fn init_logging(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("lab_indicators={}", level)),
    );
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
    }

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Invalid configuration in {}", path.display()),
        None => "Invalid configuration".to_string(),
    })?;

    init_logging(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let format = resolve_format(cli.output);
    let today = config.indicators.reference_date();
    let last_year = today.year() - 1;

    match cli.command {
        Some(Commands::Compute {
            dataset,
            organization,
            keys,
            years,
            no_sub_organizations,
            save,
        }) => {
            let data = Arc::new(
                InMemoryLabData::load(&dataset)
                    .with_context(|| format!("Cannot load {}", dataset.display()))?,
            );
            let organization = data.find_organization(&organization)?;

            let mut settings = config.indicators.clone();
            if let Some(years) = years {
                settings.year_count = years;
            }
            if no_sub_organizations {
                settings.include_sub_organizations = false;
            }

            let registry = IndicatorRegistry::standard(data.clone(), &settings, today)?;
            let mut snapshot = IndicatorSnapshot::from_registry(&registry, &organization, Utc::now());
            match keys {
                Some(keys) => snapshot.set_visible_keys(&keys),
                None => snapshot.set_visible_keys(&settings.visible.join(",")),
            }

            if let Some(path) = save {
                std::fs::write(&path, snapshot.to_json()?)
                    .with_context(|| format!("Cannot write {}", path.display()))?;
                tracing::info!("Saved indicator snapshot to {}", path.display());
            }

            let values: Vec<(String, String, IndicatorValue)> = if snapshot.visible.is_empty() {
                snapshot
                    .values
                    .iter()
                    .map(|(key, value)| (key.clone(), label_of(&registry, key), *value))
                    .collect()
            } else {
                snapshot
                    .visible_values()
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), label_of(&registry, key), value))
                    .collect()
            };
            output_values(&values, format)?;
        }

        Some(Commands::Indicators) => {
            let data = Arc::new(InMemoryLabData::default());
            let registry = IndicatorRegistry::standard(data, &config.indicators, today)?;
            let keys: Vec<(String, String)> = registry
                .iter()
                .map(|indicator| (indicator.key().to_string(), indicator.label()))
                .collect();
            match format {
                OutputFormat::Json => {
                    let map: BTreeMap<_, _> = keys.into_iter().collect();
                    println!("{}", serde_json::to_string_pretty(&map)?);
                }
                _ => {
                    for (key, label) in keys {
                        println!("{:<45} {}", key, label);
                    }
                }
            }
        }

        Some(Commands::ScimagoQuartile { journal_id }) => {
            let platform = OnlineScimagoPlatform::new(&config.scimago)?;
            let quartile = platform.download_quartile(&journal_id).await;
            match format {
                OutputFormat::Json => {
                    let result = serde_json::json!({
                        "journal_id": journal_id,
                        "quartile": quartile,
                        "url": platform.journal_url(&journal_id).map(|u| u.to_string()),
                    });
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                _ => match quartile {
                    Some(quartile) => println!("{}: {}", journal_id, quartile),
                    None => println!("{}: unknown", journal_id),
                },
            }
        }

        Some(Commands::ScimagoTable { year, file, journal }) => {
            let year = year.unwrap_or(last_year);
            let ranking = match file {
                Some(path) => Arc::new(scimago::read_journal_ranking(
                    BufReader::new(open(&path)?),
                    config.scimago.search_columns_by_name,
                )?),
                None => {
                    OnlineScimagoPlatform::new(&config.scimago)?
                        .journal_ranking(year)
                        .await?
                }
            };

            match journal {
                Some(journal) => match ranking.get(journal.trim()) {
                    Some(quartiles) => output_quartiles(quartiles, None, format)?,
                    None => bail!("Journal {} is not in the Scimago table of {}", journal, year),
                },
                None => println!("Scimago {}: {} journals", year, ranking.len()),
            }
        }

        Some(Commands::WosTable { file, issn }) => {
            let ranking = wos::read_journal_ranking(BufReader::new(open(&file)?))?;
            match issn {
                Some(issn) => match ranking.get(&issn) {
                    Some(journal) => {
                        output_quartiles(&journal.quartiles, Some(journal.impact_factor), format)?
                    }
                    None => bail!("ISSN {} is not in {}", issn, file.display()),
                },
                None => println!("WoS table: {} ISSNs", ranking.len()),
            }
        }

        Some(Commands::UpdateRankings {
            dataset: dataset_path,
            platform,
            year,
            file,
            write,
        }) => {
            let mut dataset = LabDataset::load(&dataset_path)
                .with_context(|| format!("Cannot load {}", dataset_path.display()))?;
            let updater = RankingUpdater::new(year.unwrap_or(last_year));
            let year = updater.reference_year();

            let changed = match platform {
                Platform::Scimago => {
                    let ranking = match file {
                        Some(path) => Arc::new(scimago::read_journal_ranking(
                            BufReader::new(open(&path)?),
                            config.scimago.search_columns_by_name,
                        )?),
                        None => {
                            OnlineScimagoPlatform::new(&config.scimago)?
                                .journal_ranking(year)
                                .await?
                        }
                    };
                    let updates = updater.scimago_updates(&dataset.journals, &ranking);
                    output_updates(&updates, format)?;
                    write.then(|| (updater.apply(&mut dataset.journals, &updates), "journals"))
                }
                Platform::Wos => {
                    let Some(path) = file else {
                        bail!("The WoS table is not public: give its CSV export with --file");
                    };
                    let ranking = wos::read_journal_ranking(BufReader::new(open(&path)?))?;
                    let updates = updater.wos_updates(&dataset.journals, &ranking);
                    output_updates(&updates, format)?;
                    write.then(|| (updater.apply(&mut dataset.journals, &updates), "journals"))
                }
                Platform::Core => {
                    let Some(path) = file else {
                        bail!("Give the CSV export of the CORE portal with --file");
                    };
                    let table = core_portal::read_conference_ranking(BufReader::new(open(&path)?))?;
                    let updates = updater.core_updates(&dataset.conferences, &table);
                    output_conference_updates(&updates, format)?;
                    write.then(|| {
                        (
                            updater.apply_core(&mut dataset.conferences, &updates),
                            "conferences",
                        )
                    })
                }
            };

            if let Some((changed, kind)) = changed {
                dataset.save(&dataset_path)?;
                if !cli.quiet {
                    eprintln!("{} {} updated in {}", changed, kind, dataset_path.display());
                }
            }
        }

        Some(Commands::InitConfig { path, force }) => {
            let Some(path) = path.or_else(default_config_path) else {
                bail!("No configuration directory on this system: give a path");
            };
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            Config::default().save(&path)?;
            println!("Configuration written to {}", path.display());
        }

        None => {
            eprintln!("No command given. Use --help for usage.");
        }
    }

    Ok(())
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Cannot open {}", path.display()))
}

fn label_of(registry: &IndicatorRegistry, key: &str) -> String {
    registry
        .get(key)
        .map(|indicator| indicator.label())
        .unwrap_or_default()
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    }
}

fn output_values(values: &[(String, String, IndicatorValue)], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let map: BTreeMap<&str, IndicatorValue> =
                values.iter().map(|(key, _, value)| (key.as_str(), *value)).collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        OutputFormat::Plain => {
            for (key, _, value) in values {
                println!("{} = {}", key, value);
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::{Attribute, Cell, CellAlignment, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Indicator", "Key", "Value"]);

            for (key, label, value) in values {
                table.add_row(vec![
                    Cell::new(label).add_attribute(Attribute::Bold),
                    Cell::new(key),
                    Cell::new(value.to_string()).set_alignment(CellAlignment::Right),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn output_quartiles(
    quartiles: &JournalQuartiles,
    impact_factor: Option<f32>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let categories: BTreeMap<&str, QuartileRanking> = quartiles.categories().collect();
            let result = serde_json::json!({
                "categories": categories,
                "best": quartiles.best(),
                "impact_factor": impact_factor,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Plain => {
            for (category, quartile) in quartiles.categories() {
                println!("{}: {}", category, quartile);
            }
            if let Some(best) = quartiles.best() {
                println!("best: {}", best);
            }
            if let Some(impact_factor) = impact_factor {
                println!("impact factor: {}", impact_factor);
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::{Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Category", "Quartile"]);
            for (category, quartile) in quartiles.categories() {
                table.add_row(vec![Cell::new(category), Cell::new(quartile)]);
            }
            if let Some(best) = quartiles.best() {
                table.add_row(vec![Cell::new("(best)"), Cell::new(best)]);
            }
            if let Some(impact_factor) = impact_factor {
                table.add_row(vec![Cell::new("(impact factor)"), Cell::new(impact_factor)]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn output_updates(updates: &[JournalRankingUpdate], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(updates)?);
        }
        OutputFormat::Plain => {
            for update in updates {
                let selected = update
                    .selected()
                    .map(|q| q.to_string())
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "{} [{}]: {} -> {}",
                    update.journal_name, update.platform, update.previous, selected
                );
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::{Attribute, Cell, Color, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Journal", "Category", "Previous", "Candidates", "IF"]);

            for update in updates {
                let candidates = update
                    .candidates
                    .iter()
                    .map(|(category, quartile)| format!("{}: {}", category, quartile))
                    .collect::<Vec<_>>()
                    .join("\n");
                let mut name = Cell::new(&update.journal_name);
                if update.is_change() {
                    name = name.add_attribute(Attribute::Bold).fg(Color::Green);
                }
                table.add_row(vec![
                    name,
                    Cell::new(update.category.as_deref().unwrap_or("")),
                    Cell::new(update.previous),
                    Cell::new(candidates),
                    Cell::new(
                        update
                            .impact_factor
                            .map(|f| format!("{:.3}", f))
                            .unwrap_or_default(),
                    ),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn output_conference_updates(
    updates: &[ConferenceRankingUpdate],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(updates)?);
        }
        OutputFormat::Plain => {
            for update in updates {
                let rank = update
                    .ranking
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "{} [CORE]: {} -> {}",
                    update.conference_name, update.previous, rank
                );
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::{Attribute, Cell, Color, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Conference", "CORE id", "Previous", "Rank"]);

            for update in updates {
                let mut name = Cell::new(&update.conference_name);
                if update.is_change() {
                    name = name.add_attribute(Attribute::Bold).fg(Color::Green);
                }
                table.add_row(vec![
                    name,
                    Cell::new(update.core_id.as_deref().unwrap_or("")),
                    Cell::new(update.previous),
                    Cell::new(update.ranking.map(|r| r.to_string()).unwrap_or_default()),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
