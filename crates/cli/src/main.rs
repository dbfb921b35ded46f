use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use orderflow_catalog::CatalogJoin;
use orderflow_infra::{FsReferenceStore, Settings, SettingsOverrides, config};
use orderflow_observability::LogFormat;

mod commands;

use commands::App;
use commands::inventory::InventoryArgs;
use commands::reference::ReferenceCommand;
use commands::ship::ShipArgs;

#[derive(Debug, Parser)]
#[command(name = "orderflow")]
#[command(about = "Turn channel exports into delivery notes and corrected inventory feeds", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the stored reference tables and `orderflow.toml`.
    #[arg(long, global = true, env = "ORDERFLOW_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file to use instead of `<data-dir>/orderflow.toml`.
    #[arg(long, global = true, env = "ORDERFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Comma-separated SKU prefixes whose order lines never ship.
    #[arg(long, global = true, value_delimiter = ',', env = "ORDERFLOW_RESERVED_PREFIXES")]
    reserved_prefixes: Option<Vec<String>>,

    /// Separator between bundle component names.
    #[arg(long, global = true, env = "ORDERFLOW_BUNDLE_DELIMITER")]
    bundle_delimiter: Option<String>,

    /// How duplicate catalog item names join (fan-out | first-match).
    #[arg(long, global = true, env = "ORDERFLOW_CATALOG_JOIN")]
    catalog_join: Option<CatalogJoin>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "ORDERFLOW_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage the stored catalog and exception tables
    Reference {
        #[command(subcommand)]
        command: ReferenceCommand,
    },

    /// Build a delivery note from a channel order export
    Ship(ShipArgs),

    /// Correct the on-hand counts of a channel inventory export
    Inventory(InventoryArgs),
}

impl Cli {
    /// Defaults, then the config file, then env/flags.
    fn settings(&self) -> Result<Settings> {
        let search_dir = self.data_dir.clone().or_else(config::default_data_dir);
        let settings = Settings::discover(self.config.as_deref(), search_dir.as_deref())
            .context("loading configuration")?;

        settings
            .with_overrides(SettingsOverrides {
                data_dir: self.data_dir.clone(),
                reserved_prefixes: self.reserved_prefixes.clone(),
                bundle_delimiter: self.bundle_delimiter.clone(),
                catalog_join: self.catalog_join,
            })
            .context("applying configuration overrides")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    orderflow_observability::init(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    let settings = cli.settings()?;
    let data_dir = settings.resolved_data_dir()?;
    let store = FsReferenceStore::open(&data_dir)
        .with_context(|| format!("opening reference store at {}", data_dir.display()))?;
    tracing::debug!(data_dir = %data_dir.display(), ?settings, "starting");

    let app = App { settings, store };
    match cli.command {
        Command::Reference { command } => commands::reference::run(&app, command),
        Command::Ship(args) => commands::ship::run(&app, args),
        Command::Inventory(args) => commands::inventory::run(&app, args),
    }
}
