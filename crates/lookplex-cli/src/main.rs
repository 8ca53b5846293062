use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lookplex_catalog::entries::{dashboard_entry, explore_entry, view_entry};
use lookplex_catalog::{
    AuthorizedClient, CatalogSetup, Credentials, DataplexCatalog, EntrySpec, EntryWriter,
    RelationshipLinker,
};
use lookplex_core::{BatchSummary, Config, Relationships, RunReport};
use lookplex_lineage::{AssetLinks, DataLineageClient, LineageBuilder, LineageOptions};
use lookplex_lookml::LookmlProject;

/// Lookplex - Sync Looker assets into the Dataplex catalog
#[derive(Parser)]
#[command(name = "lookplex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Local override file with KEY=value lines
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    /// LookML project root (overrides LOOKML_DIR)
    #[arg(long, global = true)]
    lookml_dir: Option<PathBuf>,

    /// Relationship tables in TOML (overrides RELATIONSHIPS_FILE)
    #[arg(long, global = true)]
    relationships: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write a JSON run report to this file
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved configuration
    Config,

    /// Create the entry group, aspect types and entry types
    Setup {
        #[arg(value_enum, default_value_t = SetupTarget::All)]
        target: SetupTarget,
    },

    /// Create catalog entries from the LookML project
    Ingest {
        #[arg(value_enum, default_value_t = IngestTarget::All)]
        target: IngestTarget,
    },

    /// Link dashboards, explores, views and BigQuery tables
    Links,

    /// Record table → view → explore → dashboard lineage
    Lineage {
        /// Keep existing lineage processes instead of deleting them first
        #[arg(long)]
        no_cleanup: bool,

        /// Seconds to wait after cleanup
        #[arg(long, default_value_t = 5)]
        propagation_delay_secs: u64,
    },

    /// List lineage processes, runs and links of the sample assets
    LineageInspect,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SetupTarget {
    EntryGroup,
    AspectTypes,
    EntryTypes,
    All,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum IngestTarget {
    Views,
    Explores,
    Dashboards,
    All,
}

impl IngestTarget {
    fn includes(self, other: IngestTarget) -> bool {
        self == IngestTarget::All || self == other
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.env_file).context("Failed to load configuration")?;
    if let Some(dir) = &cli.lookml_dir {
        config = config.with_lookml_dir(dir);
    }
    if let Some(path) = &cli.relationships {
        config = config.with_relationships_file(path);
    }

    init_logging(cli.verbose || config.debug);

    let report = match cli.command {
        Commands::Config => {
            config_command(&config)?;
            None
        }
        Commands::Setup { target } => Some(setup_command(&config, target).await?),
        Commands::Ingest { target } => Some(ingest_command(&config, target).await?),
        Commands::Links => Some(links_command(&config).await?),
        Commands::Lineage {
            no_cleanup,
            propagation_delay_secs,
        } => {
            let options = LineageOptions {
                cleanup: !no_cleanup,
                propagation_delay: Duration::from_secs(propagation_delay_secs),
            };
            Some(lineage_command(&config, options).await?)
        }
        Commands::LineageInspect => {
            lineage_inspect_command(&config).await?;
            None
        }
    };

    if let Some(report) = report {
        print_summary(&report);
        if let Some(path) = &cli.report {
            report.write_to(path)?;
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` when verbose
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn header(title: &str) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", title.bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
}

fn load_relationships(config: &Config) -> Result<Relationships> {
    Relationships::load(config.relationships_file.as_deref()).context("Failed to load relationship tables")
}

/// Authorized client with a token already fetched, so auth problems stop the command
async fn authorized_client() -> Result<AuthorizedClient> {
    let client = AuthorizedClient::new(Credentials::gcloud()).context("Failed to create HTTP client")?;
    client
        .credentials()
        .token()
        .await
        .context("Failed to get an access token; run `gcloud auth login`")?;
    Ok(client)
}

async fn dataplex(config: &Config) -> Result<DataplexCatalog> {
    Ok(DataplexCatalog::new(config.clone(), authorized_client().await?))
}

fn config_command(config: &Config) -> Result<()> {
    header("Configuration");
    for (label, value) in config.summary_lines() {
        println!("  {:<18} {}", format!("{}:", label).bold(), value);
    }

    let relationships = load_relationships(config)?;
    println!();
    println!("{}", "Relationship tables".bold());
    println!("  dashboard → explore pairs: {}", relationships.dashboard_explore_pairs());
    println!("  explore → view pairs:      {}", relationships.explore_view_pairs());
    println!("  view → table pairs:        {}", relationships.links.view_tables.len());
    println!("  table → view lineage:      {}", relationships.lineage.table_views.len());
    Ok(())
}

async fn setup_command(config: &Config, target: SetupTarget) -> Result<RunReport> {
    header("Dataplex Setup");
    let catalog = dataplex(config).await?;
    let setup = CatalogSetup::new(&catalog);

    let batches = match target {
        SetupTarget::EntryGroup => vec![setup.create_entry_group().await],
        SetupTarget::AspectTypes => vec![setup.create_aspect_types().await],
        SetupTarget::EntryTypes => vec![setup.create_entry_types().await],
        SetupTarget::All => setup.run_all().await,
    };

    let mut report = RunReport::new("setup");
    batches.into_iter().for_each(|b| report.add_batch(b));
    Ok(report)
}

async fn ingest_command(config: &Config, target: IngestTarget) -> Result<RunReport> {
    header("LookML Ingest");
    let project = LookmlProject::discover(&config.lookml_dir)
        .with_context(|| format!("Failed to read LookML project at {}", config.lookml_dir.display()))?;
    eprintln!(
        "{} {} view files, {} explore files, {} dashboards",
        "Found".cyan(),
        project.view_files.len(),
        project.explore_files.len(),
        project.dashboard_files.len()
    );

    let views = project.view_cache();
    let mut batches: Vec<(&str, Vec<EntrySpec>)> = Vec::new();

    if target.includes(IngestTarget::Views) {
        let specs = views.values().map(|view| view_entry(config, view)).collect();
        batches.push(("views", specs));
    }
    if target.includes(IngestTarget::Explores) {
        let specs = project
            .load_explores()
            .values()
            .map(|explore| explore_entry(config, explore, &views))
            .collect();
        batches.push(("explores", specs));
    }
    if target.includes(IngestTarget::Dashboards) {
        let specs = project
            .load_dashboards()
            .iter()
            .map(|dashboard| dashboard_entry(config, dashboard))
            .collect();
        batches.push(("dashboards", specs));
    }

    let catalog = dataplex(config).await?;
    let writer = EntryWriter::new(&catalog, config);
    let mut report = RunReport::new("ingest");

    for (label, specs) in &batches {
        eprintln!("{} {} {}...", "Ingesting".cyan(), specs.len(), label);
        report.add_batch(writer.ensure_all(label, specs).await);
    }

    Ok(report)
}

async fn links_command(config: &Config) -> Result<RunReport> {
    header("Structural Links");
    let relationships = load_relationships(config)?;
    let catalog = dataplex(config).await?;

    let batches = RelationshipLinker::new(&catalog, config)
        .link_all(&relationships.links)
        .await
        .with_context(|| format!("Failed to list entries in {}", config.entry_group))?;

    let mut report = RunReport::new("links");
    batches.into_iter().for_each(|b| report.add_batch(b));
    Ok(report)
}

async fn lineage_command(config: &Config, options: LineageOptions) -> Result<RunReport> {
    header("Data Lineage");
    if options.cleanup {
        eprintln!(
            "{}",
            format!("Every lineage process in {} will be deleted first", config.location_path()).yellow()
        );
    }

    let relationships = load_relationships(config)?;
    let client = DataLineageClient::new(config, authorized_client().await?);
    let result = LineageBuilder::new(&client, config)
        .with_options(options)
        .run(&relationships.lineage)
        .await;

    print_asset_links(&result.verification);

    let mut report = RunReport::new("lineage");
    result.batches.into_iter().for_each(|b| report.add_batch(b));
    Ok(report)
}

async fn lineage_inspect_command(config: &Config) -> Result<()> {
    header("Lineage Inspection");
    let relationships = load_relationships(config)?;
    let client = DataLineageClient::new(config, authorized_client().await?);

    let inspection = LineageBuilder::new(&client, config)
        .inspect(&relationships.lineage.verify)
        .await
        .context("Failed to list lineage processes")?;

    println!("{} {}", "Processes:".bold(), inspection.processes.len());
    for entry in &inspection.processes {
        println!("  • {} ({})", entry.process.display_name, entry.process.id().dimmed());
        for run in &entry.runs {
            println!("      {} {:?}", run.display_name, run.state);
        }
    }

    print_asset_links(&inspection.links);
    Ok(())
}

fn print_asset_links(links: &[AssetLinks]) {
    if links.is_empty() {
        return;
    }

    println!();
    println!("{}", "Lineage links".bold());
    for asset in links {
        println!("  {}", asset.fqn.as_str().cyan());
        print_direction("→", &asset.downstream);
        print_direction("←", &asset.upstream);
    }
}

fn print_direction(arrow: &str, found: &Option<Vec<String>>) {
    match found {
        None => println!("    {} {}", arrow, "search failed".red()),
        Some(fqns) if fqns.is_empty() => println!("    {} {}", arrow, "none".dimmed()),
        Some(fqns) => {
            for fqn in fqns.iter().take(3) {
                println!("    {} {}", arrow, fqn);
            }
            if fqns.len() > 3 {
                println!("    {} ... {} more", arrow, fqns.len() - 3);
            }
        }
    }
}

fn print_batch(batch: &BatchSummary) {
    let line = batch.to_string();
    if batch.has_failures() {
        println!("  {} {} ({} failed)", "✗".red(), line, batch.failed);
    } else {
        println!("  {} {}", "✓".green(), line);
    }
}

fn print_summary(report: &RunReport) {
    println!();
    println!("{}", "Summary".bold());
    for batch in &report.batches {
        print_batch(batch);
    }

    let totals = report.totals();
    println!();
    if report.has_failures() {
        println!(
            "{}",
            format!("⚠ {} of {} operations failed, see the log above", totals.failed, totals.processed)
                .yellow()
                .bold()
        );
    } else {
        println!("{}", format!("✓ {} operations succeeded", totals.succeeded).green().bold());
    }
}
