//! Exoplanet clustering CLI
//!
//! Run with: cargo run -p exo-cluster -- --help

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exo_cluster::clustering::{inertia_curve, transform, KMeans};
use exo_cluster::config::PipelineConfig;
use exo_cluster::ingest;
use exo_cluster::pipeline::{Pipeline, RunReport, TierStatus};
use exo_cluster::sample_data;
use exo_cluster::storage::ExoplanetDb;
use exo_cluster::tiers::resolve;

#[derive(Parser, Debug)]
#[command(version, about = "Tiered exoplanet clustering with rank-stable labels", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a cleaned archive CSV into the database
    Import {
        /// CSV with pl_name, hostname, feature, and cohort flag columns
        csv: PathBuf,
    },
    /// Cluster every tier (or the named ones) and persist stable ranks
    Run {
        /// Only run these tiers
        #[arg(short, long = "tier")]
        tiers: Vec<String>,
    },
    /// Print inertia for k = 1..=max_k for each tier
    Elbow {
        #[arg(long, default_value_t = 10)]
        max_k: usize,
        /// Only analyse these tiers
        #[arg(short, long = "tier")]
        tiers: Vec<String>,
    },
    /// Print the persisted assignments of one label column
    Show { label_column: String },
    /// Print table sizes and referential integrity counts
    Verify,
    /// Run the full pipeline on the embedded sample dataset in memory
    Demo,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "exo_cluster=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(path) = cli.database {
        config.database.path = path;
    }

    match cli.command {
        Commands::Import { csv } => {
            let batch = ingest::load_csv(&csv, &config.ingest)
                .with_context(|| format!("reading {}", csv.display()))?;
            let db = open_db(&config)?;
            let stats = db.import(&batch)?;

            println!(
                "{} {} stars, {} planets, {} discoveries",
                "Imported".green().bold(),
                stats.stars,
                stats.planets,
                stats.discoveries
            );
            if stats.skipped_planets + stats.skipped_discoveries > 0 {
                println!(
                    "{} {} planets without a host, {} orphan discoveries",
                    "Skipped".yellow(),
                    stats.skipped_planets,
                    stats.skipped_discoveries
                );
            }
        }

        Commands::Run { tiers } => {
            let mut catalog = config.catalog()?;
            if !tiers.is_empty() {
                catalog = catalog.select(&tiers)?;
            }
            let db = Arc::new(open_db(&config)?);
            let planets = db.load_planets()?;

            let pipeline = Pipeline::new(config, catalog, db);
            let report = pipeline.run(&planets);
            print_report(&report);
        }

        Commands::Elbow { max_k, tiers } => {
            let mut catalog = config.catalog()?;
            if !tiers.is_empty() {
                catalog = catalog.select(&tiers)?;
            }
            let db = open_db(&config)?;
            let planets = db.load_planets()?;
            let algorithm = KMeans::from_config(&config.clustering);

            for tier in catalog.list_tiers() {
                let membership = resolve(tier, &planets);
                println!("{} ({} eligible, configured k={})", tier.name.bold(), membership.len(), tier.k);

                let curve = transform(&membership.features, &tier.required_features).and_then(|data| {
                    inertia_curve(&algorithm, &data, max_k, config.clustering.seed)
                });
                match curve {
                    Ok(points) => {
                        for point in points {
                            let marker = if point.k == tier.k { "<" } else { "" };
                            println!("  k={:<3} inertia={:>12.4} {}", point.k, point.inertia, marker.cyan());
                        }
                    }
                    Err(e) => println!("  {} {}", "skipped:".yellow(), e),
                }
            }
        }

        Commands::Show { label_column } => {
            let db = open_db(&config)?;
            let rows = db.load_assignments(&label_column)?;
            if rows.is_empty() {
                println!("{} no assignments in {}", "Empty:".yellow(), label_column);
            }
            for row in rows {
                println!("{:<4} {:<24} {}", row.rank, row.label, row.planet_name);
            }
        }

        Commands::Verify => {
            let db = open_db(&config)?;
            let report = db.verify()?;

            println!("stars:        {}", report.stars);
            println!("planets:      {}", report.planets);
            println!("discoveries:  {}", report.discoveries);
            println!("assignments:  {}", report.assignments);

            let orphaned = if report.planets_without_host == 0 {
                "0".green()
            } else {
                report.planets_without_host.to_string().red()
            };
            println!("planets without host:      {}", orphaned);
            println!("planets without discovery: {}", report.planets_without_discovery);
        }

        Commands::Demo => {
            let db = Arc::new(ExoplanetDb::in_memory()?);
            let stats = db.import(&sample_data::sample_batch())?;
            println!("Loaded {} sample planets", stats.planets);

            let catalog = config.catalog()?;
            let planets = db.load_planets()?;
            let pipeline = Pipeline::new(config, catalog, db.clone());
            let report = pipeline.run(&planets);
            print_report(&report);

            for outcome in report.outcomes.iter().filter(|o| o.is_success()) {
                println!("\n{}", outcome.label_column.bold());
                for row in db.load_assignments(&outcome.label_column)? {
                    println!("  {:<24} {}", row.label, row.planet_name);
                }
            }
        }
    }

    Ok(())
}

fn open_db(config: &PipelineConfig) -> anyhow::Result<ExoplanetDb> {
    ExoplanetDb::new(&config.database.path)
        .with_context(|| format!("opening {}", config.database.path.display()))
}

fn print_report(report: &RunReport) {
    println!("\n{} {}", "Run".bold(), report.run_id);

    for outcome in &report.outcomes {
        let head = format!("{} [{}] eligible={} k={}", outcome.tier, outcome.label_column, outcome.eligible, outcome.k);
        match &outcome.status {
            TierStatus::Succeeded { clusters, persisted, cleared, profiles } => {
                println!(
                    "{} {}: {} clusters, {} persisted, {} cleared",
                    "ok".green().bold(),
                    head,
                    clusters,
                    persisted,
                    cleared
                );
                for profile in profiles {
                    let means = profile
                        .means
                        .iter()
                        .map(|(feature, mean)| format!("{}={:.2}", feature, mean))
                        .collect::<Vec<_>>()
                        .join(" ");
                    println!("     {:<24} n={:<4} {}", profile.label, profile.count, means);
                }
            }
            TierStatus::Failed { kind, reason, cleared } => {
                println!(
                    "{} {}: {} ({}), {} cleared",
                    "failed".red().bold(),
                    head,
                    kind,
                    reason,
                    cleared
                );
            }
        }
    }

    println!(
        "\n{} succeeded, {} failed",
        report.succeeded().to_string().green(),
        report.failed().to_string().red()
    );
}
