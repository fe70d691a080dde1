use std::path::PathBuf;

use adpulse_cli::{report, MetricsClient};
use adpulse_core::{aggregate, aggregate_by_day, MetricRecord};
use adpulse_store::{demo, MetricsFilter};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "adpulse-cli")]
#[command(about = "adpulse campaign metrics command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Aggregate metric records into totals, CTR and ROAS
    Summarize {
        /// JSON file holding an array of metric records (or a saved API response)
        #[arg(long, conflicts_with = "server", required_unless_present = "server")]
        input: Option<PathBuf>,

        /// Base URL of a running adpulse-server, e.g. <http://localhost:3000>
        #[arg(long)]
        server: Option<String>,

        /// Only include records for this campaign
        #[arg(long)]
        campaign_id: Option<Uuid>,

        /// First day to include (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Print one row per day instead of a single summary
        #[arg(long)]
        daily: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// ISO 4217 code for currency columns
        #[arg(long, env = "ADPULSE_CURRENCY", default_value = "USD")]
        currency: String,

        /// HTTP timeout for --server requests, in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// Write a generated sample seed file for adpulse-server
    DemoSeed {
        /// Number of daily records per campaign
        #[arg(long, default_value_t = 30)]
        days: u32,

        /// RNG seed; the same seed always produces the same file
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Last day of generated data (defaults to today, UTC)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Output path; prints to stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Summarize {
            input,
            server,
            campaign_id,
            start,
            end,
            daily,
            json,
            currency,
            timeout_secs,
        }) => {
            let filter = MetricsFilter {
                campaign_id,
                start,
                end,
            };
            filter.validate()?;

            let records = match (input, server) {
                (Some(path), _) => load_local_records(&path, &filter)?,
                (None, Some(url)) => {
                    let client = MetricsClient::new(&url, timeout_secs)?;
                    client.fetch_metrics(&filter).await?
                }
                (None, None) => anyhow::bail!("either --input or --server is required"),
            };
            run_summarize(&records, daily, json, &currency)?;
        }
        Some(Commands::DemoSeed {
            days,
            seed,
            end,
            output,
        }) => run_demo_seed(days, seed, end, output.as_deref())?,
        None => println!("adpulse-cli: run with --help to list commands"),
    }

    Ok(())
}

fn load_local_records(
    path: &std::path::Path,
    filter: &MetricsFilter,
) -> anyhow::Result<Vec<MetricRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut records = report::parse_records(&raw)
        .with_context(|| format!("failed to parse metric records from {}", path.display()))?;
    records.retain(|record| filter.matches(record));
    records.sort_by_key(|record| record.date);
    tracing::debug!(count = records.len(), "loaded metric records");
    Ok(records)
}

fn run_summarize(
    records: &[MetricRecord],
    daily: bool,
    json: bool,
    currency: &str,
) -> anyhow::Result<()> {
    if daily {
        let days = aggregate_by_day(records);
        if json {
            println!("{}", serde_json::to_string_pretty(&days)?);
        } else {
            print!("{}", report::render_daily(&days, currency)?);
        }
    } else {
        let summary = aggregate(records);
        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print!("{}", report::render_summary(&summary, currency)?);
        }
    }
    Ok(())
}

fn run_demo_seed(
    days: u32,
    seed: u64,
    end: Option<NaiveDate>,
    output: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    if days == 0 {
        anyhow::bail!("--days must be at least 1");
    }
    let last_day = end.unwrap_or_else(|| chrono::Utc::now().date_naive());
    let seed_file = demo::generate(days, seed, last_day);
    let yaml = serde_yaml::to_string(&seed_file)?;

    match output {
        Some(path) => {
            std::fs::write(path, yaml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "wrote {} campaigns x {days} days to {}",
                seed_file.campaigns.len(),
                path.display()
            );
        }
        None => print!("{yaml}"),
    }
    Ok(())
}
