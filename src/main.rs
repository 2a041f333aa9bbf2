//! Siranio CLI - keyword-driven fraud detection scenarios
//!
//! Serves the HTTP API by default; the other subcommands work against the
//! same database from the terminal.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use siranio::{
    api, config::SiranioConfig, scenario::GeneratedScenario, RunStatus, Siranio,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let matches = Command::new("siranio")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Keyword-driven fraud detection scenarios for withdrawal data")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file path")
                .global(true),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .value_name("URL")
                .help("SQLite connection string or file path")
                .global(true),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("HTTP listener port")
                .value_parser(value_parser!(u16))
                .global(true),
        )
        .subcommand(Command::new("serve").about("Seed the dataset and serve the HTTP API"))
        .subcommand(
            Command::new("generate")
                .about("Print the three scenario drafts for three keywords")
                .arg(
                    Arg::new("keywords")
                        .required(true)
                        .num_args(1..)
                        .help("Condition keywords, e.g. \"고액 출금\" 야간 atm"),
                ),
        )
        .subcommand(Command::new("seed").about("Fill the synthetic dataset up to its targets"))
        .subcommand(
            Command::new("run")
                .about("Run saved scenarios against the dataset")
                .arg(
                    Arg::new("ids")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(i64))
                        .help("Scenario IDs"),
                ),
        )
        .subcommand(Command::new("stats").about("Show table row counts"))
        .get_matches();

    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("generate", sub_matches)) => {
            let keywords: Vec<&String> = sub_matches
                .get_many::<String>("keywords")
                .context("keywords are required")?
                .collect();
            generate_drafts(keywords.as_slice())?.iter().for_each(print_draft);
        }
        Some(("seed", _)) => {
            let service = Siranio::open(config).await?;
            let report = service.seed_dataset().await?;
            println!("🌱 Seeding finished");
            println!("   Customers inserted:    {}", report.customers_inserted);
            println!("   Transactions inserted: {}", report.transactions_inserted);
            println!("   Customers total:       {}", report.customer_count);
            println!("   Transactions total:    {}", report.transaction_count);
        }
        Some(("run", sub_matches)) => {
            let ids: Vec<i64> = sub_matches
                .get_many::<i64>("ids")
                .context("scenario ids are required")?
                .copied()
                .collect();
            let service = Siranio::open(config).await?;
            run_scenarios(&service, &ids).await?;
        }
        Some(("stats", _)) => {
            let service = Siranio::open(config).await?;
            let counts = service.counts().await?;
            println!("📊 Dataset");
            println!("   Customers:         {}", counts.customers);
            println!("   Transactions:      {}", counts.transactions);
            println!("   Saved scenarios:   {}", counts.scenarios);
            println!("   Detection results: {}", counts.detection_results);
        }
        _ => serve(config).await?,
    }

    Ok(())
}

/// Defaults, then the JSON file, then the environment, then CLI flags
fn load_config(matches: &ArgMatches) -> Result<SiranioConfig> {
    let path = matches.get_one::<String>("config").map(Path::new);
    let mut config = SiranioConfig::load(path)?;

    if let Some(url) = matches.get_one::<String>("database") {
        config.database_url = url.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.port = *port;
    }
    if config.is_in_memory() {
        config.max_connections = 1;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    Ok(config)
}

async fn serve(config: SiranioConfig) -> Result<()> {
    let service = Siranio::open(config).await?;

    if service.config().seed_on_startup {
        let report = service.seed_dataset().await?;
        info!(
            "Dataset ready: {} customers, {} transactions",
            report.customer_count, report.transaction_count
        );
    }

    let addr = service.config().bind_address();
    let app = api::create_router(Arc::new(service));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Siranio API listening on http://{}", addr);
    info!("  Health check: http://{}/api/health", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Draft scenarios, failing with the analyst-facing message
fn generate_drafts<S: AsRef<str>>(keywords: &[S]) -> Result<[GeneratedScenario; 3]> {
    siranio::scenario::generate_scenarios(keywords)
        .map_err(|e| anyhow::anyhow!("❌ {}", e.to_user_message()))
}

async fn run_scenarios(service: &Siranio, ids: &[i64]) -> Result<()> {
    let batch = service
        .run_detections(ids)
        .await
        .map_err(|e| anyhow::anyhow!("❌ {} ({})", e.to_user_message(), e))?;

    println!("🔎 Detection run {}", batch.run_id);
    for run in &batch.runs {
        match run.status {
            RunStatus::Completed => println!(
                "   ✅ #{} {}: {} detected",
                run.scenario_id,
                run.scenario_name.as_deref().unwrap_or("-"),
                run.detected_count
            ),
            RunStatus::NotFound => println!("   ⚠️ #{} not found", run.scenario_id),
        }
    }
    Ok(())
}

fn print_draft(draft: &GeneratedScenario) {
    println!("📋 {} ({})", draft.name, draft.temp_scenario_id);
    println!("   {}", draft.description);
    for condition in &draft.conditions {
        println!("   - {} → {}: {}", condition.keyword, condition.label, condition.detail);
    }
    println!();
    println!("{}", draft.sql);
    println!();
}

/// Initialize tracing subscriber
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "siranio=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
