use ammoscout::application::ingest::ImportBatch;
use ammoscout::application::predicate::ExplicitFilters;
use ammoscout::application::search::SearchOptions;
use ammoscout::cli::commands::{Cli, Commands};
use ammoscout::domain::values::caller_tier::CallerTier;
use ammoscout::domain::values::sort_order::SortBy;
use ammoscout::AmmoScout;
use clap::Parser;
use std::io::Read;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = std::env::var("AMMOSCOUT_DB").unwrap_or_else(|_| "./ammoscout.db".into());

    let engine = match AmmoScout::new(&db_path) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error initializing AmmoScout: {e}");
            std::process::exit(1);
        }
    };

    let result = run_command(engine, cli.command).await;
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(engine: AmmoScout, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Search {
            query,
            limit,
            page,
            sort,
            vector,
            tier,
            pipeline,
            filters,
        } => {
            let sort_by: SortBy = sort.parse().map_err(|e: String| e)?;
            let tier: CallerTier = tier.parse().map_err(|e: String| e)?;
            let filters: ExplicitFilters = match filters {
                Some(json) => serde_json::from_str(&json)?,
                None => ExplicitFilters::default(),
            };
            let options = SearchOptions {
                page,
                limit,
                sort_by,
                use_vector_search: vector,
                filters,
                pipeline_id: pipeline,
                tier,
            };
            let result = engine.search(&query, options).await?;
            println!("{}", serde_json::to_string_pretty(&result).unwrap());
        }
        Commands::Import { file } => {
            let json = if file == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                std::fs::read_to_string(&file)?
            };
            let batch: ImportBatch = serde_json::from_str(&json)?;
            let summary = engine.import(batch).await?;
            println!("{}", serde_json::to_string_pretty(&summary).unwrap());
        }
        Commands::Stats { caliber } => {
            let stats = engine.caliber_stats(&caliber)?;
            println!("{}", serde_json::to_string_pretty(&stats).unwrap());
        }
        Commands::Prices { product_id } => {
            let prices = engine.product_prices(&product_id)?;
            println!("{}", serde_json::to_string_pretty(&prices).unwrap());
        }
        Commands::RevokeCorrection { id } => {
            engine.revoke_correction(&id)?;
            println!("Correction {id} revoked");
        }
        Commands::Warm { calibers } => {
            engine.warm_cache(&calibers);
            println!("Warmed {} caliber(s)", calibers.len());
        }
        Commands::Reindex => {
            let count = engine.reindex().await?;
            println!("Reindexed {count} products");
        }
    }
    Ok(())
}
