use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ammoscout", about = "Ammunition search and price context engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search products with price context
    Search {
        /// Free-text query
        query: String,
        #[arg(long, default_value = "20")]
        limit: usize,
        #[arg(long, default_value = "1")]
        page: usize,
        /// Sort order (relevance, price_asc, price_desc, date_asc, date_desc, price_context)
        #[arg(long, default_value = "relevance")]
        sort: String,
        /// Enable vector retrieval (falls back to relational on gaps)
        #[arg(long)]
        vector: bool,
        /// Caller tier (standard, elevated)
        #[arg(long, default_value = "standard")]
        tier: String,
        /// Lens pipeline id to delegate ordering to
        #[arg(long)]
        pipeline: Option<String>,
        /// Explicit filters as JSON (category, brand, purpose, caseMaterial, minGrain, maxGrain, minPrice, maxPrice, inStock, ...)
        #[arg(long)]
        filters: Option<String>,
    },
    /// Import a catalog/price batch from JSON
    Import {
        /// Path to a JSON batch file, or "-" for stdin
        file: String,
    },
    /// Show 30-day price statistics for a caliber
    Stats {
        /// Caliber label (e.g. "9mm Luger", ".223/5.56")
        caliber: String,
    },
    /// List currently visible prices for a product
    Prices {
        /// Product ID
        product_id: String,
    },
    /// Revoke a price correction
    RevokeCorrection {
        /// Correction ID
        id: String,
    },
    /// Pre-warm the caliber statistics cache
    Warm {
        /// Caliber labels to warm
        calibers: Vec<String>,
    },
    /// Embed products missing vectors
    Reindex,
}
