//! quotecache CLI: local stock quote cache.

use std::sync::Arc;

use anyhow::{bail, Context as _};
use chrono::{Months, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use quotecache_core::quotes::constants::{DEFAULT_LOOKBACK_YEARS, DEFAULT_PROVIDER};
use quotecache_core::quotes::{
    EngineConfig, ProviderId, QuoteRecord, QuoteService, QuoteServiceTrait,
};
use quotecache_core::validation::is_valid_symbol_format;
use quotecache_market_data::{ProviderRegistry, ProviderSettings, RetryPolicy};
use quotecache_storage_sqlite::{create_pool, init, run_migrations, spawn_writer, QuoteRepository};

#[derive(Parser)]
#[command(name = "quotecache", about = "quotecache - local stock quote CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Look up one quote (today's when DATE is omitted).
    Quote {
        symbol: String,
        /// Quote date, YYYY-MM-DD.
        date: Option<String>,
        /// Data provider to use.
        #[arg(long)]
        provider: Option<String>,
    },
    /// Print cached history for a symbol.
    History {
        symbol: String,
        /// Years of history to show.
        #[arg(long, default_value_t = DEFAULT_LOOKBACK_YEARS)]
        years: u32,
        #[arg(long)]
        provider: Option<String>,
    },
    /// Download historical quotes into the local database.
    Prefetch {
        symbol: String,
        /// Years of history to fetch.
        #[arg(long, default_value_t = DEFAULT_LOOKBACK_YEARS)]
        years: u32,
        /// Data provider to use.
        #[arg(long, default_value = DEFAULT_PROVIDER)]
        provider: String,
    },
    /// Download history from every configured provider.
    PrefetchAll {
        symbol: String,
        #[arg(long, default_value_t = DEFAULT_LOOKBACK_YEARS)]
        years: u32,
    },
    /// List available data providers and their status.
    Providers,
    /// Show data from all providers for a given symbol and date.
    Compare { symbol: String, date: String },
    /// Show cache contents (for one symbol, or everything).
    Info { symbol: Option<String> },
    /// Export the entire database to a JSON file.
    Dump {
        /// Output file path.
        #[arg(short, long, default_value = "quotes.json")]
        output: String,
    },
    /// Import quotes from a JSON file into the database.
    Load { file: String },
}

struct Context {
    service: Arc<dyn QuoteServiceTrait>,
    registry: Arc<ProviderRegistry>,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn build_context() -> anyhow::Result<Context> {
    let db_path = env_opt("QUOTECACHE_DB").unwrap_or_else(|| "instance/quotes.db".to_string());

    init(&db_path)?;
    let pool = create_pool(&db_path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());
    let store = Arc::new(QuoteRepository::new(pool, writer));

    let registry = Arc::new(ProviderRegistry::new(&ProviderSettings {
        alpha_vantage_api_key: env_opt("ALPHA_VANTAGE_API_KEY"),
        polygon_api_key: env_opt("POLYGON_API_KEY"),
        retry: RetryPolicy::default(),
    })?);

    let config = EngineConfig {
        default_provider: ProviderId::new(
            env_opt("DEFAULT_PROVIDER").unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
        ),
        ..EngineConfig::default()
    };

    let service: Arc<dyn QuoteServiceTrait> =
        Arc::new(QuoteService::new(store, registry.clone(), config));
    Ok(Context { service, registry })
}

fn check_symbol(symbol: &str) -> anyhow::Result<()> {
    if !is_valid_symbol_format(symbol) {
        bail!("Invalid symbol '{}'", symbol);
    }
    Ok(())
}

fn parse_date(date_str: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {}. Use YYYY-MM-DD.", date_str))
}

fn lookback_range(years: u32) -> (NaiveDate, NaiveDate) {
    let end = Utc::now().date_naive();
    let start = end.checked_sub_months(Months::new(years * 12)).unwrap_or(end);
    (start, end)
}

fn fmt_price(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn fmt_volume(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.0}", v))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let ctx = build_context()?;

    match cli.command {
        Command::Quote {
            symbol,
            date,
            provider,
        } => {
            check_symbol(&symbol)?;
            let result = match date {
                Some(date_str) => {
                    let day = parse_date(&date_str)?;
                    ctx.service.resolve(&symbol, day, provider.as_deref()).await?
                }
                None => ctx.service.resolve_latest(&symbol, provider.as_deref()).await?,
            };
            match result {
                Some(resolved) => println!("{}", serde_json::to_string_pretty(&resolved)?),
                None => println!("No quote found for {}.", symbol.to_uppercase()),
            }
        }

        Command::History {
            symbol,
            years,
            provider,
        } => {
            check_symbol(&symbol)?;
            let (start, end) = lookback_range(years);
            let quotes = ctx
                .service
                .get_history(&symbol, start, end, provider.as_deref())?;
            if quotes.is_empty() {
                println!(
                    "No cached history for {}. Try `quotecache prefetch {}` first.",
                    symbol.to_uppercase(),
                    symbol.to_uppercase()
                );
            } else {
                for q in &quotes {
                    println!(
                        "{}  {:>10} {:>10} {:>10} {:>10} {:>14}",
                        q.day,
                        fmt_price(q.open),
                        fmt_price(q.high),
                        fmt_price(q.low),
                        fmt_price(q.close),
                        fmt_volume(q.volume),
                    );
                }
                println!("{} quotes.", quotes.len());
            }
        }

        Command::Prefetch {
            symbol,
            years,
            provider,
        } => {
            check_symbol(&symbol)?;
            let (start, end) = lookback_range(years);
            println!(
                "Fetching {}y of {} from {} ...",
                years,
                symbol.to_uppercase(),
                provider
            );
            let count = ctx
                .service
                .prefetch(&symbol, start, end, Some(&provider))
                .await?;
            println!("Stored {} quotes.", count);
        }

        Command::PrefetchAll { symbol, years } => {
            check_symbol(&symbol)?;
            let (start, end) = lookback_range(years);
            for provider in ctx.registry.iter() {
                if !provider.is_configured() {
                    println!("  {}: skipped (not configured)", provider.id());
                    continue;
                }
                print!("  {}: fetching ...", provider.id());
                let count = ctx
                    .service
                    .prefetch(&symbol, start, end, Some(provider.id()))
                    .await?;
                println!(" {} quotes stored.", count);
            }
        }

        Command::Providers => {
            for (id, configured) in ctx.registry.readiness() {
                let status = if configured { "ready" } else { "needs API key" };
                println!("  {}: {}", id, status);
            }
        }

        Command::Compare { symbol, date } => {
            check_symbol(&symbol)?;
            let day = parse_date(&date)?;
            let quotes = ctx.service.resolve_all_providers(&symbol, day)?;

            if quotes.is_empty() {
                println!(
                    "No data for {} on {} from any provider.",
                    symbol.to_uppercase(),
                    date
                );
                return Ok(());
            }

            let header = format!(
                "{:<16} {:>10} {:>10} {:>10} {:>10} {:>14}",
                "Provider", "Open", "High", "Low", "Close", "Volume"
            );
            println!("{}", header);
            println!("{}", "-".repeat(header.len()));
            for q in &quotes {
                println!(
                    "{:<16} {:>10} {:>10} {:>10} {:>10} {:>14}",
                    q.provider,
                    fmt_price(q.open),
                    fmt_price(q.high),
                    fmt_price(q.low),
                    fmt_price(q.close),
                    fmt_volume(q.volume),
                );
            }
        }

        Command::Info { symbol } => match symbol {
            Some(symbol) => {
                check_symbol(&symbol)?;
                match ctx.service.symbol_info(&symbol)? {
                    Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
                    None => println!("No data cached for {}.", symbol.to_uppercase()),
                }
            }
            None => {
                let info = ctx.service.cache_info()?;
                println!("{}", serde_json::to_string_pretty(&info)?);
            }
        },

        Command::Dump { output } => {
            let records = ctx.service.dump_all()?;
            std::fs::write(&output, serde_json::to_string_pretty(&records)?)?;
            println!("Dumped {} quotes to {}", records.len(), output);
        }

        Command::Load { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file))?;
            let records: Vec<QuoteRecord> =
                serde_json::from_str(&contents).context("invalid quotes file")?;
            let count = ctx.service.load_all(records).await?;
            println!("Loaded {} quotes from {}", count, file);
        }
    }

    Ok(())
}
