use clap::{Parser, Subcommand};
use tracing::info;

use std::sync::Arc;
use tatabuku::config::{AppConfig, ChartFile};
use tatabuku::db::DatabaseManager;
use tatabuku::domain::{Account, Company};
use tatabuku::observability::metrics;
use tatabuku::storage::{SqliteStorage, Storage};

#[derive(Parser)]
#[command(name = "tatabuku")]
#[command(about = "Multi-tenant bookkeeping back office")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the JSON API server
    Serve {
        /// Port to listen on (overrides TATABUKU_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply the database schema and exit
    Migrate,
    /// Create a company and load its chart of accounts
    Seed {
        /// Company code, e.g. DEMO
        #[arg(long)]
        code: String,
        /// Company display name
        #[arg(long)]
        name: String,
        /// Chart-of-accounts TOML file
        #[arg(long, default_value = "chart_of_accounts.toml")]
        chart: String,
    },
}

async fn open_storage(config: &AppConfig) -> anyhow::Result<Arc<dyn Storage>> {
    let db = DatabaseManager::open(&config.database_path)?;
    db.run_migrations().await?;
    Ok(Arc::new(SqliteStorage::new(Arc::new(db))))
}

async fn seed_company(
    storage: &Arc<dyn Storage>,
    code: &str,
    name: &str,
    chart_path: &str,
) -> anyhow::Result<Company> {
    if storage.get_company_by_code(code).await?.is_some() {
        anyhow::bail!("company '{code}' already exists");
    }

    let chart = ChartFile::load(chart_path)?;

    let mut company = Company {
        id: None,
        code: code.to_string(),
        name: name.to_string(),
        created_at: chrono::Utc::now(),
    };
    storage.create_company(&mut company).await?;
    let company_id = company.id.ok_or_else(|| anyhow::anyhow!("company id missing after insert"))?;

    for entry in &chart.accounts {
        let mut account = Account {
            id: None,
            company_id,
            code: entry.code.clone(),
            name: entry.name.clone(),
            class: entry.class,
            normal_balance: entry.class.normal_balance(),
        };
        storage.upsert_account(&mut account).await?;
    }

    info!(
        "Seeded company {} with {} accounts",
        company.code,
        chart.accounts.len()
    );
    Ok(company)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;

    // Initialize logging
    tatabuku::logging::init_logging(&config.log_dir);

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);

            if let Err(e) = metrics::init() {
                tracing::warn!("Metrics disabled: {e}");
            }

            let storage = open_storage(&config).await?;
            tatabuku::server::start_server(storage, port)
                .await
                .map_err(|e| anyhow::anyhow!("server error: {e}"))?;
        }
        Commands::Migrate => {
            let db = DatabaseManager::open(&config.database_path)?;
            db.run_migrations().await?;
            println!("✅ Schema applied to {}", config.database_path);
        }
        Commands::Seed { code, name, chart } => {
            let storage = open_storage(&config).await?;
            let company = seed_company(&storage, &code, &name, &chart).await?;
            println!(
                "✅ Company {} created with id {}",
                company.code,
                company.id.unwrap_or_default()
            );
            println!("   Chart loaded from {chart}");
        }
    }
    Ok(())
}
