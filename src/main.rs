use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::sqlite::SqlitePool;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use state::AppState;
use string_analysis_backend::config::{self, AppConfig};
use string_analysis_backend::db::{self, StringStore};
use string_analysis_backend::filter::{RuleSet, Translator};

#[derive(Debug, Parser)]
#[command(name = "string-analysis-backend", version, about = "String analysis API server")]
struct Cli {
    /// Config file path (default: ./config.json) / 配置文件路径
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default) / 启动服务器
    Serve,
    /// Database management / 数据库管理
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Debug, Subcommand)]
enum DbAction {
    /// Create database tables / 创建数据表
    Init,
    /// Drop and recreate all tables, deleting all data / 重置数据库
    Reset {
        /// Skip the confirmation prompt / 跳过确认
        #[arg(long)]
        yes: bool,
    },
    /// Check the database connection / 检查数据库连接
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "string_analysis_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration / 加载配置
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let mut app_config = config::load_config(&config_path).map_err(anyhow::Error::msg)?;
    app_config.apply_env_overrides();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(app_config).await,
        Command::Db { action } => run_db_action(&app_config, action).await,
    }
}

/// Create data directory and open the pool / 打开数据库连接池
async fn open_pool(app_config: &AppConfig) -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| app_config.get_database_url());

    if database_url.starts_with("sqlite:") && !database_url.contains(":memory:") {
        // Create data directory if not exists / 创建数据目录
        let data_dir = app_config.get_data_dir();
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir)?;
            tracing::info!("Created data directory: {:?}", data_dir);
        }
    }

    db::connect(&database_url, app_config.database.max_connections)
        .await
        .with_context(|| format!("Failed to connect to database {}", database_url))
}

async fn serve(app_config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Server will listen on {}", app_config.get_bind_address());

    let pool = open_pool(&app_config).await?;
    db::run_migrations(&pool).await?;

    let translator = Translator::new(RuleSet::standard()?);
    tracing::info!("Natural language translator ready with {} rules", translator.rules().len());
    tracing::debug!(
        "Translator rules: {:?}",
        translator.rules().iter().map(|r| r.name()).collect::<Vec<_>>()
    );

    let bind_addr = app_config.get_bind_address();
    let state = Arc::new(AppState::new(StringStore::new(pool), translator, app_config));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_db_action(app_config: &AppConfig, action: DbAction) -> anyhow::Result<()> {
    match action {
        DbAction::Init => {
            let pool = open_pool(app_config).await?;
            println!("Creating database tables...");
            db::run_migrations(&pool).await?;
            println!("✓ Database tables created successfully!");
        }
        DbAction::Reset { yes } => {
            println!("WARNING: This will delete all data!");
            if !yes && !confirm("Are you sure you want to reset the database? (yes/no): ")? {
                println!("Database reset cancelled.");
                return Ok(());
            }
            let pool = open_pool(app_config).await?;
            println!("Dropping existing tables...");
            db::drop_tables(&pool).await?;
            println!("Creating new tables...");
            db::run_migrations(&pool).await?;
            println!("✓ Database reset successfully!");
        }
        DbAction::Check => {
            let pool = open_pool(app_config).await?;
            match db::check_connection(&pool).await {
                Ok(()) => println!("✓ Database connection successful!"),
                Err(e) => {
                    println!("✗ Database connection failed: {}", e);
                    anyhow::bail!("database connection check failed");
                }
            }
        }
    }
    Ok(())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}
