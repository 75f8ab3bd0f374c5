use std::sync::Arc;

use {
    clap::Parser,
    secrecy::SecretString,
    sqlx::sqlite::SqliteConnectOptions,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use arkive_router::{Outbound, Processor, Router};

#[derive(Parser)]
#[command(name = "arkive", about = "Arkive — Telegram note archive bot")]
struct Cli {
    /// Telegram bot token.
    #[arg(long, env = "ARKIVE_BOT_TOKEN", hide_env_values = true)]
    token: String,

    /// Telegram user id allowed on the admin panel (0 disables it).
    #[arg(long, env = "ARKIVE_ADMIN_ID", default_value_t = 0)]
    admin_id: i64,

    /// Path to the SQLite database file.
    #[arg(long, env = "ARKIVE_DB", default_value = "arkive.db")]
    db: std::path::PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    let options = SqliteConnectOptions::new().filename(&cli.db).create_if_missing(true);
    let pool = sqlx::SqlitePool::connect_with(options).await?;
    arkive_store::run_migrations(&pool).await?;
    info!(db = %cli.db.display(), "database ready");

    let token = SecretString::new(cli.token.clone());
    let admin_id = cli.admin_id;
    let cancel = arkive_telegram::start_polling(&token, move |outbound| {
        let outbound: Arc<dyn Outbound> = outbound;
        Router::new(Processor::sqlite(pool), outbound, admin_id)
    })
    .await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            cancel.cancel();
        },
        () = cancel.cancelled() => {},
    }
    Ok(())
}
