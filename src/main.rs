use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planner::{bot, config, health, telegram};
use planner_core::db::Database;

#[derive(Parser)]
#[command(name = "planner")]
#[command(about = "Telegram to-do list bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (long polling)
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "planner=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        // Default: start the bot
        Some(Commands::Serve) | None => serve().await,
    }
}

async fn serve() -> anyhow::Result<()> {
    let config = config::Config::from_env()?;

    let db = match &config.db_path {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;

    let _health = health::spawn(db.clone());

    let api = telegram::Api::new(&config.token)?;
    let bot = bot::Bot::new(api, db);
    bot.run().await
}
