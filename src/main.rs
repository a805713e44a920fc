//! EmojiApp binary entry point

use clap::Parser;
use emojiapp::cli::{self, Cli};
use emojiapp::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Parse arguments
/// 2. Load configuration from files and environment
/// 3. Initialize tracing/logging
/// 4. Initialize metrics and AppState
/// 5. Run the command
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse arguments
    let args = Cli::parse();

    // 2. Load configuration
    let config = config::AppConfig::load(args.config.as_deref())?;

    // 3. Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("emojiapp={}", config.logging.level).into());

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!(
        base_url = %config.github.base_url,
        database = %config.database.path.display(),
        "Configuration loaded"
    );

    // 4. Initialize metrics and application state
    emojiapp::metrics::init_metrics();
    let state = AppState::new(config).await?;

    // 5. Run the command
    let result = cli::execute(&state, args.command).await;
    if let Ok(output) = &result {
        print!("{}", output);
    }

    if args.metrics {
        println!("{}", emojiapp::metrics::render()?);
    }

    result.map(|_| ())
}
