use clap::Parser;
use poly_hourly::cli::{Cli, Commands};
use poly_hourly::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = if std::path::Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        eprintln!("Warning: Config file {} not found", cli.config);
        eprintln!("Using default configuration");
        Config::default()
    };

    // Initialize telemetry
    poly_hourly::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!(symbol = %config.feed.symbol, "Starting hourly signal engine");
            args.execute(config).await?;
        }
        Commands::Status(args) => {
            args.execute(config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Feed: {} (reference {}), stale after {}s",
                config.feed.symbol, config.feed.reference_symbol, config.feed.stale_after_secs
            );
            println!(
                "  Market: {} [{}]",
                config.odds.slug_prefix, config.odds.timezone
            );
            println!(
                "  Window: from minute {}, skip hours {:?}",
                config.window.entry_window_start_minute, config.window.skip_hours
            );
            println!(
                "  Scoring: alert >= {}, good odds < {}, max buy odds {}, mode {:?}",
                config.scoring.alert_min_score,
                config.scoring.good_odds,
                config.scoring.max_buy_odds,
                config.scoring.direction_mode
            );
            println!(
                "  Exits: reversal ${}, reference ${}, take profit < {}, stop loss > {}",
                config.exit.price_reversal_usd,
                config.exit.reference_reversal_usd,
                config.exit.take_profit_odds,
                config.exit.stop_loss_odds
            );
            println!(
                "  Notify: {}",
                if config.notify.webhook_url.is_some() { "webhook" } else { "log only" }
            );
        }
        Commands::Slug(args) => {
            args.execute(&config)?;
        }
    }

    Ok(())
}
