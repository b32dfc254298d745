use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newswire::app::AppContext;
use newswire::cli::{commands, Cli, Commands, DaemonAction};
use newswire::config::Config;
use newswire::daemon::{self, Daemon, DaemonConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Daemon stop/status don't need a database or feed client.
    if let Commands::Daemon { ref action } = cli.command {
        match action {
            DaemonAction::Stop => {
                match daemon::stop_daemon() {
                    Ok(()) => println!("Daemon stopped"),
                    Err(e) => eprintln!("{}", e),
                }
                return Ok(());
            }
            DaemonAction::Status => {
                println!("{}", daemon::daemon_status());
                return Ok(());
            }
            DaemonAction::Start { .. } => {}
        }
    }

    let config = Config::load()?;
    let ctx = AppContext::new(config, cli.db)?;

    match cli.command {
        Commands::Fetch {
            category,
            lang,
            max,
        } => {
            commands::fetch(&ctx, category, lang, max).await?;
        }
        Commands::Resync {
            category,
            lang,
            max,
        } => {
            commands::resync(&ctx, category, lang, max).await?;
        }
        Commands::List {
            limit,
            offset,
            language,
            order_by,
            asc,
        } => {
            commands::list(&ctx, limit, offset, language, &order_by, asc)?;
        }
        Commands::Show { id } => {
            commands::show(&ctx, &id)?;
        }
        Commands::Search {
            query,
            lang,
            max,
            page,
        } => {
            commands::search(&ctx, &query, lang, max, page).await?;
        }
        Commands::Daemon { action } => {
            if let DaemonAction::Start {
                interval,
                no_initial_run,
                log,
            } = action
            {
                let interval_secs = DaemonConfig::parse_interval(&interval)
                    .map_err(|e| anyhow::anyhow!(e))?;
                let daemon = Daemon::new(
                    Arc::new(ctx),
                    DaemonConfig {
                        interval_secs,
                        run_on_start: !no_initial_run,
                        log_file: log,
                    },
                );
                daemon.run().await?;
            }
        }
    }

    Ok(())
}
