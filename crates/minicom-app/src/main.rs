use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use minicom_app::{
    commands::{execute, Command, Outcome, ParseError},
    config::Config,
    render,
    state::AppState,
};
use minicom_chat::NetworkStatus;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Minicom");
    tracing::info!(
        "Storage: {:?} at {}",
        config.storage.backend,
        config.storage.directory
    );

    let state = AppState::new(config).await?;
    spawn_offline_banner(&state.network);

    println!("{}", render::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(ParseError::Empty) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match execute(&state, command).await {
            Ok(Outcome::Lines(output)) => {
                for line in output {
                    println!("{}", line);
                }
            }
            Ok(Outcome::Pending(pending)) => {
                println!("{}", render::message_line(pending.message()));
                tokio::spawn(async move {
                    if let Some(message) = pending.confirmed().await {
                        println!("{}", render::message_line(&message));
                    }
                });
            }
            Ok(Outcome::Quit) => break,
            Err(e) => {
                tracing::error!("Command failed: {:#}", e);
                println!("{}", e);
                println!("{}", render::FAULT_NOTICE);
            }
        }
    }

    state.shutdown();
    tracing::info!("Minicom stopped");
    Ok(())
}

fn spawn_offline_banner(network: &NetworkStatus) {
    let mut status = network.subscribe();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let online = *status.borrow_and_update();
            if online {
                println!("{}", render::BACK_ONLINE_NOTICE);
            } else {
                println!("{}", render::OFFLINE_NOTICE);
            }
        }
    });
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
