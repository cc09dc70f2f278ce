use clap::Parser;
use log::{error, info};
use server::network::Server;
use shared::RoundConfig;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Tick rate (updates per second)
    #[clap(short, long, default_value = "60")]
    tick_rate: u32,
    /// Maximum number of connected peers
    #[clap(short, long, default_value = "16")]
    max_clients: usize,
    /// Seed for the round planner, for reproducible rounds
    #[clap(long)]
    seed: Option<u64>,
    /// Seconds allowed per turn
    #[clap(long, default_value = "5.0")]
    turn_seconds: f32,
    /// Fixed number of tokens dealt to each participant
    #[clap(long)]
    tokens_per_player: Option<u32>,
    /// Let the host machine take part, pressing with Enter
    #[clap(short, long)]
    local_player: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = RoundConfig {
        seed: args.seed,
        turn_seconds: args.turn_seconds,
        tokens_per_participant: args.tokens_per_player,
        ..RoundConfig::default()
    };
    let tick_duration = Duration::from_secs_f32(1.0 / args.tick_rate.max(1) as f32);
    let address = format!("{}:{}", args.host, args.port);

    let mut server = Server::new(&address, tick_duration, args.max_clients, config).await?;
    if args.local_player {
        server.enable_local_player();
    }

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
