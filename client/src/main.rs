use clap::Parser;
use client::game::ClientGameState;
use client::hud::Hud;
use client::input::InputManager;
use client::network::{NetworkClient, NetworkEvent};
use log::{error, info};
use macroquad::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: i32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: i32,
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "Turn Sync".to_string(),
        window_width: args.width,
        window_height: args.height,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Starting client...");
    info!("Controls: Space or left click when your number is up");

    let mut network = match NetworkClient::spawn(args.server.clone()) {
        Ok(network) => network,
        Err(e) => {
            error!("Failed to start network thread: {}", e);
            return;
        }
    };

    let mut game = ClientGameState::new();
    let mut input = InputManager::new();
    let mut hud = Hud::new(args.width as f32, args.height as f32);

    loop {
        let dt = get_frame_time();

        for event in network.poll() {
            match event {
                NetworkEvent::Received(packet) => game.handle_packet(packet, &mut hud),
                NetworkEvent::Closed(reason) => game.connection_lost(reason),
            }
        }

        game.update(dt);
        hud.update(dt);

        if input.update() {
            if let Some(packet) = game.press() {
                network.send(packet);
            }
        }

        game.render(&mut hud);
        hud.draw(game.status());

        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        next_frame().await;
    }

    network.disconnect();
}
