use clap::Parser;
use client::connection::{parse_target, TerminalPrompt};
use client::input;
use client::rendering::Renderer;
use client::session::{ClientConfig, ClientSession};
use client::ClientError;
use log::{error, info, warn};
use macroquad::prelude::*;
use shared::ProtocolError;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to; asked on the terminal when omitted
    #[arg(short = 's', long)]
    server: Option<String>,

    /// Server port, used when the address carries none
    #[arg(short = 'p', long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Display name
    #[arg(short = 'n', long, default_value = "player")]
    name: String,

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
        window_title: "Puck Arena".to_owned(),
        window_width: args.width,
        window_height: args.height,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("Client stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let initial = args.server.as_deref().map(|server| {
        let mut info = parse_target(server, &args.name);
        if !server.contains(':') {
            info.port = args.port;
        }
        info
    });

    let mut prompt = TerminalPrompt::new(
        initial,
        args.name.clone(),
        std::io::stdin().lock(),
        std::io::stderr(),
    );
    let mut session = ClientSession::new(ClientConfig::default())?;
    let Some(player_id) = session.connect_with_retry(&mut prompt)? else {
        return Ok(());
    };

    info!("Controls: release W/A/S/D to steer, Escape to quit");
    info!("Playing as {} (player {})", args.name, player_id);

    prevent_quit();
    let mut renderer = Renderer::new();

    loop {
        let events = input::poll_events();
        if is_quit_requested() || input::quit_requested(&events) {
            break;
        }

        match session.frame(&events) {
            Ok(_) => {}
            Err(ClientError::Protocol(ProtocolError::ServerClosed)) => {
                warn!("Server went away");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        renderer.render(&session.scene());
        next_frame().await;
    }

    if session.is_connected() {
        session.disconnect()?;
    }
    Ok(())
}
