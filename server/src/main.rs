use clap::Parser;
use log::info;
use server::config::{Args, ServerConfig};
use server::network::Server;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig::from(args);

    let mut server = Server::new(config)?;
    let addr = server.local_addr();
    info!("Server is running, ip: {}, port: {}", addr.ip(), addr.port());

    server.run().await?;
    Ok(())
}
