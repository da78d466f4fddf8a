use pos_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Set up environment (dotenv, logging)
    setup_environment();

    tracing::info!("POS inventory server starting...");

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize server state (store, cache warm-up)
    let state = ServerState::initialize(&config).await?;

    // 4. Run the HTTP server (starts background tasks)
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
