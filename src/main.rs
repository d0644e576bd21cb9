use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sessions_backend::{
    config::{get_config, init_config},
    database::{memory::MemoryUserStore, pool::create_pool, postgres::PgUserStore, store::UserStore},
    router, AppState,
};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sessions-backend", version, about = "User account service")]
struct Cli {
    /// Execute a single JSON request, print the response and exit.
    #[arg(long)]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();
    init_config()?;
    let config = get_config();

    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => {
            let store = PgUserStore::new(create_pool(url).await?);
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, accounts are kept in memory only");
            Arc::new(MemoryUserStore::new())
        }
    };

    let app_state = AppState::new(store, config);

    let (version, result) = app_state
        .api
        .handle_json(r#"{"method":"get_database_version"}"#)
        .await;
    result?;
    debug!("Database version: {}", version.message.unwrap_or_default());

    if let Some(query) = cli.query {
        let (response, result) = app_state.api.handle_json(&query).await;
        println!("{}", response.marshal()?);
        result?;
        return Ok(());
    }

    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN not set, only public methods are reachable over HTTP");
    }

    {
        let cache = app_state.api.cache().clone();
        let period = Duration::from_secs(config.cache_sweep_secs.max(1));
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                let purged = cache.purge_expired();
                if purged > 0 {
                    debug!(purged, remaining = cache.len(), "swept credential cache");
                }
            }
        });
    }

    let app = router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
