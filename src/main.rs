use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use argon2::Argon2;
use clap::Parser;
use log::{info, warn};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod objects;
mod schema;
mod services;
mod store;
mod throttle;
mod utils;

use config::{Config, ConfigBuilder};
use error::Error;
use store::{MemoryStore, PgStore, Store};
use throttle::Throttle;

const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

/// Social networking backend: accounts, sessions and friend requests
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = String::from("/etc/social-backend/config.toml"))]
    config: String,
}

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub argon2: Argon2<'static>,
    pub send_throttle: Throttle,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config, argon2: Argon2<'static>) -> Self {
        let send_throttle = Throttle::per_minute(config.throttle.send_request_per_minute);

        Self {
            store,
            argon2,
            send_throttle,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!(
        "starting social-backend {} ({})",
        VERSION.unwrap_or("UNKNOWN"),
        env!("GIT_SHORT_HASH")
    );

    let config = ConfigBuilder::load(args.config).await?.build();

    let store: Arc<dyn Store> = match &config.database {
        Some(database) => {
            info!("connecting to postgres");
            Arc::new(PgStore::connect(database.url()).await?)
        }
        None => {
            warn!("no [database] configured, all data is kept in memory and lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let address = SocketAddr::new(config.web.ip.parse::<IpAddr>()?, config.web.port);

    let app_state = Arc::new(AppState::new(store, &config, Argon2::default()));

    let app = api::router(app_state.clone())
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(address).await?;

    info!("listening on {address}");

    axum::serve(listener, app).await?;

    Ok(())
}
