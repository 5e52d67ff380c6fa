//! # cosmea-client
//!
//! Client-side data layer of the Cosmea chat application: account, profile
//! and friend-graph access ([`services`]), server/channel aggregation into
//! observable state ([`viewmodels`]), and the signed-in session.

pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod state;
pub mod viewmodels;

use std::sync::Arc;

use cosmea_shared::constants::APP_NAME;
use cosmea_store::{Database, DocumentStore, MemoryStore, StoreError};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ClientConfig, StoreBackend};
use crate::error::OrAbsent;
use crate::services::{ChannelService, ServerService, UserService};
use crate::session::{Session, SessionError};
use crate::viewmodels::{ProfileViewModel, ServersViewModel};

pub use error::{DataError, Result};

/// Install the global `tracing` subscriber.  `RUST_LOG` overrides the
/// default filter.  Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cosmea_client=debug,cosmea_store=info,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Open the document store selected by `config`.
pub fn open_store(config: &ClientConfig) -> std::result::Result<Arc<dyn DocumentStore>, StoreError> {
    let store: Arc<dyn DocumentStore> = match config.store {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Sqlite => match &config.db_path {
            Some(path) => Arc::new(Database::open_at(path)?),
            None => Arc::new(Database::new()?),
        },
    };
    Ok(store)
}

/// Load the persisted session, or an in-memory one when no path resolves.
pub fn open_session(config: &ClientConfig) -> std::result::Result<Session, SessionError> {
    match config.resolved_session_path() {
        Some(path) => Session::load(&path),
        None => Ok(Session::in_memory()),
    }
}

/// Headless entry point: load the server list and the signed-in profile
/// and log what the screens would show.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting {} client v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    let store = open_store(&config)?;
    let session = open_session(&config)?;

    let servers = ServersViewModel::new(
        ServerService::new(store.clone()),
        ChannelService::new(store.clone()),
    );
    servers.load_all().await;

    for server in servers.servers().get() {
        let channels = servers
            .channels_by_server()
            .get()
            .get(&server.id)
            .map(|c| c.iter().flatten().count());
        info!(server_id = %server.id, name = %server.name, ?channels, "Server");
    }

    let users = UserService::new(store);
    let profile = ProfileViewModel::new(users.clone());
    profile.load(&session).await;

    match (session.current_user_id(), profile.profile().get()) {
        (Some(id), Some(p)) => {
            let pending = users
                .get_friend_requests(id)
                .await
                .or_absent("pending friends")
                .unwrap_or_default();
            info!(user_id = %id, display_name = %p.display_name, pending = pending.len(), "Signed in");
        }
        (Some(id), None) => info!(user_id = %id, "Signed in, profile unavailable"),
        (None, _) => info!("No user signed in"),
    }

    Ok(())
}
