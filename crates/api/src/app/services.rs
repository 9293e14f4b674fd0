//! Runtime wiring: storage backends and the session codec.

use std::sync::Arc;

use chrono::Duration;

use stockroom_auth::SessionCodec;
use stockroom_infra::{AppConfig, InMemoryStore, InventoryStore, PostgresStore, StoreConfig, UserStore};

/// Shared handles every handler needs.
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<dyn InventoryStore>,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<SessionCodec>,
}

impl AppServices {
    /// Non-persistent services, used when no database is configured and in tests.
    pub fn in_memory(session_secret: &str, session_ttl: Duration) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            inventory: store.clone(),
            users: store,
            sessions: Arc::new(SessionCodec::new(session_secret.as_bytes(), session_ttl)),
        }
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let ttl = Duration::minutes(config.session_ttl_minutes);

    match &config.store {
        StoreConfig::InMemory => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
            Ok(AppServices::in_memory(&config.session_secret, ttl))
        }
        StoreConfig::Postgres { url, max_connections } => {
            let store = Arc::new(PostgresStore::connect(url, *max_connections).await?);
            tracing::info!(max_connections, "connected to postgres");
            Ok(AppServices {
                inventory: store.clone(),
                users: store,
                sessions: Arc::new(SessionCodec::new(config.session_secret.as_bytes(), ttl)),
            })
        }
    }
}
