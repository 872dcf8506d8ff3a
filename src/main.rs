//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use dotenv::dotenv;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vote_sync::adapters::graphql::GraphqlStore;
use vote_sync::adapters::notify::LogNotifier;
use vote_sync::adapters::persistence::{MemoryStore, SqliteStore, seed_demo};
use vote_sync::adapters::session::LocalSession;
use vote_sync::adapters::ui::{SpinnerNotifier, tui::TuiInputPort};
use vote_sync::ports::{
    ChangeFeed, CommunityPort, InputPort, MutationPort, NotifierPort, PostReader,
};
use vote_sync::shared::config::{AppConfig, BackendKind, DEFAULT_LOG_FILTER};

/// The three store-facing ports, all served by one backend instance.
struct Backend {
    reader: Arc<dyn PostReader>,
    mutations: Arc<dyn MutationPort>,
    changes: Arc<dyn ChangeFeed>,
}

impl Backend {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: PostReader + MutationPort + ChangeFeed + 'static,
    {
        Self {
            reader: Arc::clone(&store) as Arc<dyn PostReader>,
            mutations: Arc::clone(&store) as Arc<dyn MutationPort>,
            changes: store as Arc<dyn ChangeFeed>,
        }
    }
}

async fn seed_if_enabled<S>(store: &S, enabled: bool) -> anyhow::Result<()>
where
    S: CommunityPort + MutationPort + PostReader,
{
    if enabled {
        seed_demo(store)
            .await
            .map_err(|e| anyhow::anyhow!("seeding demo content failed: {}", e))?;
    }
    Ok(())
}

async fn build_backend(cfg: &AppConfig) -> anyhow::Result<Backend> {
    let seed = cfg.seed_demo_or_default();
    match cfg.backend_or_default() {
        BackendKind::Memory => {
            info!("using in-memory store");
            let store = Arc::new(MemoryStore::new());
            seed_if_enabled(store.as_ref(), seed).await?;
            Ok(Backend::from_store(store))
        }
        BackendKind::Sqlite => {
            let data_path = PathBuf::from(cfg.data_dir_or_default());
            let data_dir_abs = data_path
                .canonicalize()
                .unwrap_or_else(|_| data_path.clone());
            info!(path = %data_dir_abs.display(), "using SQLite store");
            let store = Arc::new(
                SqliteStore::connect(&data_path)
                    .await
                    .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
            );
            seed_if_enabled(store.as_ref(), seed).await?;
            Ok(Backend::from_store(store))
        }
        BackendKind::Graphql => {
            let url = cfg.graphql_url().map_err(|e| anyhow::anyhow!("{}", e))?;
            if cfg.graphql_api_key().is_none() {
                warn!("VOTE_SYNC_GRAPHQL_API_KEY not set, sending unauthenticated requests");
            }
            let store = Arc::new(GraphqlStore::new(url, cfg.graphql_api_key()));
            info!(endpoint = %store.endpoint(), "using GraphQL backend");
            if seed {
                warn!("demo seeding is not supported for the GraphQL backend; skipping");
            }
            Ok(Backend::from_store(store))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config not loaded, using defaults");
            AppConfig::default()
        }
    };

    let backend = build_backend(&cfg).await?;

    // --- Session: identity is injected, never derived inside the core ---
    let session = Arc::new(LocalSession::new(cfg.identity()));
    let notifier: Arc<dyn NotifierPort> = if std::io::stdout().is_terminal() {
        Arc::new(SpinnerNotifier::new())
    } else {
        Arc::new(LogNotifier)
    };

    vote_sync::adapters::ui::init_ui();

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        backend.reader,
        backend.mutations,
        backend.changes,
        notifier,
        session,
        cfg.top_communities_or_default(),
    ));

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
