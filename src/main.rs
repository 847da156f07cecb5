use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use yabonse_dispatch::config::{LoggingSettings, Settings, StoreBackend};
use yabonse_dispatch::routes::{self, AppState};
use yabonse_dispatch::services::{AppwriteClient, DocumentStore, MemoryStore, StoreError};

/// Initialize logging; `RUST_LOG` takes precedence over the configured level
fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "compact" => subscriber.compact().init(),
        _ => subscriber.json().init(),
    }
}

fn build_appwrite(settings: &Settings) -> Result<AppwriteClient, StoreError> {
    let appwrite = settings
        .appwrite
        .clone()
        .ok_or_else(|| StoreError::Unavailable("missing [appwrite] configuration".to_string()))?;

    AppwriteClient::new(
        appwrite.endpoint,
        appwrite.api_key,
        appwrite.project_id,
        appwrite.database_id,
        appwrite.collections.into(),
    )
}

fn build_memory(settings: &Settings) -> Result<MemoryStore, StoreError> {
    match &settings.store.seed_path {
        Some(path) => MemoryStore::from_seed_file(path),
        None => Ok(MemoryStore::new()),
    }
}

async fn serve<S: DocumentStore>(store: Arc<S>, settings: Settings) -> std::io::Result<()> {
    let policy = settings.matching.policy();
    info!("Matcher initialized with policy: {:?}", policy);

    let state = web::Data::new(AppState::new(
        store,
        policy,
        settings.matching.request_timeout(),
    ));

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(state.clone())
            .app_data(routes::json_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes::<S>)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();
    init_logging(&logging);

    info!("Starting Yabonse dispatch service...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::other(e)
    })?;

    info!("Configuration loaded successfully");

    // One store per process, shared by every worker through `AppState`
    match settings.store.backend {
        StoreBackend::Appwrite => {
            let store = build_appwrite(&settings).map_err(|e| {
                error!("Failed to initialize Appwrite client: {}", e);
                std::io::Error::other(e)
            })?;
            info!("Appwrite client initialized");
            serve(Arc::new(store), settings).await
        }
        StoreBackend::Memory => {
            let store = build_memory(&settings).map_err(|e| {
                error!("Failed to initialize memory store: {}", e);
                std::io::Error::other(e)
            })?;
            info!("Memory store initialized");
            serve(Arc::new(store), settings).await
        }
    }
}
