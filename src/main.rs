use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use spott_feed::config::Settings;
use spott_feed::core::EventFeed;
use spott_feed::routes::{self, AppState};
use spott_feed::services::{
    AppwriteClient, AppwriteCollections, EventStore, MemoryEventStore, TokenIdentityResolver,
    TokenVerifier,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn startup_error<E: std::fmt::Display>(context: &str, err: E) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            init_logging("info", "compact");
            return Err(startup_error("Configuration error", e));
        }
    };

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting Spott feed service...");

    let appwrite = Arc::new(
        AppwriteClient::new(
            settings.appwrite.endpoint.clone(),
            settings.appwrite.api_key.clone(),
            settings.appwrite.project_id.clone(),
            settings.appwrite.database_id.clone(),
            AppwriteCollections {
                events: settings.collection.events.clone(),
                users: settings.collection.users.clone(),
            },
        )
        .map_err(|e| startup_error("Failed to build Appwrite client", e))?
        .with_page_size(
            settings
                .appwrite
                .page_size
                .unwrap_or(spott_feed::services::appwrite::DEFAULT_PAGE_SIZE),
        ),
    );

    info!("Appwrite client initialized");

    let event_store: Arc<dyn EventStore> = match &settings.feed.seed_file {
        Some(path) => {
            info!("Serving events from seed file {}", path);
            Arc::new(
                MemoryEventStore::from_json_file(path)
                    .map_err(|e| startup_error("Failed to load seed file", e))?,
            )
        }
        None => appwrite.clone(),
    };

    let verifier = TokenVerifier::from_settings(
        settings.identity.jwt_public_key_pem.as_deref(),
        settings.identity.jwt_secret.as_deref(),
        settings.identity.issuer.as_deref(),
        settings.identity.audience.as_deref(),
    )
    .map_err(|e| startup_error("Invalid identity settings", e))?;

    let cache_size = settings.identity.cache_size.unwrap_or(1000);
    let cache_ttl = settings.identity.cache_ttl_secs.unwrap_or(60);
    let identity = Arc::new(TokenIdentityResolver::new(
        verifier,
        appwrite,
        cache_size,
        cache_ttl,
    ));

    info!("Identity resolver initialized (cache: {} entries, TTL: {}s)", cache_size, cache_ttl);

    let limits = settings.feed_limits();
    let feed = EventFeed::new(event_store, identity, limits);

    info!("Feed initialized with limits: {:?}", limits);

    let app_state = AppState { feed };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
