use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::api::handlers::{showcases, storefront, type_hints};
use crate::db::queries::seed::seed_system_hints;
use crate::db::{close_pool, init_pool};
use crate::domain::cache::HintCache;
use crate::domain::strategy::SelectionThresholds;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub hints: Arc<HintCache>,
    pub thresholds: Arc<SelectionThresholds>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        AppState {
            pool,
            hints: Arc::new(HintCache::default()),
            thresholds: Arc::new(SelectionThresholds::default()),
        }
    }
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(false)
                .with_span_events(fmt::format::FmtSpan::CLOSE),
        )
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=info,hyper=warn,tower=warn,h2=error")),
        )
        .init();
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Storefront surface
        .route(
            "/storefront/showcases",
            get(storefront::get_showcases_handler),
        )
        .route("/storefront/search", get(storefront::search_handler))
        // Admin: type hint registry
        .route(
            "/admin/type-hints",
            get(type_hints::list_handler).post(type_hints::create_handler),
        )
        .route(
            "/admin/type-hints/{key}",
            get(type_hints::get_handler)
                .put(type_hints::update_handler)
                .delete(type_hints::delete_handler),
        )
        .route(
            "/admin/type-hints/{key}/activate",
            post(type_hints::activate_handler),
        )
        .route(
            "/admin/type-hints/{key}/deactivate",
            post(type_hints::deactivate_handler),
        )
        .route(
            "/admin/type-hints/{key}/restore",
            post(type_hints::restore_handler),
        )
        // Admin: showcases
        .route(
            "/admin/showcases",
            get(showcases::list_handler).post(showcases::create_handler),
        )
        .route(
            "/admin/showcases/{id}",
            put(showcases::update_handler).delete(showcases::delete_handler),
        )
        .route(
            "/admin/showcases/{id}/activate",
            post(showcases::activate_handler),
        )
        .route(
            "/admin/showcases/{id}/deactivate",
            post(showcases::deactivate_handler),
        )
        // Health check endpoint
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("Starting storefront ranker server");

    // Set up ctrl-c handler for graceful shutdown
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
        info!("Shutting down gracefully...");
    };

    let pool = init_pool().await?;

    // The built-in hints and their showcases must exist before the
    // storefront takes traffic
    seed_system_hints(&pool).await?;

    let app = create_app(AppState::new(pool));

    let port = env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    close_pool().await?;

    Ok(())
}
