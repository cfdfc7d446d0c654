use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use storefront_orderservice::{
    common::{app_state::AppState, bootstrap, config, db, swagger},
    orders::{
        effects::StoreEffects,
        post_order::{self, PostOrderQueue},
    },
    routes,
};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    bootstrap::init_tracing();
    let config = config::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let db_pool = db::create_pool(&config.database).await?;
    let http_client = reqwest::Client::new();

    let (post_order, post_order_rx) = PostOrderQueue::channel();
    let effects = Arc::new(StoreEffects::new(
        db_pool.clone(),
        http_client.clone(),
        config.services.file_service_url.clone(),
    ));
    tokio::spawn(post_order::run_worker(
        post_order_rx,
        effects,
        config.ordering.post_order_task_timeout,
    ));

    let routes = routes::orders::routes_with_openapi()
        .merge(routes::payments::routes_with_openapi())
        .merge(routes::customers::carts::routes_with_openapi())
        .merge(routes::customers::orders::routes_with_openapi());

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Storefront OrderService API")
        .version("1.0.0")
        .build();
    let swagger_ui = swagger::create_swagger_ui(openapi)?;

    let server_config = config.server.clone();
    let state = AppState {
        db_pool,
        http_client,
        config: Arc::new(config),
        post_order,
    };

    let app = Router::new()
        .merge(routes)
        .merge(swagger_ui)
        .with_state(state);

    tracing::info!("Bootstrapping...");
    bootstrap::serve("OrderService", app, &server_config).await
}
