use std::sync::Arc;

use reqwest::Client;

use crate::{
    common::{config::AppConfig, db::DbPool},
    orders::post_order::PostOrderQueue,
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub http_client: Client,
    pub config: Arc<AppConfig>,
    pub post_order: PostOrderQueue,
}
