use crate::error::AppError;
use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get};
use bitsync_core::{Client, NodeProvider};
use bitsync_types::repository::get_max_height;
use bitsync_types::DbPool;
use handler::{BlockApiModule, TransactionApiModule};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{openapi::Info, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub mod handler;

/// The mirror is unhealthy when it trails the node by more than this many
/// blocks.
const MAX_HEALTHY_LAG: i64 = 3;

#[derive(Clone, Debug)]
pub struct Config {
    pub db_client: Arc<DbPool>,
    pub node_client: Arc<Client>,
    pub api_host: String,
    pub api_port: u16,
}

impl Config {
    pub fn api_endpoint(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub node_client: Arc<Client>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

impl Pagination {
    pub fn get_limit(&self) -> i64 {
        match self.limit {
            Some(limit) if limit > 0 && limit <= MAX_PAGE_SIZE => limit,
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    pub fn get_offset(&self) -> i64 {
        match self.offset {
            Some(offset) if offset >= 0 => offset,
            _ => 0,
        }
    }
}

pub async fn start(config: Config) -> Result<()> {
    let state =
        AppState { db: config.db_client.clone(), node_client: config.node_client.clone() };

    let (app, mut api) = configure_api().with_state(state).split_for_parts();

    api.info = Info::new("REST API", "v1");
    api.info.description = Some("Bitsync Bitcoin mirror REST API".to_string());
    let app = app
        .layer(CorsLayer::permissive())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()));

    let addr = config.api_endpoint();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> &'static str {
    "Hello Bitsync API"
}

/// Read-only health: compares the node's tip against the stored frontier.
/// Never touches sync-loop state.
async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let remote_height = state
        .node_client
        .get_block_count()
        .await
        .map_err(|err| AppError::Internal(err.into()))?;
    let stored_height = get_max_height(&state.db).await?;

    stored_height.map_or(
        Err(AppError::Internal(anyhow::anyhow!("No block found in database"))),
        |height| {
            if remote_height - height > MAX_HEALTHY_LAG {
                Err(AppError::Internal(anyhow::anyhow!("Mirror is too far behind the node")))
            } else {
                Ok(())
            }
        },
    )
}

pub fn configure_api() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/v1/blocks", BlockApiModule::register())
        .nest("/v1/transactions", TransactionApiModule::register())
        .route("/", get(root))
        .route("/v1/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_limit() {
        assert_eq!(Pagination { limit: Some(50), offset: None }.get_limit(), 50);
        assert_eq!(Pagination { limit: Some(0), offset: None }.get_limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination { limit: Some(-5), offset: None }.get_limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination { limit: Some(500), offset: None }.get_limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(Pagination { limit: None, offset: None }.get_limit(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn pagination_clamps_offset() {
        assert_eq!(Pagination { limit: None, offset: Some(20) }.get_offset(), 20);
        assert_eq!(Pagination { limit: None, offset: Some(-1) }.get_offset(), 0);
        assert_eq!(Pagination { limit: None, offset: None }.get_offset(), 0);
    }
}
