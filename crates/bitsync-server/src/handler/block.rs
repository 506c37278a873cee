use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use bitsync_types::repository::{
    get_block_by_hash, get_block_by_height, get_block_transactions, get_blocks,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::error::AppError;
use crate::handler::dto::{
    parse_order, BlockByHashQuery, BlockByHeightQuery, BlockDto, BlocksQuery, TransactionDto,
};
use crate::{AppState, Pagination};

pub struct BlockApiModule;

impl BlockApiModule {
    pub fn register() -> OpenApiRouter<crate::AppState> {
        OpenApiRouter::new()
            .routes(routes!(get_blocks_handler))
            .routes(routes!(get_block_by_hash_handler))
            .routes(routes!(get_block_by_height_handler))
            .routes(routes!(get_block_transactions_handler))
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Blocks",
    params(BlocksQuery),
    responses(
        (status = 200, description = "List of blocks retrieved successfully", body = Vec<BlockDto>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_blocks_handler(
    Query(query): Query<BlocksQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination { limit: query.limit, offset: query.offset };
    let block_models = get_blocks(
        &state.db,
        pagination.get_limit(),
        pagination.get_offset(),
        Some(parse_order(query.order.as_deref())),
    )
    .await?;
    let blocks: Vec<BlockDto> = block_models.into_iter().map(BlockDto::from).collect();
    Ok(Json(blocks))
}

#[utoipa::path(
    get,
    path = "/hash",
    tag = "Blocks",
    params(BlockByHashQuery),
    responses(
        (status = 200, description = "Block retrieved successfully", body = BlockDto),
        (status = 404, description = "Block not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_block_by_hash_handler(
    Query(query): Query<BlockByHashQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let block_model = get_block_by_hash(&state.db, &query.hash).await?;
    match block_model {
        Some(block) => Ok(Json(BlockDto::from(block))),
        None => Err(AppError::NotFound("Block not found".to_string())),
    }
}

#[utoipa::path(
    get,
    path = "/height",
    tag = "Blocks",
    params(BlockByHeightQuery),
    responses(
        (status = 200, description = "Block retrieved successfully", body = BlockDto),
        (status = 404, description = "Block not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_block_by_height_handler(
    Query(query): Query<BlockByHeightQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let block_model = get_block_by_height(&state.db, query.height).await?;
    match block_model {
        Some(block) => Ok(Json(BlockDto::from(block))),
        None => Err(AppError::NotFound("Block not found".to_string())),
    }
}

#[utoipa::path(
    get,
    path = "/transactions",
    tag = "Blocks",
    params(BlockByHashQuery),
    responses(
        (status = 200, description = "Block transactions retrieved successfully", body = Vec<TransactionDto>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_block_transactions_handler(
    Query(query): Query<BlockByHashQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let transaction_models = get_block_transactions(&state.db, &query.hash).await?;
    let transactions: Vec<TransactionDto> =
        transaction_models.into_iter().map(TransactionDto::from).collect();
    Ok(Json(transactions))
}
