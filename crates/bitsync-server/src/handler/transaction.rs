use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use bitsync_types::repository::{
    get_outputs_by_address, get_transaction_by_txid, get_transaction_inputs,
    get_transaction_outputs,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::error::AppError;
use crate::handler::dto::{
    InputDto, OutputDto, OutputsByAddressQuery, TransactionByTxidQuery, TransactionDto,
};
use crate::{AppState, Pagination};

pub struct TransactionApiModule;

impl TransactionApiModule {
    pub fn register() -> OpenApiRouter<crate::AppState> {
        OpenApiRouter::new()
            .routes(routes!(get_transaction_handler))
            .routes(routes!(get_transaction_inputs_handler))
            .routes(routes!(get_transaction_outputs_handler))
            .routes(routes!(get_outputs_by_address_handler))
    }
}

#[utoipa::path(
    get,
    path = "/txid",
    tag = "Transactions",
    params(TransactionByTxidQuery),
    responses(
        (status = 200, description = "Transaction retrieved successfully", body = TransactionDto),
        (status = 404, description = "Transaction not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_transaction_handler(
    Query(query): Query<TransactionByTxidQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let transaction_model = get_transaction_by_txid(&state.db, &query.txid).await?;
    match transaction_model {
        Some(transaction) => Ok(Json(TransactionDto::from(transaction))),
        None => Err(AppError::NotFound("Transaction not found".to_string())),
    }
}

#[utoipa::path(
    get,
    path = "/txid/inputs",
    tag = "Transactions",
    params(TransactionByTxidQuery),
    responses(
        (status = 200, description = "Transaction inputs retrieved successfully", body = Vec<InputDto>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_transaction_inputs_handler(
    Query(query): Query<TransactionByTxidQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let input_models = get_transaction_inputs(&state.db, &query.txid).await?;
    let inputs: Vec<InputDto> = input_models.into_iter().map(InputDto::from).collect();
    Ok(Json(inputs))
}

#[utoipa::path(
    get,
    path = "/txid/outputs",
    tag = "Transactions",
    params(TransactionByTxidQuery),
    responses(
        (status = 200, description = "Transaction outputs retrieved successfully", body = Vec<OutputDto>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_transaction_outputs_handler(
    Query(query): Query<TransactionByTxidQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let output_models = get_transaction_outputs(&state.db, &query.txid).await?;
    let outputs: Vec<OutputDto> = output_models.into_iter().map(OutputDto::from).collect();
    Ok(Json(outputs))
}

#[utoipa::path(
    get,
    path = "/outputs/address",
    tag = "Transactions",
    params(OutputsByAddressQuery),
    responses(
        (status = 200, description = "Outputs for address retrieved successfully", body = Vec<OutputDto>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_outputs_by_address_handler(
    Query(query): Query<OutputsByAddressQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination { limit: query.limit, offset: query.offset };
    let output_models = get_outputs_by_address(
        &state.db,
        &query.address,
        pagination.get_limit(),
        pagination.get_offset(),
    )
    .await?;
    let outputs: Vec<OutputDto> = output_models.into_iter().map(OutputDto::from).collect();
    Ok(Json(outputs))
}
