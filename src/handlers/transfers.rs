use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::{policy::TransferDecision, AuthenticatedUser},
    errors::ApiError,
    handlers::AppState,
    queries::RecordFilter,
    services::transfers::InitiateTransferCommand,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTransferRequest {
    pub from_base_id: Uuid,
    pub to_base_id: Uuid,
    pub equipment_type_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Initiate a transfer, debiting the source base immediately
#[utoipa::path(
    post,
    path = "/api/v1/transfers",
    request_body = CreateTransferRequest,
    responses(
        (status = 201, description = "Transfer initiated", body = crate::entities::transfer::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Access denied", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient inventory", body = crate::errors::ErrorResponse)
    ),
    tag = "transfers"
)]
pub async fn create_transfer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let command = InitiateTransferCommand {
        from_base_id: payload.from_base_id,
        to_base_id: payload.to_base_id,
        equipment_type_id: payload.equipment_type_id,
        quantity: payload.quantity,
        notes: payload.notes,
    };

    let transfer = state
        .services
        .transfers
        .initiate_transfer(&user.actor(), command)
        .await
        .map_err(map_service_error)?;

    info!("Transfer initiated: {}", transfer.id);

    Ok(created_response(transfer))
}

/// Get a transfer by ID
#[utoipa::path(
    get,
    path = "/api/v1/transfers/{id}",
    params(("id" = Uuid, Path, description = "Transfer ID")),
    responses(
        (status = 200, description = "Transfer fetched", body = crate::entities::transfer::Model),
        (status = 404, description = "Transfer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "transfers"
)]
pub async fn get_transfer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let transfer = state
        .services
        .transfers
        .get_transfer(&user.actor(), id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(transfer))
}

/// Complete a pending transfer, crediting the destination base
#[utoipa::path(
    post,
    path = "/api/v1/transfers/{id}/complete",
    params(("id" = Uuid, Path, description = "Transfer ID")),
    responses(
        (status = 200, description = "Transfer completed", body = crate::entities::transfer::Model),
        (status = 400, description = "Transfer is not pending", body = crate::errors::ErrorResponse),
        (status = 403, description = "Access denied", body = crate::errors::ErrorResponse),
        (status = 404, description = "Transfer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "transfers"
)]
pub async fn complete_transfer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let transfer = state
        .services
        .transfers
        .finalize_transfer(&user.actor(), id, TransferDecision::Complete)
        .await
        .map_err(map_service_error)?;

    info!("Transfer completed: {}", transfer.id);

    Ok(success_response(transfer))
}

/// Cancel a pending transfer, refunding the source base
#[utoipa::path(
    post,
    path = "/api/v1/transfers/{id}/cancel",
    params(("id" = Uuid, Path, description = "Transfer ID")),
    responses(
        (status = 200, description = "Transfer cancelled", body = crate::entities::transfer::Model),
        (status = 400, description = "Transfer is not pending", body = crate::errors::ErrorResponse),
        (status = 403, description = "Access denied", body = crate::errors::ErrorResponse),
        (status = 404, description = "Transfer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "transfers"
)]
pub async fn cancel_transfer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let transfer = state
        .services
        .transfers
        .finalize_transfer(&user.actor(), id, TransferDecision::Cancel)
        .await
        .map_err(map_service_error)?;

    info!("Transfer cancelled: {}", transfer.id);

    Ok(success_response(transfer))
}

/// List transfers where the caller's base is either endpoint
#[utoipa::path(
    get,
    path = "/api/v1/transfers",
    params(RecordFilter),
    responses(
        (status = 200, description = "Transfers fetched", body = Vec<crate::entities::transfer::Model>)
    ),
    tag = "transfers"
)]
pub async fn list_transfers(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<RecordFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let transfers = state
        .services
        .transfers
        .list_transfers(&user.actor(), &filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(transfers))
}
