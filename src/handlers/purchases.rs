use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthenticatedUser, errors::ApiError, handlers::AppState, queries::RecordFilter,
    services::purchases::RecordPurchaseCommand,
};
use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseRequest {
    pub base_id: Uuid,
    pub equipment_type_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(length(max = 200))]
    pub supplier: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Record a purchase and credit the receiving base
#[utoipa::path(
    post,
    path = "/api/v1/purchases",
    request_body = CreatePurchaseRequest,
    responses(
        (status = 201, description = "Purchase recorded", body = crate::entities::purchase::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Access denied", body = crate::errors::ErrorResponse)
    ),
    tag = "purchases"
)]
pub async fn create_purchase(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreatePurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let command = RecordPurchaseCommand {
        base_id: payload.base_id,
        equipment_type_id: payload.equipment_type_id,
        quantity: payload.quantity,
        supplier: payload.supplier,
        purchase_date: payload.purchase_date,
        notes: payload.notes,
    };

    let purchase = state
        .services
        .purchases
        .record_purchase(&user.actor(), command)
        .await
        .map_err(map_service_error)?;

    info!("Purchase recorded: {}", purchase.id);

    Ok(created_response(purchase))
}

/// List purchases visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/purchases",
    params(RecordFilter),
    responses(
        (status = 200, description = "Purchases fetched", body = Vec<crate::entities::purchase::Model>)
    ),
    tag = "purchases"
)]
pub async fn list_purchases(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<RecordFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let purchases = state
        .services
        .purchases
        .list_purchases(&user.actor(), &filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(purchases))
}
