use super::common::{map_service_error, success_response};
use crate::{
    auth::AuthenticatedUser, errors::ApiError, handlers::AppState, queries::RecordFilter,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

/// List balance snapshots visible to the caller.
///
/// These are unlocked reads for dashboards and may trail in-flight ledger
/// transactions; mutation decisions never go through this endpoint.
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(RecordFilter),
    responses(
        (status = 200, description = "Balances fetched", body = Vec<crate::entities::inventory_balance::Model>)
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<RecordFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let balances = state
        .services
        .inventory
        .list_balances(&user.actor(), &filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(balances))
}

/// Get the balance snapshot for one (base, equipment type) pair
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{base_id}/{equipment_type_id}",
    params(
        ("base_id" = Uuid, Path, description = "Base ID"),
        ("equipment_type_id" = Uuid, Path, description = "Equipment type ID")
    ),
    responses(
        (status = 200, description = "Balance fetched", body = crate::entities::inventory_balance::Model),
        (status = 404, description = "No balance for this pair", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_balance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((base_id, equipment_type_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    if !user.is_admin() && user.base_id != Some(base_id) {
        return Err(ApiError::ServiceError(crate::errors::ServiceError::Forbidden(
            "Access denied to this base".to_string(),
        )));
    }

    let balance = state
        .services
        .inventory
        .get_balance(base_id, equipment_type_id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No balance for base {} and equipment type {}",
                base_id, equipment_type_id
            ))
        })?;

    Ok(success_response(balance))
}
