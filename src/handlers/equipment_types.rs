use super::common::{created_response, map_service_error, success_response};
use crate::{
    auth::AuthenticatedUser, errors::ApiError, handlers::AppState,
    services::equipment_types::CreateEquipmentTypeCommand,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateEquipmentTypeRequest {
    pub name: String,
    pub category: String,
    pub unit: String,
}

/// List all equipment types
#[utoipa::path(
    get,
    path = "/api/v1/equipment-types",
    responses(
        (status = 200, description = "Equipment types fetched", body = Vec<crate::entities::equipment_type::Model>)
    ),
    tag = "equipment-types"
)]
pub async fn list_equipment_types(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let types = state
        .services
        .equipment_types
        .list_equipment_types()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(types))
}

/// Get an equipment type by ID
#[utoipa::path(
    get,
    path = "/api/v1/equipment-types/{id}",
    params(("id" = Uuid, Path, description = "Equipment type ID")),
    responses(
        (status = 200, description = "Equipment type fetched", body = crate::entities::equipment_type::Model),
        (status = 404, description = "Equipment type not found", body = crate::errors::ErrorResponse)
    ),
    tag = "equipment-types"
)]
pub async fn get_equipment_type(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let equipment_type = state
        .services
        .equipment_types
        .get_equipment_type(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(equipment_type))
}

/// Create a new equipment type (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/equipment-types",
    request_body = CreateEquipmentTypeRequest,
    responses(
        (status = 201, description = "Equipment type created", body = crate::entities::equipment_type::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "equipment-types"
)]
pub async fn create_equipment_type(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateEquipmentTypeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateEquipmentTypeCommand {
        name: payload.name,
        category: payload.category,
        unit: payload.unit,
    };

    let equipment_type = state
        .services
        .equipment_types
        .create_equipment_type(&user.actor(), command)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(equipment_type))
}
