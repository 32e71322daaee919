use super::common::{created_response, map_service_error, no_content_response, success_response};
use crate::{
    auth::AuthenticatedUser,
    errors::ApiError,
    handlers::AppState,
    services::bases::{CreateBaseCommand, UpdateBaseCommand},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateBaseRequest {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateBaseRequest {
    pub name: Option<String>,
    pub location: Option<String>,
}

/// List all bases
#[utoipa::path(
    get,
    path = "/api/v1/bases",
    responses(
        (status = 200, description = "Bases fetched", body = Vec<crate::entities::base::Model>)
    ),
    tag = "bases"
)]
pub async fn list_bases(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let bases = state
        .services
        .bases
        .list_bases()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(bases))
}

/// Get a base by ID
#[utoipa::path(
    get,
    path = "/api/v1/bases/{id}",
    params(("id" = Uuid, Path, description = "Base ID")),
    responses(
        (status = 200, description = "Base fetched", body = crate::entities::base::Model),
        (status = 404, description = "Base not found", body = crate::errors::ErrorResponse)
    ),
    tag = "bases"
)]
pub async fn get_base(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // Base-scoped actors may only inspect their own base
    if !user.is_admin() && user.base_id != Some(id) {
        return Err(ApiError::ServiceError(crate::errors::ServiceError::Forbidden(
            "Access denied to this base".to_string(),
        )));
    }

    let base = state
        .services
        .bases
        .get_base(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(base))
}

/// Create a new base (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/bases",
    request_body = CreateBaseRequest,
    responses(
        (status = 201, description = "Base created", body = crate::entities::base::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "bases"
)]
pub async fn create_base(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateBaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateBaseCommand {
        name: payload.name,
        location: payload.location,
    };

    let base = state
        .services
        .bases
        .create_base(&user.actor(), command)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(base))
}

/// Update a base (admin only)
#[utoipa::path(
    put,
    path = "/api/v1/bases/{id}",
    params(("id" = Uuid, Path, description = "Base ID")),
    request_body = UpdateBaseRequest,
    responses(
        (status = 200, description = "Base updated", body = crate::entities::base::Model),
        (status = 404, description = "Base not found", body = crate::errors::ErrorResponse)
    ),
    tag = "bases"
)]
pub async fn update_base(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdateBaseCommand {
        name: payload.name,
        location: payload.location,
    };

    let base = state
        .services
        .bases
        .update_base(&user.actor(), id, command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(base))
}

/// Delete a base (admin only)
#[utoipa::path(
    delete,
    path = "/api/v1/bases/{id}",
    params(("id" = Uuid, Path, description = "Base ID")),
    responses(
        (status = 204, description = "Base deleted"),
        (status = 404, description = "Base not found", body = crate::errors::ErrorResponse)
    ),
    tag = "bases"
)]
pub async fn delete_base(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .bases
        .delete_base(&user.actor(), id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
