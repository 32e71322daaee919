use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthenticatedUser,
    entities::assignment::AssignmentKind,
    errors::ApiError,
    handlers::AppState,
    queries::RecordFilter,
    services::assignments::RecordAssignmentCommand,
};
use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAssignmentRequest {
    pub base_id: Uuid,
    pub equipment_type_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
    /// "assigned" hands stock to personnel, "expended" writes it off
    pub kind: AssignmentKind,
    #[validate(length(max = 200))]
    pub assigned_to: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Record an assignment or expenditure, debiting the base
#[utoipa::path(
    post,
    path = "/api/v1/assignments",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment recorded", body = crate::entities::assignment::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Access denied", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient inventory", body = crate::errors::ErrorResponse)
    ),
    tag = "assignments"
)]
pub async fn create_assignment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let command = RecordAssignmentCommand {
        base_id: payload.base_id,
        equipment_type_id: payload.equipment_type_id,
        quantity: payload.quantity,
        kind: payload.kind,
        assigned_to: payload.assigned_to,
        notes: payload.notes,
    };

    let assignment = state
        .services
        .assignments
        .record_assignment(&user.actor(), command)
        .await
        .map_err(map_service_error)?;

    info!("Assignment recorded: {}", assignment.id);

    Ok(created_response(assignment))
}

/// List assignments visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/assignments",
    params(RecordFilter),
    responses(
        (status = 200, description = "Assignments fetched", body = Vec<crate::entities::assignment::Model>)
    ),
    tag = "assignments"
)]
pub async fn list_assignments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<RecordFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = state
        .services
        .assignments
        .list_assignments(&user.actor(), &filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(assignments))
}
