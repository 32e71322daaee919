use super::common::{map_service_error, success_response};
use crate::{
    auth::AuthenticatedUser, errors::ApiError, handlers::AppState, queries::RecordFilter,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};

/// Movement metrics per equipment type over an optional date window.
///
/// Opening balances are back-solved from the closing snapshot and period
/// movements; this endpoint is a reporting view over the ledger, not part
/// of it.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/metrics",
    params(RecordFilter),
    responses(
        (status = 200, description = "Metrics computed", body = crate::services::reports::DashboardMetrics)
    ),
    tag = "dashboard"
)]
pub async fn get_metrics(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<RecordFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let metrics = state
        .services
        .dashboard
        .movement_metrics(&user.actor(), &filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(metrics))
}
