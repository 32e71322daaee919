//! Garrison API Library
//!
//! Equipment inventory across bases: purchases credit stock, transfers move
//! it between bases through a pending/completed/cancelled lifecycle, and
//! assignments or expenditures debit it. The ledger services keep every
//! (base, equipment type) balance non-negative under concurrent operations.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod queries;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{AuthRouterExt, Role};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::middleware_helpers::current_request_id()
                .map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// Enhanced API routes function
pub fn api_v1_routes() -> Router<AppState> {
    // Base catalog: reads for any authenticated user, mutations admin-only
    let bases_read = Router::new()
        .route("/bases", get(handlers::bases::list_bases))
        .route("/bases/:id", get(handlers::bases::get_base))
        .with_auth();

    let bases_admin = Router::new()
        .route("/bases", axum::routing::post(handlers::bases::create_base))
        .route(
            "/bases/:id",
            axum::routing::put(handlers::bases::update_base),
        )
        .route(
            "/bases/:id",
            axum::routing::delete(handlers::bases::delete_base),
        )
        .with_role(Role::Admin);

    // Equipment type catalog
    let equipment_read = Router::new()
        .route(
            "/equipment-types",
            get(handlers::equipment_types::list_equipment_types),
        )
        .route(
            "/equipment-types/:id",
            get(handlers::equipment_types::get_equipment_type),
        )
        .with_auth();

    let equipment_admin = Router::new()
        .route(
            "/equipment-types",
            axum::routing::post(handlers::equipment_types::create_equipment_type),
        )
        .with_role(Role::Admin);

    // Balance snapshots
    let inventory = Router::new()
        .route("/inventory", get(handlers::inventory::list_inventory))
        .route(
            "/inventory/:base_id/:equipment_type_id",
            get(handlers::inventory::get_balance),
        )
        .with_auth();

    // Ledger operations: per-base authorization happens in the access
    // policy, consulted by each service before any lock is taken
    let purchases = Router::new()
        .route("/purchases", get(handlers::purchases::list_purchases))
        .route(
            "/purchases",
            axum::routing::post(handlers::purchases::create_purchase),
        )
        .with_auth();

    let transfers = Router::new()
        .route("/transfers", get(handlers::transfers::list_transfers))
        .route(
            "/transfers",
            axum::routing::post(handlers::transfers::create_transfer),
        )
        .route("/transfers/:id", get(handlers::transfers::get_transfer))
        .route(
            "/transfers/:id/complete",
            axum::routing::post(handlers::transfers::complete_transfer),
        )
        .route(
            "/transfers/:id/cancel",
            axum::routing::post(handlers::transfers::cancel_transfer),
        )
        .with_auth();

    let assignments = Router::new()
        .route("/assignments", get(handlers::assignments::list_assignments))
        .route(
            "/assignments",
            axum::routing::post(handlers::assignments::create_assignment),
        )
        .with_auth();

    let dashboard = Router::new()
        .route("/dashboard/metrics", get(handlers::dashboard::get_metrics))
        .with_auth();

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Catalog
        .merge(bases_read)
        .merge(bases_admin)
        .merge(equipment_read)
        .merge(equipment_admin)
        // Ledger
        .merge(inventory)
        .merge(purchases)
        .merge(transfers)
        .merge(assignments)
        // Reporting
        .merge(dashboard)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let git = option_env!("GIT_HASH").unwrap_or("unknown");
    let build_time = option_env!("BUILD_TIME").unwrap_or("unknown");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "git": git,
        "build_time": build_time,
        "service": "garrison-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    // Check database connectivity
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
