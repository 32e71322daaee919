use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Garrison API",
        version = "1.0.0",
        description = r#"
# Garrison Equipment Inventory API

Tracks military equipment inventory across bases. Purchases credit stock,
inter-base transfers move it through a pending/completed/cancelled
lifecycle, and assignments or expenditures debit it. Balances are kept
consistent under concurrent operations by the inventory ledger.

## Authentication

All `/api/v1` endpoints require a bearer token obtained from `/auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

Admins operate on every base; commanders and logistics officers are scoped
to their home base.

## Error Handling

Errors use a consistent response format with appropriate HTTP status codes:

```json
{
  "error": "Unprocessable Entity",
  "message": "Insufficient inventory: available=2, requested=5",
  "request_id": "req-abc123xyz",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "bases", description = "Base administration"),
        (name = "equipment-types", description = "Equipment type catalog"),
        (name = "inventory", description = "Balance snapshots"),
        (name = "purchases", description = "Procurement and stock credits"),
        (name = "transfers", description = "Inter-base transfers"),
        (name = "assignments", description = "Assignments and expenditures"),
        (name = "dashboard", description = "Movement reporting")
    ),
    paths(
        // Bases
        crate::handlers::bases::list_bases,
        crate::handlers::bases::get_base,
        crate::handlers::bases::create_base,
        crate::handlers::bases::update_base,
        crate::handlers::bases::delete_base,

        // Equipment types
        crate::handlers::equipment_types::list_equipment_types,
        crate::handlers::equipment_types::get_equipment_type,
        crate::handlers::equipment_types::create_equipment_type,

        // Inventory
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::get_balance,

        // Purchases
        crate::handlers::purchases::create_purchase,
        crate::handlers::purchases::list_purchases,

        // Transfers
        crate::handlers::transfers::create_transfer,
        crate::handlers::transfers::get_transfer,
        crate::handlers::transfers::complete_transfer,
        crate::handlers::transfers::cancel_transfer,
        crate::handlers::transfers::list_transfers,

        // Assignments
        crate::handlers::assignments::create_assignment,
        crate::handlers::assignments::list_assignments,

        // Dashboard
        crate::handlers::dashboard::get_metrics,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::handlers::bases::CreateBaseRequest,
            crate::handlers::bases::UpdateBaseRequest,
            crate::handlers::equipment_types::CreateEquipmentTypeRequest,
            crate::handlers::purchases::CreatePurchaseRequest,
            crate::handlers::transfers::CreateTransferRequest,
            crate::handlers::assignments::CreateAssignmentRequest,
            crate::services::reports::DashboardMetrics,
            crate::services::reports::EquipmentMovement,
            crate::services::reports::MovementSummary,
            crate::services::reports::NetMovementBreakdown,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
