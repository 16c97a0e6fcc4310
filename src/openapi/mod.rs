use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Printshop API",
        version = "1.0.0",
        description = r#"
# Printshop API

Order intake for custom printed, engraved and cut pieces.

## Workflow

1. Upload the design with `POST /print-orders/upload-file` and keep the returned `file_path`.
2. Optionally price the job with `POST /print-orders/quote`.
3. Submit the order with `POST /print-orders`. Prices are always computed by the server.
4. Staff move the order through its lifecycle by recording progress entries.

## Authentication

Every endpoint except `/health` requires a bearer token:

```
Authorization: Bearer <your-jwt-token>
```

Tokens carry one of two roles, `client` or `admin`. Clients only see their own orders.

## Error Handling

```json
{
  "error": "Bad Request",
  "message": "contact_email: contact email is not a valid address",
  "request_id": "3f0c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `skip` (default 0) and `limit` (default and maximum 100).
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
        (name = "print-orders", description = "Print order intake, lifecycle and files"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::health_check,
        crate::handlers::print_orders::upload_design_file,
        crate::handlers::print_orders::quote_price,
        crate::handlers::print_orders::create_print_order,
        crate::handlers::print_orders::list_my_print_orders,
        crate::handlers::print_orders::get_print_order,
        crate::handlers::print_orders::download_design_file,
        crate::handlers::print_orders::update_print_order,
        crate::handlers::print_orders::delete_print_order,
        crate::handlers::print_orders::record_progress,
        crate::handlers::print_orders::list_progress,
        crate::handlers::print_orders::add_tracking_update,
        crate::handlers::print_orders::list_all_print_orders,
        crate::handlers::print_orders::list_print_orders_by_status,
        crate::handlers::print_orders::list_print_orders_by_payment_status,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::HealthStatus,

            crate::handlers::print_orders::PrintOrderResponse,
            crate::handlers::print_orders::PrintOrderDetailResponse,
            crate::handlers::print_orders::ProgressEntryResponse,
            crate::services::print_orders::CreatePrintOrderRequest,
            crate::services::print_orders::UpdatePrintOrderRequest,
            crate::services::print_orders::RecordProgressRequest,
            crate::services::print_orders::TrackingUpdateRequest,
            crate::services::print_orders::QuoteRequest,
            crate::services::pricing::PriceBreakdown,
            crate::storage::StoredFile,
            crate::models::OrderStatus,
            crate::models::PaymentStatus,
            crate::models::PrintStyle,
            crate::models::TrackingUpdate,
            crate::auth::ActorRole,

            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
