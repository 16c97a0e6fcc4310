use std::str::FromStr;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::common::{created_response, no_content_response, JsonBody, ListParams};
use crate::{
    auth::AuthUser,
    entities::{order_progress, print_order},
    errors::ServiceError,
    models::{OrderStatus, PaymentStatus, PrintStyle, TrackingUpdate},
    services::{
        pricing::PriceBreakdown,
        print_orders::{
            CreatePrintOrderRequest, OrderWithProgress, QuoteRequest, RecordProgressRequest,
            TrackingUpdateRequest, UpdatePrintOrderRequest,
        },
    },
    storage::StoredFile,
    ApiResponse, AppState,
};

/// Multipart framing on top of the configured file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Print order as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrintOrderResponse {
    pub id: i32,
    pub owner_id: String,
    pub material_type: String,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub quantity: i32,
    pub print_style: PrintStyle,
    #[schema(value_type = Option<Object>)]
    pub color_preferences: Option<serde_json::Value>,
    pub file_name: String,
    pub file_size: i64,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub shipping_address: String,
    pub customer_notes: Option<String>,
    pub base_price: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub tracking_number: Option<String>,
    pub tracking_updates: Vec<TrackingUpdate>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only present for administrators
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_notes: Option<String>,
}

impl PrintOrderResponse {
    /// Internal notes are staff-only and dropped for clients.
    fn for_actor(order: print_order::Model, actor: &AuthUser) -> Self {
        let mut response = Self::from(order);
        if !actor.is_admin() {
            response.internal_notes = None;
        }
        response
    }
}

impl From<print_order::Model> for PrintOrderResponse {
    fn from(order: print_order::Model) -> Self {
        let tracking_updates = order.tracking_history();
        Self {
            id: order.id,
            owner_id: order.owner_id,
            material_type: order.material_type,
            width: order.width,
            height: order.height,
            depth: order.depth,
            quantity: order.quantity,
            print_style: order.print_style,
            color_preferences: order.color_preferences,
            file_name: order.file_name,
            file_size: order.file_size,
            contact_name: order.contact_name,
            contact_email: order.contact_email,
            contact_phone: order.contact_phone,
            shipping_address: order.shipping_address,
            customer_notes: order.customer_notes,
            base_price: order.base_price,
            tax_amount: order.tax_amount,
            shipping_cost: order.shipping_cost,
            total_price: order.total_price,
            status: order.status,
            payment_status: order.payment_status,
            tracking_number: order.tracking_number,
            tracking_updates,
            estimated_delivery: order.estimated_delivery,
            actual_delivery: order.actual_delivery,
            created_at: order.created_at,
            updated_at: order.updated_at,
            internal_notes: order.internal_notes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProgressEntryResponse {
    pub id: i32,
    pub order_id: i32,
    pub status: OrderStatus,
    pub description: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<order_progress::Model> for ProgressEntryResponse {
    fn from(entry: order_progress::Model) -> Self {
        Self {
            id: entry.id,
            order_id: entry.order_id,
            status: entry.status,
            description: entry.description,
            updated_by: entry.updated_by,
            created_at: entry.created_at,
        }
    }
}

/// An order with its full progress history, oldest entry first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrintOrderDetailResponse {
    pub order: PrintOrderResponse,
    pub progress: Vec<ProgressEntryResponse>,
}

fn detail_for_actor(detail: OrderWithProgress, actor: &AuthUser) -> PrintOrderDetailResponse {
    PrintOrderDetailResponse {
        order: PrintOrderResponse::for_actor(detail.order, actor),
        progress: detail.progress.into_iter().map(Into::into).collect(),
    }
}

fn order_list(orders: Vec<print_order::Model>, actor: &AuthUser) -> Vec<PrintOrderResponse> {
    orders
        .into_iter()
        .map(|order| PrintOrderResponse::for_actor(order, actor))
        .collect()
}

fn parse_order_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(&raw.to_ascii_lowercase())
        .map_err(|_| ServiceError::ValidationError(format!("unknown order status '{}'", raw)))
}

fn parse_payment_status(raw: &str) -> Result<PaymentStatus, ServiceError> {
    PaymentStatus::from_str(&raw.to_ascii_lowercase())
        .map_err(|_| ServiceError::ValidationError(format!("unknown payment status '{}'", raw)))
}

/// Routes for print orders. All of them expect an authenticated caller.
pub fn print_order_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/print-orders/upload-file",
            post(upload_design_file).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route("/print-orders/quote", post(quote_price))
        .route(
            "/print-orders",
            post(create_print_order).get(list_my_print_orders),
        )
        .route(
            "/print-orders/",
            post(create_print_order).get(list_my_print_orders),
        )
        .route("/print-orders/admin/all", get(list_all_print_orders))
        .route(
            "/print-orders/admin/status/:status",
            get(list_print_orders_by_status),
        )
        .route(
            "/print-orders/admin/payment/:status",
            get(list_print_orders_by_payment_status),
        )
        .route(
            "/print-orders/:id",
            get(get_print_order)
                .put(update_print_order)
                .delete(delete_print_order),
        )
        .route("/print-orders/:id/file", get(download_design_file))
        .route(
            "/print-orders/:id/progress",
            post(record_progress).get(list_progress),
        )
        .route("/print-orders/:id/tracking", post(add_tracking_update))
}

/// Upload a design file
#[utoipa::path(
    post,
    path = "/print-orders/upload-file",
    summary = "Upload design file",
    description = "Stores a design file (multipart field `file`) and returns the reference to submit with the order",
    request_body(content_type = "multipart/form-data", description = "Design file in the `file` field"),
    responses(
        (status = 201, description = "File stored", body = ApiResponse<StoredFile>),
        (status = 400, description = "Missing, empty, oversized or disallowed file", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "File storage error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
#[instrument(skip(state, multipart), fields(user_id = %auth_user.user_id))]
pub async fn upload_design_file(
    State(state): State<AppState>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> Result<Response, ServiceError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::ValidationError(format!("invalid multipart request: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ServiceError::ValidationError("no file selected".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::ValidationError(format!("multipart error: {}", e)))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| {
        ServiceError::ValidationError("no 'file' field found in the upload".into())
    })?;

    let stored = state
        .services
        .print_orders
        .upload_design(&auth_user, &file_name, &bytes)
        .await?;

    Ok(created_response(ApiResponse::success(stored)))
}

/// Price a configuration without creating an order
#[utoipa::path(
    post,
    path = "/print-orders/quote",
    summary = "Quote price",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Price breakdown", body = ApiResponse<PriceBreakdown>),
        (status = 400, description = "Invalid dimensions or quantity", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
pub async fn quote_price(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    JsonBody(payload): JsonBody<QuoteRequest>,
) -> Result<Json<ApiResponse<PriceBreakdown>>, ServiceError> {
    let breakdown = state.services.print_orders.quote(&payload)?;
    Ok(Json(ApiResponse::success(breakdown)))
}

/// Submit a print order
#[utoipa::path(
    post,
    path = "/print-orders",
    summary = "Create print order",
    description = "Creates an order for a previously uploaded design file. Prices are computed server side.",
    request_body = CreatePrintOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<PrintOrderResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
pub async fn create_print_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    JsonBody(payload): JsonBody<CreatePrintOrderRequest>,
) -> Result<Response, ServiceError> {
    let order = state
        .services
        .print_orders
        .submit_order(&auth_user, payload)
        .await?;

    info!(order_id = order.id, "print order created");
    Ok(created_response(ApiResponse::success(
        PrintOrderResponse::for_actor(order, &auth_user),
    )))
}

/// List the caller's own orders, newest first
#[utoipa::path(
    get,
    path = "/print-orders",
    summary = "List my print orders",
    params(ListParams),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<Vec<PrintOrderResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
pub async fn list_my_print_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<PrintOrderResponse>>>, ServiceError> {
    let service = &state.services.print_orders;
    let orders = service
        .list_my_orders(&auth_user, service.page(params.skip, params.limit))
        .await?;
    Ok(Json(ApiResponse::success(order_list(orders, &auth_user))))
}

/// Get an order with its progress history
#[utoipa::path(
    get,
    path = "/print-orders/{id}",
    summary = "Get print order",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<PrintOrderDetailResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Order belongs to another user", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
pub async fn get_print_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PrintOrderDetailResponse>>, ServiceError> {
    let detail = state
        .services
        .print_orders
        .fetch_order_for_actor(id, &auth_user)
        .await?;
    Ok(Json(ApiResponse::success(detail_for_actor(detail, &auth_user))))
}

/// Download the order's design file
#[utoipa::path(
    get,
    path = "/print-orders/{id}/file",
    summary = "Download design file",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "File contents", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Order belongs to another user", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order or file not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
pub async fn download_design_file(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
) -> Result<Response, ServiceError> {
    let file = state
        .services
        .print_orders
        .fetch_file_for_actor(id, &auth_user)
        .await?;

    let safe_name: String = file
        .file_name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

/// Update an order (administrators only)
#[utoipa::path(
    put,
    path = "/print-orders/{id}",
    summary = "Update print order",
    description = "Changing `status` also records a progress entry",
    params(("id" = i32, Path, description = "Order ID")),
    request_body = UpdatePrintOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<PrintOrderResponse>),
        (status = 400, description = "Invalid request data or status change", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Administrator role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
pub async fn update_print_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
    JsonBody(payload): JsonBody<UpdatePrintOrderRequest>,
) -> Result<Json<ApiResponse<PrintOrderResponse>>, ServiceError> {
    let order = state
        .services
        .print_orders
        .admin_update_order(id, &auth_user, payload)
        .await?;
    Ok(Json(ApiResponse::success(PrintOrderResponse::for_actor(
        order, &auth_user,
    ))))
}

/// Delete an order and its design file (administrators only)
#[utoipa::path(
    delete,
    path = "/print-orders/{id}",
    summary = "Delete print order",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Administrator role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
pub async fn delete_print_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
) -> Result<Response, ServiceError> {
    state
        .services
        .print_orders
        .admin_delete_order(id, &auth_user)
        .await?;
    Ok(no_content_response())
}

/// Append a progress entry; the order takes the entry's status
#[utoipa::path(
    post,
    path = "/print-orders/{id}/progress",
    summary = "Record progress",
    params(("id" = i32, Path, description = "Order ID")),
    request_body = RecordProgressRequest,
    responses(
        (status = 201, description = "Progress recorded", body = ApiResponse<ProgressEntryResponse>),
        (status = 400, description = "Invalid request data or status change", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Administrator role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
pub async fn record_progress(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
    JsonBody(payload): JsonBody<RecordProgressRequest>,
) -> Result<Response, ServiceError> {
    let entry = state
        .services
        .print_orders
        .record_progress(id, &auth_user, payload)
        .await?;
    Ok(created_response(ApiResponse::success(
        ProgressEntryResponse::from(entry),
    )))
}

/// Progress history of an order, oldest first
#[utoipa::path(
    get,
    path = "/print-orders/{id}/progress",
    summary = "List progress",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Progress history", body = ApiResponse<Vec<ProgressEntryResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Order belongs to another user", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
pub async fn list_progress(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<Vec<ProgressEntryResponse>>>, ServiceError> {
    let entries = state
        .services
        .print_orders
        .fetch_progress_for_actor(id, &auth_user)
        .await?;
    Ok(Json(ApiResponse::success(
        entries.into_iter().map(Into::into).collect(),
    )))
}

/// Append a shipment tracking update (administrators only)
#[utoipa::path(
    post,
    path = "/print-orders/{id}/tracking",
    summary = "Add tracking update",
    params(("id" = i32, Path, description = "Order ID")),
    request_body = TrackingUpdateRequest,
    responses(
        (status = 200, description = "Tracking update stored", body = ApiResponse<PrintOrderResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Administrator role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
pub async fn add_tracking_update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    auth_user: AuthUser,
    JsonBody(payload): JsonBody<TrackingUpdateRequest>,
) -> Result<Json<ApiResponse<PrintOrderResponse>>, ServiceError> {
    let order = state
        .services
        .print_orders
        .add_tracking_update(id, &auth_user, payload)
        .await?;
    Ok(Json(ApiResponse::success(PrintOrderResponse::for_actor(
        order, &auth_user,
    ))))
}

/// All orders (administrators only)
#[utoipa::path(
    get,
    path = "/print-orders/admin/all",
    summary = "List all print orders",
    params(ListParams),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<Vec<PrintOrderResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Administrator role required", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
pub async fn list_all_print_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<PrintOrderResponse>>>, ServiceError> {
    let service = &state.services.print_orders;
    let orders = service
        .list_all_orders(&auth_user, service.page(params.skip, params.limit))
        .await?;
    Ok(Json(ApiResponse::success(order_list(orders, &auth_user))))
}

/// Orders in a given status (administrators only)
#[utoipa::path(
    get,
    path = "/print-orders/admin/status/{status}",
    summary = "List print orders by status",
    params(
        ("status" = OrderStatus, Path, description = "Order status"),
        ListParams,
    ),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<Vec<PrintOrderResponse>>),
        (status = 400, description = "Unknown status", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Administrator role required", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
pub async fn list_print_orders_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
    auth_user: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<PrintOrderResponse>>>, ServiceError> {
    let status = parse_order_status(&status)?;
    let service = &state.services.print_orders;
    let orders = service
        .list_orders_by_status(&auth_user, status, service.page(params.skip, params.limit))
        .await?;
    Ok(Json(ApiResponse::success(order_list(orders, &auth_user))))
}

/// Orders in a given payment status (administrators only)
#[utoipa::path(
    get,
    path = "/print-orders/admin/payment/{status}",
    summary = "List print orders by payment status",
    params(
        ("status" = PaymentStatus, Path, description = "Payment status"),
        ListParams,
    ),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<Vec<PrintOrderResponse>>),
        (status = 400, description = "Unknown payment status", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Administrator role required", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "print-orders"
)]
pub async fn list_print_orders_by_payment_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
    auth_user: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<PrintOrderResponse>>>, ServiceError> {
    let payment_status = parse_payment_status(&status)?;
    let service = &state.services.print_orders;
    let orders = service
        .list_orders_by_payment_status(
            &auth_user,
            payment_status,
            service.page(params.skip, params.limit),
        )
        .await?;
    Ok(Json(ApiResponse::success(order_list(orders, &auth_user))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ActorRole;
    use assert_matches::assert_matches;

    #[test]
    fn status_path_segments_parse_case_insensitively() {
        assert_eq!(parse_order_status("IN_PRODUCTION").unwrap(), OrderStatus::InProduction);
        assert_eq!(parse_payment_status("paid").unwrap(), PaymentStatus::Paid);
        assert_matches!(
            parse_order_status("lost"),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn internal_notes_hidden_from_clients() {
        let now = Utc::now();
        let order = print_order::Model {
            id: 1,
            owner_id: "alice".into(),
            material_type: "oak".into(),
            width: 1.0,
            height: 1.0,
            depth: 1.0,
            quantity: 1,
            print_style: PrintStyle::Cutting,
            color_preferences: None,
            file_path: "k.png".into(),
            file_name: "k.png".into(),
            file_size: 1,
            contact_name: "Al".into(),
            contact_email: "a@example.com".into(),
            contact_phone: None,
            shipping_address: "somewhere long enough".into(),
            customer_notes: None,
            base_price: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            total_price: Decimal::ZERO,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            tracking_number: None,
            internal_notes: Some("rush".into()),
            tracking_updates: serde_json::json!([]),
            estimated_delivery: None,
            actual_delivery: None,
            created_at: now,
            updated_at: now,
        };

        let client = AuthUser::new("alice", ActorRole::Client);
        let admin = AuthUser::new("root", ActorRole::Admin);
        assert!(PrintOrderResponse::for_actor(order.clone(), &client)
            .internal_notes
            .is_none());
        assert_eq!(
            PrintOrderResponse::for_actor(order, &admin).internal_notes.as_deref(),
            Some("rush")
        );
    }
}
