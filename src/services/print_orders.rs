use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::auth::AuthUser;
use crate::config::AppConfig;
use crate::entities::order_progress::Model as ProgressModel;
use crate::entities::print_order::Model as PrintOrderModel;
use crate::errors::ServiceError;
use crate::models::{
    Dimensions, OrderStatus, PaymentStatus, PrintStyle, TrackingUpdate, MAX_SIDE_CM,
};
use crate::repositories::{NewPrintOrder, NewProgress, OrderChanges, Page, PrintOrderRepository};
use crate::services::pricing::{self, PriceBreakdown, MAX_QUANTITY};
use crate::storage::{self, validate_key, FileStore, StoredFile};

pub const ORDER_CREATED_NOTE: &str = "order created";

/// Payload for submitting a new print order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePrintOrderRequest {
    #[validate(length(min = 1, max = 64, message = "material type is required"))]
    #[schema(example = "pine")]
    pub material_type: String,
    /// Centimetres; must contain positive `width`, `height` and `depth`
    #[validate(custom = "validate_dimensions")]
    pub dimensions: HashMap<String, f64>,
    #[validate(range(min = 1, max = 10000, message = "quantity must be between 1 and 10000"))]
    pub quantity: i32,
    pub print_style: PrintStyle,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub color_preferences: Option<serde_json::Value>,
    /// Storage key returned by the upload endpoint; the file name recorded
    /// at upload travels with it
    #[validate(length(min = 1, message = "design file reference is required"))]
    pub file_path: String,
    #[validate(length(min = 2, max = 100, message = "contact name must be at least 2 characters"))]
    pub contact_name: String,
    #[validate(
        email(message = "contact email is not a valid address"),
        custom = "validate_contact_email"
    )]
    pub contact_email: String,
    #[validate(length(max = 30))]
    pub contact_phone: Option<String>,
    #[validate(length(min = 10, max = 500, message = "shipping address must be at least 10 characters"))]
    pub shipping_address: String,
    #[validate(length(max = 2000))]
    pub customer_notes: Option<String>,
}

/// Fields an administrator may change on an existing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePrintOrderRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    #[validate(length(min = 1, max = 100))]
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[validate(length(max = 2000))]
    pub internal_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordProgressRequest {
    pub status: OrderStatus,
    #[validate(length(min = 5, max = 1000, message = "description must be at least 5 characters"))]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TrackingUpdateRequest {
    #[validate(length(min = 1, max = 64))]
    pub status: String,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(min = 1, max = 1000))]
    pub description: String,
    /// Defaults to the time the update is received
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuoteRequest {
    #[validate(length(min = 1, max = 64))]
    pub material_type: String,
    #[validate(custom = "validate_dimensions")]
    pub dimensions: HashMap<String, f64>,
    #[validate(range(min = 1, max = 10000, message = "quantity must be between 1 and 10000"))]
    pub quantity: i32,
}

fn validate_dimensions(dimensions: &HashMap<String, f64>) -> Result<(), ValidationError> {
    for key in Dimensions::KEYS {
        match dimensions.get(key) {
            None => {
                let mut err = ValidationError::new("dimensions_missing");
                err.message = Some(format!("'{}' is required", key).into());
                return Err(err);
            }
            Some(value) if !value.is_finite() || *value <= 0.0 => {
                let mut err = ValidationError::new("dimensions_positive");
                err.message = Some(format!("'{}' must be greater than 0", key).into());
                return Err(err);
            }
            Some(value) if *value > MAX_SIDE_CM => {
                let mut err = ValidationError::new("dimensions_too_large");
                err.message = Some(format!("'{}' must be at most {} cm", key, MAX_SIDE_CM).into());
                return Err(err);
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Addresses without a dot in the domain (`ana@localhost`) cannot receive
/// mail from outside, so they are refused on top of the syntax check.
fn validate_contact_email(email: &str) -> Result<(), ValidationError> {
    let domain_ok = email
        .rsplit_once('@')
        .map(|(_, domain)| {
            domain
                .split('.')
                .filter(|label| !label.is_empty())
                .count()
                >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        })
        .unwrap_or(false);
    if domain_ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("contact_email_domain");
        err.message = Some("contact email needs a full domain such as example.com".into());
        Err(err)
    }
}

fn quantity_of(quantity: i32) -> Result<u32, ServiceError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| (1..=MAX_QUANTITY).contains(q))
        .ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "quantity: must be between 1 and {}",
                MAX_QUANTITY
            ))
        })
}

/// An order together with its full progress history.
#[derive(Debug, Clone)]
pub struct OrderWithProgress {
    pub order: PrintOrderModel,
    pub progress: Vec<ProgressModel>,
}

/// Bytes of a design file plus the name it was uploaded under.
#[derive(Debug, Clone)]
pub struct DesignFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Knobs taken from [`AppConfig`]. The terminal-state guard lives on the
/// repository, see [`PrintOrderRepository::with_transition_guard`].
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub estimated_delivery_days: i64,
    pub max_upload_bytes: usize,
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            estimated_delivery_days: 7,
            max_upload_bytes: 10 * 1024 * 1024,
            default_page_size: 100,
            max_page_size: 100,
        }
    }
}

impl From<&AppConfig> for LifecycleSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            estimated_delivery_days: cfg.estimated_delivery_days,
            max_upload_bytes: cfg.max_upload_bytes,
            default_page_size: cfg.api_default_page_size,
            max_page_size: cfg.api_max_page_size,
        }
    }
}

/// Business rules for print orders: validation, ownership, admin-only
/// mutations and the progress log.
#[derive(Clone)]
pub struct PrintOrderService {
    repository: Arc<PrintOrderRepository>,
    files: Arc<dyn FileStore>,
    settings: LifecycleSettings,
}

impl PrintOrderService {
    pub fn new(
        repository: Arc<PrintOrderRepository>,
        files: Arc<dyn FileStore>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            repository,
            files,
            settings,
        }
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Turns optional `skip`/`limit` query values into a bounded page.
    pub fn page(&self, skip: Option<u64>, limit: Option<u64>) -> Page {
        let limit = limit
            .unwrap_or(self.settings.default_page_size)
            .clamp(1, self.settings.max_page_size);
        Page::new(skip.unwrap_or(0), limit)
    }

    /// Prices the request without persisting anything.
    pub fn quote(&self, request: &QuoteRequest) -> Result<PriceBreakdown, ServiceError> {
        request.validate()?;
        let dimensions = Dimensions::try_from(&request.dimensions)?;
        let quantity = quantity_of(request.quantity)?;
        pricing::quote(&dimensions, quantity, &request.material_type)
    }

    /// Stores an uploaded design and records `uploader` as its owner. Only
    /// the owner can later attach it to an order.
    #[instrument(skip(self, bytes), fields(owner_id = %uploader.user_id, size = bytes.len()))]
    pub async fn upload_design(
        &self,
        uploader: &AuthUser,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, ServiceError> {
        let stored = storage::intake(
            self.files.as_ref(),
            file_name,
            bytes,
            self.settings.max_upload_bytes,
        )
        .await?;

        if let Err(e) = self
            .repository
            .register_design_file(&uploader.user_id, &stored)
            .await
        {
            if let Err(cleanup) = self.files.delete(&stored.file_path).await {
                warn!(error = %cleanup, "failed to remove unregistered design file");
            }
            return Err(e);
        }
        Ok(stored)
    }

    /// Validates and prices a submission, then stores the order together with
    /// its initial `pending` progress entry.
    #[instrument(skip(self, request), fields(owner_id = %requester.user_id, file_path = %request.file_path))]
    pub async fn submit_order(
        &self,
        requester: &AuthUser,
        request: CreatePrintOrderRequest,
    ) -> Result<PrintOrderModel, ServiceError> {
        request.validate()?;
        let dimensions = Dimensions::try_from(&request.dimensions)?;
        let quantity = quantity_of(request.quantity)?;

        validate_key(&request.file_path)?;
        let design = self
            .repository
            .get_design_file(&request.file_path)
            .await?
            .filter(|design| design.owner_id == requester.user_id)
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "file_path: design file '{}' was not uploaded by this account",
                    request.file_path
                ))
            })?;
        let file_size = self.files.size(&request.file_path).await?.ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "file_path: design file '{}' is no longer stored",
                request.file_path
            ))
        })?;
        if file_size == 0 {
            return Err(ServiceError::ValidationError(
                "file_path: design file is empty".into(),
            ));
        }

        let pricing = pricing::quote(&dimensions, quantity, &request.material_type)?;
        let estimated_delivery =
            Utc::now() + ChronoDuration::days(self.settings.estimated_delivery_days);
        let file_path = request.file_path.clone();

        let new_order = NewPrintOrder {
            owner_id: requester.user_id.clone(),
            material_type: request.material_type,
            dimensions,
            quantity,
            print_style: request.print_style,
            color_preferences: request.color_preferences,
            file_path: request.file_path,
            file_name: design.file_name,
            file_size,
            contact_name: request.contact_name,
            contact_email: request.contact_email,
            contact_phone: request.contact_phone,
            shipping_address: request.shipping_address,
            customer_notes: request.customer_notes,
            pricing,
            estimated_delivery: Some(estimated_delivery),
        };
        let initial = NewProgress {
            status: OrderStatus::Pending,
            description: ORDER_CREATED_NOTE.to_string(),
            updated_by: Some(requester.user_id.clone()),
        };

        match self
            .repository
            .create_order_with_progress(new_order, initial)
            .await
        {
            Ok((order, _)) => {
                info!(order_id = order.id, total = %order.total_price, "print order submitted");
                Ok(order)
            }
            Err(e) => {
                error!(error = %e, "order submission failed");
                match self.repository.discard_unclaimed_design_file(&file_path).await {
                    Ok(true) => info!("discarded design file of the failed submission"),
                    Ok(false) => {}
                    Err(cleanup) => warn!(error = %cleanup, "failed to discard orphaned design file"),
                }
                Err(e)
            }
        }
    }

    /// Loads an order the actor is allowed to see: 404 when missing, 403 when
    /// it belongs to someone else.
    async fn visible_order(
        &self,
        order_id: i32,
        actor: &AuthUser,
    ) -> Result<PrintOrderModel, ServiceError> {
        let order = self
            .repository
            .get_order(order_id)
            .await?
            .ok_or_else(|| not_found(order_id))?;

        if !actor.can_access(&order.owner_id) {
            warn!(order_id, actor = %actor.user_id, "access to foreign order denied");
            return Err(ServiceError::Forbidden(
                "you do not have access to this order".into(),
            ));
        }
        Ok(order)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn fetch_order_for_actor(
        &self,
        order_id: i32,
        actor: &AuthUser,
    ) -> Result<OrderWithProgress, ServiceError> {
        let order = self.visible_order(order_id, actor).await?;
        let progress = self.repository.list_progress(order_id).await?;
        Ok(OrderWithProgress { order, progress })
    }

    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn fetch_file_for_actor(
        &self,
        order_id: i32,
        actor: &AuthUser,
    ) -> Result<DesignFile, ServiceError> {
        let order = self.visible_order(order_id, actor).await?;
        if !self.files.exists(&order.file_path).await? {
            return Err(ServiceError::NotFound(format!(
                "design file for order {} no longer exists",
                order_id
            )));
        }
        let bytes = self.files.read(&order.file_path).await?;
        Ok(DesignFile {
            file_name: order.file_name,
            bytes,
        })
    }

    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn fetch_progress_for_actor(
        &self,
        order_id: i32,
        actor: &AuthUser,
    ) -> Result<Vec<ProgressModel>, ServiceError> {
        self.visible_order(order_id, actor).await?;
        self.repository.list_progress(order_id).await
    }

    pub async fn list_my_orders(
        &self,
        actor: &AuthUser,
        page: Page,
    ) -> Result<Vec<PrintOrderModel>, ServiceError> {
        self.repository
            .list_orders_for_user(&actor.user_id, page)
            .await
    }

    pub async fn list_all_orders(
        &self,
        actor: &AuthUser,
        page: Page,
    ) -> Result<Vec<PrintOrderModel>, ServiceError> {
        require_admin(actor)?;
        self.repository.list_all_orders(page).await
    }

    pub async fn list_orders_by_status(
        &self,
        actor: &AuthUser,
        status: OrderStatus,
        page: Page,
    ) -> Result<Vec<PrintOrderModel>, ServiceError> {
        require_admin(actor)?;
        self.repository.list_orders_by_status(status, page).await
    }

    pub async fn list_orders_by_payment_status(
        &self,
        actor: &AuthUser,
        payment_status: PaymentStatus,
        page: Page,
    ) -> Result<Vec<PrintOrderModel>, ServiceError> {
        require_admin(actor)?;
        self.repository
            .list_orders_by_payment_status(payment_status, page)
            .await
    }

    #[instrument(skip(self, actor, request), fields(actor = %actor.user_id))]
    pub async fn admin_update_order(
        &self,
        order_id: i32,
        actor: &AuthUser,
        request: UpdatePrintOrderRequest,
    ) -> Result<PrintOrderModel, ServiceError> {
        require_admin(actor)?;
        request.validate()?;

        let changes = OrderChanges {
            status: request.status,
            payment_status: request.payment_status,
            tracking_number: request.tracking_number,
            estimated_delivery: request.estimated_delivery,
            internal_notes: request.internal_notes,
        };
        self.repository
            .update_order(order_id, changes, Some(&actor.user_id))
            .await?
            .ok_or_else(|| not_found(order_id))
    }

    #[instrument(skip(self, actor, request), fields(actor = %actor.user_id, status = %request.status))]
    pub async fn record_progress(
        &self,
        order_id: i32,
        actor: &AuthUser,
        request: RecordProgressRequest,
    ) -> Result<ProgressModel, ServiceError> {
        require_admin(actor)?;
        request.validate()?;

        self.repository
            .append_progress(
                order_id,
                NewProgress {
                    status: request.status,
                    description: request.description,
                    updated_by: Some(actor.user_id.clone()),
                },
            )
            .await
    }

    #[instrument(skip(self, actor, request), fields(actor = %actor.user_id))]
    pub async fn add_tracking_update(
        &self,
        order_id: i32,
        actor: &AuthUser,
        request: TrackingUpdateRequest,
    ) -> Result<PrintOrderModel, ServiceError> {
        require_admin(actor)?;
        request.validate()?;

        let update = TrackingUpdate {
            status: request.status,
            location: request.location,
            description: request.description,
            timestamp: request.timestamp.unwrap_or_else(Utc::now),
        };
        self.repository
            .add_tracking_update(order_id, update)
            .await?
            .ok_or_else(|| not_found(order_id))
    }

    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn admin_delete_order(
        &self,
        order_id: i32,
        actor: &AuthUser,
    ) -> Result<(), ServiceError> {
        require_admin(actor)?;
        if self.repository.delete_order(order_id).await? {
            Ok(())
        } else {
            Err(not_found(order_id))
        }
    }
}

fn require_admin(actor: &AuthUser) -> Result<(), ServiceError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("administrator role required".into()))
    }
}

fn not_found(order_id: i32) -> ServiceError {
    ServiceError::NotFound(format!("print order {} not found", order_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(w: f64, h: f64, d: f64) -> HashMap<String, f64> {
        [("width", w), ("height", h), ("depth", d)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn request() -> CreatePrintOrderRequest {
        CreatePrintOrderRequest {
            material_type: "oak".into(),
            dimensions: dims(10.0, 10.0, 1.0),
            quantity: 1,
            print_style: PrintStyle::Engraving,
            color_preferences: None,
            file_path: "abc.png".into(),
            contact_name: "Ana Ruiz".into(),
            contact_email: "ana@example.com".into(),
            contact_phone: None,
            shipping_address: "Calle Mayor 12, Madrid".into(),
            customer_notes: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn dimension_rules() {
        let mut req = request();
        req.dimensions = dims(0.0, 5.0, 5.0);
        assert!(req.validate().is_err());

        req.dimensions.remove("depth");
        req.dimensions.insert("width".into(), 4.0);
        let err = req.validate().unwrap_err();
        assert!(err.field_errors().contains_key("dimensions"));
    }

    #[test]
    fn contact_rules() {
        let mut req = request();
        req.contact_email = "not-an-email".into();
        req.contact_name = "A".into();
        req.shipping_address = "short".into();
        req.quantity = 0;

        let fields = req.validate().unwrap_err();
        let fields = fields.field_errors();
        for field in ["contact_email", "contact_name", "shipping_address", "quantity"] {
            assert!(fields.contains_key(field), "expected error on {}", field);
        }
    }

    #[test]
    fn contact_email_needs_a_dotted_domain() {
        for bad in ["ana@localhost", "ana@example.", "ana@.com", "ana"] {
            let mut req = request();
            req.contact_email = bad.into();
            let err = req.validate().unwrap_err();
            assert!(err.field_errors().contains_key("contact_email"), "accepted {}", bad);
        }
        for good in ["ana@example.com", "ana.ruiz@correo.example.es"] {
            let mut req = request();
            req.contact_email = good.into();
            assert!(req.validate().is_ok(), "rejected {}", good);
        }
    }

    #[test]
    fn oversized_requests_fail_validation() {
        let mut req = request();
        req.dimensions = dims(1e15, 1e15, 1.0);
        let err = req.validate().unwrap_err();
        assert!(err.field_errors().contains_key("dimensions"));

        let mut req = request();
        req.dimensions = dims(MAX_SIDE_CM, MAX_SIDE_CM, MAX_SIDE_CM);
        req.quantity = 10_000;
        assert!(req.validate().is_ok());
        req.quantity = 10_001;
        assert!(req.validate().unwrap_err().field_errors().contains_key("quantity"));
    }

    #[test]
    fn progress_description_needs_five_chars() {
        let short = RecordProgressRequest {
            status: OrderStatus::Approved,
            description: "ok".into(),
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn quantity_conversion() {
        assert_eq!(quantity_of(3).unwrap(), 3);
        assert!(quantity_of(0).is_err());
        assert!(quantity_of(-4).is_err());
        assert_eq!(quantity_of(10_000).unwrap(), MAX_QUANTITY);
        assert!(quantity_of(10_001).is_err());
    }
}
