use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::entities::design_file::{
    self, ActiveModel as DesignFileActiveModel, Entity as DesignFile, Model as DesignFileModel,
};
use crate::entities::order_progress::{
    self, ActiveModel as ProgressActiveModel, Entity as OrderProgress, Model as ProgressModel,
};
use crate::entities::print_order::{
    self, ActiveModel as PrintOrderActiveModel, Entity as PrintOrder, Model as PrintOrderModel,
};
use crate::errors::ServiceError;
use crate::models::{Dimensions, OrderStatus, PaymentStatus, PrintStyle, TrackingUpdate};
use crate::services::pricing::PriceBreakdown;
use crate::storage::{FileStore, StoredFile};

/// Offset/limit window over an ordered listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }
}

/// Everything needed to persist a freshly submitted order.
#[derive(Clone, Debug)]
pub struct NewPrintOrder {
    pub owner_id: String,
    pub material_type: String,
    pub dimensions: Dimensions,
    pub quantity: u32,
    pub print_style: PrintStyle,
    pub color_preferences: Option<JsonValue>,
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub shipping_address: String,
    pub customer_notes: Option<String>,
    pub pricing: PriceBreakdown,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Partial update applied by an administrator. `None` leaves a field alone.
#[derive(Clone, Debug, Default)]
pub struct OrderChanges {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub internal_notes: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewProgress {
    pub status: OrderStatus,
    pub description: String,
    pub updated_by: Option<String>,
}

pub const ADMIN_STATUS_CHANGE_NOTE: &str = "status updated by administrator";

/// Persistence for print orders, their progress history and the registry of
/// uploaded design files.
///
/// Every write that touches more than one row runs in a single transaction.
/// Writes that depend on the current order row lock it first.
#[derive(Clone)]
pub struct PrintOrderRepository {
    db: Arc<DatabaseConnection>,
    files: Arc<dyn FileStore>,
    enforce_status_transitions: bool,
}

fn db_failure(operation: &'static str) -> impl FnOnce(DbErr) -> ServiceError {
    move |e| {
        error!(operation, error = %e, "database operation failed");
        ServiceError::from_db(e)
    }
}

impl PrintOrderRepository {
    pub fn new(db: Arc<DatabaseConnection>, files: Arc<dyn FileStore>) -> Self {
        Self {
            db,
            files,
            enforce_status_transitions: false,
        }
    }

    /// When enabled, delivered and cancelled orders refuse any further status change.
    pub fn with_transition_guard(mut self, enabled: bool) -> Self {
        self.enforce_status_transitions = enabled;
        self
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Inserts the order row alone.
    #[instrument(skip(self, order), fields(owner_id = %order.owner_id))]
    pub async fn create_order(&self, order: NewPrintOrder) -> Result<PrintOrderModel, ServiceError> {
        let created = insert_order(self.db(), order).await?;
        info!(order_id = created.id, "print order created");
        Ok(created)
    }

    /// Inserts the order and its first progress entry atomically.
    #[instrument(skip(self, order, progress), fields(owner_id = %order.owner_id))]
    pub async fn create_order_with_progress(
        &self,
        order: NewPrintOrder,
        progress: NewProgress,
    ) -> Result<(PrintOrderModel, ProgressModel), ServiceError> {
        let txn = self.db().begin().await.map_err(db_failure("begin"))?;

        let attached = PrintOrder::find()
            .filter(print_order::Column::FilePath.eq(order.file_path.as_str()))
            .count(&txn)
            .await
            .map_err(db_failure("create_order_with_progress"))?;
        if attached > 0 {
            return Err(ServiceError::ValidationError(
                "file_path: design file is already attached to an order".into(),
            ));
        }

        let created = insert_order(&txn, order).await?;
        let (created, entry) = record_progress(&txn, created, progress).await?;
        txn.commit().await.map_err(db_failure("commit"))?;

        info!(order_id = created.id, "print order created");
        Ok((created, entry))
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i32) -> Result<Option<PrintOrderModel>, ServiceError> {
        PrintOrder::find_by_id(order_id)
            .one(self.db())
            .await
            .map_err(db_failure("get_order"))
    }

    #[instrument(skip(self))]
    pub async fn list_orders_for_user(
        &self,
        owner_id: &str,
        page: Page,
    ) -> Result<Vec<PrintOrderModel>, ServiceError> {
        newest_first(PrintOrder::find().filter(print_order::Column::OwnerId.eq(owner_id)), page)
            .all(self.db())
            .await
            .map_err(db_failure("list_orders_for_user"))
    }

    #[instrument(skip(self))]
    pub async fn list_all_orders(&self, page: Page) -> Result<Vec<PrintOrderModel>, ServiceError> {
        newest_first(PrintOrder::find(), page)
            .all(self.db())
            .await
            .map_err(db_failure("list_all_orders"))
    }

    #[instrument(skip(self))]
    pub async fn list_orders_by_status(
        &self,
        status: OrderStatus,
        page: Page,
    ) -> Result<Vec<PrintOrderModel>, ServiceError> {
        newest_first(PrintOrder::find().filter(print_order::Column::Status.eq(status)), page)
            .all(self.db())
            .await
            .map_err(db_failure("list_orders_by_status"))
    }

    #[instrument(skip(self))]
    pub async fn list_orders_by_payment_status(
        &self,
        payment_status: PaymentStatus,
        page: Page,
    ) -> Result<Vec<PrintOrderModel>, ServiceError> {
        newest_first(
            PrintOrder::find().filter(print_order::Column::PaymentStatus.eq(payment_status)),
            page,
        )
        .all(self.db())
        .await
        .map_err(db_failure("list_orders_by_payment_status"))
    }

    /// Applies `changes` and returns the refreshed order, or `None` if the id is unknown.
    ///
    /// A status change goes through the progress log in the same transaction.
    #[instrument(skip(self, changes))]
    pub async fn update_order(
        &self,
        order_id: i32,
        changes: OrderChanges,
        actor_id: Option<&str>,
    ) -> Result<Option<PrintOrderModel>, ServiceError> {
        let txn = self.db().begin().await.map_err(db_failure("begin"))?;

        let Some(mut order) = PrintOrder::find_by_id(order_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_failure("update_order"))?
        else {
            return Ok(None);
        };

        if let Some(status) = changes.status {
            self.check_transition(&order, status)?;
            let progress = NewProgress {
                status,
                description: ADMIN_STATUS_CHANGE_NOTE.to_string(),
                updated_by: actor_id.map(str::to_owned),
            };
            order = record_progress(&txn, order, progress).await?.0;
        }

        let mut active: PrintOrderActiveModel = order.into();
        if let Some(payment_status) = changes.payment_status {
            active.payment_status = Set(payment_status);
        }
        if let Some(tracking_number) = changes.tracking_number {
            active.tracking_number = Set(Some(tracking_number));
        }
        if let Some(estimated_delivery) = changes.estimated_delivery {
            active.estimated_delivery = Set(Some(estimated_delivery));
        }
        if let Some(internal_notes) = changes.internal_notes {
            active.internal_notes = Set(Some(internal_notes));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await.map_err(db_failure("update_order"))?;
        txn.commit().await.map_err(db_failure("commit"))?;

        info!(order_id, "print order updated");
        Ok(Some(updated))
    }

    /// Removes the order, its progress entries and its design file.
    /// Returns `false` when the order did not exist.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: i32) -> Result<bool, ServiceError> {
        let txn = self.db().begin().await.map_err(db_failure("begin"))?;

        let Some(order) = PrintOrder::find_by_id(order_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_failure("delete_order"))?
        else {
            return Ok(false);
        };

        OrderProgress::delete_many()
            .filter(order_progress::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(db_failure("delete_order_progress"))?;
        PrintOrder::delete_by_id(order_id)
            .exec(&txn)
            .await
            .map_err(db_failure("delete_order"))?;
        DesignFile::delete_by_id(order.file_path.clone())
            .exec(&txn)
            .await
            .map_err(db_failure("delete_design_file"))?;
        txn.commit().await.map_err(db_failure("commit"))?;

        match self.files.delete(&order.file_path).await {
            Ok(true) => {}
            Ok(false) => warn!(order_id, file_path = %order.file_path, "design file was already missing"),
            Err(e) => warn!(order_id, error = %e, "failed to remove design file"),
        }

        info!(order_id, "print order deleted");
        Ok(true)
    }

    /// Records a progress entry and moves the order to its status.
    #[instrument(skip(self, progress), fields(status = %progress.status))]
    pub async fn append_progress(
        &self,
        order_id: i32,
        progress: NewProgress,
    ) -> Result<ProgressModel, ServiceError> {
        let txn = self.db().begin().await.map_err(db_failure("begin"))?;

        let order = PrintOrder::find_by_id(order_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_failure("append_progress"))?
            .ok_or_else(|| ServiceError::NotFound(format!("print order {} not found", order_id)))?;
        self.check_transition(&order, progress.status)?;

        let (_, entry) = record_progress(&txn, order, progress).await?;
        txn.commit().await.map_err(db_failure("commit"))?;

        info!(order_id, progress_id = entry.id, "progress recorded");
        Ok(entry)
    }

    /// Progress history, oldest first.
    #[instrument(skip(self))]
    pub async fn list_progress(&self, order_id: i32) -> Result<Vec<ProgressModel>, ServiceError> {
        OrderProgress::find()
            .filter(order_progress::Column::OrderId.eq(order_id))
            .order_by_asc(order_progress::Column::CreatedAt)
            .order_by_asc(order_progress::Column::Id)
            .all(self.db())
            .await
            .map_err(db_failure("list_progress"))
    }

    /// Appends a shipment event. Returns `None` if the order is unknown.
    #[instrument(skip(self, update))]
    pub async fn add_tracking_update(
        &self,
        order_id: i32,
        update: TrackingUpdate,
    ) -> Result<Option<PrintOrderModel>, ServiceError> {
        let txn = self.db().begin().await.map_err(db_failure("begin"))?;

        let Some(order) = PrintOrder::find_by_id(order_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_failure("add_tracking_update"))?
        else {
            return Ok(None);
        };

        let entry = serde_json::to_value(&update)
            .map_err(|e| ServiceError::InternalError(format!("tracking update encoding: {}", e)))?;
        let mut history = match &order.tracking_updates {
            JsonValue::Array(items) => items.clone(),
            _ => Vec::new(),
        };
        history.push(entry);

        let mut active: PrintOrderActiveModel = order.into();
        active.tracking_updates = Set(JsonValue::Array(history));
        active.updated_at = Set(Utc::now());
        let updated = active
            .update(&txn)
            .await
            .map_err(db_failure("add_tracking_update"))?;
        txn.commit().await.map_err(db_failure("commit"))?;

        Ok(Some(updated))
    }

    /// Records who uploaded a freshly stored design file.
    #[instrument(skip(self, stored), fields(file_path = %stored.file_path))]
    pub async fn register_design_file(
        &self,
        owner_id: &str,
        stored: &StoredFile,
    ) -> Result<DesignFileModel, ServiceError> {
        let file_size = i64::try_from(stored.file_size)
            .map_err(|_| ServiceError::ValidationError("file_size: out of range".into()))?;
        DesignFileActiveModel {
            file_path: Set(stored.file_path.clone()),
            owner_id: Set(owner_id.to_owned()),
            file_name: Set(stored.file_name.clone()),
            file_size: Set(file_size),
            created_at: Set(Utc::now()),
        }
        .insert(self.db())
        .await
        .map_err(db_failure("register_design_file"))
    }

    #[instrument(skip(self))]
    pub async fn get_design_file(
        &self,
        file_path: &str,
    ) -> Result<Option<DesignFileModel>, ServiceError> {
        DesignFile::find_by_id(file_path.to_owned())
            .one(self.db())
            .await
            .map_err(db_failure("get_design_file"))
    }

    /// Forgets an upload and removes its bytes, but only while no order
    /// references it. Returns `false` when the file was kept.
    #[instrument(skip(self))]
    pub async fn discard_unclaimed_design_file(&self, file_path: &str) -> Result<bool, ServiceError> {
        let txn = self.db().begin().await.map_err(db_failure("begin"))?;

        let attached = PrintOrder::find()
            .filter(print_order::Column::FilePath.eq(file_path))
            .count(&txn)
            .await
            .map_err(db_failure("discard_unclaimed_design_file"))?;
        if attached > 0 {
            return Ok(false);
        }
        DesignFile::delete_many()
            .filter(design_file::Column::FilePath.eq(file_path))
            .exec(&txn)
            .await
            .map_err(db_failure("discard_unclaimed_design_file"))?;
        txn.commit().await.map_err(db_failure("commit"))?;

        self.files.delete(file_path).await?;
        info!(file_path, "unclaimed design file discarded");
        Ok(true)
    }

    fn check_transition(&self, order: &PrintOrderModel, next: OrderStatus) -> Result<(), ServiceError> {
        if !self.enforce_status_transitions || order.status.can_transition_to(next) {
            return Ok(());
        }
        Err(ServiceError::InvalidStatus(format!(
            "order {} is {} and cannot move to {}",
            order.id, order.status, next
        )))
    }
}

fn newest_first(query: sea_orm::Select<PrintOrder>, page: Page) -> sea_orm::Select<PrintOrder> {
    query
        .order_by_desc(print_order::Column::CreatedAt)
        .order_by_desc(print_order::Column::Id)
        .offset(page.offset)
        .limit(page.limit)
}

async fn insert_order<C>(conn: &C, order: NewPrintOrder) -> Result<PrintOrderModel, ServiceError>
where
    C: ConnectionTrait,
{
    let quantity = i32::try_from(order.quantity)
        .map_err(|_| ServiceError::ValidationError("quantity: out of range".into()))?;
    let file_size = i64::try_from(order.file_size)
        .map_err(|_| ServiceError::ValidationError("file_size: out of range".into()))?;
    let now = Utc::now();

    let active = PrintOrderActiveModel {
        owner_id: Set(order.owner_id),
        material_type: Set(order.material_type),
        width: Set(order.dimensions.width),
        height: Set(order.dimensions.height),
        depth: Set(order.dimensions.depth),
        quantity: Set(quantity),
        print_style: Set(order.print_style),
        color_preferences: Set(order.color_preferences),
        file_path: Set(order.file_path),
        file_name: Set(order.file_name),
        file_size: Set(file_size),
        contact_name: Set(order.contact_name),
        contact_email: Set(order.contact_email),
        contact_phone: Set(order.contact_phone),
        shipping_address: Set(order.shipping_address),
        customer_notes: Set(order.customer_notes),
        base_price: Set(order.pricing.base_price),
        tax_amount: Set(order.pricing.tax_amount),
        shipping_cost: Set(order.pricing.shipping_cost),
        total_price: Set(order.pricing.total_price),
        status: Set(OrderStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        tracking_number: Set(None),
        internal_notes: Set(None),
        tracking_updates: Set(JsonValue::Array(Vec::new())),
        estimated_delivery: Set(order.estimated_delivery),
        actual_delivery: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    active.insert(conn).await.map_err(db_failure("insert_order"))
}

/// Inserts a progress row and moves the order to the entry's status.
async fn record_progress<C>(
    conn: &C,
    order: PrintOrderModel,
    progress: NewProgress,
) -> Result<(PrintOrderModel, ProgressModel), ServiceError>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let order_id = order.id;

    let entry = ProgressActiveModel {
        order_id: Set(order_id),
        status: Set(progress.status),
        description: Set(progress.description),
        updated_by: Set(progress.updated_by),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(db_failure("insert_progress"))?;

    let mut active: PrintOrderActiveModel = order.into();
    active.status = Set(progress.status);
    if progress.status == OrderStatus::Delivered {
        active.actual_delivery = Set(Some(now));
    }
    active.updated_at = Set(now);
    let order = active
        .update(conn)
        .await
        .map_err(db_failure("update_order_status"))?;

    Ok((order, entry))
}
