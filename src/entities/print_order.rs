use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::models::{Dimensions, OrderStatus, PaymentStatus, PrintStyle, TrackingUpdate};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "print_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_id: String,

    pub material_type: String,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub quantity: i32,
    pub print_style: PrintStyle,
    #[sea_orm(column_type = "Json", nullable)]
    pub color_preferences: Option<Json>,

    pub file_path: String,
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
    pub internal_notes: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub tracking_updates: Json,

    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
            depth: self.depth,
        }
    }

    /// Tracking entries in insertion order. Malformed entries are skipped.
    pub fn tracking_history(&self) -> Vec<TrackingUpdate> {
        match &self.tracking_updates {
            Json::Array(items) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_progress::Entity")]
    Progress,
}

impl Related<super::order_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Progress.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            self.updated_at = Set(Utc::now());
        }
        Ok(self)
    }
}
