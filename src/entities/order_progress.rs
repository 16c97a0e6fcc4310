use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::OrderStatus;

/// Append-only history of status changes for a print order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_progress")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_id: i32,
    pub status: OrderStatus,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::print_order::Entity",
        from = "Column::OrderId",
        to = "super::print_order::Column::Id",
        on_delete = "Cascade"
    )]
    PrintOrder,
}

impl Related<super::print_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrintOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
