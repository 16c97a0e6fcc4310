use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Uploaded design file and the account that uploaded it.
///
/// A row exists from upload until the order that references the file is
/// deleted. At most one order may reference a given `file_path`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "design_files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub file_path: String,
    pub owner_id: String,
    pub file_name: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
