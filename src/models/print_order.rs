use std::collections::HashMap;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// Lifecycle status shared by print orders and their progress entries.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "uploaded")]
    Uploaded,
    #[sea_orm(string_value = "reviewing")]
    Reviewing,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "in_production")]
    InProduction,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Delivered and cancelled orders do not move any further.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether an order currently in `self` may be moved to `next` when
    /// transition enforcement is switched on.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        !self.is_terminal() || self == next
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PrintStyle {
    #[sea_orm(string_value = "engraving")]
    Engraving,
    #[sea_orm(string_value = "cutting")]
    Cutting,
    #[sea_orm(string_value = "marking")]
    Marking,
    #[sea_orm(string_value = "relief")]
    Relief,
}

/// Largest accepted side, in centimetres.
pub const MAX_SIDE_CM: f64 = 1000.0;

/// Piece size in centimetres. Every side is strictly positive and at most
/// [`MAX_SIDE_CM`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Dimensions {
    pub const KEYS: [&'static str; 3] = ["width", "height", "depth"];

    pub fn new(width: f64, height: f64, depth: f64) -> Result<Self, ServiceError> {
        for (name, value) in Self::KEYS.iter().zip([width, height, depth]) {
            check_side(name, value)?;
        }
        Ok(Self {
            width,
            height,
            depth,
        })
    }

    /// Width x height, the surface that gets priced.
    pub fn area(&self) -> Result<Decimal, ServiceError> {
        to_decimal("width", self.width)?
            .checked_mul(to_decimal("height", self.height)?)
            .ok_or_else(|| too_large("area"))
    }

    pub fn volume(&self) -> Result<Decimal, ServiceError> {
        self.area()?
            .checked_mul(to_decimal("depth", self.depth)?)
            .ok_or_else(|| too_large("volume"))
    }
}

impl TryFrom<&HashMap<String, f64>> for Dimensions {
    type Error = ServiceError;

    fn try_from(map: &HashMap<String, f64>) -> Result<Self, Self::Error> {
        let side = |key: &str| {
            map.get(key).copied().ok_or_else(|| {
                ServiceError::ValidationError(format!("dimensions: missing '{}'", key))
            })
        };
        Dimensions::new(side("width")?, side("height")?, side("depth")?)
    }
}

fn check_side(name: &str, value: f64) -> Result<(), ServiceError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ServiceError::ValidationError(format!(
            "dimensions: '{}' must be a positive number",
            name
        )));
    }
    if value > MAX_SIDE_CM {
        return Err(ServiceError::ValidationError(format!(
            "dimensions: '{}' must be at most {} cm",
            name, MAX_SIDE_CM
        )));
    }
    Ok(())
}

// Fields are public, so values built without `new` are re-checked here.
fn to_decimal(name: &str, value: f64) -> Result<Decimal, ServiceError> {
    check_side(name, value)?;
    Decimal::from_f64(value).ok_or_else(|| {
        ServiceError::ValidationError(format!("dimensions: '{}' is not a valid number", name))
    })
}

fn too_large(what: &str) -> ServiceError {
    ServiceError::ValidationError(format!("dimensions: {} is too large", what))
}

/// One free-form shipment event attached to an order by an administrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrackingUpdate {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub description: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::str::FromStr;

    #[test]
    fn terminal_statuses_reject_further_moves() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());

        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Approved));
        assert!(OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn status_text_is_snake_case() {
        assert_eq!(OrderStatus::InProduction.to_string(), "in_production");
        assert_eq!(
            OrderStatus::from_str("in_production").ok(),
            Some(OrderStatus::InProduction)
        );
        assert_eq!(
            serde_json::to_value(PaymentStatus::Refunded).unwrap(),
            serde_json::json!("refunded")
        );
        assert!(PrintStyle::from_str("embossing").is_err());
    }

    #[test]
    fn dimensions_from_map() {
        let map: HashMap<String, f64> = [("width", 10.0), ("height", 20.0), ("depth", 1.5)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let dims = Dimensions::try_from(&map).unwrap();
        assert_eq!(dims.width, 10.0);
        assert_eq!(dims.area().unwrap(), Decimal::from(200));
        assert_eq!(dims.volume().unwrap(), Decimal::from(300));
    }

    #[test]
    fn dimensions_reject_missing_or_non_positive_sides() {
        let missing: HashMap<String, f64> = [("width".to_string(), 10.0)].into_iter().collect();
        assert_matches!(
            Dimensions::try_from(&missing),
            Err(ServiceError::ValidationError(msg)) if msg.contains("height")
        );

        assert_matches!(
            Dimensions::new(10.0, 0.0, 1.0),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            Dimensions::new(10.0, 5.0, -2.0),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            Dimensions::new(f64::NAN, 5.0, 2.0),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn oversized_sides_are_rejected_not_overflowed() {
        assert_matches!(
            Dimensions::new(1e15, 1e15, 1.0),
            Err(ServiceError::ValidationError(msg)) if msg.contains("at most")
        );
        assert!(Dimensions::new(MAX_SIDE_CM, MAX_SIDE_CM, MAX_SIDE_CM).is_ok());

        // built directly, bypassing `new`
        let raw = Dimensions {
            width: 1e15,
            height: 1e15,
            depth: 1.0,
        };
        assert_matches!(raw.area(), Err(ServiceError::ValidationError(_)));
        assert_matches!(raw.volume(), Err(ServiceError::ValidationError(_)));
    }
}
