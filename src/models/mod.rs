// Domain value types shared by entities, services and handlers
pub mod print_order;

pub use print_order::{
    Dimensions, OrderStatus, PaymentStatus, PrintStyle, TrackingUpdate, MAX_SIDE_CM,
};
