// Pricing rules
pub mod pricing;

// Order lifecycle
pub mod print_orders;
