pub mod design_file;
pub mod order_progress;
pub mod print_order;
