pub mod print_order_repository;

pub use print_order_repository::{
    NewPrintOrder, NewProgress, OrderChanges, Page, PrintOrderRepository,
};
