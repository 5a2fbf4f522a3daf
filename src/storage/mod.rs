pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{
    AdjustmentFilter, InvoiceFilter, Page, PurchaseOrderFilter, Storage, VoucherFilter,
};
