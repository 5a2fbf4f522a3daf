//! Domain data shapes shared across layers.

pub mod account;
pub mod invoice;
pub mod journal;
pub mod purchase;
pub mod report;

pub use account::{Account, AccountClass, Company, NormalBalance};
pub use invoice::{
    InvoicePayment, InvoiceStatus, PaymentAllocation, PaymentComponent, VendorInvoice,
};
pub use journal::{AdjustmentJournal, CashVoucher, JournalLine, VoucherKind};
pub use purchase::{PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus};
pub use report::{AccountTotals, IncomeStatement, ReportRow, ReportSection, TrialBalanceRow};
