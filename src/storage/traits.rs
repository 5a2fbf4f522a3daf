use crate::domain::*;
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Page {
    /// Clamp user-supplied paging to sane bounds.
    pub fn clamped(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PurchaseOrderFilter {
    pub supplier: Option<String>,
    pub status: Option<PurchaseOrderStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Free-text search over remark and item names.
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub supplier: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VoucherFilter {
    pub kind: Option<VoucherKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Free-text search over remark and line memos.
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AdjustmentFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub q: Option<String>,
}

/// Storage trait for the bookkeeping tables. Every operation below a
/// company method is scoped to that company; rows of other tenants are
/// invisible to it.
#[async_trait]
pub trait Storage: Send + Sync {
    // Companies
    async fn create_company(&self, company: &mut Company) -> Result<()>;
    async fn get_company(&self, id: i64) -> Result<Option<Company>>;
    async fn get_company_by_code(&self, code: &str) -> Result<Option<Company>>;
    async fn list_companies(&self) -> Result<Vec<Company>>;

    // Chart of accounts
    async fn upsert_account(&self, account: &mut Account) -> Result<()>;
    async fn get_account(&self, company_id: i64, code: &str) -> Result<Option<Account>>;
    async fn list_accounts(&self, company_id: i64) -> Result<Vec<Account>>;

    // Purchase orders
    async fn create_purchase_order(&self, order: &mut PurchaseOrder) -> Result<()>;
    async fn get_purchase_order(&self, company_id: i64, id: Uuid)
        -> Result<Option<PurchaseOrder>>;
    async fn update_purchase_order(&self, order: &PurchaseOrder) -> Result<()>;
    async fn delete_purchase_order(&self, company_id: i64, id: Uuid) -> Result<()>;
    async fn list_purchase_orders(
        &self,
        company_id: i64,
        filter: &PurchaseOrderFilter,
        page: Page,
    ) -> Result<Vec<PurchaseOrder>>;

    // Vendor invoices
    async fn create_invoice(&self, invoice: &mut VendorInvoice) -> Result<()>;
    async fn get_invoice(&self, company_id: i64, id: Uuid) -> Result<Option<VendorInvoice>>;
    async fn update_invoice(&self, invoice: &VendorInvoice) -> Result<()>;
    async fn delete_invoice(&self, company_id: i64, id: Uuid) -> Result<()>;
    async fn list_invoices(
        &self,
        company_id: i64,
        filter: &InvoiceFilter,
        page: Page,
    ) -> Result<Vec<VendorInvoice>>;

    // Invoice payments
    /// Persist a payment with its allocations and move the invoice to
    /// `new_status`, all in one transaction.
    async fn record_payment(
        &self,
        company_id: i64,
        payment: &mut InvoicePayment,
        new_status: InvoiceStatus,
    ) -> Result<()>;
    async fn list_payments(&self, company_id: i64, invoice_id: Uuid)
        -> Result<Vec<InvoicePayment>>;
    /// Sums of the DPP and PPN slices already paid against an invoice.
    async fn paid_components(&self, company_id: i64, invoice_id: Uuid)
        -> Result<(Decimal, Decimal)>;

    // Cash vouchers
    async fn create_voucher(&self, voucher: &mut CashVoucher) -> Result<()>;
    async fn get_voucher(&self, company_id: i64, id: Uuid) -> Result<Option<CashVoucher>>;
    async fn update_voucher(&self, voucher: &CashVoucher) -> Result<()>;
    async fn delete_voucher(&self, company_id: i64, id: Uuid) -> Result<()>;
    async fn list_vouchers(
        &self,
        company_id: i64,
        filter: &VoucherFilter,
        page: Page,
    ) -> Result<Vec<CashVoucher>>;

    // Adjustment journals
    async fn create_adjustment(&self, journal: &mut AdjustmentJournal) -> Result<()>;
    async fn get_adjustment(&self, company_id: i64, id: Uuid)
        -> Result<Option<AdjustmentJournal>>;
    async fn update_adjustment(&self, journal: &AdjustmentJournal) -> Result<()>;
    async fn delete_adjustment(&self, company_id: i64, id: Uuid) -> Result<()>;
    async fn list_adjustments(
        &self,
        company_id: i64,
        filter: &AdjustmentFilter,
        page: Page,
    ) -> Result<Vec<AdjustmentJournal>>;

    // Derived queries
    /// The most recent `(account_code, memo)` pairs across voucher and
    /// adjustment lines, newest first — the suggestion corpus.
    async fn recent_journal_memos(
        &self,
        company_id: i64,
        limit: usize,
    ) -> Result<Vec<(String, String)>>;
    /// Per-account debit/credit sums over posted journal lines in the
    /// period, both endpoints inclusive.
    async fn account_movement(
        &self,
        company_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AccountTotals>>;
}
