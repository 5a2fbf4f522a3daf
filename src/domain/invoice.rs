use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Open,
    PartiallyPaid,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Open => "open",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(InvoiceStatus::Open),
            "partially_paid" => Some(InvoiceStatus::PartiallyPaid),
            "paid" => Some(InvoiceStatus::Paid),
            _ => None,
        }
    }
}

/// A vendor invoice taken into the books. `dpp` is the tax base, `ppn` the
/// VAT on it; the header must satisfy `dpp + ppn == total`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorInvoice {
    pub id: Option<Uuid>,
    pub company_id: i64,
    pub invoice_number: String,
    pub supplier: String,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub dpp: Decimal,
    pub ppn: Decimal,
    pub total: Decimal,
    pub status: InvoiceStatus,
    pub remark: Option<String>,
    pub purchase_order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Which invoice component a payment slice settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentComponent {
    Dpp,
    Ppn,
}

impl PaymentComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentComponent::Dpp => "dpp",
            PaymentComponent::Ppn => "ppn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dpp" => Some(PaymentComponent::Dpp),
            "ppn" => Some(PaymentComponent::Ppn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub component: PaymentComponent,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicePayment {
    pub id: Option<Uuid>,
    pub invoice_id: Uuid,
    pub paid_at: NaiveDate,
    pub method: String,
    pub amount: Decimal,
    pub allocations: Vec<PaymentAllocation>,
    pub created_at: DateTime<Utc>,
}
