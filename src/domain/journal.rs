use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherKind {
    CashIn,
    CashOut,
}

impl VoucherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherKind::CashIn => "cash_in",
            VoucherKind::CashOut => "cash_out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash_in" => Some(VoucherKind::CashIn),
            "cash_out" => Some(VoucherKind::CashOut),
            _ => None,
        }
    }

    /// Prefix used by the voucher numbering scheme.
    pub fn number_prefix(&self) -> &'static str {
        match self {
            VoucherKind::CashIn => "CI",
            VoucherKind::CashOut => "CO",
        }
    }
}

/// One journal line. A valid line carries an amount on exactly one side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_code: String,
    pub memo: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
}

/// A cash-book voucher: a balanced journal entry attached to a cash
/// receipt or disbursement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashVoucher {
    pub id: Option<Uuid>,
    pub company_id: i64,
    /// Assigned on create: `CI-`/`CO-<year>-<seq>`.
    pub number: Option<String>,
    pub kind: VoucherKind,
    pub voucher_date: NaiveDate,
    pub remark: Option<String>,
    pub lines: Vec<JournalLine>,
    pub created_at: DateTime<Utc>,
}

/// A period-end adjusting entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentJournal {
    pub id: Option<Uuid>,
    pub company_id: i64,
    /// Assigned on create: `AJ-<year>-<seq>`.
    pub number: Option<String>,
    pub journal_date: NaiveDate,
    pub memo: Option<String>,
    pub lines: Vec<JournalLine>,
    pub created_at: DateTime<Utc>,
}

impl JournalLine {
    pub fn debit_total(lines: &[JournalLine]) -> Decimal {
        lines.iter().map(|line| line.debit).sum()
    }

    pub fn credit_total(lines: &[JournalLine]) -> Decimal {
        lines.iter().map(|line| line.credit).sum()
    }
}
