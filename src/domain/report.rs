use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountClass;

/// Raw per-account movement over a period, as summed by storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTotals {
    pub account_code: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

/// One row of the trial-balance view. `balance` is signed toward the
/// account's normal side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account_code: String,
    pub account_name: String,
    pub class: AccountClass,
    pub debit: Decimal,
    pub credit: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub account_code: String,
    pub account_name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub rows: Vec<ReportRow>,
    pub subtotal: Decimal,
}

/// Income statement assembled waterfall-style from trial-balance rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub revenue: ReportSection,
    pub cost_of_sales: ReportSection,
    pub gross_profit: Decimal,
    pub operating_expenses: ReportSection,
    pub operating_income: Decimal,
    pub other_income: ReportSection,
    pub other_expense: ReportSection,
    pub net_income: Decimal,
}
