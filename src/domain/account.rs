use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tenant. Every business row below is keyed by a company id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Option<i64>,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Classification used by the income-statement waterfall. Asset, liability,
/// and equity accounts never reach the P&L.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountClass {
    Asset,
    Liability,
    Equity,
    Revenue,
    CostOfSales,
    OperatingExpense,
    OtherIncome,
    OtherExpense,
}

impl AccountClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountClass::Asset => "asset",
            AccountClass::Liability => "liability",
            AccountClass::Equity => "equity",
            AccountClass::Revenue => "revenue",
            AccountClass::CostOfSales => "cost_of_sales",
            AccountClass::OperatingExpense => "operating_expense",
            AccountClass::OtherIncome => "other_income",
            AccountClass::OtherExpense => "other_expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asset" => Some(AccountClass::Asset),
            "liability" => Some(AccountClass::Liability),
            "equity" => Some(AccountClass::Equity),
            "revenue" => Some(AccountClass::Revenue),
            "cost_of_sales" => Some(AccountClass::CostOfSales),
            "operating_expense" => Some(AccountClass::OperatingExpense),
            "other_income" => Some(AccountClass::OtherIncome),
            "other_expense" => Some(AccountClass::OtherExpense),
            _ => None,
        }
    }

    /// The side the account naturally grows on.
    pub fn normal_balance(&self) -> NormalBalance {
        match self {
            AccountClass::Asset
            | AccountClass::CostOfSales
            | AccountClass::OperatingExpense
            | AccountClass::OtherExpense => NormalBalance::Debit,
            AccountClass::Liability
            | AccountClass::Equity
            | AccountClass::Revenue
            | AccountClass::OtherIncome => NormalBalance::Credit,
        }
    }

    pub fn is_profit_and_loss(&self) -> bool {
        matches!(
            self,
            AccountClass::Revenue
                | AccountClass::CostOfSales
                | AccountClass::OperatingExpense
                | AccountClass::OtherIncome
                | AccountClass::OtherExpense
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalBalance {
    Debit,
    Credit,
}

impl NormalBalance {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalBalance::Debit => "debit",
            NormalBalance::Credit => "credit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "debit" => Some(NormalBalance::Debit),
            "credit" => Some(NormalBalance::Credit),
            _ => None,
        }
    }
}

/// One row of the chart of accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Option<i64>,
    pub company_id: i64,
    pub code: String,
    pub name: String,
    pub class: AccountClass,
    pub normal_balance: NormalBalance,
}
