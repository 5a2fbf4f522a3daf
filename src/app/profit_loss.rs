//! Trial-balance derivation and the waterfall aggregation of its rows
//! into an income statement.

use crate::domain::{
    Account, AccountClass, AccountTotals, IncomeStatement, NormalBalance, ReportRow,
    ReportSection, TrialBalanceRow,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Build the trial-balance row set from the per-account movement sums.
/// Accounts with no movement in the period are omitted; rows come out in
/// account-code order. Movement on codes missing from the chart is skipped.
pub fn trial_balance(accounts: &[Account], totals: &[AccountTotals]) -> Vec<TrialBalanceRow> {
    let by_code: HashMap<&str, &Account> = accounts
        .iter()
        .map(|account| (account.code.as_str(), account))
        .collect();

    let mut rows: Vec<TrialBalanceRow> = totals
        .iter()
        .filter(|t| t.debit != Decimal::ZERO || t.credit != Decimal::ZERO)
        .filter_map(|t| {
            let account = by_code.get(t.account_code.as_str())?;
            let balance = match account.normal_balance {
                NormalBalance::Debit => t.debit - t.credit,
                NormalBalance::Credit => t.credit - t.debit,
            };
            Some(TrialBalanceRow {
                account_code: account.code.clone(),
                account_name: account.name.clone(),
                class: account.class,
                debit: t.debit,
                credit: t.credit,
                balance,
            })
        })
        .collect();

    rows.sort_by(|a, b| a.account_code.cmp(&b.account_code));
    rows
}

/// Aggregate trial-balance rows into the income statement. Balance-sheet
/// classes never contribute; each P&L row enters its section with the
/// account's natural sign (credit-normal classes as credit − debit,
/// debit-normal as debit − credit), so contra rows show up negative.
pub fn income_statement(
    from: NaiveDate,
    to: NaiveDate,
    rows: &[TrialBalanceRow],
) -> IncomeStatement {
    let revenue = section_for(rows, AccountClass::Revenue);
    let cost_of_sales = section_for(rows, AccountClass::CostOfSales);
    let operating_expenses = section_for(rows, AccountClass::OperatingExpense);
    let other_income = section_for(rows, AccountClass::OtherIncome);
    let other_expense = section_for(rows, AccountClass::OtherExpense);

    let gross_profit = revenue.subtotal - cost_of_sales.subtotal;
    let operating_income = gross_profit - operating_expenses.subtotal;
    let net_income = operating_income + other_income.subtotal - other_expense.subtotal;

    IncomeStatement {
        from,
        to,
        revenue,
        cost_of_sales,
        gross_profit,
        operating_expenses,
        operating_income,
        other_income,
        other_expense,
        net_income,
    }
}

fn section_for(rows: &[TrialBalanceRow], class: AccountClass) -> ReportSection {
    let section_rows: Vec<ReportRow> = rows
        .iter()
        .filter(|row| row.class == class)
        .map(|row| ReportRow {
            account_code: row.account_code.clone(),
            account_name: row.account_name.clone(),
            amount: row.balance,
        })
        .collect();

    let subtotal = section_rows.iter().map(|row| row.amount).sum();

    ReportSection {
        rows: section_rows,
        subtotal,
    }
}
