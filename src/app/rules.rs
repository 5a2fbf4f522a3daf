//! Bookkeeping validation: granular findings with a severity, rolled up
//! into an accept/reject verdict. The same engine checks cash vouchers and
//! adjustment journals; invoice intake reuses the finding shape for its
//! header arithmetic.

use crate::domain::JournalLine;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    EmptyLines,
    UnbalancedEntry,
    MissingAccount,
    UnknownAccount,
    BothSidesUsed,
    ZeroLine,
    NegativeAmount,
    DppPlusTaxMismatch,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// One concrete problem found in an entry. `line` is the zero-based index
/// of the offending line, when the problem is line-scoped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub description: String,
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCheck {
    pub verdict: Verdict,
    pub findings: Vec<Finding>,
}

impl EntryCheck {
    fn from_findings(findings: Vec<Finding>) -> Self {
        let verdict = if findings.iter().any(|f| f.severity == Severity::Error) {
            Verdict::Reject
        } else {
            Verdict::Accept
        };
        Self { verdict, findings }
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict == Verdict::Accept
    }
}

/// Validates journal entries against the tenant's chart of accounts.
pub struct EntryRules {
    known_accounts: HashSet<String>,
}

impl EntryRules {
    pub fn new<I, S>(account_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_accounts: account_codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Check the journal lines of a voucher or adjustment entry.
    pub fn check_lines(&self, lines: &[JournalLine]) -> EntryCheck {
        let mut findings = Vec::new();

        if lines.len() < 2 {
            findings.push(Finding {
                kind: FindingKind::EmptyLines,
                severity: Severity::Error,
                description: "a journal entry needs at least two lines".to_string(),
                line: None,
            });
        }

        for (idx, line) in lines.iter().enumerate() {
            if line.account_code.trim().is_empty() {
                findings.push(Finding {
                    kind: FindingKind::MissingAccount,
                    severity: Severity::Error,
                    description: "line has no account code".to_string(),
                    line: Some(idx),
                });
            } else if !self.known_accounts.contains(line.account_code.trim()) {
                findings.push(Finding {
                    kind: FindingKind::UnknownAccount,
                    severity: Severity::Error,
                    description: format!(
                        "account '{}' is not in the chart of accounts",
                        line.account_code.trim()
                    ),
                    line: Some(idx),
                });
            }

            if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
                findings.push(Finding {
                    kind: FindingKind::NegativeAmount,
                    severity: Severity::Error,
                    description: "amounts must not be negative".to_string(),
                    line: Some(idx),
                });
            }

            if line.debit > Decimal::ZERO && line.credit > Decimal::ZERO {
                findings.push(Finding {
                    kind: FindingKind::BothSidesUsed,
                    severity: Severity::Error,
                    description: "a line must touch exactly one side".to_string(),
                    line: Some(idx),
                });
            }

            if line.debit == Decimal::ZERO && line.credit == Decimal::ZERO {
                findings.push(Finding {
                    kind: FindingKind::ZeroLine,
                    severity: Severity::Warning,
                    description: "line carries no amount".to_string(),
                    line: Some(idx),
                });
            }
        }

        let debit = JournalLine::debit_total(lines);
        let credit = JournalLine::credit_total(lines);
        if debit != credit {
            findings.push(Finding {
                kind: FindingKind::UnbalancedEntry,
                severity: Severity::Error,
                description: format!("debit {debit} does not equal credit {credit}"),
                line: None,
            });
        }

        EntryCheck::from_findings(findings)
    }

    /// Check the DPP + PPN = total arithmetic of an invoice header.
    pub fn check_invoice_header(dpp: Decimal, ppn: Decimal, total: Decimal) -> EntryCheck {
        let mut findings = Vec::new();

        if dpp < Decimal::ZERO || ppn < Decimal::ZERO || total < Decimal::ZERO {
            findings.push(Finding {
                kind: FindingKind::NegativeAmount,
                severity: Severity::Error,
                description: "invoice amounts must not be negative".to_string(),
                line: None,
            });
        }

        if dpp + ppn != total {
            findings.push(Finding {
                kind: FindingKind::DppPlusTaxMismatch,
                severity: Severity::Error,
                description: format!("DPP {dpp} + PPN {ppn} does not equal total {total}"),
                line: None,
            });
        }

        EntryCheck::from_findings(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(account: &str, debit: &str, credit: &str) -> JournalLine {
        JournalLine {
            account_code: account.to_string(),
            memo: None,
            debit: d(debit),
            credit: d(credit),
        }
    }

    fn rules() -> EntryRules {
        EntryRules::new(["1100", "4100", "6200"])
    }

    #[test]
    fn balanced_entry_is_accepted() {
        let check = rules().check_lines(&[line("1100", "250", "0"), line("4100", "0", "250")]);
        assert!(check.is_accepted());
        assert!(check.findings.is_empty());
    }

    #[test]
    fn unbalanced_entry_is_rejected() {
        let check = rules().check_lines(&[line("1100", "250", "0"), line("4100", "0", "200")]);
        assert_eq!(check.verdict, Verdict::Reject);
        assert!(check
            .findings
            .iter()
            .any(|f| f.kind == FindingKind::UnbalancedEntry));
    }

    #[test]
    fn unknown_account_is_rejected() {
        let check = rules().check_lines(&[line("1100", "50", "0"), line("9999", "0", "50")]);
        assert_eq!(check.verdict, Verdict::Reject);
        let finding = check
            .findings
            .iter()
            .find(|f| f.kind == FindingKind::UnknownAccount)
            .unwrap();
        assert_eq!(finding.line, Some(1));
    }

    #[test]
    fn line_on_both_sides_is_rejected() {
        let check = rules().check_lines(&[line("1100", "50", "50"), line("4100", "0", "0")]);
        assert!(check
            .findings
            .iter()
            .any(|f| f.kind == FindingKind::BothSidesUsed));
        assert_eq!(check.verdict, Verdict::Reject);
    }

    #[test]
    fn zero_line_is_only_a_warning() {
        let check = rules().check_lines(&[
            line("1100", "100", "0"),
            line("4100", "0", "100"),
            line("6200", "0", "0"),
        ]);
        assert!(check.is_accepted());
        let finding = check
            .findings
            .iter()
            .find(|f| f.kind == FindingKind::ZeroLine)
            .unwrap();
        assert_eq!(finding.severity, Severity::Warning);
        assert_eq!(finding.line, Some(2));
    }

    #[test]
    fn single_line_entry_is_rejected() {
        let check = rules().check_lines(&[line("1100", "100", "100")]);
        assert!(check
            .findings
            .iter()
            .any(|f| f.kind == FindingKind::EmptyLines));
    }

    #[test]
    fn invoice_header_arithmetic_must_hold() {
        assert!(EntryRules::check_invoice_header(d("1000"), d("110"), d("1110")).is_accepted());

        let check = EntryRules::check_invoice_header(d("1000"), d("110"), d("1100"));
        assert_eq!(check.verdict, Verdict::Reject);
        assert!(check
            .findings
            .iter()
            .any(|f| f.kind == FindingKind::DppPlusTaxMismatch));
    }

    #[test]
    fn negative_invoice_amounts_are_rejected() {
        let check = EntryRules::check_invoice_header(d("-10"), d("10"), d("0"));
        assert_eq!(check.verdict, Verdict::Reject);
    }
}
