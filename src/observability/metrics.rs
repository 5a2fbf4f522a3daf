//! Counter helpers for the back-office use cases.
//!
//! Names follow Prometheus conventions; the recorder is installed once by
//! the `serve` command and rendered at `GET /metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Safe to call once per process.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))?;
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics system initialized");
    Ok(())
}

/// Render the current metrics snapshot in Prometheus exposition format.
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod vouchers {
    pub fn accepted() {
        ::metrics::counter!("tatabuku_vouchers_accepted_total").increment(1);
    }

    pub fn rejected() {
        ::metrics::counter!("tatabuku_vouchers_rejected_total").increment(1);
    }

    pub fn findings(count: usize) {
        ::metrics::counter!("tatabuku_voucher_findings_total").increment(count as u64);
    }
}

pub mod payments {
    pub fn allocated() {
        ::metrics::counter!("tatabuku_payments_allocated_total").increment(1);
    }

    pub fn rejected() {
        ::metrics::counter!("tatabuku_payments_rejected_total").increment(1);
    }

    pub fn invoice_settled() {
        ::metrics::counter!("tatabuku_invoices_settled_total").increment(1);
    }
}

pub mod suggestions {
    pub fn queried() {
        ::metrics::counter!("tatabuku_suggestions_queried_total").increment(1);
    }

    pub fn auto_apply() {
        ::metrics::counter!("tatabuku_suggestions_auto_apply_total").increment(1);
    }

    pub fn score_recorded(score: f64) {
        ::metrics::histogram!("tatabuku_suggestion_best_score").record(score);
    }
}

pub mod reports {
    pub fn trial_balance_built() {
        ::metrics::counter!("tatabuku_trial_balance_built_total").increment(1);
    }

    pub fn income_statement_built() {
        ::metrics::counter!("tatabuku_income_statement_built_total").increment(1);
    }
}
