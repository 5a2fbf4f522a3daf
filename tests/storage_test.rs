use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tatabuku::db::DatabaseManager;
use tatabuku::domain::*;
use tatabuku::storage::{Page, SqliteStorage, Storage, VoucherFilter};
use tempfile::tempdir;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

async fn storage() -> Result<SqliteStorage> {
    let db = DatabaseManager::open_in_memory()?;
    db.run_migrations().await?;
    Ok(SqliteStorage::new(Arc::new(db)))
}

async fn seed_company(storage: &SqliteStorage, code: &str) -> Result<i64> {
    let mut company = Company {
        id: None,
        code: code.to_string(),
        name: format!("{code} Pte"),
        created_at: Utc::now(),
    };
    storage.create_company(&mut company).await?;
    let company_id = company.id.unwrap();

    for (code, name, class) in [
        ("1100", "Kas", AccountClass::Asset),
        ("4100", "Penjualan", AccountClass::Revenue),
        ("6200", "Beban Sewa", AccountClass::OperatingExpense),
    ] {
        let mut account = Account {
            id: None,
            company_id,
            code: code.to_string(),
            name: name.to_string(),
            class,
            normal_balance: class.normal_balance(),
        };
        storage.upsert_account(&mut account).await?;
    }
    Ok(company_id)
}

fn voucher(company_id: i64, day: &str, remark: &str, memo: &str) -> CashVoucher {
    CashVoucher {
        id: None,
        company_id,
        number: None,
        kind: VoucherKind::CashIn,
        voucher_date: date(day),
        remark: Some(remark.to_string()),
        lines: vec![
            JournalLine {
                account_code: "1100".to_string(),
                memo: Some(memo.to_string()),
                debit: d("250"),
                credit: Decimal::ZERO,
            },
            JournalLine {
                account_code: "4100".to_string(),
                memo: Some(memo.to_string()),
                debit: Decimal::ZERO,
                credit: d("250"),
            },
        ],
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn migrations_apply_to_a_fresh_file() -> Result<()> {
    let dir = tempdir()?;
    let db = DatabaseManager::open(dir.path().join("books.db"))?;
    db.run_migrations().await?;
    // Second run must be a no-op.
    db.run_migrations().await?;
    Ok(())
}

#[tokio::test]
async fn voucher_round_trip_preserves_lines() -> Result<()> {
    let storage = storage().await?;
    let company_id = seed_company(&storage, "DEMO").await?;

    let mut posted = voucher(company_id, "2025-03-10", "setoran penjualan", "penjualan tunai");
    storage.create_voucher(&mut posted).await?;
    let id = posted.id.unwrap();
    assert_eq!(posted.number.as_deref(), Some("CI-2025-0001"));

    let loaded = storage.get_voucher(company_id, id).await?.unwrap();
    assert_eq!(loaded.lines.len(), 2);
    assert_eq!(loaded.lines[0].account_code, "1100");
    assert_eq!(loaded.lines[0].debit, d("250"));
    assert_eq!(loaded.lines[1].credit, d("250"));
    assert_eq!(loaded.remark.as_deref(), Some("setoran penjualan"));
    Ok(())
}

#[tokio::test]
async fn voucher_numbers_run_per_company_and_year() -> Result<()> {
    let storage = storage().await?;
    let first = seed_company(&storage, "ALFA").await?;
    let second = seed_company(&storage, "BETA").await?;

    let mut a1 = voucher(first, "2025-01-05", "a", "m");
    let mut a2 = voucher(first, "2025-02-06", "b", "m");
    let mut b1 = voucher(second, "2025-01-07", "c", "m");
    let mut a_prev_year = voucher(first, "2024-12-31", "d", "m");
    storage.create_voucher(&mut a1).await?;
    storage.create_voucher(&mut a2).await?;
    storage.create_voucher(&mut b1).await?;
    storage.create_voucher(&mut a_prev_year).await?;

    assert_eq!(a1.number.as_deref(), Some("CI-2025-0001"));
    assert_eq!(a2.number.as_deref(), Some("CI-2025-0002"));
    // The other tenant starts its own sequence.
    assert_eq!(b1.number.as_deref(), Some("CI-2025-0001"));
    // And last year's books are a separate range.
    assert_eq!(a_prev_year.number.as_deref(), Some("CI-2024-0001"));
    Ok(())
}

#[tokio::test]
async fn tenants_cannot_see_each_others_rows() -> Result<()> {
    let storage = storage().await?;
    let first = seed_company(&storage, "ALFA").await?;
    let second = seed_company(&storage, "BETA").await?;

    let mut posted = voucher(first, "2025-03-10", "kas masuk", "penjualan");
    storage.create_voucher(&mut posted).await?;
    let id = posted.id.unwrap();

    assert!(storage.get_voucher(second, id).await?.is_none());
    assert!(storage.delete_voucher(second, id).await.is_err());

    let listed = storage
        .list_vouchers(second, &VoucherFilter::default(), Page::default())
        .await?;
    assert!(listed.is_empty());

    // The owner still sees it.
    assert!(storage.get_voucher(first, id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn voucher_list_filters_and_paginates() -> Result<()> {
    let storage = storage().await?;
    let company_id = seed_company(&storage, "DEMO").await?;

    for (day, remark, memo) in [
        ("2025-01-10", "sewa kantor januari", "sewa kantor"),
        ("2025-02-10", "sewa kantor februari", "sewa kantor"),
        ("2025-03-10", "setoran tunai", "penjualan tunai"),
    ] {
        let mut posted = voucher(company_id, day, remark, memo);
        storage.create_voucher(&mut posted).await?;
    }

    let by_text = storage
        .list_vouchers(
            company_id,
            &VoucherFilter {
                q: Some("sewa".to_string()),
                ..VoucherFilter::default()
            },
            Page::default(),
        )
        .await?;
    assert_eq!(by_text.len(), 2);

    let by_range = storage
        .list_vouchers(
            company_id,
            &VoucherFilter {
                from: Some(date("2025-02-01")),
                to: Some(date("2025-02-28")),
                ..VoucherFilter::default()
            },
            Page::default(),
        )
        .await?;
    assert_eq!(by_range.len(), 1);
    assert_eq!(by_range[0].remark.as_deref(), Some("sewa kantor februari"));

    let second_page = storage
        .list_vouchers(
            company_id,
            &VoucherFilter::default(),
            Page {
                limit: 2,
                offset: 2,
            },
        )
        .await?;
    assert_eq!(second_page.len(), 1);
    Ok(())
}

#[tokio::test]
async fn purchase_order_update_replaces_lines() -> Result<()> {
    let storage = storage().await?;
    let company_id = seed_company(&storage, "DEMO").await?;

    let mut order = PurchaseOrder {
        id: None,
        company_id,
        po_number: None,
        supplier: "PT Sumber Makmur".to_string(),
        order_date: date("2025-04-01"),
        status: PurchaseOrderStatus::Draft,
        remark: None,
        lines: vec![PurchaseOrderLine {
            item_name: "Kertas A4".to_string(),
            quantity: d("10"),
            unit_price: d("45000"),
            amount: d("450000"),
        }],
        created_at: Utc::now(),
    };
    storage.create_purchase_order(&mut order).await?;
    assert_eq!(order.po_number.as_deref(), Some("PO-2025-0001"));

    let mut updated = order.clone();
    updated.status = PurchaseOrderStatus::Received;
    updated.lines = vec![
        PurchaseOrderLine {
            item_name: "Kertas A4".to_string(),
            quantity: d("10"),
            unit_price: d("45000"),
            amount: d("450000"),
        },
        PurchaseOrderLine {
            item_name: "Tinta printer".to_string(),
            quantity: d("2"),
            unit_price: d("120000"),
            amount: d("240000"),
        },
    ];
    storage.update_purchase_order(&updated).await?;

    let loaded = storage
        .get_purchase_order(company_id, order.id.unwrap())
        .await?
        .unwrap();
    assert_eq!(loaded.status, PurchaseOrderStatus::Received);
    assert_eq!(loaded.lines.len(), 2);
    assert_eq!(loaded.total(), d("690000"));
    Ok(())
}

#[tokio::test]
async fn memo_corpus_spans_vouchers_and_adjustments() -> Result<()> {
    let storage = storage().await?;
    let company_id = seed_company(&storage, "DEMO").await?;

    let mut posted = voucher(company_id, "2025-05-02", "kas", "sewa kantor mei");
    storage.create_voucher(&mut posted).await?;

    let mut adjustment = AdjustmentJournal {
        id: None,
        company_id,
        number: None,
        journal_date: date("2025-05-31"),
        memo: Some("penyesuaian akhir bulan".to_string()),
        lines: vec![
            JournalLine {
                account_code: "6200".to_string(),
                memo: Some("akrual sewa mei".to_string()),
                debit: d("100"),
                credit: Decimal::ZERO,
            },
            JournalLine {
                account_code: "1100".to_string(),
                memo: None,
                debit: Decimal::ZERO,
                credit: d("100"),
            },
        ],
        created_at: Utc::now(),
    };
    storage.create_adjustment(&mut adjustment).await?;
    assert_eq!(adjustment.number.as_deref(), Some("AJ-2025-0001"));

    let memos = storage.recent_journal_memos(company_id, 10).await?;
    // Three memo-carrying lines; the None memo stays out.
    assert_eq!(memos.len(), 3);
    assert!(memos
        .iter()
        .any(|(code, memo)| code == "6200" && memo == "akrual sewa mei"));
    Ok(())
}
