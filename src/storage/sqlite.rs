use super::traits::{
    AdjustmentFilter, InvoiceFilter, Page, PurchaseOrderFilter, Storage, VoucherFilter,
};
use crate::db::DatabaseManager;
use crate::domain::*;
use crate::error::{BackofficeError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// SQLite-backed storage. Amounts live in TEXT columns and are summed in
/// `Decimal`, never in SQL, so no float drift sneaks into the books.
pub struct SqliteStorage {
    db: Arc<DatabaseManager>,
}

impl SqliteStorage {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> BackofficeError {
    BackofficeError::Database {
        message: format!("failed to decode {what}: {err}"),
    }
}

fn dec_col(what: &str, raw: &str) -> Result<Decimal> {
    raw.parse::<Decimal>().map_err(|e| corrupt(what, e))
}

fn date_col(what: &str, raw: &str) -> Result<NaiveDate> {
    raw.parse::<NaiveDate>().map_err(|e| corrupt(what, e))
}

fn ts_col(what: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(what, e))
}

fn uuid_col(what: &str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| corrupt(what, e))
}

/// Next document number for a company/prefix/year, e.g. `CO-2025-0012`.
/// Derived from the current maximum so it is assigned inside the same
/// transaction as the insert.
fn next_number(
    conn: &Connection,
    table: &str,
    column: &str,
    company_id: i64,
    prefix: &str,
    year: i32,
) -> Result<String> {
    let pattern = format!("{prefix}-{year}-%");
    let sql = format!(
        "SELECT {column} FROM {table} WHERE company_id = ?1 AND {column} LIKE ?2 \
         ORDER BY {column} DESC LIMIT 1"
    );
    let last: Option<String> = conn
        .query_row(&sql, params![company_id, pattern], |row| row.get(0))
        .optional()?;

    let seq = last
        .and_then(|number| {
            number
                .rsplit('-')
                .next()
                .and_then(|tail| tail.parse::<u32>().ok())
        })
        .unwrap_or(0)
        + 1;

    Ok(format!("{prefix}-{year}-{seq:04}"))
}

fn insert_journal_lines(
    conn: &Connection,
    table: &str,
    fk_column: &str,
    owner_id: Uuid,
    lines: &[JournalLine],
) -> Result<()> {
    let sql = format!(
        "INSERT INTO {table} ({fk_column}, line_no, account_code, memo, debit, credit) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    );
    let mut stmt = conn.prepare(&sql)?;
    for (idx, line) in lines.iter().enumerate() {
        stmt.execute(params![
            owner_id.to_string(),
            idx as i64 + 1,
            line.account_code,
            line.memo,
            line.debit.to_string(),
            line.credit.to_string(),
        ])?;
    }
    Ok(())
}

fn load_journal_lines(
    conn: &Connection,
    table: &str,
    fk_column: &str,
    owner_id: Uuid,
) -> Result<Vec<JournalLine>> {
    let sql = format!(
        "SELECT account_code, memo, debit, credit FROM {table} \
         WHERE {fk_column} = ?1 ORDER BY line_no"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![owner_id.to_string()])?;

    let mut lines = Vec::new();
    while let Some(row) = rows.next()? {
        let debit: String = row.get(2)?;
        let credit: String = row.get(3)?;
        lines.push(JournalLine {
            account_code: row.get(0)?,
            memo: row.get(1)?,
            debit: dec_col("line debit", &debit)?,
            credit: dec_col("line credit", &credit)?,
        });
    }
    Ok(lines)
}

fn row_to_company(row: &Row) -> Result<Company> {
    let created_at: String = row.get(3)?;
    Ok(Company {
        id: Some(row.get(0)?),
        code: row.get(1)?,
        name: row.get(2)?,
        created_at: ts_col("company created_at", &created_at)?,
    })
}

fn row_to_account(row: &Row) -> Result<Account> {
    let class: String = row.get(4)?;
    let normal: String = row.get(5)?;
    Ok(Account {
        id: Some(row.get(0)?),
        company_id: row.get(1)?,
        code: row.get(2)?,
        name: row.get(3)?,
        class: AccountClass::parse(&class).ok_or_else(|| corrupt("account class", &class))?,
        normal_balance: NormalBalance::parse(&normal)
            .ok_or_else(|| corrupt("account normal_balance", &normal))?,
    })
}

const PO_COLUMNS: &str =
    "id, company_id, po_number, supplier, order_date, status, remark, created_at";

fn row_to_purchase_order(row: &Row) -> Result<PurchaseOrder> {
    let id: String = row.get(0)?;
    let order_date: String = row.get(4)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(7)?;
    Ok(PurchaseOrder {
        id: Some(uuid_col("purchase order id", &id)?),
        company_id: row.get(1)?,
        po_number: Some(row.get(2)?),
        supplier: row.get(3)?,
        order_date: date_col("order_date", &order_date)?,
        status: PurchaseOrderStatus::parse(&status)
            .ok_or_else(|| corrupt("purchase order status", &status))?,
        remark: row.get(6)?,
        lines: Vec::new(),
        created_at: ts_col("purchase order created_at", &created_at)?,
    })
}

fn load_po_lines(conn: &Connection, order_id: Uuid) -> Result<Vec<PurchaseOrderLine>> {
    let mut stmt = conn.prepare(
        "SELECT item_name, quantity, unit_price, amount FROM purchase_order_lines \
         WHERE order_id = ?1 ORDER BY line_no",
    )?;
    let mut rows = stmt.query(params![order_id.to_string()])?;

    let mut lines = Vec::new();
    while let Some(row) = rows.next()? {
        let quantity: String = row.get(1)?;
        let unit_price: String = row.get(2)?;
        let amount: String = row.get(3)?;
        lines.push(PurchaseOrderLine {
            item_name: row.get(0)?,
            quantity: dec_col("line quantity", &quantity)?,
            unit_price: dec_col("line unit_price", &unit_price)?,
            amount: dec_col("line amount", &amount)?,
        });
    }
    Ok(lines)
}

fn insert_po_lines(conn: &Connection, order_id: Uuid, lines: &[PurchaseOrderLine]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO purchase_order_lines (order_id, line_no, item_name, quantity, unit_price, amount) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (idx, line) in lines.iter().enumerate() {
        stmt.execute(params![
            order_id.to_string(),
            idx as i64 + 1,
            line.item_name,
            line.quantity.to_string(),
            line.unit_price.to_string(),
            line.amount.to_string(),
        ])?;
    }
    Ok(())
}

const INVOICE_COLUMNS: &str = "id, company_id, invoice_number, supplier, invoice_date, due_date, \
     dpp, ppn, total, status, remark, purchase_order_id, created_at";

fn row_to_invoice(row: &Row) -> Result<VendorInvoice> {
    let id: String = row.get(0)?;
    let invoice_date: String = row.get(4)?;
    let due_date: Option<String> = row.get(5)?;
    let dpp: String = row.get(6)?;
    let ppn: String = row.get(7)?;
    let total: String = row.get(8)?;
    let status: String = row.get(9)?;
    let po_id: Option<String> = row.get(11)?;
    let created_at: String = row.get(12)?;
    Ok(VendorInvoice {
        id: Some(uuid_col("invoice id", &id)?),
        company_id: row.get(1)?,
        invoice_number: row.get(2)?,
        supplier: row.get(3)?,
        invoice_date: date_col("invoice_date", &invoice_date)?,
        due_date: due_date.map(|raw| date_col("due_date", &raw)).transpose()?,
        dpp: dec_col("invoice dpp", &dpp)?,
        ppn: dec_col("invoice ppn", &ppn)?,
        total: dec_col("invoice total", &total)?,
        status: InvoiceStatus::parse(&status).ok_or_else(|| corrupt("invoice status", &status))?,
        remark: row.get(10)?,
        purchase_order_id: po_id
            .map(|raw| uuid_col("purchase_order_id", &raw))
            .transpose()?,
        created_at: ts_col("invoice created_at", &created_at)?,
    })
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_company(&self, company: &mut Company) -> Result<()> {
        let conn = self.db.conn().await;
        conn.execute(
            "INSERT INTO companies (code, name, created_at) VALUES (?1, ?2, ?3)",
            params![
                company.code,
                company.name,
                company.created_at.to_rfc3339()
            ],
        )?;
        company.id = Some(conn.last_insert_rowid());
        info!("Created company {} ({})", company.code, company.name);
        Ok(())
    }

    async fn get_company(&self, id: i64) -> Result<Option<Company>> {
        let conn = self.db.conn().await;
        let mut stmt =
            conn.prepare("SELECT id, code, name, created_at FROM companies WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_company(row)?)),
            None => Ok(None),
        }
    }

    async fn get_company_by_code(&self, code: &str) -> Result<Option<Company>> {
        let conn = self.db.conn().await;
        let mut stmt =
            conn.prepare("SELECT id, code, name, created_at FROM companies WHERE code = ?1")?;
        let mut rows = stmt.query(params![code])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_company(row)?)),
            None => Ok(None),
        }
    }

    async fn list_companies(&self) -> Result<Vec<Company>> {
        let conn = self.db.conn().await;
        let mut stmt =
            conn.prepare("SELECT id, code, name, created_at FROM companies ORDER BY code")?;
        let mut rows = stmt.query([])?;
        let mut companies = Vec::new();
        while let Some(row) = rows.next()? {
            companies.push(row_to_company(row)?);
        }
        Ok(companies)
    }

    async fn upsert_account(&self, account: &mut Account) -> Result<()> {
        let conn = self.db.conn().await;
        conn.execute(
            "INSERT INTO accounts (company_id, code, name, class, normal_balance) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT (company_id, code) DO UPDATE SET \
             name = excluded.name, class = excluded.class, normal_balance = excluded.normal_balance",
            params![
                account.company_id,
                account.code,
                account.name,
                account.class.as_str(),
                account.normal_balance.as_str(),
            ],
        )?;
        let id: i64 = conn.query_row(
            "SELECT id FROM accounts WHERE company_id = ?1 AND code = ?2",
            params![account.company_id, account.code],
            |row| row.get(0),
        )?;
        account.id = Some(id);
        debug!("Upserted account {} for company {}", account.code, account.company_id);
        Ok(())
    }

    async fn get_account(&self, company_id: i64, code: &str) -> Result<Option<Account>> {
        let conn = self.db.conn().await;
        let mut stmt = conn.prepare(
            "SELECT id, company_id, code, name, class, normal_balance FROM accounts \
             WHERE company_id = ?1 AND code = ?2",
        )?;
        let mut rows = stmt.query(params![company_id, code])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_account(row)?)),
            None => Ok(None),
        }
    }

    async fn list_accounts(&self, company_id: i64) -> Result<Vec<Account>> {
        let conn = self.db.conn().await;
        let mut stmt = conn.prepare(
            "SELECT id, company_id, code, name, class, normal_balance FROM accounts \
             WHERE company_id = ?1 ORDER BY code",
        )?;
        let mut rows = stmt.query(params![company_id])?;
        let mut accounts = Vec::new();
        while let Some(row) = rows.next()? {
            accounts.push(row_to_account(row)?);
        }
        Ok(accounts)
    }

    async fn create_purchase_order(&self, order: &mut PurchaseOrder) -> Result<()> {
        let mut conn = self.db.conn().await;
        let tx = conn.transaction()?;

        let id = order.id.unwrap_or_else(Uuid::new_v4);
        order.id = Some(id);
        let number = match &order.po_number {
            Some(number) => number.clone(),
            None => next_number(
                &tx,
                "purchase_orders",
                "po_number",
                order.company_id,
                "PO",
                order.order_date.year(),
            )?,
        };
        order.po_number = Some(number.clone());

        tx.execute(
            "INSERT INTO purchase_orders \
             (id, company_id, po_number, supplier, order_date, status, remark, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id.to_string(),
                order.company_id,
                number,
                order.supplier,
                order.order_date.to_string(),
                order.status.as_str(),
                order.remark,
                order.created_at.to_rfc3339(),
            ],
        )?;
        insert_po_lines(&tx, id, &order.lines)?;
        tx.commit()?;

        info!("Created purchase order {} for company {}", number, order.company_id);
        Ok(())
    }

    async fn get_purchase_order(
        &self,
        company_id: i64,
        id: Uuid,
    ) -> Result<Option<PurchaseOrder>> {
        let conn = self.db.conn().await;
        let sql = format!(
            "SELECT {PO_COLUMNS} FROM purchase_orders WHERE company_id = ?1 AND id = ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params![company_id, id.to_string()])?;
        let order = match rows.next()? {
            Some(row) => row_to_purchase_order(row)?,
            None => return Ok(None),
        };
        drop(rows);
        drop(stmt);

        let mut order = order;
        order.lines = load_po_lines(&conn, id)?;
        Ok(Some(order))
    }

    async fn update_purchase_order(&self, order: &PurchaseOrder) -> Result<()> {
        let id = order.id.ok_or(BackofficeError::NotFound("purchase order"))?;
        let mut conn = self.db.conn().await;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE purchase_orders SET supplier = ?1, order_date = ?2, status = ?3, remark = ?4 \
             WHERE company_id = ?5 AND id = ?6",
            params![
                order.supplier,
                order.order_date.to_string(),
                order.status.as_str(),
                order.remark,
                order.company_id,
                id.to_string(),
            ],
        )?;
        if updated == 0 {
            return Err(BackofficeError::NotFound("purchase order"));
        }

        tx.execute(
            "DELETE FROM purchase_order_lines WHERE order_id = ?1",
            params![id.to_string()],
        )?;
        insert_po_lines(&tx, id, &order.lines)?;
        tx.commit()?;
        Ok(())
    }

    async fn delete_purchase_order(&self, company_id: i64, id: Uuid) -> Result<()> {
        let conn = self.db.conn().await;
        let deleted = conn.execute(
            "DELETE FROM purchase_orders WHERE company_id = ?1 AND id = ?2",
            params![company_id, id.to_string()],
        )?;
        if deleted == 0 {
            return Err(BackofficeError::NotFound("purchase order"));
        }
        Ok(())
    }

    async fn list_purchase_orders(
        &self,
        company_id: i64,
        filter: &PurchaseOrderFilter,
        page: Page,
    ) -> Result<Vec<PurchaseOrder>> {
        let conn = self.db.conn().await;
        let mut sql =
            format!("SELECT {PO_COLUMNS} FROM purchase_orders WHERE company_id = ?");
        let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(company_id)];

        if let Some(supplier) = &filter.supplier {
            sql.push_str(" AND supplier LIKE ?");
            args.push(Box::new(format!("%{supplier}%")));
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            args.push(Box::new(status.as_str()));
        }
        if let Some(from) = filter.from {
            sql.push_str(" AND order_date >= ?");
            args.push(Box::new(from.to_string()));
        }
        if let Some(to) = filter.to {
            sql.push_str(" AND order_date <= ?");
            args.push(Box::new(to.to_string()));
        }
        if let Some(q) = &filter.q {
            sql.push_str(
                " AND (remark LIKE ? OR id IN \
                 (SELECT order_id FROM purchase_order_lines WHERE item_name LIKE ?))",
            );
            let needle = format!("%{q}%");
            args.push(Box::new(needle.clone()));
            args.push(Box::new(needle));
        }

        sql.push_str(" ORDER BY order_date DESC, po_number DESC LIMIT ? OFFSET ?");
        args.push(Box::new(page.limit as i64));
        args.push(Box::new(page.offset as i64));

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(args.iter().map(|arg| arg.as_ref())))?;
        let mut orders = Vec::new();
        while let Some(row) = rows.next()? {
            orders.push(row_to_purchase_order(row)?);
        }
        drop(rows);
        drop(stmt);

        for order in &mut orders {
            let id = order.id.expect("listed purchase order has an id");
            order.lines = load_po_lines(&conn, id)?;
        }
        Ok(orders)
    }

    async fn create_invoice(&self, invoice: &mut VendorInvoice) -> Result<()> {
        let conn = self.db.conn().await;
        let id = invoice.id.unwrap_or_else(Uuid::new_v4);
        invoice.id = Some(id);

        conn.execute(
            "INSERT INTO vendor_invoices \
             (id, company_id, invoice_number, supplier, invoice_date, due_date, dpp, ppn, total, \
              status, remark, purchase_order_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                id.to_string(),
                invoice.company_id,
                invoice.invoice_number,
                invoice.supplier,
                invoice.invoice_date.to_string(),
                invoice.due_date.map(|d| d.to_string()),
                invoice.dpp.to_string(),
                invoice.ppn.to_string(),
                invoice.total.to_string(),
                invoice.status.as_str(),
                invoice.remark,
                invoice.purchase_order_id.map(|po| po.to_string()),
                invoice.created_at.to_rfc3339(),
            ],
        )?;

        info!(
            "Took in invoice {} from {} for company {}",
            invoice.invoice_number, invoice.supplier, invoice.company_id
        );
        Ok(())
    }

    async fn get_invoice(&self, company_id: i64, id: Uuid) -> Result<Option<VendorInvoice>> {
        let conn = self.db.conn().await;
        let sql =
            format!("SELECT {INVOICE_COLUMNS} FROM vendor_invoices WHERE company_id = ?1 AND id = ?2");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params![company_id, id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_invoice(row)?)),
            None => Ok(None),
        }
    }

    async fn update_invoice(&self, invoice: &VendorInvoice) -> Result<()> {
        let id = invoice.id.ok_or(BackofficeError::NotFound("invoice"))?;
        let conn = self.db.conn().await;
        let updated = conn.execute(
            "UPDATE vendor_invoices SET invoice_number = ?1, supplier = ?2, invoice_date = ?3, \
             due_date = ?4, dpp = ?5, ppn = ?6, total = ?7, status = ?8, remark = ?9, \
             purchase_order_id = ?10 WHERE company_id = ?11 AND id = ?12",
            params![
                invoice.invoice_number,
                invoice.supplier,
                invoice.invoice_date.to_string(),
                invoice.due_date.map(|d| d.to_string()),
                invoice.dpp.to_string(),
                invoice.ppn.to_string(),
                invoice.total.to_string(),
                invoice.status.as_str(),
                invoice.remark,
                invoice.purchase_order_id.map(|po| po.to_string()),
                invoice.company_id,
                id.to_string(),
            ],
        )?;
        if updated == 0 {
            return Err(BackofficeError::NotFound("invoice"));
        }
        Ok(())
    }

    async fn delete_invoice(&self, company_id: i64, id: Uuid) -> Result<()> {
        let conn = self.db.conn().await;
        let deleted = conn.execute(
            "DELETE FROM vendor_invoices WHERE company_id = ?1 AND id = ?2",
            params![company_id, id.to_string()],
        )?;
        if deleted == 0 {
            return Err(BackofficeError::NotFound("invoice"));
        }
        Ok(())
    }

    async fn list_invoices(
        &self,
        company_id: i64,
        filter: &InvoiceFilter,
        page: Page,
    ) -> Result<Vec<VendorInvoice>> {
        let conn = self.db.conn().await;
        let mut sql = format!("SELECT {INVOICE_COLUMNS} FROM vendor_invoices WHERE company_id = ?");
        let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(company_id)];

        if let Some(supplier) = &filter.supplier {
            sql.push_str(" AND supplier LIKE ?");
            args.push(Box::new(format!("%{supplier}%")));
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            args.push(Box::new(status.as_str()));
        }
        if let Some(from) = filter.from {
            sql.push_str(" AND invoice_date >= ?");
            args.push(Box::new(from.to_string()));
        }
        if let Some(to) = filter.to {
            sql.push_str(" AND invoice_date <= ?");
            args.push(Box::new(to.to_string()));
        }
        if let Some(q) = &filter.q {
            sql.push_str(" AND (remark LIKE ? OR invoice_number LIKE ?)");
            let needle = format!("%{q}%");
            args.push(Box::new(needle.clone()));
            args.push(Box::new(needle));
        }

        sql.push_str(" ORDER BY invoice_date DESC, invoice_number DESC LIMIT ? OFFSET ?");
        args.push(Box::new(page.limit as i64));
        args.push(Box::new(page.offset as i64));

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(args.iter().map(|arg| arg.as_ref())))?;
        let mut invoices = Vec::new();
        while let Some(row) = rows.next()? {
            invoices.push(row_to_invoice(row)?);
        }
        Ok(invoices)
    }

    async fn record_payment(
        &self,
        company_id: i64,
        payment: &mut InvoicePayment,
        new_status: InvoiceStatus,
    ) -> Result<()> {
        let mut conn = self.db.conn().await;
        let tx = conn.transaction()?;

        let id = payment.id.unwrap_or_else(Uuid::new_v4);
        payment.id = Some(id);

        // Scope the status flip to the tenant; zero rows means the invoice
        // is not theirs to pay.
        let updated = tx.execute(
            "UPDATE vendor_invoices SET status = ?1 WHERE company_id = ?2 AND id = ?3",
            params![
                new_status.as_str(),
                company_id,
                payment.invoice_id.to_string()
            ],
        )?;
        if updated == 0 {
            return Err(BackofficeError::NotFound("invoice"));
        }

        tx.execute(
            "INSERT INTO invoice_payments (id, invoice_id, paid_at, method, amount, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.to_string(),
                payment.invoice_id.to_string(),
                payment.paid_at.to_string(),
                payment.method,
                payment.amount.to_string(),
                payment.created_at.to_rfc3339(),
            ],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO payment_allocations (payment_id, component, amount) \
                 VALUES (?1, ?2, ?3)",
            )?;
            for allocation in &payment.allocations {
                stmt.execute(params![
                    id.to_string(),
                    allocation.component.as_str(),
                    allocation.amount.to_string(),
                ])?;
            }
        }
        tx.commit()?;

        info!(
            "Recorded payment of {} against invoice {} (now {})",
            payment.amount,
            payment.invoice_id,
            new_status.as_str()
        );
        Ok(())
    }

    async fn list_payments(
        &self,
        company_id: i64,
        invoice_id: Uuid,
    ) -> Result<Vec<InvoicePayment>> {
        let conn = self.db.conn().await;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.paid_at, p.method, p.amount, p.created_at \
             FROM invoice_payments p \
             JOIN vendor_invoices i ON i.id = p.invoice_id \
             WHERE i.company_id = ?1 AND p.invoice_id = ?2 \
             ORDER BY p.paid_at, p.created_at",
        )?;
        let mut rows = stmt.query(params![company_id, invoice_id.to_string()])?;

        let mut payments = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let paid_at: String = row.get(1)?;
            let amount: String = row.get(3)?;
            let created_at: String = row.get(4)?;
            payments.push(InvoicePayment {
                id: Some(uuid_col("payment id", &id)?),
                invoice_id,
                paid_at: date_col("paid_at", &paid_at)?,
                method: row.get(2)?,
                amount: dec_col("payment amount", &amount)?,
                allocations: Vec::new(),
                created_at: ts_col("payment created_at", &created_at)?,
            });
        }
        drop(rows);
        drop(stmt);

        for payment in &mut payments {
            let payment_id = payment.id.expect("listed payment has an id");
            let mut stmt = conn.prepare(
                "SELECT component, amount FROM payment_allocations WHERE payment_id = ?1 ORDER BY id",
            )?;
            let mut rows = stmt.query(params![payment_id.to_string()])?;
            while let Some(row) = rows.next()? {
                let component: String = row.get(0)?;
                let amount: String = row.get(1)?;
                payment.allocations.push(PaymentAllocation {
                    component: PaymentComponent::parse(&component)
                        .ok_or_else(|| corrupt("allocation component", &component))?,
                    amount: dec_col("allocation amount", &amount)?,
                });
            }
        }
        Ok(payments)
    }

    async fn paid_components(
        &self,
        company_id: i64,
        invoice_id: Uuid,
    ) -> Result<(Decimal, Decimal)> {
        let conn = self.db.conn().await;
        let mut stmt = conn.prepare(
            "SELECT a.component, a.amount FROM payment_allocations a \
             JOIN invoice_payments p ON p.id = a.payment_id \
             JOIN vendor_invoices i ON i.id = p.invoice_id \
             WHERE i.company_id = ?1 AND i.id = ?2",
        )?;
        let mut rows = stmt.query(params![company_id, invoice_id.to_string()])?;

        // TEXT amounts: sum in Decimal, not in SQL.
        let mut dpp = Decimal::ZERO;
        let mut ppn = Decimal::ZERO;
        while let Some(row) = rows.next()? {
            let component: String = row.get(0)?;
            let amount: String = row.get(1)?;
            let amount = dec_col("allocation amount", &amount)?;
            match PaymentComponent::parse(&component)
                .ok_or_else(|| corrupt("allocation component", &component))?
            {
                PaymentComponent::Dpp => dpp += amount,
                PaymentComponent::Ppn => ppn += amount,
            }
        }
        Ok((dpp, ppn))
    }

    async fn create_voucher(&self, voucher: &mut CashVoucher) -> Result<()> {
        let mut conn = self.db.conn().await;
        let tx = conn.transaction()?;

        let id = voucher.id.unwrap_or_else(Uuid::new_v4);
        voucher.id = Some(id);
        let number = match &voucher.number {
            Some(number) => number.clone(),
            None => next_number(
                &tx,
                "cash_vouchers",
                "number",
                voucher.company_id,
                voucher.kind.number_prefix(),
                voucher.voucher_date.year(),
            )?,
        };
        voucher.number = Some(number.clone());

        tx.execute(
            "INSERT INTO cash_vouchers (id, company_id, number, kind, voucher_date, remark, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.to_string(),
                voucher.company_id,
                number,
                voucher.kind.as_str(),
                voucher.voucher_date.to_string(),
                voucher.remark,
                voucher.created_at.to_rfc3339(),
            ],
        )?;
        insert_journal_lines(&tx, "voucher_lines", "voucher_id", id, &voucher.lines)?;
        tx.commit()?;

        info!("Posted voucher {} for company {}", number, voucher.company_id);
        Ok(())
    }

    async fn get_voucher(&self, company_id: i64, id: Uuid) -> Result<Option<CashVoucher>> {
        let conn = self.db.conn().await;
        let mut stmt = conn.prepare(
            "SELECT id, company_id, number, kind, voucher_date, remark, created_at \
             FROM cash_vouchers WHERE company_id = ?1 AND id = ?2",
        )?;
        let mut rows = stmt.query(params![company_id, id.to_string()])?;
        let voucher = match rows.next()? {
            Some(row) => {
                let raw_id: String = row.get(0)?;
                let kind: String = row.get(3)?;
                let voucher_date: String = row.get(4)?;
                let created_at: String = row.get(6)?;
                CashVoucher {
                    id: Some(uuid_col("voucher id", &raw_id)?),
                    company_id: row.get(1)?,
                    number: Some(row.get(2)?),
                    kind: VoucherKind::parse(&kind)
                        .ok_or_else(|| corrupt("voucher kind", &kind))?,
                    voucher_date: date_col("voucher_date", &voucher_date)?,
                    remark: row.get(5)?,
                    lines: Vec::new(),
                    created_at: ts_col("voucher created_at", &created_at)?,
                }
            }
            None => return Ok(None),
        };
        drop(rows);
        drop(stmt);

        let mut voucher = voucher;
        voucher.lines = load_journal_lines(&conn, "voucher_lines", "voucher_id", id)?;
        Ok(Some(voucher))
    }

    async fn update_voucher(&self, voucher: &CashVoucher) -> Result<()> {
        let id = voucher.id.ok_or(BackofficeError::NotFound("voucher"))?;
        let mut conn = self.db.conn().await;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE cash_vouchers SET kind = ?1, voucher_date = ?2, remark = ?3 \
             WHERE company_id = ?4 AND id = ?5",
            params![
                voucher.kind.as_str(),
                voucher.voucher_date.to_string(),
                voucher.remark,
                voucher.company_id,
                id.to_string(),
            ],
        )?;
        if updated == 0 {
            return Err(BackofficeError::NotFound("voucher"));
        }

        tx.execute(
            "DELETE FROM voucher_lines WHERE voucher_id = ?1",
            params![id.to_string()],
        )?;
        insert_journal_lines(&tx, "voucher_lines", "voucher_id", id, &voucher.lines)?;
        tx.commit()?;
        Ok(())
    }

    async fn delete_voucher(&self, company_id: i64, id: Uuid) -> Result<()> {
        let conn = self.db.conn().await;
        let deleted = conn.execute(
            "DELETE FROM cash_vouchers WHERE company_id = ?1 AND id = ?2",
            params![company_id, id.to_string()],
        )?;
        if deleted == 0 {
            return Err(BackofficeError::NotFound("voucher"));
        }
        Ok(())
    }

    async fn list_vouchers(
        &self,
        company_id: i64,
        filter: &VoucherFilter,
        page: Page,
    ) -> Result<Vec<CashVoucher>> {
        let conn = self.db.conn().await;
        let mut sql = String::from(
            "SELECT id, company_id, number, kind, voucher_date, remark, created_at \
             FROM cash_vouchers WHERE company_id = ?",
        );
        let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(company_id)];

        if let Some(kind) = filter.kind {
            sql.push_str(" AND kind = ?");
            args.push(Box::new(kind.as_str()));
        }
        if let Some(from) = filter.from {
            sql.push_str(" AND voucher_date >= ?");
            args.push(Box::new(from.to_string()));
        }
        if let Some(to) = filter.to {
            sql.push_str(" AND voucher_date <= ?");
            args.push(Box::new(to.to_string()));
        }
        if let Some(q) = &filter.q {
            sql.push_str(
                " AND (remark LIKE ? OR id IN \
                 (SELECT voucher_id FROM voucher_lines WHERE memo LIKE ?))",
            );
            let needle = format!("%{q}%");
            args.push(Box::new(needle.clone()));
            args.push(Box::new(needle));
        }

        sql.push_str(" ORDER BY voucher_date DESC, number DESC LIMIT ? OFFSET ?");
        args.push(Box::new(page.limit as i64));
        args.push(Box::new(page.offset as i64));

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(args.iter().map(|arg| arg.as_ref())))?;
        let mut vouchers = Vec::new();
        while let Some(row) = rows.next()? {
            let raw_id: String = row.get(0)?;
            let kind: String = row.get(3)?;
            let voucher_date: String = row.get(4)?;
            let created_at: String = row.get(6)?;
            vouchers.push(CashVoucher {
                id: Some(uuid_col("voucher id", &raw_id)?),
                company_id: row.get(1)?,
                number: Some(row.get(2)?),
                kind: VoucherKind::parse(&kind).ok_or_else(|| corrupt("voucher kind", &kind))?,
                voucher_date: date_col("voucher_date", &voucher_date)?,
                remark: row.get(5)?,
                lines: Vec::new(),
                created_at: ts_col("voucher created_at", &created_at)?,
            });
        }
        drop(rows);
        drop(stmt);

        for voucher in &mut vouchers {
            let id = voucher.id.expect("listed voucher has an id");
            voucher.lines = load_journal_lines(&conn, "voucher_lines", "voucher_id", id)?;
        }
        Ok(vouchers)
    }

    async fn create_adjustment(&self, journal: &mut AdjustmentJournal) -> Result<()> {
        let mut conn = self.db.conn().await;
        let tx = conn.transaction()?;

        let id = journal.id.unwrap_or_else(Uuid::new_v4);
        journal.id = Some(id);
        let number = match &journal.number {
            Some(number) => number.clone(),
            None => next_number(
                &tx,
                "adjustment_journals",
                "number",
                journal.company_id,
                "AJ",
                journal.journal_date.year(),
            )?,
        };
        journal.number = Some(number.clone());

        tx.execute(
            "INSERT INTO adjustment_journals (id, company_id, number, journal_date, memo, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.to_string(),
                journal.company_id,
                number,
                journal.journal_date.to_string(),
                journal.memo,
                journal.created_at.to_rfc3339(),
            ],
        )?;
        insert_journal_lines(&tx, "adjustment_lines", "journal_id", id, &journal.lines)?;
        tx.commit()?;

        info!("Posted adjustment {} for company {}", number, journal.company_id);
        Ok(())
    }

    async fn get_adjustment(
        &self,
        company_id: i64,
        id: Uuid,
    ) -> Result<Option<AdjustmentJournal>> {
        let conn = self.db.conn().await;
        let mut stmt = conn.prepare(
            "SELECT id, company_id, number, journal_date, memo, created_at \
             FROM adjustment_journals WHERE company_id = ?1 AND id = ?2",
        )?;
        let mut rows = stmt.query(params![company_id, id.to_string()])?;
        let journal = match rows.next()? {
            Some(row) => {
                let raw_id: String = row.get(0)?;
                let journal_date: String = row.get(3)?;
                let created_at: String = row.get(5)?;
                AdjustmentJournal {
                    id: Some(uuid_col("adjustment id", &raw_id)?),
                    company_id: row.get(1)?,
                    number: Some(row.get(2)?),
                    journal_date: date_col("journal_date", &journal_date)?,
                    memo: row.get(4)?,
                    lines: Vec::new(),
                    created_at: ts_col("adjustment created_at", &created_at)?,
                }
            }
            None => return Ok(None),
        };
        drop(rows);
        drop(stmt);

        let mut journal = journal;
        journal.lines = load_journal_lines(&conn, "adjustment_lines", "journal_id", id)?;
        Ok(Some(journal))
    }

    async fn update_adjustment(&self, journal: &AdjustmentJournal) -> Result<()> {
        let id = journal.id.ok_or(BackofficeError::NotFound("adjustment journal"))?;
        let mut conn = self.db.conn().await;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE adjustment_journals SET journal_date = ?1, memo = ?2 \
             WHERE company_id = ?3 AND id = ?4",
            params![
                journal.journal_date.to_string(),
                journal.memo,
                journal.company_id,
                id.to_string(),
            ],
        )?;
        if updated == 0 {
            return Err(BackofficeError::NotFound("adjustment journal"));
        }

        tx.execute(
            "DELETE FROM adjustment_lines WHERE journal_id = ?1",
            params![id.to_string()],
        )?;
        insert_journal_lines(&tx, "adjustment_lines", "journal_id", id, &journal.lines)?;
        tx.commit()?;
        Ok(())
    }

    async fn delete_adjustment(&self, company_id: i64, id: Uuid) -> Result<()> {
        let conn = self.db.conn().await;
        let deleted = conn.execute(
            "DELETE FROM adjustment_journals WHERE company_id = ?1 AND id = ?2",
            params![company_id, id.to_string()],
        )?;
        if deleted == 0 {
            return Err(BackofficeError::NotFound("adjustment journal"));
        }
        Ok(())
    }

    async fn list_adjustments(
        &self,
        company_id: i64,
        filter: &AdjustmentFilter,
        page: Page,
    ) -> Result<Vec<AdjustmentJournal>> {
        let conn = self.db.conn().await;
        let mut sql = String::from(
            "SELECT id, company_id, number, journal_date, memo, created_at \
             FROM adjustment_journals WHERE company_id = ?",
        );
        let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(company_id)];

        if let Some(from) = filter.from {
            sql.push_str(" AND journal_date >= ?");
            args.push(Box::new(from.to_string()));
        }
        if let Some(to) = filter.to {
            sql.push_str(" AND journal_date <= ?");
            args.push(Box::new(to.to_string()));
        }
        if let Some(q) = &filter.q {
            sql.push_str(
                " AND (memo LIKE ? OR id IN \
                 (SELECT journal_id FROM adjustment_lines WHERE memo LIKE ?))",
            );
            let needle = format!("%{q}%");
            args.push(Box::new(needle.clone()));
            args.push(Box::new(needle));
        }

        sql.push_str(" ORDER BY journal_date DESC, number DESC LIMIT ? OFFSET ?");
        args.push(Box::new(page.limit as i64));
        args.push(Box::new(page.offset as i64));

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(args.iter().map(|arg| arg.as_ref())))?;
        let mut journals = Vec::new();
        while let Some(row) = rows.next()? {
            let raw_id: String = row.get(0)?;
            let journal_date: String = row.get(3)?;
            let created_at: String = row.get(5)?;
            journals.push(AdjustmentJournal {
                id: Some(uuid_col("adjustment id", &raw_id)?),
                company_id: row.get(1)?,
                number: Some(row.get(2)?),
                journal_date: date_col("journal_date", &journal_date)?,
                memo: row.get(4)?,
                lines: Vec::new(),
                created_at: ts_col("adjustment created_at", &created_at)?,
            });
        }
        drop(rows);
        drop(stmt);

        for journal in &mut journals {
            let id = journal.id.expect("listed adjustment has an id");
            journal.lines = load_journal_lines(&conn, "adjustment_lines", "journal_id", id)?;
        }
        Ok(journals)
    }

    async fn recent_journal_memos(
        &self,
        company_id: i64,
        limit: usize,
    ) -> Result<Vec<(String, String)>> {
        let conn = self.db.conn().await;
        let mut stmt = conn.prepare(
            "SELECT l.account_code, l.memo, v.created_at, l.id \
             FROM voucher_lines l JOIN cash_vouchers v ON v.id = l.voucher_id \
             WHERE v.company_id = ?1 AND l.memo IS NOT NULL AND l.memo <> '' \
             UNION ALL \
             SELECT l.account_code, l.memo, j.created_at, l.id \
             FROM adjustment_lines l JOIN adjustment_journals j ON j.id = l.journal_id \
             WHERE j.company_id = ?1 AND l.memo IS NOT NULL AND l.memo <> '' \
             ORDER BY 3 DESC, 4 DESC LIMIT ?2",
        )?;
        let mut rows = stmt.query(params![company_id, limit as i64])?;

        let mut memos = Vec::new();
        while let Some(row) = rows.next()? {
            memos.push((row.get(0)?, row.get(1)?));
        }
        Ok(memos)
    }

    async fn account_movement(
        &self,
        company_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AccountTotals>> {
        let conn = self.db.conn().await;
        let mut stmt = conn.prepare(
            "SELECT l.account_code, l.debit, l.credit \
             FROM voucher_lines l JOIN cash_vouchers v ON v.id = l.voucher_id \
             WHERE v.company_id = ?1 AND v.voucher_date >= ?2 AND v.voucher_date <= ?3 \
             UNION ALL \
             SELECT l.account_code, l.debit, l.credit \
             FROM adjustment_lines l JOIN adjustment_journals j ON j.id = l.journal_id \
             WHERE j.company_id = ?1 AND j.journal_date >= ?2 AND j.journal_date <= ?3",
        )?;
        let mut rows = stmt.query(params![company_id, from.to_string(), to.to_string()])?;

        // TEXT amounts: sum in Decimal, not in SQL.
        let mut totals: HashMap<String, (Decimal, Decimal)> = HashMap::new();
        while let Some(row) = rows.next()? {
            let account_code: String = row.get(0)?;
            let debit: String = row.get(1)?;
            let credit: String = row.get(2)?;
            let entry = totals.entry(account_code).or_default();
            entry.0 += dec_col("line debit", &debit)?;
            entry.1 += dec_col("line credit", &credit)?;
        }

        let mut movement: Vec<AccountTotals> = totals
            .into_iter()
            .map(|(account_code, (debit, credit))| AccountTotals {
                account_code,
                debit,
                credit,
            })
            .collect();
        movement.sort_by(|a, b| a.account_code.cmp(&b.account_code));
        Ok(movement)
    }
}
