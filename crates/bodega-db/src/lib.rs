// Copyright 2026 The bodega Authors
// Licensed under the Apache License, Version 2.0

pub mod validation;

use anyhow::{Context, Result, anyhow, bail};
use bodega_app::{
    CatalogChoice, Customer, CustomerId, Item, ItemId, OrderStatus, PurchaseFormInput,
    PurchaseLine, PurchaseLineId, PurchaseOrder, PurchaseOrderId, SaleFormInput, SaleLine,
    SaleLineId, SalesOrder, SalesOrderId, Supplier, SupplierId,
};
use rusqlite::{Connection, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::validation::{cents_from_amount, format_cents, format_stock};

pub const APP_NAME: &str = "bodega";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "items",
        &[
            "id",
            "name",
            "sku",
            "category",
            "current_stock",
            "min_stock_level",
            "cost_price_cents",
            "selling_price_cents",
            "created_at",
        ],
    ),
    (
        "suppliers",
        &["id", "name", "contact_person", "phone", "email", "address"],
    ),
    ("customers", &["id", "name", "phone", "email", "address"]),
    (
        "purchase_orders",
        &[
            "id",
            "supplier_id",
            "po_number",
            "order_date",
            "total_cents",
            "status",
        ],
    ),
    (
        "purchase_lines",
        &[
            "id",
            "purchase_order_id",
            "item_id",
            "quantity",
            "unit_cost_cents",
            "total_cents",
        ],
    ),
    (
        "sales_orders",
        &[
            "id",
            "customer_id",
            "invoice_number",
            "sale_date",
            "total_cents",
            "status",
        ],
    ),
    (
        "sale_lines",
        &[
            "id",
            "sales_order_id",
            "item_id",
            "quantity",
            "unit_price_cents",
            "total_cents",
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_items_sku",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_items_sku ON items (sku);",
    },
    RequiredIndex {
        name: "idx_purchase_orders_po_number",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_purchase_orders_po_number ON purchase_orders (po_number);",
    },
    RequiredIndex {
        name: "idx_purchase_orders_supplier_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_purchase_orders_supplier_id ON purchase_orders (supplier_id);",
    },
    RequiredIndex {
        name: "idx_purchase_lines_order_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_purchase_lines_order_id ON purchase_lines (purchase_order_id);",
    },
    RequiredIndex {
        name: "idx_purchase_lines_item_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_purchase_lines_item_id ON purchase_lines (item_id);",
    },
    RequiredIndex {
        name: "idx_sales_orders_invoice_number",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_sales_orders_invoice_number ON sales_orders (invoice_number);",
    },
    RequiredIndex {
        name: "idx_sales_orders_customer_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_sales_orders_customer_id ON sales_orders (customer_id);",
    },
    RequiredIndex {
        name: "idx_sale_lines_order_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_sale_lines_order_id ON sale_lines (sales_order_id);",
    },
    RequiredIndex {
        name: "idx_sale_lines_item_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_sale_lines_item_id ON sale_lines (item_id);",
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub sku: String,
    pub category: String,
    pub current_stock: f64,
    pub min_stock_level: f64,
    pub cost_price_cents: i64,
    pub selling_price_cents: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSupplier {
    pub name: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)?;
        Ok(())
    }

    pub fn create_item(&self, item: &NewItem) -> Result<ItemId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO items (
                  name, sku, category, current_stock, min_stock_level,
                  cost_price_cents, selling_price_cents, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    item.name,
                    item.sku,
                    item.category,
                    item.current_stock,
                    item.min_stock_level,
                    item.cost_price_cents,
                    item.selling_price_cents,
                    now,
                ],
            )
            .with_context(|| format!("insert item {}", item.sku))?;
        Ok(ItemId::new(self.conn.last_insert_rowid()))
    }

    pub fn get_item(&self, item_id: ItemId) -> Result<Item> {
        self.conn
            .query_row(
                "
                SELECT
                  id, name, sku, category, current_stock, min_stock_level,
                  cost_price_cents, selling_price_cents, created_at
                FROM items
                WHERE id = ?
                ",
                params![item_id.get()],
                map_item_row,
            )
            .with_context(|| format!("item {} not found", item_id.get()))
    }

    pub fn list_items(&self) -> Result<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT
                  id, name, sku, category, current_stock, min_stock_level,
                  cost_price_cents, selling_price_cents, created_at
                FROM items
                ORDER BY name ASC, id ASC
                ",
            )
            .context("prepare items query")?;
        let rows = stmt.query_map([], map_item_row).context("query items")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect items")
    }

    /// The catalog as the order form sees it: one choice per item, labeled
    /// with current stock, carrying the selling price as an annotation when
    /// the item has one.
    pub fn list_catalog(&self) -> Result<Vec<CatalogChoice>> {
        let items = self.list_items()?;
        Ok(items
            .into_iter()
            .map(|item| CatalogChoice {
                id: item.id,
                label: format!("{} - Stock: {}", item.name, format_stock(item.current_stock)),
                price: item.selling_price_cents.map(format_cents),
            })
            .collect())
    }

    pub fn create_supplier(&self, supplier: &NewSupplier) -> Result<SupplierId> {
        self.conn
            .execute(
                "
                INSERT INTO suppliers (name, contact_person, phone, email, address)
                VALUES (?, ?, ?, ?, ?)
                ",
                params![
                    supplier.name,
                    supplier.contact_person,
                    supplier.phone,
                    supplier.email,
                    supplier.address,
                ],
            )
            .with_context(|| format!("insert supplier {}", supplier.name))?;
        Ok(SupplierId::new(self.conn.last_insert_rowid()))
    }

    pub fn list_suppliers(&self) -> Result<Vec<Supplier>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, name, contact_person, phone, email, address
                FROM suppliers
                ORDER BY name ASC, id ASC
                ",
            )
            .context("prepare suppliers query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Supplier {
                    id: SupplierId::new(row.get(0)?),
                    name: row.get(1)?,
                    contact_person: row.get(2)?,
                    phone: row.get(3)?,
                    email: row.get(4)?,
                    address: row.get(5)?,
                })
            })
            .context("query suppliers")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect suppliers")
    }

    pub fn create_customer(&self, customer: &NewCustomer) -> Result<CustomerId> {
        self.conn
            .execute(
                "
                INSERT INTO customers (name, phone, email, address)
                VALUES (?, ?, ?, ?)
                ",
                params![
                    customer.name,
                    customer.phone,
                    customer.email,
                    customer.address,
                ],
            )
            .with_context(|| format!("insert customer {}", customer.name))?;
        Ok(CustomerId::new(self.conn.last_insert_rowid()))
    }

    pub fn list_customers(&self) -> Result<Vec<Customer>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, name, phone, email, address
                FROM customers
                ORDER BY name ASC, id ASC
                ",
            )
            .context("prepare customers query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Customer {
                    id: CustomerId::new(row.get(0)?),
                    name: row.get(1)?,
                    phone: row.get(2)?,
                    email: row.get(3)?,
                    address: row.get(4)?,
                })
            })
            .context("query customers")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect customers")
    }

    /// Inserts a purchase order header plus one line per form line, setting
    /// the header total to the sum of line totals (each rounded to cents).
    pub fn create_purchase_order(&self, form: &PurchaseFormInput) -> Result<PurchaseOrder> {
        form.validate()?;
        for line in &form.lines {
            // Surfaces a clear error before any insert happens.
            self.get_item(line.item_id)?;
        }

        let now = now_rfc3339()?;
        let po_number = self.next_order_number("PO", "purchase_orders")?;
        self.conn
            .execute(
                "
                INSERT INTO purchase_orders (supplier_id, po_number, order_date, total_cents, status)
                VALUES (?, ?, ?, 0, ?)
                ",
                params![
                    form.supplier_id.get(),
                    po_number,
                    now,
                    OrderStatus::Pending.as_str(),
                ],
            )
            .context("insert purchase order")?;
        let order_id = PurchaseOrderId::new(self.conn.last_insert_rowid());

        let mut total_cents = 0_i64;
        for line in &form.lines {
            let unit_cost_cents = cents_from_amount(line.unit_cost)?;
            let line_total_cents = cents_from_amount(line.quantity * line.unit_cost)?;
            self.conn
                .execute(
                    "
                    INSERT INTO purchase_lines (
                      purchase_order_id, item_id, quantity, unit_cost_cents, total_cents
                    ) VALUES (?, ?, ?, ?, ?)
                    ",
                    params![
                        order_id.get(),
                        line.item_id.get(),
                        line.quantity,
                        unit_cost_cents,
                        line_total_cents,
                    ],
                )
                .context("insert purchase line")?;
            total_cents += line_total_cents;
        }

        self.conn
            .execute(
                "UPDATE purchase_orders SET total_cents = ? WHERE id = ?",
                params![total_cents, order_id.get()],
            )
            .context("set purchase order total")?;

        self.get_purchase_order(order_id)
    }

    /// Inserts a sales order after checking that every line's item has the
    /// stock to cover it; the first shortfall aborts the whole order.
    pub fn create_sales_order(&self, form: &SaleFormInput) -> Result<SalesOrder> {
        form.validate()?;
        for line in &form.lines {
            let item = self.get_item(line.item_id)?;
            if item.current_stock < line.quantity {
                bail!(
                    "insufficient stock for {}: available {}",
                    item.name,
                    format_stock(item.current_stock)
                );
            }
        }

        let now = now_rfc3339()?;
        let invoice_number = self.next_order_number("INV", "sales_orders")?;
        self.conn
            .execute(
                "
                INSERT INTO sales_orders (customer_id, invoice_number, sale_date, total_cents, status)
                VALUES (?, ?, ?, 0, ?)
                ",
                params![
                    form.customer_id.get(),
                    invoice_number,
                    now,
                    OrderStatus::Pending.as_str(),
                ],
            )
            .context("insert sales order")?;
        let order_id = SalesOrderId::new(self.conn.last_insert_rowid());

        let mut total_cents = 0_i64;
        for line in &form.lines {
            let unit_price_cents = cents_from_amount(line.unit_cost)?;
            let line_total_cents = cents_from_amount(line.quantity * line.unit_cost)?;
            self.conn
                .execute(
                    "
                    INSERT INTO sale_lines (
                      sales_order_id, item_id, quantity, unit_price_cents, total_cents
                    ) VALUES (?, ?, ?, ?, ?)
                    ",
                    params![
                        order_id.get(),
                        line.item_id.get(),
                        line.quantity,
                        unit_price_cents,
                        line_total_cents,
                    ],
                )
                .context("insert sale line")?;
            total_cents += line_total_cents;
        }

        self.conn
            .execute(
                "UPDATE sales_orders SET total_cents = ? WHERE id = ?",
                params![total_cents, order_id.get()],
            )
            .context("set sales order total")?;

        self.get_sales_order(order_id)
    }

    pub fn get_purchase_order(&self, order_id: PurchaseOrderId) -> Result<PurchaseOrder> {
        self.conn
            .query_row(
                "
                SELECT id, supplier_id, po_number, order_date, total_cents, status
                FROM purchase_orders
                WHERE id = ?
                ",
                params![order_id.get()],
                map_purchase_order_row,
            )
            .with_context(|| format!("purchase order {} not found", order_id.get()))
    }

    pub fn get_sales_order(&self, order_id: SalesOrderId) -> Result<SalesOrder> {
        self.conn
            .query_row(
                "
                SELECT id, customer_id, invoice_number, sale_date, total_cents, status
                FROM sales_orders
                WHERE id = ?
                ",
                params![order_id.get()],
                map_sales_order_row,
            )
            .with_context(|| format!("sales order {} not found", order_id.get()))
    }

    pub fn list_purchase_orders(&self) -> Result<Vec<PurchaseOrder>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, supplier_id, po_number, order_date, total_cents, status
                FROM purchase_orders
                ORDER BY order_date DESC, id DESC
                ",
            )
            .context("prepare purchase orders query")?;
        let rows = stmt
            .query_map([], map_purchase_order_row)
            .context("query purchase orders")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect purchase orders")
    }

    pub fn list_sales_orders(&self) -> Result<Vec<SalesOrder>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, customer_id, invoice_number, sale_date, total_cents, status
                FROM sales_orders
                ORDER BY sale_date DESC, id DESC
                ",
            )
            .context("prepare sales orders query")?;
        let rows = stmt
            .query_map([], map_sales_order_row)
            .context("query sales orders")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect sales orders")
    }

    pub fn purchase_lines(&self, order_id: PurchaseOrderId) -> Result<Vec<PurchaseLine>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, purchase_order_id, item_id, quantity, unit_cost_cents, total_cents
                FROM purchase_lines
                WHERE purchase_order_id = ?
                ORDER BY id ASC
                ",
            )
            .context("prepare purchase lines query")?;
        let rows = stmt
            .query_map(params![order_id.get()], |row| {
                Ok(PurchaseLine {
                    id: PurchaseLineId::new(row.get(0)?),
                    purchase_order_id: PurchaseOrderId::new(row.get(1)?),
                    item_id: ItemId::new(row.get(2)?),
                    quantity: row.get(3)?,
                    unit_cost_cents: row.get(4)?,
                    total_cents: row.get(5)?,
                })
            })
            .context("query purchase lines")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect purchase lines")
    }

    pub fn sale_lines(&self, order_id: SalesOrderId) -> Result<Vec<SaleLine>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, sales_order_id, item_id, quantity, unit_price_cents, total_cents
                FROM sale_lines
                WHERE sales_order_id = ?
                ORDER BY id ASC
                ",
            )
            .context("prepare sale lines query")?;
        let rows = stmt
            .query_map(params![order_id.get()], |row| {
                Ok(SaleLine {
                    id: SaleLineId::new(row.get(0)?),
                    sales_order_id: SalesOrderId::new(row.get(1)?),
                    item_id: ItemId::new(row.get(2)?),
                    quantity: row.get(3)?,
                    unit_price_cents: row.get(4)?,
                    total_cents: row.get(5)?,
                })
            })
            .context("query sale lines")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect sale lines")
    }

    /// Marks a pending purchase order received and adds each line's quantity
    /// to its item's stock. Returns false without touching anything when the
    /// order was already received.
    pub fn receive_purchase_order(&self, order_id: PurchaseOrderId) -> Result<bool> {
        let order = self.get_purchase_order(order_id)?;
        if order.status != OrderStatus::Pending {
            return Ok(false);
        }

        for line in self.purchase_lines(order_id)? {
            self.conn
                .execute(
                    "UPDATE items SET current_stock = current_stock + ? WHERE id = ?",
                    params![line.quantity, line.item_id.get()],
                )
                .context("increment item stock")?;
        }

        self.conn
            .execute(
                "UPDATE purchase_orders SET status = ? WHERE id = ?",
                params![OrderStatus::Received.as_str(), order_id.get()],
            )
            .context("mark purchase order received")?;
        Ok(true)
    }

    /// Marks a pending sales order completed and subtracts each line's
    /// quantity from its item's stock. Returns false for already-completed
    /// orders.
    pub fn complete_sales_order(&self, order_id: SalesOrderId) -> Result<bool> {
        let order = self.get_sales_order(order_id)?;
        if order.status != OrderStatus::Pending {
            return Ok(false);
        }

        for line in self.sale_lines(order_id)? {
            self.conn
                .execute(
                    "UPDATE items SET current_stock = current_stock - ? WHERE id = ?",
                    params![line.quantity, line.item_id.get()],
                )
                .context("decrement item stock")?;
        }

        self.conn
            .execute(
                "UPDATE sales_orders SET status = ? WHERE id = ?",
                params![OrderStatus::Completed.as_str(), order_id.get()],
            )
            .context("mark sales order completed")?;
        Ok(true)
    }

    fn next_order_number(&self, prefix: &str, table: &str) -> Result<String> {
        let next: i64 = self
            .conn
            .query_row(
                &format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {table}"),
                [],
                |row| row.get(0),
            )
            .with_context(|| format!("next sequence for {table}"))?;
        let today = OffsetDateTime::now_utc()
            .format(&format_description!("[year][month][day]"))
            .context("format order date")?;
        Ok(format!("{prefix}{today}-{next:04}"))
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("BODEGA_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set BODEGA_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("bodega.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn map_item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: ItemId::new(row.get(0)?),
        name: row.get(1)?,
        sku: row.get(2)?,
        category: row.get(3)?,
        current_stock: row.get(4)?,
        min_stock_level: row.get(5)?,
        cost_price_cents: row.get(6)?,
        selling_price_cents: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?).map_err(to_sql_error)?,
    })
}

fn map_purchase_order_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PurchaseOrder> {
    let status: String = row.get(5)?;
    Ok(PurchaseOrder {
        id: PurchaseOrderId::new(row.get(0)?),
        supplier_id: SupplierId::new(row.get(1)?),
        po_number: row.get(2)?,
        order_date: parse_datetime(&row.get::<_, String>(3)?).map_err(to_sql_error)?,
        total_cents: row.get(4)?,
        status: OrderStatus::parse(&status)
            .ok_or_else(|| to_sql_error(anyhow!("unknown order status {status:?}")))?,
    })
}

fn map_sales_order_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SalesOrder> {
    let status: String = row.get(5)?;
    Ok(SalesOrder {
        id: SalesOrderId::new(row.get(0)?),
        customer_id: CustomerId::new(row.get(1)?),
        invoice_number: row.get(2)?,
        sale_date: parse_datetime(&row.get::<_, String>(3)?).map_err(to_sql_error)?,
        total_cents: row.get(4)?,
        status: OrderStatus::parse(&status)
            .ok_or_else(|| to_sql_error(anyhow!("unknown order status {status:?}")))?,
    })
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; use a bodega-compatible database or migrate first"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}
