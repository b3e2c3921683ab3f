// Copyright 2026 The bodega Authors
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use bodega_app::{OrderFormPayload, OrderKind};
use bodega_db::validation::format_cents;
use bodega_db::{NewCustomer, NewItem, NewSupplier, Store};
use bodega_testkit::StockFaker;
use bodega_tui::{AppRuntime, OrderSummary, PartyChoice};
use std::collections::BTreeMap;

const RECENT_ORDER_LIMIT: usize = 8;
const DEMO_SEED: u64 = 20_260_829;
const DEMO_ITEMS: usize = 24;
const DEMO_SUPPLIERS: usize = 4;
const DEMO_CUSTOMERS: usize = 6;

pub struct DbRuntime<'a> {
    store: &'a Store,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl AppRuntime for DbRuntime<'_> {
    fn load_catalog(&mut self) -> Result<Vec<bodega_app::CatalogChoice>> {
        self.store.list_catalog()
    }

    fn load_parties(&mut self, kind: OrderKind) -> Result<Vec<PartyChoice>> {
        let parties = match kind {
            OrderKind::Purchase => self
                .store
                .list_suppliers()?
                .into_iter()
                .map(|supplier| PartyChoice {
                    id: supplier.id.get(),
                    name: supplier.name,
                })
                .collect(),
            OrderKind::Sale => self
                .store
                .list_customers()?
                .into_iter()
                .map(|customer| PartyChoice {
                    id: customer.id.get(),
                    name: customer.name,
                })
                .collect(),
        };
        Ok(parties)
    }

    fn load_recent_orders(&mut self, kind: OrderKind) -> Result<Vec<OrderSummary>> {
        let orders = match kind {
            OrderKind::Purchase => {
                let names: BTreeMap<i64, String> = self
                    .store
                    .list_suppliers()?
                    .into_iter()
                    .map(|supplier| (supplier.id.get(), supplier.name))
                    .collect();
                self.store
                    .list_purchase_orders()?
                    .into_iter()
                    .take(RECENT_ORDER_LIMIT)
                    .map(|order| OrderSummary {
                        number: order.po_number,
                        party: party_name(&names, order.supplier_id.get()),
                        total: format_cents(order.total_cents),
                        status: order.status,
                    })
                    .collect()
            }
            OrderKind::Sale => {
                let names: BTreeMap<i64, String> = self
                    .store
                    .list_customers()?
                    .into_iter()
                    .map(|customer| (customer.id.get(), customer.name))
                    .collect();
                self.store
                    .list_sales_orders()?
                    .into_iter()
                    .take(RECENT_ORDER_LIMIT)
                    .map(|order| OrderSummary {
                        number: order.invoice_number,
                        party: party_name(&names, order.customer_id.get()),
                        total: format_cents(order.total_cents),
                        status: order.status,
                    })
                    .collect()
            }
        };
        Ok(orders)
    }

    fn submit_order(&mut self, payload: &OrderFormPayload) -> Result<String> {
        match payload {
            OrderFormPayload::Purchase(form) => {
                Ok(self.store.create_purchase_order(form)?.po_number)
            }
            OrderFormPayload::Sale(form) => Ok(self.store.create_sales_order(form)?.invoice_number),
        }
    }
}

fn party_name(names: &BTreeMap<i64, String>, id: i64) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| format!("party #{id}"))
}

/// Fills an empty store with deterministic demo inventory. The fixed seed
/// makes `--demo` look the same on every launch.
pub fn seed_demo(store: &Store) -> Result<()> {
    let mut faker = StockFaker::new(DEMO_SEED);

    for _ in 0..DEMO_ITEMS {
        let item = faker.item();
        store.create_item(&NewItem {
            name: item.name,
            sku: item.sku,
            category: item.category,
            current_stock: item.current_stock,
            min_stock_level: item.min_stock_level,
            cost_price_cents: item.cost_price_cents,
            selling_price_cents: item.selling_price_cents,
        })?;
    }

    for _ in 0..DEMO_SUPPLIERS {
        let supplier = faker.supplier();
        store.create_supplier(&NewSupplier {
            name: supplier.name,
            contact_person: supplier.contact_person,
            phone: supplier.phone,
            email: supplier.email,
            address: supplier.address,
        })?;
    }

    for _ in 0..DEMO_CUSTOMERS {
        let customer = faker.customer();
        store.create_customer(&NewCustomer {
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
            address: customer.address,
        })?;
    }

    Ok(())
}
