// Copyright 2026 The bodega Authors
// Licensed under the Apache License, Version 2.0

//! Deterministic fake inventory data for tests and the `--demo` seed.
//! Same seed, same output; no external randomness.

use anyhow::{Context, Result};
use std::path::PathBuf;

const ITEM_ADJECTIVES: [&str; 12] = [
    "Blue", "Matte", "Heavy", "Compact", "Classic", "Slim", "Rugged", "Bright", "Double", "Wide",
    "Mini", "Pro",
];

const ITEM_NOUNS: [&str; 16] = [
    "Widget",
    "Bracket",
    "Coupler",
    "Gasket",
    "Hinge",
    "Spindle",
    "Valve",
    "Washer",
    "Bolt Kit",
    "Clamp",
    "Fitting",
    "Roller",
    "Sleeve",
    "Spring",
    "Panel",
    "Latch",
];

const CATEGORIES: [&str; 6] = [
    "Hardware",
    "Fasteners",
    "Plumbing",
    "Electrical",
    "Tools",
    "Packaging",
];

const COMPANY_NAMES: [&str; 10] = [
    "Cascade", "Harbor", "Summit", "Pioneer", "Lakeside", "Granite", "Beacon", "Redwood",
    "Ironwood", "Meridian",
];
const COMPANY_SUFFIXES: [&str; 5] = ["Supply", "Trading", "Distribution", "Wholesale", "Imports"];

const FIRST_NAMES: [&str; 12] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Rowan",
];
const LAST_NAMES: [&str; 12] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Turner", "Brooks",
];

const CITIES: [&str; 8] = [
    "Austin",
    "Seattle",
    "Denver",
    "Madison",
    "Raleigh",
    "Portland",
    "Boise",
    "Tucson",
];
const STREET_NAMES: [&str; 8] = [
    "Cedar", "Maple", "Oak", "Pine", "Willow", "Elm", "Ridge", "Canyon",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ItemSeed {
    pub name: String,
    pub sku: String,
    pub category: String,
    pub current_stock: f64,
    pub min_stock_level: f64,
    pub cost_price_cents: i64,
    /// Roughly one item in four has no sale price yet; the order form has
    /// to handle those without autofilling a cost.
    pub selling_price_cents: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierSeed {
    pub name: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSeed {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone)]
pub struct StockFaker {
    rng: DeterministicRng,
    sku_counter: u32,
}

impl StockFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            sku_counter: 0,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn item(&mut self) -> ItemSeed {
        let adjective = self.pick(&ITEM_ADJECTIVES);
        let noun = self.pick(&ITEM_NOUNS);
        let category = self.pick(&CATEGORIES).to_owned();
        self.sku_counter += 1;

        let cost_price_cents = self.int_range_i64(50, 25_000);
        let selling_price_cents = if self.rng.int_n(4) == 0 {
            None
        } else {
            // Sale price sits above cost by a 10-80% markup.
            let markup_percent = self.int_range_i64(10, 80);
            Some(cost_price_cents + cost_price_cents * markup_percent / 100)
        };

        ItemSeed {
            name: format!("{adjective} {noun}"),
            sku: format!(
                "{}{}-{:04}",
                initial(adjective),
                initial(noun),
                self.sku_counter
            ),
            category,
            current_stock: self.int_range_i64(0, 250) as f64,
            min_stock_level: self.int_range_i64(2, 20) as f64,
            cost_price_cents,
            selling_price_cents,
        }
    }

    pub fn supplier(&mut self) -> SupplierSeed {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        SupplierSeed {
            name: format!(
                "{} {}",
                self.pick(&COMPANY_NAMES),
                self.pick(&COMPANY_SUFFIXES)
            ),
            contact_person: format!("{first} {last}"),
            phone: self.phone(),
            email: format!(
                "{}.{}@example-supply.com",
                first.to_ascii_lowercase(),
                last.to_ascii_lowercase()
            ),
            address: self.address(),
        }
    }

    pub fn customer(&mut self) -> CustomerSeed {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        CustomerSeed {
            name: format!("{first} {last}"),
            phone: self.phone(),
            email: format!(
                "{}.{}@example-mail.com",
                first.to_ascii_lowercase(),
                last.to_ascii_lowercase()
            ),
            address: self.address(),
        }
    }

    fn phone(&mut self) -> String {
        format!(
            "({:03}) {:03}-{:04}",
            self.int_range_i64(200, 999),
            self.int_range_i64(200, 999),
            self.int_range_i64(0, 9_999),
        )
    }

    fn address(&mut self) -> String {
        format!(
            "{} {} St, {}",
            self.int_range_i64(100, 9999),
            self.pick(&STREET_NAMES),
            self.pick(&CITIES),
        )
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("bodega.db");
    Ok((dir, db_path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

pub fn item_categories() -> &'static [&'static str] {
    &CATEGORIES
}

fn initial(word: &str) -> String {
    word.chars().take(2).collect::<String>().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::{StockFaker, item_categories};
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_same_output() {
        let mut left = StockFaker::new(42);
        let mut right = StockFaker::new(42);
        assert_eq!(left.item(), right.item());
        assert_eq!(left.supplier(), right.supplier());
        assert_eq!(left.customer(), right.customer());
    }

    #[test]
    fn item_fields_are_plausible() {
        let mut faker = StockFaker::new(1);
        for _ in 0..50 {
            let item = faker.item();
            assert!(!item.name.is_empty());
            assert!(!item.sku.is_empty());
            assert!(item.current_stock >= 0.0);
            assert!(item.cost_price_cents > 0);
            if let Some(price) = item.selling_price_cents {
                assert!(price >= item.cost_price_cents, "item {}", item.name);
            }
        }
    }

    #[test]
    fn some_items_lack_a_selling_price() {
        let mut faker = StockFaker::new(7);
        let mut priced = 0;
        let mut unpriced = 0;
        for _ in 0..80 {
            match faker.item().selling_price_cents {
                Some(_) => priced += 1,
                None => unpriced += 1,
            }
        }
        assert!(priced > 0);
        assert!(unpriced > 0);
    }

    #[test]
    fn skus_are_unique_within_a_faker() {
        let mut faker = StockFaker::new(3);
        let mut skus = BTreeSet::new();
        for _ in 0..100 {
            assert!(skus.insert(faker.item().sku));
        }
    }

    #[test]
    fn supplier_and_customer_have_contact_details() {
        let mut faker = StockFaker::new(9);
        let supplier = faker.supplier();
        assert!(!supplier.name.is_empty());
        assert!(supplier.email.contains('@'));
        let customer = faker.customer();
        assert!(!customer.name.is_empty());
        assert!(customer.phone.starts_with('('));
    }

    #[test]
    fn categories_list_is_non_empty() {
        assert!(!item_categories().is_empty());
    }
}
