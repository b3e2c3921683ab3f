// Copyright 2026 The bodega Authors
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::order::{OrderDraft, parse_amount_or_zero};
use crate::{CustomerId, ItemId, OrderKind, SupplierId};

/// One complete line ready for submission. Unlike draft rows, these carry
/// parsed numbers; incomplete draft rows never make it this far.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemInput {
    pub item_id: ItemId,
    pub quantity: f64,
    pub unit_cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseFormInput {
    pub supplier_id: SupplierId,
    pub lines: Vec<LineItemInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleFormInput {
    pub customer_id: CustomerId,
    pub lines: Vec<LineItemInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderFormPayload {
    Purchase(PurchaseFormInput),
    Sale(SaleFormInput),
}

impl OrderFormPayload {
    pub const fn kind(&self) -> OrderKind {
        match self {
            Self::Purchase(_) => OrderKind::Purchase,
            Self::Sale(_) => OrderKind::Sale,
        }
    }

    pub fn lines(&self) -> &[LineItemInput] {
        match self {
            Self::Purchase(form) => &form.lines,
            Self::Sale(form) => &form.lines,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Purchase(form) => form.validate(),
            Self::Sale(form) => form.validate(),
        }
    }
}

impl PurchaseFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.supplier_id.get() <= 0 {
            bail!("supplier is required -- choose a supplier and retry");
        }
        validate_lines(&self.lines)
    }
}

impl SaleFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.customer_id.get() <= 0 {
            bail!("customer is required -- choose a customer and retry");
        }
        validate_lines(&self.lines)
    }
}

fn validate_lines(lines: &[LineItemInput]) -> Result<()> {
    if lines.is_empty() {
        bail!("order needs at least one complete line");
    }
    for line in lines {
        if line.item_id.get() <= 0 {
            bail!("order line is missing an item");
        }
        if !line.quantity.is_finite() || line.quantity <= 0.0 {
            bail!("order line quantity must be positive");
        }
        if !line.unit_cost.is_finite() || line.unit_cost < 0.0 {
            bail!("order line unit cost cannot be negative");
        }
    }
    Ok(())
}

/// Collects the submittable lines of a draft. Rows missing an item selection
/// or with blank quantity/unit-cost text are skipped, matching the form's
/// required-field semantics: partially filled rows are simply not sent.
pub fn complete_lines(draft: &OrderDraft) -> Vec<LineItemInput> {
    draft
        .rows()
        .iter()
        .filter_map(|line| {
            let item_id = line.item?;
            if line.quantity.trim().is_empty() || line.unit_cost.trim().is_empty() {
                return None;
            }
            Some(LineItemInput {
                item_id,
                quantity: parse_amount_or_zero(&line.quantity),
                unit_cost: parse_amount_or_zero(&line.unit_cost),
            })
        })
        .collect()
}
