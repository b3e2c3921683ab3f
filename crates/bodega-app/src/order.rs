// Copyright 2026 The bodega Authors
// Licensed under the Apache License, Version 2.0

//! The in-memory order draft behind the purchase/sales entry form.
//!
//! The draft owns an ordered list of line rows; the TUI is a projection of
//! it. All mutation goes through [`OrderDraft::dispatch`], a single seam that
//! routes by command rather than wiring handlers to individual rows, so rows
//! added later are covered automatically and nothing dangles when a row is
//! removed.

use crate::ItemId;

/// One selectable entry in the item picker: the id, a display label that
/// includes current stock, and an optional price annotation carried as a
/// numeric string ready to drop into the unit-cost field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogChoice {
    pub id: ItemId,
    pub label: String,
    pub price: Option<String>,
}

/// A single line row. Quantity and unit cost hold raw field text exactly as
/// typed; `total` is derived and never edited directly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineItem {
    pub item: Option<ItemId>,
    pub quantity: String,
    pub unit_cost: String,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftCommand {
    AddRow,
    RemoveRow(usize),
    SelectItem { row: usize, choice: CatalogChoice },
    EditQuantity { row: usize, text: String },
    EditUnitCost { row: usize, text: String },
    Recompute,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEvent {
    RowAdded(usize),
    RowRemoved(usize),
    ItemSelected { row: usize, item: ItemId },
    UnitCostFilled { row: usize },
    TotalsChanged { grand_total: String },
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    rows: Vec<LineItem>,
    grand_total: String,
}

impl Default for OrderDraft {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            grand_total: format_amount(0.0),
        }
    }
}

impl OrderDraft {
    pub fn rows(&self) -> &[LineItem] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&LineItem> {
        self.rows.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn grand_total(&self) -> &str {
        &self.grand_total
    }

    /// Routes a command to the draft. Commands naming a row that is no longer
    /// present are silent no-ops: nothing changes and no events are emitted.
    pub fn dispatch(&mut self, command: DraftCommand) -> Vec<DraftEvent> {
        match command {
            DraftCommand::AddRow => {
                self.rows.push(LineItem::default());
                vec![DraftEvent::RowAdded(self.rows.len() - 1)]
            }
            DraftCommand::RemoveRow(index) => {
                if index >= self.rows.len() {
                    return Vec::new();
                }
                self.rows.remove(index);
                vec![DraftEvent::RowRemoved(index), self.recompute_totals()]
            }
            DraftCommand::SelectItem { row, choice } => {
                let Some(line) = self.rows.get_mut(row) else {
                    return Vec::new();
                };
                line.item = Some(choice.id);
                let mut events = vec![DraftEvent::ItemSelected {
                    row,
                    item: choice.id,
                }];
                // A choice without a price annotation leaves the unit-cost
                // field as the user left it, and forces no recompute.
                if let Some(price) = choice.price {
                    line.unit_cost = price;
                    events.push(DraftEvent::UnitCostFilled { row });
                    events.push(self.recompute_totals());
                }
                events
            }
            DraftCommand::EditQuantity { row, text } => {
                let Some(line) = self.rows.get_mut(row) else {
                    return Vec::new();
                };
                line.quantity = text;
                vec![self.recompute_totals()]
            }
            DraftCommand::EditUnitCost { row, text } => {
                let Some(line) = self.rows.get_mut(row) else {
                    return Vec::new();
                };
                line.unit_cost = text;
                vec![self.recompute_totals()]
            }
            DraftCommand::Recompute => vec![self.recompute_totals()],
            DraftCommand::Clear => {
                self.rows.clear();
                vec![DraftEvent::Cleared, self.recompute_totals()]
            }
        }
    }

    /// Rewrites every row total and the grand total from the current field
    /// text. Unparseable or empty fields count as zero so a half-edited row
    /// never breaks the display. Idempotent.
    fn recompute_totals(&mut self) -> DraftEvent {
        let mut sum = 0.0_f64;
        for line in &mut self.rows {
            let quantity = parse_amount_or_zero(&line.quantity);
            let unit_cost = parse_amount_or_zero(&line.unit_cost);
            let row_total = quantity * unit_cost;
            line.total = format_amount(row_total);
            sum += row_total;
        }
        self.grand_total = format_amount(sum);
        DraftEvent::TotalsChanged {
            grand_total: self.grand_total.clone(),
        }
    }
}

pub fn parse_amount_or_zero(text: &str) -> f64 {
    let parsed = text.trim().parse::<f64>().unwrap_or(0.0);
    if parsed.is_finite() { parsed } else { 0.0 }
}

pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::{CatalogChoice, DraftCommand, DraftEvent, OrderDraft, format_amount};
    use crate::ItemId;

    fn choice(id: i64, price: Option<&str>) -> CatalogChoice {
        CatalogChoice {
            id: ItemId::new(id),
            label: format!("Item {id} - Stock: 10"),
            price: price.map(str::to_owned),
        }
    }

    fn edit_quantity(draft: &mut OrderDraft, row: usize, text: &str) {
        draft.dispatch(DraftCommand::EditQuantity {
            row,
            text: text.to_owned(),
        });
    }

    fn edit_unit_cost(draft: &mut OrderDraft, row: usize, text: &str) {
        draft.dispatch(DraftCommand::EditUnitCost {
            row,
            text: text.to_owned(),
        });
    }

    #[test]
    fn rows_keep_insertion_order_across_removals() {
        let mut draft = OrderDraft::default();
        for id in 1..=4 {
            draft.dispatch(DraftCommand::AddRow);
            draft.dispatch(DraftCommand::SelectItem {
                row: (id - 1) as usize,
                choice: choice(id, None),
            });
        }

        draft.dispatch(DraftCommand::RemoveRow(1));

        let selected: Vec<i64> = draft
            .rows()
            .iter()
            .map(|line| line.item.expect("item selected").get())
            .collect();
        assert_eq!(selected, vec![1, 3, 4]);
    }

    #[test]
    fn row_total_is_quantity_times_unit_cost_to_two_decimals() {
        let mut draft = OrderDraft::default();
        draft.dispatch(DraftCommand::AddRow);
        edit_quantity(&mut draft, 0, "1.5");
        edit_unit_cost(&mut draft, 0, "2.50");

        assert_eq!(draft.row(0).expect("row").total, "3.75");
        assert_eq!(draft.grand_total(), "3.75");
    }

    #[test]
    fn unparseable_fields_count_as_zero() {
        let mut draft = OrderDraft::default();
        draft.dispatch(DraftCommand::AddRow);
        draft.dispatch(DraftCommand::AddRow);
        edit_quantity(&mut draft, 0, "abc");
        edit_unit_cost(&mut draft, 0, "5.00");
        edit_quantity(&mut draft, 1, "2");
        edit_unit_cost(&mut draft, 1, "");

        assert_eq!(draft.row(0).expect("row").total, "0.00");
        assert_eq!(draft.row(1).expect("row").total, "0.00");
        assert_eq!(draft.grand_total(), "0.00");
    }

    #[test]
    fn grand_total_rounds_binary_float_artifacts() {
        // 0.1 + 0.2 is 0.30000000000000004 in f64; the display must not be.
        let mut draft = OrderDraft::default();
        for cost in ["0.1", "0.2"] {
            let events = draft.dispatch(DraftCommand::AddRow);
            let DraftEvent::RowAdded(row) = events[0] else {
                panic!("expected RowAdded");
            };
            edit_quantity(&mut draft, row, "1");
            edit_unit_cost(&mut draft, row, cost);
        }

        assert_eq!(draft.grand_total(), "0.30");
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut draft = OrderDraft::default();
        draft.dispatch(DraftCommand::AddRow);
        edit_quantity(&mut draft, 0, "4");
        edit_unit_cost(&mut draft, 0, "1.25");

        let first = draft.clone();
        let events = draft.dispatch(DraftCommand::Recompute);
        assert_eq!(
            events,
            vec![DraftEvent::TotalsChanged {
                grand_total: "5.00".to_owned()
            }]
        );
        assert_eq!(draft, first);
    }

    #[test]
    fn priced_choice_fills_unit_cost_and_updates_totals() {
        let mut draft = OrderDraft::default();
        draft.dispatch(DraftCommand::AddRow);
        edit_quantity(&mut draft, 0, "2");

        let events = draft.dispatch(DraftCommand::SelectItem {
            row: 0,
            choice: choice(7, Some("10.50")),
        });

        assert_eq!(draft.row(0).expect("row").unit_cost, "10.50");
        assert_eq!(draft.grand_total(), "21.00");
        assert!(events.contains(&DraftEvent::UnitCostFilled { row: 0 }));
    }

    #[test]
    fn unpriced_choice_leaves_entered_unit_cost_alone() {
        let mut draft = OrderDraft::default();
        draft.dispatch(DraftCommand::AddRow);
        edit_quantity(&mut draft, 0, "1");
        edit_unit_cost(&mut draft, 0, "5.00");

        let events = draft.dispatch(DraftCommand::SelectItem {
            row: 0,
            choice: choice(9, None),
        });

        assert_eq!(draft.row(0).expect("row").unit_cost, "5.00");
        assert_eq!(draft.grand_total(), "5.00");
        assert_eq!(
            events,
            vec![DraftEvent::ItemSelected {
                row: 0,
                item: ItemId::new(9)
            }]
        );
    }

    #[test]
    fn removing_last_row_leaves_empty_draft_and_zero_total() {
        let mut draft = OrderDraft::default();
        draft.dispatch(DraftCommand::AddRow);
        edit_quantity(&mut draft, 0, "3");
        edit_unit_cost(&mut draft, 0, "9.99");
        assert_eq!(draft.grand_total(), "29.97");

        draft.dispatch(DraftCommand::RemoveRow(0));

        assert!(draft.is_empty());
        assert_eq!(draft.grand_total(), "0.00");
    }

    #[test]
    fn out_of_range_row_commands_are_silent_no_ops() {
        let mut draft = OrderDraft::default();
        draft.dispatch(DraftCommand::AddRow);
        edit_quantity(&mut draft, 0, "1");
        let before = draft.clone();

        assert!(draft.dispatch(DraftCommand::RemoveRow(5)).is_empty());
        assert!(
            draft
                .dispatch(DraftCommand::EditQuantity {
                    row: 5,
                    text: "9".to_owned(),
                })
                .is_empty()
        );
        assert!(
            draft
                .dispatch(DraftCommand::SelectItem {
                    row: 5,
                    choice: choice(1, Some("1.00")),
                })
                .is_empty()
        );
        assert_eq!(draft, before);
    }

    #[test]
    fn negative_values_flow_through_the_multiplication() {
        let mut draft = OrderDraft::default();
        draft.dispatch(DraftCommand::AddRow);
        edit_quantity(&mut draft, 0, "-2");
        edit_unit_cost(&mut draft, 0, "3.00");

        assert_eq!(draft.row(0).expect("row").total, "-6.00");
        assert_eq!(draft.grand_total(), "-6.00");
    }

    #[test]
    fn clear_resets_rows_and_grand_total() {
        let mut draft = OrderDraft::default();
        draft.dispatch(DraftCommand::AddRow);
        edit_quantity(&mut draft, 0, "2");
        edit_unit_cost(&mut draft, 0, "2");

        let events = draft.dispatch(DraftCommand::Clear);
        assert!(draft.is_empty());
        assert_eq!(draft.grand_total(), "0.00");
        assert_eq!(events[0], DraftEvent::Cleared);
    }

    #[test]
    fn format_amount_pads_and_rounds() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(1.005e2), "100.50");
        assert_eq!(format_amount(2.0 / 3.0), "0.67");
    }
}
