// Copyright 2026 The bodega Authors
// Licensed under the Apache License, Version 2.0

//! Terminal front end. All draft mutation flows through
//! `OrderDraft::dispatch`; rendering is a pure projection of `AppState`
//! plus the view data loaded from the runtime.

use anyhow::{Context, Result};
use bodega_app::{
    AppCommand, AppEvent, AppMode, AppState, CatalogChoice, CustomerId, DraftCommand, ItemId,
    OrderDraft, OrderFormPayload, OrderKind, OrderStatus, PickerKind, PurchaseFormInput,
    SaleFormInput, SupplierId, TabKind, complete_lines,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const RECENT_ORDERS_ROWS: u16 = 6;
const CURSOR_MARK: &str = "▸";

/// A supplier or customer as the party picker sees it. Which one it is
/// follows from the active tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyChoice {
    pub id: i64,
    pub name: String,
}

/// One previously submitted order, preformatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub number: String,
    pub party: String,
    pub total: String,
    pub status: OrderStatus,
}

pub trait AppRuntime {
    fn load_catalog(&mut self) -> Result<Vec<CatalogChoice>>;
    fn load_parties(&mut self, kind: OrderKind) -> Result<Vec<PartyChoice>>;
    fn load_recent_orders(&mut self, kind: OrderKind) -> Result<Vec<OrderSummary>>;
    /// Persists the order and returns its generated number.
    fn submit_order(&mut self, payload: &OrderFormPayload) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormColumn {
    Item,
    Quantity,
    UnitCost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormCursor {
    Party,
    Line { row: usize, column: FormColumn },
}

impl Default for FormCursor {
    fn default() -> Self {
        Self::Party
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct OrderFormUiState {
    draft: OrderDraft,
    party: Option<PartyChoice>,
    cursor: FormCursor,
    picker_cursor: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    catalog: Vec<CatalogChoice>,
    parties: Vec<PartyChoice>,
    recent_orders: Vec<OrderSummary>,
    purchase_form: OrderFormUiState,
    sales_form: OrderFormUiState,
    catalog_cursor: usize,
    help_visible: bool,
    status_token: u64,
}

impl ViewData {
    fn form_for_tab(&mut self, tab: TabKind) -> Option<&mut OrderFormUiState> {
        match tab {
            TabKind::Purchase => Some(&mut self.purchase_form),
            TabKind::Sales => Some(&mut self.sales_form),
            TabKind::Catalog => None,
        }
    }

    fn form_for_tab_ref(&self, tab: TabKind) -> Option<&OrderFormUiState> {
        match tab {
            TabKind::Purchase => Some(&self.purchase_form),
            TabKind::Sales => Some(&self.sales_form),
            TabKind::Catalog => None,
        }
    }
}

const fn order_kind_for_tab(tab: TabKind) -> Option<OrderKind> {
    match tab {
        TabKind::Purchase => Some(OrderKind::Purchase),
        TabKind::Sales => Some(OrderKind::Sale),
        TabKind::Catalog => None,
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = refresh_view_data(state, runtime, &mut view_data) {
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(state: &mut AppState, view_data: &mut ViewData, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            view_data.help_visible = false;
        }
        return false;
    }

    match state.mode {
        AppMode::Picker(kind) => {
            handle_picker_key(state, view_data, internal_tx, key, kind);
            false
        }
        AppMode::EditField => {
            handle_edit_key(state, view_data, key);
            false
        }
        AppMode::Nav => handle_nav_key(state, runtime, view_data, internal_tx, key),
    }
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => {
            view_data.help_visible = true;
            return false;
        }
        KeyCode::Char('f') => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::NextTab, internal_tx);
            return false;
        }
        KeyCode::Char('b') => {
            dispatch_and_refresh(state, runtime, view_data, AppCommand::PrevTab, internal_tx);
            return false;
        }
        _ => {}
    }

    if state.active_tab == TabKind::Catalog {
        match key.code {
            KeyCode::Up => {
                view_data.catalog_cursor = view_data.catalog_cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                let last = view_data.catalog.len().saturating_sub(1);
                view_data.catalog_cursor = (view_data.catalog_cursor + 1).min(last);
            }
            _ => {}
        }
        return false;
    }

    handle_form_key(state, runtime, view_data, internal_tx, key);
    false
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let tab = state.active_tab;
    let Some(form) = view_data.form_for_tab(tab) else {
        return;
    };
    let row_count = form.draft.row_count();
    let cursor = form.cursor;

    match key.code {
        KeyCode::Char('a') => {
            let events = form.draft.dispatch(DraftCommand::AddRow);
            if let Some(bodega_app::DraftEvent::RowAdded(index)) = events.first() {
                form.cursor = FormCursor::Line {
                    row: *index,
                    column: FormColumn::Item,
                };
            }
        }
        KeyCode::Char('x') => {
            if let FormCursor::Line { row, .. } = cursor {
                form.draft.dispatch(DraftCommand::RemoveRow(row));
                let remaining = form.draft.row_count();
                form.cursor = if remaining == 0 {
                    FormCursor::Party
                } else {
                    FormCursor::Line {
                        row: row.min(remaining - 1),
                        column: FormColumn::Item,
                    }
                };
            }
        }
        KeyCode::Up => form.cursor = move_cursor_vertical(cursor, row_count, -1),
        KeyCode::Down => form.cursor = move_cursor_vertical(cursor, row_count, 1),
        KeyCode::Left => form.cursor = move_cursor_horizontal(cursor, -1),
        KeyCode::Right | KeyCode::Tab => form.cursor = advance_cursor(cursor, row_count),
        KeyCode::Enter => match cursor {
            FormCursor::Party => {
                form.picker_cursor = 0;
                state.dispatch(AppCommand::OpenPicker(PickerKind::Party));
            }
            FormCursor::Line {
                column: FormColumn::Item,
                ..
            } => {
                form.picker_cursor = 0;
                state.dispatch(AppCommand::OpenPicker(PickerKind::Item));
            }
            FormCursor::Line { .. } => {
                state.dispatch(AppCommand::EnterEdit);
            }
        },
        KeyCode::Char('s') => {
            submit_active_order(state, runtime, view_data, internal_tx);
        }
        KeyCode::Char(ch) if is_amount_char(ch) => {
            // Typing on an amount cell starts a fresh edit with that char.
            if let FormCursor::Line { row, column } = cursor
                && column != FormColumn::Item
            {
                dispatch_cell_edit(&mut form.draft, row, column, ch.to_string());
                state.dispatch(AppCommand::EnterEdit);
            }
        }
        _ => {}
    }
}

fn handle_edit_key(state: &mut AppState, view_data: &mut ViewData, key: KeyEvent) {
    let tab = state.active_tab;
    let Some(form) = view_data.form_for_tab(tab) else {
        state.dispatch(AppCommand::ExitToNav);
        return;
    };
    let FormCursor::Line { row, column } = form.cursor else {
        state.dispatch(AppCommand::ExitToNav);
        return;
    };
    if column == FormColumn::Item {
        state.dispatch(AppCommand::ExitToNav);
        return;
    }

    let current = match (form.draft.row(row), column) {
        (Some(line), FormColumn::Quantity) => line.quantity.clone(),
        (Some(line), FormColumn::UnitCost) => line.unit_cost.clone(),
        _ => {
            state.dispatch(AppCommand::ExitToNav);
            return;
        }
    };

    match key.code {
        KeyCode::Enter | KeyCode::Esc => {
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Backspace => {
            let mut text = current;
            text.pop();
            dispatch_cell_edit(&mut form.draft, row, column, text);
        }
        KeyCode::Char(ch) if is_amount_char(ch) => {
            let mut text = current;
            text.push(ch);
            dispatch_cell_edit(&mut form.draft, row, column, text);
        }
        _ => {}
    }
}

fn handle_picker_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
    kind: PickerKind,
) {
    let tab = state.active_tab;
    let option_count = match kind {
        PickerKind::Item => view_data.catalog.len(),
        PickerKind::Party => view_data.parties.len(),
    };

    match key.code {
        KeyCode::Esc => {
            state.dispatch(AppCommand::ClosePicker);
        }
        KeyCode::Up => {
            if let Some(form) = view_data.form_for_tab(tab) {
                form.picker_cursor = form.picker_cursor.saturating_sub(1);
            }
        }
        KeyCode::Down => {
            if let Some(form) = view_data.form_for_tab(tab) {
                form.picker_cursor = (form.picker_cursor + 1).min(option_count.saturating_sub(1));
            }
        }
        KeyCode::Enter => {
            if option_count == 0 {
                state.dispatch(AppCommand::ClosePicker);
                emit_status(state, view_data, internal_tx, "nothing to choose from");
                return;
            }
            apply_picker_selection(view_data, tab, kind);
            state.dispatch(AppCommand::ClosePicker);
        }
        _ => {}
    }
}

fn apply_picker_selection(view_data: &mut ViewData, tab: TabKind, kind: PickerKind) {
    let choice = match kind {
        PickerKind::Item => None,
        PickerKind::Party => {
            let Some(form) = view_data.form_for_tab_ref(tab) else {
                return;
            };
            view_data.parties.get(form.picker_cursor).cloned()
        }
    };

    match kind {
        PickerKind::Item => {
            let item_choice = {
                let Some(form) = view_data.form_for_tab_ref(tab) else {
                    return;
                };
                view_data.catalog.get(form.picker_cursor).cloned()
            };
            let Some(item_choice) = item_choice else {
                return;
            };
            if let Some(form) = view_data.form_for_tab(tab)
                && let FormCursor::Line { row, .. } = form.cursor
            {
                form.draft.dispatch(DraftCommand::SelectItem {
                    row,
                    choice: item_choice,
                });
            }
        }
        PickerKind::Party => {
            if let (Some(form), Some(choice)) = (view_data.form_for_tab(tab), choice) {
                form.party = Some(choice);
            }
        }
    }
}

fn submit_active_order<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let tab = state.active_tab;
    let payload = {
        let Some(form) = view_data.form_for_tab_ref(tab) else {
            return;
        };
        build_payload(tab, form)
    };

    let payload = match payload {
        Ok(payload) => payload,
        Err(error) => {
            emit_status(state, view_data, internal_tx, error.to_string());
            return;
        }
    };

    match runtime.submit_order(&payload) {
        Ok(number) => {
            if let Some(form) = view_data.form_for_tab(tab) {
                form.draft.dispatch(DraftCommand::Clear);
                form.party = None;
                form.cursor = FormCursor::Party;
            }
            if let Some(kind) = order_kind_for_tab(tab) {
                match runtime.load_recent_orders(kind) {
                    Ok(orders) => view_data.recent_orders = orders,
                    Err(error) => {
                        emit_status(
                            state,
                            view_data,
                            internal_tx,
                            format!("load failed: {error}"),
                        );
                        return;
                    }
                }
            }
            emit_status(state, view_data, internal_tx, format!("created {number}"));
        }
        Err(error) => {
            emit_status(state, view_data, internal_tx, error.to_string());
        }
    }
}

/// Turns a draft form into a submission payload. Incomplete rows are
/// dropped; the remaining lines and the chosen party must pass validation.
fn build_payload(tab: TabKind, form: &OrderFormUiState) -> Result<OrderFormPayload> {
    let lines = complete_lines(&form.draft);
    let party_id = form.party.as_ref().map_or(0, |party| party.id);

    let payload = match tab {
        TabKind::Purchase => OrderFormPayload::Purchase(PurchaseFormInput {
            supplier_id: SupplierId::new(party_id),
            lines,
        }),
        TabKind::Sales => OrderFormPayload::Sale(SaleFormInput {
            customer_id: CustomerId::new(party_id),
            lines,
        }),
        TabKind::Catalog => anyhow::bail!("no order form on the catalog tab"),
    };
    payload.validate()?;
    Ok(payload)
}

fn dispatch_cell_edit(draft: &mut OrderDraft, row: usize, column: FormColumn, text: String) {
    let command = match column {
        FormColumn::Quantity => DraftCommand::EditQuantity { row, text },
        FormColumn::UnitCost => DraftCommand::EditUnitCost { row, text },
        FormColumn::Item => return,
    };
    draft.dispatch(command);
}

fn is_amount_char(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '.' || ch == '-'
}

fn move_cursor_vertical(cursor: FormCursor, row_count: usize, delta: isize) -> FormCursor {
    match (cursor, delta) {
        (FormCursor::Party, d) if d > 0 && row_count > 0 => FormCursor::Line {
            row: 0,
            column: FormColumn::Item,
        },
        (FormCursor::Party, _) => FormCursor::Party,
        (FormCursor::Line { row: 0, .. }, d) if d < 0 => FormCursor::Party,
        (FormCursor::Line { row, column }, d) => {
            let next = row.saturating_add_signed(d).min(row_count.saturating_sub(1));
            FormCursor::Line { row: next, column }
        }
    }
}

fn move_cursor_horizontal(cursor: FormCursor, delta: isize) -> FormCursor {
    let FormCursor::Line { row, column } = cursor else {
        return cursor;
    };
    let order = [FormColumn::Item, FormColumn::Quantity, FormColumn::UnitCost];
    let index = order
        .iter()
        .position(|c| *c == column)
        .unwrap_or(0) as isize;
    let next = (index + delta).rem_euclid(order.len() as isize) as usize;
    FormCursor::Line {
        row,
        column: order[next],
    }
}

/// Tab order: party, then each row left to right, wrapping back to party.
fn advance_cursor(cursor: FormCursor, row_count: usize) -> FormCursor {
    match cursor {
        FormCursor::Party if row_count > 0 => FormCursor::Line {
            row: 0,
            column: FormColumn::Item,
        },
        FormCursor::Party => FormCursor::Party,
        FormCursor::Line { row, column } => match column {
            FormColumn::Item => FormCursor::Line {
                row,
                column: FormColumn::Quantity,
            },
            FormColumn::Quantity => FormCursor::Line {
                row,
                column: FormColumn::UnitCost,
            },
            FormColumn::UnitCost => {
                if row + 1 < row_count {
                    FormCursor::Line {
                        row: row + 1,
                        column: FormColumn::Item,
                    }
                } else {
                    FormCursor::Party
                }
            }
        },
    }
}

fn dispatch_and_refresh<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    command: AppCommand,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(command);
    let tab_changed = events
        .iter()
        .any(|event| matches!(event, AppEvent::TabChanged(_)));
    if tab_changed && let Err(error) = refresh_view_data(state, runtime, view_data) {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("load failed: {error}"),
        );
    }
}

fn refresh_view_data<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    view_data.catalog = runtime.load_catalog()?;
    let last = view_data.catalog.len().saturating_sub(1);
    view_data.catalog_cursor = view_data.catalog_cursor.min(last);

    if let Some(kind) = order_kind_for_tab(state.active_tab) {
        view_data.parties = runtime.load_parties(kind)?;
        view_data.recent_orders = runtime.load_recent_orders(kind)?;
    } else {
        view_data.parties.clear();
        view_data.recent_orders.clear();
    }
    Ok(())
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = TabKind::ALL
        .iter()
        .position(|tab| *tab == state.active_tab)
        .unwrap_or(0);
    let tab_titles = TabKind::ALL
        .iter()
        .map(|tab| tab.label().to_owned())
        .collect::<Vec<String>>();
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title("bodega").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    if state.active_tab == TabKind::Catalog {
        render_catalog(frame, layout[1], view_data);
    } else {
        render_order_form(frame, layout[1], state, view_data);
    }

    let status = status_text(state);
    let status_widget = Paragraph::new(status)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if let AppMode::Picker(kind) = state.mode {
        render_picker_overlay(frame, state, view_data, kind);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_catalog(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let rows = view_data
        .catalog
        .iter()
        .enumerate()
        .map(|(index, choice)| {
            let mark = if index == view_data.catalog_cursor {
                CURSOR_MARK
            } else {
                " "
            };
            Row::new(vec![
                Cell::from(mark),
                Cell::from(choice.label.clone()),
                Cell::from(choice.price.clone().unwrap_or_else(|| "-".to_owned())),
            ])
        })
        .collect::<Vec<Row<'_>>>();

    let table = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Min(20),
            Constraint::Length(10),
        ],
    )
    .header(Row::new(vec!["", "item", "price"]).style(Style::default().add_modifier(Modifier::BOLD)))
    .block(Block::default().title("catalog").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_order_form(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let Some(form) = view_data.form_for_tab_ref(state.active_tab) else {
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(RECENT_ORDERS_ROWS),
        ])
        .split(area);

    let party_label = match state.active_tab {
        TabKind::Sales => "customer",
        _ => "supplier",
    };
    let party_mark = if form.cursor == FormCursor::Party {
        CURSOR_MARK
    } else {
        " "
    };
    let party_name = form
        .party
        .as_ref()
        .map_or("<choose with Enter>", |party| party.name.as_str());
    let party = Paragraph::new(format!("{party_mark} {party_label}: {party_name}"))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(party, layout[0]);

    let mut rows = form
        .draft
        .rows()
        .iter()
        .enumerate()
        .map(|(index, line)| {
            Row::new(vec![
                Cell::from(row_mark(form.cursor, index, FormColumn::Item)),
                Cell::from(item_cell_text(line.item, &view_data.catalog)),
                Cell::from(cell_text(
                    &line.quantity,
                    form.cursor,
                    state.mode,
                    index,
                    FormColumn::Quantity,
                )),
                Cell::from(cell_text(
                    &line.unit_cost,
                    form.cursor,
                    state.mode,
                    index,
                    FormColumn::UnitCost,
                )),
                Cell::from(line.total.clone()),
            ])
        })
        .collect::<Vec<Row<'_>>>();
    rows.push(
        Row::new(vec![
            Cell::from(""),
            Cell::from("grand total"),
            Cell::from(""),
            Cell::from(""),
            Cell::from(form.draft.grand_total().to_owned()),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD)),
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(
        Row::new(vec!["", "item", "qty", "unit cost", "total"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title(format!("{} order", state.active_tab.label()))
            .borders(Borders::ALL),
    );
    frame.render_widget(table, layout[1]);

    let recent = view_data
        .recent_orders
        .iter()
        .map(|order| {
            format!(
                "{}  {}  {}  {}",
                order.number,
                order.party,
                order.total,
                order.status.as_str()
            )
        })
        .collect::<Vec<String>>()
        .join("\n");
    let recent_widget = Paragraph::new(recent)
        .block(Block::default().title("recent orders").borders(Borders::ALL));
    frame.render_widget(recent_widget, layout[2]);
}

fn render_picker_overlay(
    frame: &mut ratatui::Frame<'_>,
    state: &AppState,
    view_data: &ViewData,
    kind: PickerKind,
) {
    let Some(form) = view_data.form_for_tab_ref(state.active_tab) else {
        return;
    };

    let (title, lines): (&str, Vec<String>) = match kind {
        PickerKind::Item => (
            "choose item",
            view_data
                .catalog
                .iter()
                .map(|choice| match &choice.price {
                    Some(price) => format!("{} ({price})", choice.label),
                    None => choice.label.clone(),
                })
                .collect(),
        ),
        PickerKind::Party => (
            "choose party",
            view_data
                .parties
                .iter()
                .map(|party| party.name.clone())
                .collect(),
        ),
    };

    let body = if lines.is_empty() {
        "nothing available".to_owned()
    } else {
        lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let mark = if index == form.picker_cursor {
                    CURSOR_MARK
                } else {
                    " "
                };
                format!("{mark} {line}")
            })
            .collect::<Vec<String>>()
            .join("\n")
    };

    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);
    let picker =
        Paragraph::new(body).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(picker, area);
}

fn row_mark(cursor: FormCursor, row: usize, column: FormColumn) -> &'static str {
    if cursor == (FormCursor::Line { row, column }) {
        CURSOR_MARK
    } else {
        " "
    }
}

fn item_cell_text(item: Option<ItemId>, catalog: &[CatalogChoice]) -> String {
    let Some(item_id) = item else {
        return "<choose with Enter>".to_owned();
    };
    catalog
        .iter()
        .find(|choice| choice.id == item_id)
        .map_or_else(|| format!("item #{}", item_id.get()), |c| c.label.clone())
}

fn cell_text(text: &str, cursor: FormCursor, mode: AppMode, row: usize, column: FormColumn) -> String {
    let focused = cursor == FormCursor::Line { row, column };
    if focused && mode == AppMode::EditField {
        format!("{text}_")
    } else if focused {
        format!("{}{text}", CURSOR_MARK)
    } else {
        text.to_owned()
    }
}

fn status_text(state: &AppState) -> String {
    match &state.status_line {
        Some(line) => line.clone(),
        None => match state.mode {
            AppMode::Nav => {
                "a add  x remove  Enter pick/edit  s submit  f/b tab  ? help  q quit".to_owned()
            }
            AppMode::EditField => "typing edits the cell; Enter/Esc done".to_owned(),
            AppMode::Picker(_) => "up/down choose  Enter select  Esc cancel".to_owned(),
        },
    }
}

fn help_overlay_text() -> String {
    [
        "f / b      next / previous tab",
        "a          add an order line",
        "x          remove the selected line",
        "arrows     move between cells",
        "Tab        next field (wraps through the party line)",
        "Enter      open picker on item/party, edit on qty/cost",
        "s          submit the order",
        "?          toggle this help",
        "q          quit (Ctrl-q from anywhere)",
    ]
    .join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, FormColumn, FormCursor, OrderFormUiState, OrderSummary, PartyChoice, ViewData,
        advance_cursor, build_payload, handle_key_event, item_cell_text, move_cursor_horizontal,
        move_cursor_vertical, status_text,
    };
    use anyhow::{Result, bail};
    use bodega_app::{
        AppMode, AppState, CatalogChoice, DraftCommand, ItemId, OrderFormPayload, OrderKind,
        TabKind,
    };
    use crossterm::event::{KeyCode, KeyEvent};
    use std::sync::mpsc;

    struct FakeRuntime {
        catalog: Vec<CatalogChoice>,
        parties: Vec<PartyChoice>,
        submitted: Vec<OrderFormPayload>,
        fail_submit: bool,
    }

    impl FakeRuntime {
        fn new() -> Self {
            Self {
                catalog: vec![
                    CatalogChoice {
                        id: ItemId::new(1),
                        label: "Hinge - Stock: 12".to_owned(),
                        price: Some("10.50".to_owned()),
                    },
                    CatalogChoice {
                        id: ItemId::new(2),
                        label: "Washer - Stock: 3".to_owned(),
                        price: None,
                    },
                ],
                parties: vec![PartyChoice {
                    id: 7,
                    name: "Cascade Supply".to_owned(),
                }],
                submitted: Vec::new(),
                fail_submit: false,
            }
        }
    }

    impl AppRuntime for FakeRuntime {
        fn load_catalog(&mut self) -> Result<Vec<CatalogChoice>> {
            Ok(self.catalog.clone())
        }

        fn load_parties(&mut self, _kind: OrderKind) -> Result<Vec<PartyChoice>> {
            Ok(self.parties.clone())
        }

        fn load_recent_orders(&mut self, _kind: OrderKind) -> Result<Vec<OrderSummary>> {
            Ok(Vec::new())
        }

        fn submit_order(&mut self, payload: &OrderFormPayload) -> Result<String> {
            if self.fail_submit {
                bail!("insufficient stock for Hinge: available 2");
            }
            self.submitted.push(payload.clone());
            Ok("PO20260829-0001".to_owned())
        }
    }

    fn press(
        state: &mut AppState,
        runtime: &mut FakeRuntime,
        view_data: &mut ViewData,
        code: KeyCode,
    ) -> bool {
        let (tx, _rx) = mpsc::channel();
        handle_key_event(state, runtime, view_data, &tx, KeyEvent::from(code))
    }

    fn purchase_view(runtime: &mut FakeRuntime) -> ViewData {
        let mut view_data = ViewData::default();
        view_data.catalog = runtime.catalog.clone();
        view_data.parties = runtime.parties.clone();
        view_data
    }

    #[test]
    fn add_and_remove_rows_from_keys() {
        let mut state = AppState::default();
        let mut runtime = FakeRuntime::new();
        let mut view_data = purchase_view(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('a'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('a'));
        assert_eq!(view_data.purchase_form.draft.row_count(), 2);
        assert_eq!(
            view_data.purchase_form.cursor,
            FormCursor::Line {
                row: 1,
                column: FormColumn::Item
            }
        );

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('x'));
        assert_eq!(view_data.purchase_form.draft.row_count(), 1);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('x'));
        assert_eq!(view_data.purchase_form.draft.row_count(), 0);
        assert_eq!(view_data.purchase_form.cursor, FormCursor::Party);
    }

    #[test]
    fn item_picker_fills_unit_cost_from_price() {
        let mut state = AppState::default();
        let mut runtime = FakeRuntime::new();
        let mut view_data = purchase_view(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('a'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        assert!(matches!(state.mode, AppMode::Picker(_)));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        assert_eq!(state.mode, AppMode::Nav);

        let row = view_data.purchase_form.draft.row(0).cloned().unwrap();
        assert_eq!(row.item, Some(ItemId::new(1)));
        assert_eq!(row.unit_cost, "10.50");
    }

    #[test]
    fn typing_on_quantity_cell_edits_and_recomputes() {
        let mut state = AppState::default();
        let mut runtime = FakeRuntime::new();
        let mut view_data = purchase_view(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('a'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter); // select Hinge @ 10.50

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab); // qty
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('2'));
        assert_eq!(state.mode, AppMode::EditField);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('.'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('5'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        assert_eq!(state.mode, AppMode::Nav);

        let row = view_data.purchase_form.draft.row(0).cloned().unwrap();
        assert_eq!(row.quantity, "2.5");
        assert_eq!(row.total, "26.25");
        assert_eq!(view_data.purchase_form.draft.grand_total(), "26.25");
    }

    #[test]
    fn submit_requires_party_and_lines() {
        let mut state = AppState::default();
        let mut runtime = FakeRuntime::new();
        let mut view_data = purchase_view(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('s'));
        assert!(runtime.submitted.is_empty());
        assert!(state.status_line.is_some());
    }

    #[test]
    fn successful_submit_clears_the_form() {
        let mut state = AppState::default();
        let mut runtime = FakeRuntime::new();
        let mut view_data = purchase_view(&mut runtime);

        // Party, one complete line.
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('a'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('3'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('s'));
        assert_eq!(runtime.submitted.len(), 1);
        assert!(view_data.purchase_form.draft.is_empty());
        assert_eq!(view_data.purchase_form.party, None);
        assert_eq!(
            state.status_line.as_deref(),
            Some("created PO20260829-0001")
        );
    }

    #[test]
    fn failed_submit_keeps_the_draft() {
        let mut state = AppState::default();
        let mut runtime = FakeRuntime::new();
        runtime.fail_submit = true;
        let mut view_data = purchase_view(&mut runtime);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('a'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('3'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('s'));
        assert_eq!(view_data.purchase_form.draft.row_count(), 1);
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|s| s.contains("insufficient stock"))
        );
    }

    #[test]
    fn quit_keys() {
        let mut state = AppState::default();
        let mut runtime = FakeRuntime::new();
        let mut view_data = purchase_view(&mut runtime);
        assert!(press(
            &mut state,
            &mut runtime,
            &mut view_data,
            KeyCode::Char('q')
        ));
    }

    #[test]
    fn cursor_movement_wraps_columns_and_clamps_rows() {
        let line = |row, column| FormCursor::Line { row, column };

        assert_eq!(advance_cursor(FormCursor::Party, 2), line(0, FormColumn::Item));
        assert_eq!(
            advance_cursor(line(0, FormColumn::UnitCost), 2),
            line(1, FormColumn::Item)
        );
        assert_eq!(advance_cursor(line(1, FormColumn::UnitCost), 2), FormCursor::Party);

        assert_eq!(
            move_cursor_horizontal(line(0, FormColumn::Item), -1),
            line(0, FormColumn::UnitCost)
        );
        assert_eq!(
            move_cursor_vertical(line(0, FormColumn::Quantity), 3, -1),
            FormCursor::Party
        );
        assert_eq!(
            move_cursor_vertical(line(2, FormColumn::Quantity), 3, 1),
            line(2, FormColumn::Quantity)
        );
        assert_eq!(move_cursor_vertical(FormCursor::Party, 0, 1), FormCursor::Party);
    }

    #[test]
    fn item_cell_falls_back_to_raw_id() {
        let catalog = vec![CatalogChoice {
            id: ItemId::new(1),
            label: "Hinge - Stock: 12".to_owned(),
            price: None,
        }];
        assert_eq!(item_cell_text(Some(ItemId::new(1)), &catalog), "Hinge - Stock: 12");
        assert_eq!(item_cell_text(Some(ItemId::new(9)), &catalog), "item #9");
        assert_eq!(item_cell_text(None, &catalog), "<choose with Enter>");
    }

    #[test]
    fn build_payload_rejects_catalog_tab() {
        let form = OrderFormUiState::default();
        assert!(build_payload(TabKind::Catalog, &form).is_err());
    }

    #[test]
    fn status_falls_back_to_key_hints() {
        let state = AppState::default();
        assert!(status_text(&state).contains("s submit"));

        let mut with_status = AppState::default();
        with_status.dispatch(bodega_app::AppCommand::SetStatus("saved".to_owned()));
        assert_eq!(status_text(&with_status), "saved");
    }

    #[test]
    fn drafts_are_kept_per_tab() {
        let mut view_data = ViewData::default();
        view_data
            .purchase_form
            .draft
            .dispatch(DraftCommand::AddRow);
        assert_eq!(view_data.purchase_form.draft.row_count(), 1);
        assert_eq!(view_data.sales_form.draft.row_count(), 0);
    }
}
