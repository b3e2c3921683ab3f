// Copyright 2026 The bodega Authors
// Licensed under the Apache License, Version 2.0

//! Money and quantity conversions between the form's decimal-string world
//! and the store's integer-cents world.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidMoney,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMoney => f.write_str("invalid money value"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Rounds a decimal amount to whole cents. Amounts come from form fields
/// already parsed as f64, so `10.50` becomes `1050`.
pub fn cents_from_amount(amount: f64) -> ValidationResult<i64> {
    if !amount.is_finite() {
        return Err(ValidationError::InvalidMoney);
    }
    let cents = (amount * 100.0).round();
    if cents.abs() > i64::MAX as f64 {
        return Err(ValidationError::InvalidMoney);
    }
    Ok(cents as i64)
}

/// Plain two-decimal rendering, the form the catalog price annotation takes:
/// `1050` becomes `"10.50"`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

/// Stock counts are fractional in storage but usually whole; render them
/// without a trailing `.0` when they are.
pub fn format_stock(stock: f64) -> String {
    if stock.fract() == 0.0 {
        format!("{stock:.0}")
    } else {
        format!("{stock}")
    }
}
