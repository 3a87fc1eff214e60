// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::MaterialLine;

/// Parses a free-text money or quantity field. Unparseable, negative and
/// non-finite input all count as zero — bad input must never abort a
/// totals computation.
pub fn parse_amount(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value.max(0.0),
        _ => 0.0,
    }
}

/// Subtotal of one material line: quantity times unit price.
pub fn subtotal(line: &MaterialLine) -> f64 {
    parse_amount(&line.quantity) * parse_amount(&line.unit_price)
}

/// Sum of the subtotals over all lines, empty-description lines included
/// (the validator drops those before persistence, not this function).
pub fn materials_total(lines: &[MaterialLine]) -> f64 {
    lines.iter().map(subtotal).sum()
}

/// Materials total plus labor. Labor below zero counts as zero, like any
/// other amount.
pub fn grand_total(lines: &[MaterialLine], labor_cost: f64) -> f64 {
    materials_total(lines) + labor_cost.max(0.0)
}
