//! Money arithmetic for document totals.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::entities::document::DocumentKind;

/// Largest amount the `NUMERIC(16, 2)` money columns hold.
pub const MAX_AMOUNT: Decimal = dec!(99999999999999.99);

/// Largest quantity the `NUMERIC(16, 4)` quantity columns hold.
pub const MAX_QUANTITY: Decimal = dec!(999999999999.9999);

/// Rounds to two decimal places, midpoint away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmount {
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl LineAmount {
    pub fn new(quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            quantity,
            unit_price,
        }
    }

    /// `None` when the product leaves the storable money range.
    pub fn line_total(&self) -> Option<Decimal> {
        self.quantity
            .checked_mul(self.unit_price)
            .map(round2)
            .filter(|total| total.abs() <= MAX_AMOUNT)
    }
}

/// An amount in the totals computation left the storable range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountOverflow {
    /// Line at this position.
    Line(usize),
    Total,
}

fn within_range(value: Option<Decimal>) -> Result<Decimal, AmountOverflow> {
    value
        .filter(|v| v.abs() <= MAX_AMOUNT)
        .ok_or(AmountOverflow::Total)
}

/// Header fields that influence the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingTerms {
    pub apply_tax: bool,
    pub tax_rate: Decimal,
    pub exchange_rate: Decimal,
}

impl Default for PricingTerms {
    fn default() -> Self {
        Self {
            apply_tax: false,
            tax_rate: Decimal::ZERO,
            exchange_rate: Decimal::ONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTotals {
    pub line_totals: Vec<Decimal>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Computes line totals, subtotal, tax and grand total for one document.
///
/// Quotations and invoices add tax when `apply_tax` is set. Imports convert
/// the subtotal with the exchange rate and carry no tax. Delivery notes are
/// never taxed.
pub fn compute(
    kind: DocumentKind,
    lines: &[LineAmount],
    terms: &PricingTerms,
) -> Result<DocumentTotals, AmountOverflow> {
    let line_totals = lines
        .iter()
        .enumerate()
        .map(|(index, line)| line.line_total().ok_or(AmountOverflow::Line(index)))
        .collect::<Result<Vec<_>, _>>()?;

    let subtotal = within_range(
        line_totals
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(*line))
            .map(round2),
    )?;

    let (tax_amount, total) = match kind {
        DocumentKind::Quotation | DocumentKind::Invoice => {
            let tax = if terms.apply_tax {
                within_range(subtotal.checked_mul(terms.tax_rate).map(round2))?
            } else {
                Decimal::ZERO
            };
            (tax, within_range(subtotal.checked_add(tax))?)
        }
        DocumentKind::Import => (
            Decimal::ZERO,
            within_range(subtotal.checked_mul(terms.exchange_rate).map(round2))?,
        ),
        DocumentKind::DeliveryNote => (Decimal::ZERO, subtotal),
    };

    Ok(DocumentTotals {
        line_totals,
        subtotal,
        tax_amount,
        total,
    })
}
