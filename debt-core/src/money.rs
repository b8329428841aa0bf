//! Display formatting for so'm amounts

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount as whole so'm with space-grouped thousands: `1 575 000 UZS`
pub fn format_uzs(amount: Decimal) -> String {
    let whole = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = whole.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    if whole.is_sign_negative() && !whole.is_zero() {
        format!("-{} UZS", grouped)
    } else {
        format!("{} UZS", grouped)
    }
}
