//! pt-BR currency codec: "R$ 1.234,56" <-> 1234.56.

use rust_decimal::{Decimal, RoundingStrategy};

/// Parse a pt-BR currency string. Anything unparseable becomes zero.
pub fn parse_amount(raw: &str) -> Decimal {
    let s = raw.replace("R$", "").replace('.', "").replace(',', ".");
    s.trim().parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

/// Round half away from zero to two places, the way amounts are displayed.
fn cents(val: Decimal) -> Decimal {
    val.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Group the integer part with "." and use "," as the decimal separator.
fn grouped(val: Decimal) -> String {
    let rounded = cents(val);
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut with_dots = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_dots.push('.');
        }
        with_dots.push(c);
    }
    let with_dots: String = with_dots.chars().rev().collect();

    // -0.001 rounds to zero and should not keep its sign
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{with_dots},{dec_part}")
    } else {
        format!("{with_dots},{dec_part}")
    }
}

/// Format a value as Brazilian reais: R$ 1.234,56
pub fn format_currency(val: Decimal) -> String {
    format!("R$ {}", grouped(val))
}

/// Format a percentage with pt-BR separators: 12,30%
pub fn format_percent(val: Decimal) -> String {
    format!("{}%", grouped(val))
}

/// Sign of a value, for colouring in the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl Tone {
    pub fn of(val: Decimal) -> Self {
        if val > Decimal::ZERO {
            Tone::Positive
        } else if val < Decimal::ZERO {
            Tone::Negative
        } else {
            Tone::Neutral
        }
    }
}
