//! Display normalization for monetary amounts.
//!
//! The model may answer `50000`, `"¥50,000"` or `"50000元"` for the same
//! amount. Anything that still fails to parse after the known decorations are
//! removed is shown exactly as received.

use serde_json::Value;

const CURRENCY_SYMBOL: char = '¥';

/// Characters removed before numeric parsing
const DECORATIONS: [char; 4] = [',', '¥', '￥', '元'];

/// Canonical display form of an amount, e.g. `¥1,234`. Never fails.
pub fn format_money(value: &Value) -> String {
    match parse_amount(value) {
        Some(amount) => format!("{}{}", CURRENCY_SYMBOL, group_thousands(amount)),
        None => raw_display(value),
    }
}

/// Loss figures are shown as a negative amount, e.g. `-¥50,000`
pub fn format_loss(value: &Value) -> String {
    format!("-{}", format_money(value))
}

/// Numeric value of an amount, if it has one
pub fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decorated(s),
        _ => None,
    }?;
    amount.is_finite().then_some(amount)
}

fn parse_decorated(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| !DECORATIONS.contains(c)).collect();
    cleaned.trim().parse::<f64>().ok()
}

fn raw_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Round to an integer and insert `,` every three digits
fn group_thousands(amount: f64) -> String {
    let rounded = format!("{:.0}", amount);
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}")
}
