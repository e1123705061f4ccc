// 💱 Money & percentage helpers
//
// Amounts are plain f64 values in the venue's single currency. The currency
// code is only ever used for display, never for conversion.

/// Round to two decimal places (cents)
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// `part` as a percentage of `whole`, or 0 when `whole` is 0
///
/// Multiplies before dividing so that exact inputs (60000 of 100000) give
/// exact outputs (60.0).
pub fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    part * 100.0 / whole
}

/// Format an amount with thousands separators and two decimals
///
/// Example: `1234567.5` → `"1,234,567.50"`
pub fn format_amount(amount: f64) -> String {
    let rounded = round_cents(amount);
    let negative = rounded < 0.0;
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, cents)
}

/// Format an amount followed by its currency code
///
/// Example: `format_currency(90000.0, "YER")` → `"90,000.00 YER"`
pub fn format_currency(amount: f64, currency: &str) -> String {
    if currency.is_empty() {
        return format_amount(amount);
    }
    format!("{} {}", format_amount(amount), currency)
}

/// Format a percentage with two decimals, e.g. `"60.00%"`
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}
