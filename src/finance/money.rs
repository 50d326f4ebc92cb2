//! Parsing and display of money typed into form fields.
//!
//! Inputs arrive as whatever the seller typed ("$1,200", "1200.50", "  "). Parsing
//! strips everything except ASCII digits and the decimal point. A failed or empty parse
//! is `None`; aggregation treats that as zero while required-field validation treats
//! it as unset.

/// Parse a money or quantity input, ignoring currency symbols and separators
pub fn parse_amount(input: &str) -> Option<f64> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Aggregation policy: anything unparseable counts as zero
pub fn amount_or_zero(input: &str) -> f64 {
    parse_amount(input).unwrap_or(0.0)
}

/// `$25,000`, `$1,234.50`, `-$300`
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let dollars = cents / 100;
    let remainder = cents % 100;

    let mut out = String::new();
    if value < 0.0 && cents > 0 {
        out.push('-');
    }
    out.push('$');
    out.push_str(&group_thousands(dollars));
    if remainder > 0 {
        out.push_str(&format!(".{:02}", remainder));
    }
    out
}

pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Round to whole cents
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
