//! Decimal string helpers
//!
//! CRM balance columns are text with thousands separators ("10,000.00").
//! Every piece of arithmetic in the payment core goes through these two
//! functions so the balance invariants stay mechanically checkable.

/// Parse a CRM decimal string. Empty or malformed input parses to 0.0,
/// matching how the upstream schedule columns are treated elsewhere.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse::<f64>().unwrap_or_else(|_| {
        tracing::warn!("unparseable amount string: {:?}", raw);
        0.0
    })
}

/// Format an amount the way the payment core writes it back: two decimals,
/// no separators.
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Format with thousands separators for human-facing output (PDFs).
pub fn format_amount_grouped(amount: f64) -> String {
    let plain = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}
