//! Text formatting shared by the layout and the painter

use chrono::NaiveDate;

/// Formats a date as `DD Mon YYYY`, e.g. `01 Oct 2025`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// Maps text onto what the built-in PDF fonts can encode
///
/// The standard Type 1 fonts only cover a Latin subset, so the rupee sign
/// becomes its ISO code and anything else outside ASCII becomes `?`.
pub fn pdf_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '₹' => out.push_str("INR "),
            '€' => out.push_str("EUR "),
            '£' => out.push_str("GBP "),
            '©' => out.push_str("(c)"),
            c if c.is_ascii() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}
