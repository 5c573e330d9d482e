//! Minor-currency-unit price formatting.
//!
//! Prices throughout the system are non-negative integers denominated in
//! minor currency units (kopecks, cents). An absent price means "price
//! unavailable" and callers supply a fallback label for display.

/// Currency symbol for a small set of codes seen in hub catalogs.
///
/// Unknown codes fall back to the code itself as a suffix.
fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "RUB" => Some("\u{20bd}"),
        "USD" => Some("$"),
        "EUR" => Some("\u{20ac}"),
        _ => None,
    }
}

/// Group an integer's decimal digits with thin spaces, thousands-style.
fn group_digits(value: i64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            grouped.push('\u{202f}');
        }
        grouped.push(c);
    }
    grouped
}

/// Format a minor-unit amount as a display label, e.g. `1 234.50 ₽`.
///
/// `None` yields the provided fallback (the UI shows "price unavailable"
/// copy there).
#[must_use]
pub fn format_minor_units(cents: Option<i64>, currency: &str, fallback: &str) -> String {
    let Some(cents) = cents else {
        return fallback.to_string();
    };

    let units = group_digits(cents / 100);
    let fraction = (cents % 100).abs();
    currency_symbol(currency).map_or_else(
        || format!("{units}.{fraction:02} {currency}"),
        |symbol| format!("{units}.{fraction:02} {symbol}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_known_currency() {
        assert_eq!(
            format_minor_units(Some(123_450), "RUB", "-"),
            "1\u{202f}234.50 \u{20bd}"
        );
    }

    #[test]
    fn test_format_unknown_currency_uses_code() {
        assert_eq!(format_minor_units(Some(995), "KZT", "-"), "9.95 KZT");
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_minor_units(Some(0), "USD", "-"), "0.00 $");
    }

    #[test]
    fn test_format_absent_price_falls_back() {
        assert_eq!(
            format_minor_units(None, "RUB", "Цена недоступна"),
            "Цена недоступна"
        );
    }

    #[test]
    fn test_grouping_boundaries() {
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1_000), "1\u{202f}000");
        assert_eq!(group_digits(1_234_567), "1\u{202f}234\u{202f}567");
    }
}
