//! Presentation-only number formatting (en-US). Nothing here feeds back into
//! a calculation.

use rust_decimal::Decimal;

/// Format a dollar amount with cents and thousands separators.
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.abs().round_dp(2);
    let text = format!("{rounded:.2}");
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if amount.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}${}.{cents}", group_thousands(whole))
}

/// Format an assessment rate as a percentage, e.g. `0.0625` -> `6.25%`.
pub fn format_percent(rate: Decimal) -> String {
    format!("{:.2}%", rate * Decimal::ONE_HUNDRED)
}

/// Format a mill levy, trimming trailing zeros, e.g. `85.000` -> `85`.
pub fn format_levy(levy: Decimal) -> String {
    let text = format!("{levy:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn usd_groups_thousands_and_keeps_cents() {
        assert_eq!(format_usd(dec!(0)), "$0.00");
        assert_eq!(format_usd(dec!(802.5)), "$802.50");
        assert_eq!(format_usd(dec!(28200)), "$28,200.00");
        assert_eq!(format_usd(dec!(2800000)), "$2,800,000.00");
        assert_eq!(format_usd(dec!(64586.592)), "$64,586.59");
        assert_eq!(format_usd(dec!(-1234.5)), "-$1,234.50");
    }

    #[test]
    fn percent_renders_two_decimals() {
        assert_eq!(format_percent(dec!(0.0625)), "6.25%");
        assert_eq!(format_percent(dec!(0.0705)), "7.05%");
        assert_eq!(format_percent(dec!(0.27)), "27.00%");
    }

    #[test]
    fn levy_trims_trailing_zeros() {
        assert_eq!(format_levy(dec!(85.432)), "85.432");
        assert_eq!(format_levy(dec!(85.0)), "85");
        assert_eq!(format_levy(dec!(32.100)), "32.1");
    }
}
