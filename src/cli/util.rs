use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::dashboard::amount::{parse_grouped, parse_plain};

/// Whole-unit amount with `.` between thousands, e.g. `5.000.000`.
pub fn fmt_money(d: &Decimal) -> String {
    let rounded = d.round_dp(0);
    let digits = rounded.abs().trunc().to_string();
    let grouped = group_digits(&digits);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Inserts `.` every three digits from the right: `"1500000"` -> `"1.500.000"`.
pub fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Reads a typed amount; dots are grouping, not decimals.
pub fn parse_money(s: &str) -> Option<Decimal> {
    parse_grouped(s.trim())
}

/// Share of `target` already collected, clamped to `0.0..=1.0`.
pub fn progress_ratio(collected: &str, target: &str) -> f64 {
    let collected = parse_plain(collected).unwrap_or(Decimal::ZERO);
    let target = parse_grouped(target).unwrap_or(Decimal::ZERO);
    if target <= Decimal::ZERO {
        return 0.0;
    }
    (collected / target).to_f64().unwrap_or(0.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_is_dot_grouped() {
        assert_eq!(fmt_money(&Decimal::from(5_000_000)), "5.000.000");
        assert_eq!(fmt_money(&Decimal::from(999)), "999");
        assert_eq!(fmt_money(&Decimal::from(-1500)), "-1.500");
        assert_eq!(fmt_money(&Decimal::ZERO), "0");
        assert_eq!(fmt_money(&Decimal::new(12346, 1)), "1.235");
    }

    #[test]
    fn parse_money_reads_grouped_input() {
        assert_eq!(parse_money(" 2.500 "), Some(Decimal::from(2500)));
        assert_eq!(parse_money("x"), None);
    }

    #[test]
    fn progress_is_clamped() {
        assert!((progress_ratio("200000", "5.000.000") - 0.04).abs() < 1e-9);
        assert_eq!(progress_ratio("9000000", "5.000.000"), 1.0);
        assert_eq!(progress_ratio("-5", "10"), 0.0);
        assert_eq!(progress_ratio("5", "0"), 0.0);
        assert_eq!(progress_ratio("5", "abc"), 0.0);
    }
}
