use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

const THOUSAND: i64 = 1_000;

/// `$98,432`: rounded to whole dollars with thousands separators.
pub fn format_price(price: Decimal) -> String {
    format!("${}", group_thousands(round_whole(price)))
}

/// `+2.34%` / `-1.20%`.
pub fn format_change(pct: f64) -> String {
    let sign = if pct >= 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, pct)
}

/// `$1.2B`, `$3.4M`, or the grouped dollar amount below a million.
pub fn format_volume(volume: Decimal) -> String {
    let billion = Decimal::from(THOUSAND.pow(3));
    let million = Decimal::from(THOUSAND.pow(2));

    if volume >= billion {
        format!("${:.1}B", (volume / billion).round_dp(1))
    } else if volume >= million {
        format!("${:.1}M", (volume / million).round_dp(1))
    } else {
        format!("${}", group_thousands(round_whole(volume)))
    }
}

/// `$1.93T`, `$850.0B`, or the grouped dollar amount below a billion.
pub fn format_market_cap(cap: Decimal) -> String {
    let trillion = Decimal::from(THOUSAND.pow(4));
    let billion = Decimal::from(THOUSAND.pow(3));

    if cap >= trillion {
        format!("${:.2}T", (cap / trillion).round_dp(2))
    } else if cap >= billion {
        format!("${:.1}B", (cap / billion).round_dp(1))
    } else {
        format!("${}", group_thousands(round_whole(cap)))
    }
}

/// Compact age of a timestamp: `now`, `5m`, `3h`, `2d`.
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let mins = (now - then).num_minutes();
    if mins < 1 {
        return "now".to_string();
    }
    if mins < 60 {
        return format!("{}m", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }
    format!("{}d", hours / 24)
}

/// Half-up rounding to whole units.
fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Inserts `,` every three digits of an already rounded value.
fn group_thousands(value: Decimal) -> String {
    let digits = value.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if value.is_sign_negative() && !value.is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
