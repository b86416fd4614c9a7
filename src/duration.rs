//! Time span text in the `1h30m`, `500ms`, `1.5h` notation.
//!
//! A span is a sequence of decimal numbers, each with an optional fraction and
//! a unit suffix: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. The bare string
//! `0` is also accepted. Spans are unsigned, so a leading `-` is rejected
//! unless the value is zero.

use std::time::Duration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Largest span accepted, matching a signed 64-bit nanosecond count.
const MAX_NANOS: u128 = i64::MAX as u128;

/// Parse a span such as `"2h45m"` or `"1.5s"`.
pub fn parse(text: &str) -> Result<Duration, String> {
    let mut rest = text;
    let mut negative = false;
    if let Some(r) = rest.strip_prefix('-') {
        negative = true;
        rest = r;
    } else if let Some(r) = rest.strip_prefix('+') {
        rest = r;
    }

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(format!("invalid duration {text:?}"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_frac) = match after_int.strip_prefix('.') {
            Some(r) => {
                let frac_len = r.bytes().take_while(u8::is_ascii_digit).count();
                r.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(format!("invalid duration {text:?}"));
        }

        let unit_len = after_frac
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map(|(i, _)| i)
            .unwrap_or(after_frac.len());
        let (unit, remaining) = after_frac.split_at(unit_len);
        let scale = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3600 * NANOS_PER_SEC,
            "" => return Err(format!("missing unit in duration {text:?}")),
            other => return Err(format!("unknown unit {other:?} in duration {text:?}")),
        };

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| format!("invalid duration {text:?}"))?
        };
        let overflow = || format!("duration {text:?} overflows");
        if whole > MAX_NANOS / scale {
            return Err(overflow());
        }
        let mut value = whole * scale;

        if !frac_part.is_empty() {
            // Digits beyond nanosecond precision cannot change the result.
            let digits = &frac_part[..frac_part.len().min(18)];
            let numerator: u128 = digits
                .parse()
                .map_err(|_| format!("invalid duration {text:?}"))?;
            let denominator = 10u128.pow(digits.len() as u32);
            value = value
                .checked_add(numerator * scale / denominator)
                .ok_or_else(overflow)?;
        }

        total = total
            .checked_add(value)
            .filter(|t| *t <= MAX_NANOS)
            .ok_or_else(overflow)?;
        rest = remaining;
    }

    if negative && total > 0 {
        return Err(format!("negative duration {text:?}"));
    }

    let secs = (total / NANOS_PER_SEC) as u64;
    let nanos = (total % NANOS_PER_SEC) as u32;
    Ok(Duration::new(secs, nanos))
}

/// Render a span the way [`parse`] reads it, e.g. `1h0m0s`, `1.5s`, `250ms`.
pub fn format(span: Duration) -> String {
    let nanos = span.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", decimal(nanos, NANOS_PER_MICRO, 3));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", decimal(nanos, NANOS_PER_MILLI, 6));
    }

    let total_secs = nanos / NANOS_PER_SEC;
    let seconds = decimal(
        (total_secs % 60) * NANOS_PER_SEC + nanos % NANOS_PER_SEC,
        NANOS_PER_SEC,
        9,
    );
    let total_mins = total_secs / 60;
    if total_mins == 0 {
        return format!("{seconds}s");
    }
    let hours = total_mins / 60;
    let mins = total_mins % 60;
    if hours == 0 {
        format!("{mins}m{seconds}s")
    } else {
        format!("{hours}h{mins}m{seconds}s")
    }
}

fn decimal(value: u128, unit: u128, width: usize) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
