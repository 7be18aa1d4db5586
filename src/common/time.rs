/// Values above this are taken to be milliseconds rather than seconds.
pub const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Normalize a caller-supplied start timestamp to unix seconds.
///
/// No unit travels with the value, so magnitude decides: anything above
/// [`MILLIS_THRESHOLD`] is divided by 1000 and floored. Non-positive input yields `None`.
pub fn normalize_unix_seconds(raw: i64) -> Option<i64> {
    if raw <= 0 {
        return None;
    }
    if raw > MILLIS_THRESHOLD {
        Some(raw.div_euclid(1000))
    } else {
        Some(raw)
    }
}

/// Same as [`normalize_unix_seconds`] for floating point input (e.g. values read from JSON).
///
/// NaN and infinities are rejected.
pub fn normalize_unix_seconds_f64(raw: f64) -> Option<i64> {
    if !raw.is_finite() || raw <= 0.0 {
        return None;
    }
    let seconds = if raw > MILLIS_THRESHOLD as f64 {
        (raw / 1000.0).floor()
    } else {
        raw.floor()
    };
    if seconds < 1.0 || seconds > i64::MAX as f64 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(seconds as i64)
}
