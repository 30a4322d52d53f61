use std::time::Duration;

/// `backoff(base, max, count) = min(max, base + 2^(count-1) seconds)` for
/// `count in [1, 31]`; for `count >= 31`, returns `max`. `count ==
/// 0` is treated as `count == 1` so callers can start a retry counter at
/// zero without special-casing the first call.
pub fn exp_backoff(base: Duration, max: Duration, count: u32) -> Duration {
    if count >= 31 {
        return max;
    }
    let exponent = count.max(1) - 1;
    let step = Duration::from_secs(1u64.checked_shl(exponent).unwrap_or(u64::MAX));
    base.checked_add(step).unwrap_or(max).min(max)
}
