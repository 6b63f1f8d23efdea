//! Duration display helpers.

/// Formats whole seconds as `m:ss`.
///
/// Minutes are not wrapped at 60, so `3661.0` renders as `61:01`. Negative and
/// NaN inputs render as `0:00`.
pub fn format_duration(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Formats the player's known duration, falling back to the message's
/// nominal length until the host has reported one.
pub fn display_duration(duration_secs: Option<f64>, nominal_ms: u64) -> String {
    let secs = duration_secs.unwrap_or(nominal_ms as f64 / 1000.0);
    format_duration(secs)
}
