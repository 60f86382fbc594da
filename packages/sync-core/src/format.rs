//! Display helpers for playback positions

/// Format seconds as `m:ss`, or `h:mm:ss` from one hour up
///
/// Fractions are truncated; zero, negative and non-finite input render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 1.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    let h = total / 3600;
    let m = (total / 60) % 60;
    let s = total % 60;

    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}
