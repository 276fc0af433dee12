// Shared formatting helpers for panel rendering

use std::time::Duration;
use unicode_width::UnicodeWidthStr;

/// Compact human number: 950 -> "950", 12_400 -> "12.4K", 3_200_000 -> "3.2M"
pub fn format_compact_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Uptime as "2h 05m" / "4m 09s"
pub fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 3600 {
        format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// Truncate `text` to `max_width` display columns, appending an ellipsis
/// when something was cut. Width-aware so CJK and emoji don't overflow.
pub fn fit_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let keep = max_width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > keep {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
