/// Formatting helpers shared by metric sources and the CLI

/// Format a percentage reading the way panels display it
pub fn format_percent(value: f64) -> String {
    format!("{:.1} %", value)
}

/// Convert a byte count to megabytes
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Format a byte count as megabytes
pub fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes_to_mb(bytes))
}

/// Format a byte count observed over a sampling window as a rate
pub fn format_mb_per_sec(bytes: u64, window_secs: f64) -> String {
    let rate = if window_secs > 0.0 {
        bytes_to_mb(bytes) / window_secs
    } else {
        0.0
    };
    format!("{:.2} MB/s", rate)
}
