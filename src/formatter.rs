//! collectd `PUTVAL` line rendering.
//!
//! The line shape is consumed by collectd's exec plugin and must match it
//! byte for byte:
//!
//! ```text
//! PUTVAL <host>/fedmsg/fedmsg_wallboard interval=<N> <unix_ts>:<v1>:...:<vk>
//! ```

/// collectd plugin name.
pub const PLUGIN: &str = "fedmsg";

/// collectd type name.
pub const TYPE: &str = "fedmsg_wallboard";

/// Separator between the timestamp and each value.
pub const DELIMITER: &str = ":";

/// Render one `PUTVAL` line. No trailing newline is added.
pub fn format_putval(
    host: &str,
    interval_secs: u64,
    timestamp_secs: i64,
    values: &[u64],
) -> String {
    let fields: Vec<String> = std::iter::once(timestamp_secs.to_string())
        .chain(values.iter().map(u64::to_string))
        .collect();
    format!(
        "PUTVAL {}/{}/{} interval={} {}",
        host,
        PLUGIN,
        TYPE,
        interval_secs,
        fields.join(DELIMITER)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_reference_line() {
        let line = format_putval("host1", 2, 1_700_000_000, &[0, 3, 5]);
        assert_eq!(
            line,
            "PUTVAL host1/fedmsg/fedmsg_wallboard interval=2 1700000000:0:3:5"
        );
    }

    #[test]
    fn test_format_single_value() {
        let line = format_putval("busmon01.example.org", 10, 42, &[7]);
        assert_eq!(
            line,
            "PUTVAL busmon01.example.org/fedmsg/fedmsg_wallboard interval=10 42:7"
        );
    }

    #[test]
    fn test_format_has_no_newline() {
        let line = format_putval("h", 2, 1, &[1, 2]);
        assert!(!line.ends_with('\n'));
        assert_eq!(line.lines().count(), 1);
    }

    #[test]
    fn test_format_is_deterministic() {
        let values = [12, 0, 99_999, 1];
        assert_eq!(
            format_putval("h", 5, 1_600_000_000, &values),
            format_putval("h", 5, 1_600_000_000, &values)
        );
    }
}
