//! Time and timestamp utilities

/// Current Unix timestamp in seconds
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Current Unix timestamp in milliseconds
pub fn current_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_agree() {
        let secs = current_timestamp();
        let millis = current_timestamp_millis();
        assert!((millis / 1000 - secs).abs() <= 1);
    }
}
