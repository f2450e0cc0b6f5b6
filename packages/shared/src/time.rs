//! Time-related utilities.

use chrono::{TimeZone, Utc};

/// Get current Unix timestamp in milliseconds (UTC)
pub fn get_unix_timestamp() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to RFC 3339 format (UTC)
pub fn timestamp_to_rfc3339(timestamp_millis: i64) -> String {
    let seconds = timestamp_millis.div_euclid(1000);
    let nanos = (timestamp_millis.rem_euclid(1000) * 1_000_000) as u32;
    match Utc.timestamp_opt(seconds, nanos) {
        chrono::LocalResult::Single(dt) => dt.to_rfc3339(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_unix_timestamp_returns_non_zero() {
        // テスト項目: 現在時刻のタイムスタンプが 0 より大きい
        // given (前提条件):

        // when (操作):
        let timestamp = get_unix_timestamp();

        // then (期待する結果):
        assert!(timestamp > 0);
    }

    #[test]
    fn test_timestamp_to_rfc3339_formats_epoch() {
        // テスト項目: Unix エポックが正しい RFC 3339 文字列に変換される
        // given (前提条件):
        let timestamp_millis = 0;

        // when (操作):
        let formatted = timestamp_to_rfc3339(timestamp_millis);

        // then (期待する結果):
        assert_eq!(formatted, "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_timestamp_to_rfc3339_preserves_millis() {
        // テスト項目: ミリ秒成分が失われずに変換される
        // given (前提条件):
        let timestamp_millis = 1_700_000_000_500;

        // when (操作):
        let formatted = timestamp_to_rfc3339(timestamp_millis);

        // then (期待する結果):
        assert!(formatted.starts_with("2023-11-14T22:13:20.500"));
    }
}
