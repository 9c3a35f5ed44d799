//! Candle normalizer: raw exchange payload -> ordered, typed candles.
//!
//! The exchange returns a JSON array of `[time, low, high, open, close,
//! volume]` rows with no ordering guarantee (in practice newest-first), and
//! reports errors as a JSON object carrying a `message` field. Numeric
//! fields may arrive as JSON numbers or strings.
//!
//! Normalization is fail-fast: one bad row rejects the whole batch with
//! [`ProviderError::MalformedData`], because statistics over a partial
//! candle set are worse than no chart for that window.

use chrono::DateTime;
use serde_json::Value;

use crate::models::candle::Candle;
use crate::providers::errors::ProviderError;

/// Convert a raw candles payload into a sequence sorted ascending by time.
///
/// Idempotent on well-formed input. Repeated timestamps are tolerated; the
/// sort is stable so the later row of a same-timestamp pair stays later.
pub fn normalize(payload: &Value) -> Result<Vec<Candle>, ProviderError> {
    let rows = match payload {
        Value::Array(rows) => rows,
        Value::Object(map) => {
            let message = map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unexpected object payload");
            if message.to_ascii_lowercase().contains("rate limit") {
                return Err(ProviderError::RateLimited);
            }
            return Err(ProviderError::Upstream(message.to_string()));
        }
        other => {
            return Err(ProviderError::Upstream(format!(
                "unexpected payload shape: {other}"
            )));
        }
    };

    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        candles.push(candle_from_row(row)?);
    }
    candles.sort_by_key(|c| c.time);
    Ok(candles)
}

fn candle_from_row(row: &Value) -> Result<Candle, ProviderError> {
    let fields = row
        .as_array()
        .filter(|fields| fields.len() >= 6)
        .ok_or_else(|| malformed(row))?;

    let seconds = decimal(&fields[0]).map_err(|_| malformed(row))? as i64;
    let time = DateTime::from_timestamp(seconds, 0).ok_or_else(|| malformed(row))?;

    let candle = Candle {
        time,
        low: decimal(&fields[1]).map_err(|_| malformed(row))?,
        high: decimal(&fields[2]).map_err(|_| malformed(row))?,
        open: decimal(&fields[3]).map_err(|_| malformed(row))?,
        close: decimal(&fields[4]).map_err(|_| malformed(row))?,
        volume: decimal(&fields[5]).map_err(|_| malformed(row))?,
    };

    if !candle.is_sane() {
        return Err(malformed(row));
    }
    Ok(candle)
}

/// Coerce a JSON number or numeric string to `f64`.
fn decimal(value: &Value) -> Result<f64, ()> {
    match value {
        Value::Number(n) => n.as_f64().ok_or(()),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| ()),
        _ => Err(()),
    }
}

fn malformed(row: &Value) -> ProviderError {
    ProviderError::MalformedData(row.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_newest_first_input_ascending() {
        let payload = json!([
            [1_700_000_600, 9.0, 12.0, 10.0, 11.0, 2.0],
            [1_700_000_000, 8.0, 11.0, 9.0, 10.0, 1.0],
        ]);
        let candles = normalize(&payload).unwrap();
        assert_eq!(candles.len(), 2);
        assert!(candles[0].time < candles[1].time);
        assert_eq!(candles[0].close, 10.0);
    }

    #[test]
    fn is_idempotent_on_sorted_input() {
        let payload = json!([
            [1_700_000_000, 8.0, 11.0, 9.0, 10.0, 1.0],
            [1_700_000_600, 9.0, 12.0, 10.0, 11.0, 2.0],
        ]);
        let first = normalize(&payload).unwrap();
        let second = normalize(&payload).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn coerces_string_fields() {
        let payload = json!([["1700000000", "8.5", "11.5", "9.0", "10.25", "1.5"]]);
        let candles = normalize(&payload).unwrap();
        assert_eq!(candles[0].low, 8.5);
        assert_eq!(candles[0].close, 10.25);
    }

    #[test]
    fn one_malformed_row_rejects_the_batch() {
        let payload = json!([
            [1_700_000_000, 8.0, 11.0, 9.0, 10.0, 1.0],
            [1_700_000_600, "not-a-price", 12.0, 10.0, 11.0, 2.0],
        ]);
        assert!(matches!(
            normalize(&payload),
            Err(ProviderError::MalformedData(_))
        ));
    }

    #[test]
    fn short_row_rejects_the_batch() {
        let payload = json!([[1_700_000_000, 8.0, 11.0]]);
        assert!(matches!(
            normalize(&payload),
            Err(ProviderError::MalformedData(_))
        ));
    }

    #[test]
    fn inverted_high_low_rejects_the_batch() {
        let payload = json!([[1_700_000_000, 11.0, 8.0, 9.0, 10.0, 1.0]]);
        assert!(matches!(
            normalize(&payload),
            Err(ProviderError::MalformedData(_))
        ));
    }

    #[test]
    fn rate_limit_message_is_surfaced() {
        let payload = json!({"message": "Public rate limit exceeded"});
        assert!(matches!(
            normalize(&payload),
            Err(ProviderError::RateLimited)
        ));
    }

    #[test]
    fn other_error_message_is_upstream() {
        let payload = json!({"message": "NotFound"});
        match normalize(&payload) {
            Err(ProviderError::Upstream(msg)) => assert_eq!(msg, "NotFound"),
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn scalar_payload_is_upstream() {
        assert!(matches!(
            normalize(&json!("oops")),
            Err(ProviderError::Upstream(_))
        ));
    }

    #[test]
    fn duplicate_timestamps_are_tolerated() {
        let payload = json!([
            [1_700_000_000, 8.0, 11.0, 9.0, 10.0, 1.0],
            [1_700_000_000, 8.0, 11.0, 9.0, 10.5, 1.0],
        ]);
        let candles = normalize(&payload).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles.last().unwrap().close, 10.5);
    }
}
