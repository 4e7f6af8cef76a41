//! Permissive field deserializers.
//!
//! Stored records come from hand-edited JSON and older browser exports, so a
//! malformed field must never fail the whole collection. Each helper here
//! degrades a bad value to "absent" (or the type's default) instead.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize any value into `Option<T>`, mapping null, missing and
/// ill-typed values to `None`.
pub fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

/// Deserialize into `T`, falling back to `T::default()` on null or a bad value.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(optional(deserializer)?.unwrap_or_default())
}

/// Deserialize a string through `T::from_str`, so the type's own spelling
/// rules apply. Non-strings and unparseable text become `None`.
pub fn parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|text| text.trim().parse().ok()))
}

/// Deserialize a date that may be an RFC 3339 timestamp, a naive timestamp or
/// a bare calendar date. Anything unparseable becomes `None`.
pub fn date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(parse_date))
}

/// Parse a date string the way form inputs and exports produce them.
///
/// Bare dates (`2024-03-01`) and naive timestamps are read as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[derive(Debug, Deserialize)]
    struct Record {
        #[serde(default, deserialize_with = "optional")]
        count: Option<u8>,
        #[serde(default, deserialize_with = "date")]
        when: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "or_default")]
        label: String,
        #[serde(default, deserialize_with = "parsed")]
        level: Option<u8>,
    }

    #[test]
    fn test_parse_bare_date_is_utc_midnight() {
        let parsed = parse_date("2024-03-01").unwrap();
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.day(), 1);
        assert_eq!(parsed.hour(), 0);
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let parsed = parse_date("2024-03-01T06:00:00+06:00").unwrap();
        assert_eq!(parsed.hour(), 0);
    }

    #[test]
    fn test_parse_naive_timestamp() {
        assert!(parse_date("2024-03-01T10:30:00").is_some());
        assert!(parse_date("2024-03-01T10:30:00.250").is_some());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_date("").is_none());
        assert!(parse_date("last tuesday").is_none());
        assert!(parse_date("2024-13-45").is_none());
    }

    #[test]
    fn test_bad_values_degrade() {
        let record: Record =
            serde_json::from_str(r#"{"count": "many", "when": 42, "label": null}"#).unwrap();
        assert_eq!(record.count, None);
        assert_eq!(record.when, None);
        assert_eq!(record.label, "");
    }

    #[test]
    fn test_parsed_goes_through_from_str() {
        let record: Record = serde_json::from_str(r#"{"level": " 4 "}"#).unwrap();
        assert_eq!(record.level, Some(4));

        let record: Record = serde_json::from_str(r#"{"level": 4}"#).unwrap();
        assert_eq!(record.level, None);

        let record: Record = serde_json::from_str(r#"{"level": "four"}"#).unwrap();
        assert_eq!(record.level, None);
    }

    #[test]
    fn test_missing_values_degrade() {
        let record: Record = serde_json::from_str("{}").unwrap();
        assert_eq!(record.count, None);
        assert_eq!(record.when, None);
    }

    #[test]
    fn test_good_values_pass_through() {
        let record: Record =
            serde_json::from_str(r#"{"count": 3, "when": "2024-01-02", "label": "x"}"#).unwrap();
        assert_eq!(record.count, Some(3));
        assert!(record.when.is_some());
        assert_eq!(record.label, "x");
    }
}
