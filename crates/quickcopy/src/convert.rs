//! Builtin conversions called by generated code.
//!
//! Parsing never fails: malformed input yields the zero value of the
//! destination type.

use crate::{Timestamp, Uuid};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Display;
use std::str::FromStr;

pub fn int_to_text<T: Display>(value: &T) -> String {
  value.to_string()
}

/// Zero when `text` isn't a valid `T`.
pub fn text_to_int<T: FromStr + Default>(text: &str) -> T {
  text.trim().parse().unwrap_or_default()
}

pub fn float_to_text<T: Display>(value: &T) -> String {
  value.to_string()
}

/// `0.0` when `text` isn't a valid `T`.
pub fn text_to_float<T: FromStr + Default>(text: &str) -> T {
  text.trim().parse().unwrap_or_default()
}

/// RFC 3339, seconds precision, `Z` suffix.
pub fn timestamp_to_text(value: &Timestamp) -> String {
  value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The Unix epoch when `text` isn't RFC 3339.
pub fn text_to_timestamp(text: &str) -> Timestamp {
  DateTime::parse_from_rfc3339(text.trim())
    .map(|value| value.with_timezone(&Utc))
    .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

pub fn uuid_to_text(value: &Uuid) -> String {
  value.to_string()
}

/// The nil uuid when `text` isn't a uuid.
pub fn text_to_uuid(text: &str) -> Uuid {
  Uuid::parse_str(text.trim()).unwrap_or_else(|_| Uuid::nil())
}

pub fn text_to_bytes(text: &str) -> Vec<u8> {
  text.as_bytes().to_vec()
}

/// Invalid UTF-8 sequences become `U+FFFD`.
pub fn bytes_to_text(value: &[u8]) -> String {
  String::from_utf8_lossy(value).into_owned()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_numbers() {
    assert_eq!(int_to_text(&-42i64), "-42");
    assert_eq!(text_to_int::<u16>("7"), 7);
    assert_eq!(text_to_int::<i32>(" -3 "), -3);
    assert_eq!(text_to_int::<u8>("300"), 0);
    assert_eq!(text_to_int::<i32>("seven"), 0);
    assert_eq!(float_to_text(&1.5f64), "1.5");
    assert_eq!(text_to_float::<f32>("2.25"), 2.25);
    assert_eq!(text_to_float::<f64>(""), 0.0);
  }

  #[test]
  fn test_timestamps() {
    let value = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
    assert_eq!(timestamp_to_text(&value), "2021-03-04T05:06:07Z");
    assert_eq!(text_to_timestamp("2021-03-04T05:06:07Z"), value);
    assert_eq!(text_to_timestamp("2021-03-04T06:06:07+01:00"), value);
    assert_eq!(text_to_timestamp("yesterday"), DateTime::<Utc>::UNIX_EPOCH);
  }

  #[test]
  fn test_uuids() {
    let text = "67e55044-10b1-426f-9247-bb680e5fe0c8";
    let value = text_to_uuid(text);
    assert_eq!(uuid_to_text(&value), text);
    assert_eq!(text_to_uuid("67e55044"), Uuid::nil());
  }

  #[test]
  fn test_bytes() {
    assert_eq!(text_to_bytes("hi"), b"hi".to_vec());
    assert_eq!(bytes_to_text(&b"hi".to_vec()), "hi");
    assert_eq!(bytes_to_text(&[0x68, 0xff]), "h\u{fffd}");
  }
}
