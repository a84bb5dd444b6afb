//! Lexically sortable snapshot ordering keys.
//!
//! Format is `YYYYMMDDTHHMMSSmmmZ-NNNNNN`, the UTC capture time at millisecond
//! precision followed by a zero-padded sequence number that disambiguates
//! keys issued within the same millisecond. Every key has the same width,
//! so string order equals chronological order.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Highest sequence number representable in the key's fixed width.
pub const MAX_SEQUENCE: u32 = 999_999;

const KEY_LEN: usize = 26;
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Monotonic ordering key of one snapshot.
///
/// Field order matters: the derived `Ord` compares capture time first and
/// sequence second, which matches the lexical order of the string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderingKey {
    millis: i64,
    sequence: u32,
}

impl OrderingKey {
    /// Build a key from a capture time and a sequence number.
    ///
    /// The capture time must fall in years 0000-9999 and the sequence must
    /// not exceed [`MAX_SEQUENCE`], otherwise the fixed width breaks.
    pub fn new(captured_at: DateTime<Utc>, sequence: u32) -> Result<Self, AppError> {
        Self::from_millis(captured_at.timestamp_millis(), sequence)
    }

    /// Build a key from Unix milliseconds and a sequence number.
    pub fn from_millis(millis: i64, sequence: u32) -> Result<Self, AppError> {
        if sequence > MAX_SEQUENCE {
            return Err(AppError::validation(format!(
                "Ordering key sequence {sequence} exceeds {MAX_SEQUENCE}"
            )));
        }
        let captured_at = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| AppError::validation(format!("Invalid capture time {millis}")))?;
        let year = chrono::Datelike::year(&captured_at);
        if !(0..=9999).contains(&year) {
            return Err(AppError::validation(format!(
                "Capture year {year} is outside the sortable range"
            )));
        }
        Ok(Self { millis, sequence })
    }

    /// Capture time in Unix milliseconds.
    pub fn millis(&self) -> i64 {
        self.millis
    }

    /// Same-millisecond disambiguator.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Capture time as a UTC timestamp.
    pub fn captured_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.millis)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl fmt::Display for OrderingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:03}Z-{:06}",
            self.captured_at().format(DATE_TIME_FORMAT),
            self.millis.rem_euclid(1000),
            self.sequence
        )
    }
}

impl FromStr for OrderingKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::validation(format!("Invalid ordering key '{s}'"));

        if s.len() != KEY_LEN || !s.is_ascii() {
            return Err(invalid());
        }
        let (date_time, rest) = s.split_at(15);
        let (millis, rest) = rest.split_at(3);
        let (separator, sequence) = rest.split_at(2);
        if separator != "Z-" {
            return Err(invalid());
        }
        if !millis.bytes().all(|b| b.is_ascii_digit())
            || !sequence.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let base = NaiveDateTime::parse_from_str(date_time, DATE_TIME_FORMAT)
            .map_err(|_| invalid())?
            .and_utc()
            .timestamp_millis();
        let millis: i64 = millis.parse().map_err(|_| invalid())?;
        let sequence: u32 = sequence.parse().map_err(|_| invalid())?;

        Self::from_millis(base + millis, sequence)
    }
}

impl TryFrom<String> for OrderingKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderingKey> for String {
    fn from(key: OrderingKey) -> String {
        key.to_string()
    }
}
