//! Derived scalar fields shared by certificates and CRLs: names with their
//! hashed string form, timestamps, and reference times for expiry checks.

use std::fmt;

use der::Encode;
use sha2::{Digest, Sha256};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::parsing::Parsed;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use x509_cert::name::Name;
use x509_cert::time::Time;

use crate::error::{PkiError, Result};

/// SHA-256 of a name's string form, used for fast issuer/subject equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameHash([u8; 32]);

impl NameHash {
    pub fn of(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        NameHash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameHash({})", hex::encode(&self.0[..8]))
    }
}

/// A distinguished name together with its RFC 4514 string form and the hash
/// of that string.
#[derive(Clone, Debug)]
pub struct NameInfo {
    pub name: Name,
    pub text: String,
    pub hash: NameHash,
}

impl NameInfo {
    pub fn from_name(name: &Name) -> Self {
        let text = name.to_string();
        let hash = NameHash::of(&text);
        Self {
            name: name.clone(),
            text,
            hash,
        }
    }
}

/// A decoded X.509 time with the text it was encoded as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timestamp {
    pub time: OffsetDateTime,
    /// The raw UTCTime/GeneralizedTime value, e.g. `250101000000Z`.
    pub encoded: String,
}

impl Timestamp {
    pub fn from_x509(value: &Time) -> Result<Self> {
        let secs = i64::try_from(value.to_unix_duration().as_secs())
            .map_err(|e| PkiError::DecodingError(e.to_string()))?;
        let time = OffsetDateTime::from_unix_timestamp(secs)
            .map_err(|e| PkiError::DecodingError(e.to_string()))?;

        // Tag and length take two bytes for both time types.
        let der = value.to_der()?;
        let encoded = der
            .get(2..)
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .unwrap_or_default();

        Ok(Self { time, encoded })
    }
}

/// Big-endian serial magnitude without DER sign padding, so that serials
/// read from certificates and from CRL entries compare equal.
pub(crate) fn normalize_serial(bytes: &[u8]) -> Vec<u8> {
    let start = bytes
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(bytes.len().saturating_sub(1));
    bytes[start..].to_vec()
}

/// Converts a point in time into the X.509 encoding RFC 5280 asks for:
/// UTCTime through 2049, GeneralizedTime afterwards.
pub(crate) fn to_x509_time(value: OffsetDateTime) -> Result<Time> {
    let system_time: std::time::SystemTime = value.into();
    let time = if value.year() < 2050 {
        Time::UtcTime(der::asn1::UtcTime::from_system_time(system_time)?)
    } else {
        Time::GeneralTime(der::asn1::GeneralizedTime::from_system_time(system_time)?)
    };
    Ok(time)
}

/// The instant an expiry check is evaluated against.
///
/// Text is accepted in two fixed formats, `Jan 30 07:38:59 2008 GMT` and
/// `01/30/08`, both read as UTC. Text in any other shape falls back to the
/// current time with a warning.
#[derive(Clone, Copy, Debug, Default)]
pub enum ReferenceTime<'a> {
    #[default]
    Now,
    At(OffsetDateTime),
    Text(&'a str),
}

impl ReferenceTime<'_> {
    pub fn resolve(&self) -> OffsetDateTime {
        match self {
            ReferenceTime::Now => OffsetDateTime::now_utc(),
            ReferenceTime::At(time) => *time,
            ReferenceTime::Text(text) => parse_reference_text(text).unwrap_or_else(|| {
                log::warn!("Bad time string provided ({text:?}), using the current time instead");
                OffsetDateTime::now_utc()
            }),
        }
    }
}

impl From<OffsetDateTime> for ReferenceTime<'static> {
    fn from(time: OffsetDateTime) -> Self {
        ReferenceTime::At(time)
    }
}

impl<'a> From<&'a str> for ReferenceTime<'a> {
    fn from(text: &'a str) -> Self {
        ReferenceTime::Text(text)
    }
}

const LONG_FORMAT: &[BorrowedFormatItem<'_>] = format_description!(
    "[month repr:short case_sensitive:false] [day padding:none] [hour padding:none]:[minute]:[second] [year]"
);
const SHORT_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[month padding:none]/[day padding:none]/[year repr:last_two]");

/// Reads `"Jan 30 07:38:59 2008 GMT"` or `"01/30/08"` as UTC.
fn parse_reference_text(text: &str) -> Option<OffsetDateTime> {
    let text = text.trim();
    if text.contains('/') {
        let mut parsed = Parsed::new();
        let rest = parsed.parse_items(text.as_bytes(), SHORT_FORMAT).ok()?;
        if !rest.is_empty() {
            return None;
        }
        // Two-digit years pivot like strptime's %y.
        let yy = i32::from(parsed.year_last_two()?);
        let year = if yy < 69 { 2000 + yy } else { 1900 + yy };
        let date = Date::from_calendar_date(year, parsed.month()?, parsed.day()?.get()).ok()?;
        Some(date.midnight().assume_utc())
    } else {
        // The zone name is required but not interpreted.
        let (stamp, zone) = text.rsplit_once(char::is_whitespace)?;
        if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        PrimitiveDateTime::parse(stamp.trim_end(), LONG_FORMAT)
            .ok()
            .map(PrimitiveDateTime::assume_utc)
    }
}

#[cfg(test)]
mod tests {
    use time::Month;

    use super::*;

    #[test]
    fn test_long_reference_format() {
        let parsed = parse_reference_text("Jan 30 07:38:59 2008 GMT").unwrap();
        assert_eq!(parsed.year(), 2008);
        assert_eq!(parsed.month(), Month::January);
        assert_eq!(parsed.day(), 30);
        assert_eq!((parsed.hour(), parsed.minute(), parsed.second()), (7, 38, 59));

        let parsed = parse_reference_text("dec 5 23:00:01 2030 UTC").unwrap();
        assert_eq!(parsed.date(), Date::from_calendar_date(2030, Month::December, 5).unwrap());
        assert!(parse_reference_text("Jan 30 07:38:59 2008").is_none());
    }

    #[test]
    fn test_short_reference_format() {
        let parsed = parse_reference_text("01/30/08").unwrap();
        assert_eq!(parsed.date(), Date::from_calendar_date(2008, Month::January, 30).unwrap());
        let parsed = parse_reference_text("12/31/99").unwrap();
        assert_eq!(parsed.year(), 1999);
    }

    #[test]
    fn test_bad_reference_falls_back_to_now() {
        assert!(parse_reference_text("30 Jan 2008").is_none());
        assert!(parse_reference_text("13/45/08").is_none());

        let before = OffsetDateTime::now_utc();
        let resolved = ReferenceTime::Text("not a date").resolve();
        assert!(resolved >= before);
    }

    #[test]
    fn test_name_hash_tracks_text() {
        assert_eq!(NameHash::of("CN=a"), NameHash::of("CN=a"));
        assert_ne!(NameHash::of("CN=a"), NameHash::of("CN=b"));
    }

    #[test]
    fn test_normalize_serial() {
        assert_eq!(normalize_serial(&[0x00, 0x80, 0x01]), vec![0x80, 0x01]);
        assert_eq!(normalize_serial(&[0x01]), vec![0x01]);
        assert_eq!(normalize_serial(&[0x00]), vec![0x00]);
        assert_eq!(normalize_serial(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_x509_time_roundtrip() {
        let when = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let stamp = Timestamp::from_x509(&to_x509_time(when).unwrap()).unwrap();
        assert_eq!(stamp.time, when);
        assert_eq!(stamp.encoded, "231114221320Z");
    }
}
