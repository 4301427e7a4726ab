use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

pub fn now_utc() -> u64 {
    OffsetDateTime::now_utc().unix_timestamp().max(0) as u64
}

/// Fractional days elapsed between two unix timestamps. Negative when
/// `later` precedes `earlier`.
pub fn days_between(later: u64, earlier: u64) -> f64 {
    (later as f64 - earlier as f64) / SECONDS_PER_DAY
}

/// Parses an RFC3339 timestamp into unix seconds.
///
/// Historical logs carry 1 to 9 fractional-second digits (5-digit
/// microseconds are common) and sometimes no UTC offset at all; an
/// offset-less timestamp is read as UTC. Sub-second precision is dropped.
pub fn parse_timestamp(value: &str) -> crate::Result<u64> {
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(parsed.unix_timestamp().max(0) as u64);
    }

    let format = format_description!(
        version = 2,
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );

    match PrimitiveDateTime::parse(value, &format) {
        Ok(parsed) => Ok(parsed.assume_utc().unix_timestamp().max(0) as u64),
        Err(_) => crate::invalid!("unparseable timestamp: {value}"),
    }
}

/// Weekday of a unix timestamp in UTC, 0 = Monday through 6 = Sunday.
pub fn weekday_utc(timestamp: u64) -> crate::Result<u8> {
    let date = OffsetDateTime::from_unix_timestamp(timestamp as i64)?;
    Ok(date.weekday().number_days_from_monday())
}

/// Ordinal of the UTC calendar day a timestamp falls on.
pub fn utc_day(timestamp: u64) -> u64 {
    timestamp / SECONDS_PER_DAY as u64
}

pub fn same_utc_day(a: u64, b: u64) -> bool {
    utc_day(a) == utc_day(b)
}
