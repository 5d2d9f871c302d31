//! ISO-8601-ish timestamp formatting/parsing with a configurable
//! time-of-day separator, grounded on the original tool's documented
//! rationale: the default `:` is unusable in filenames on some
//! filesystems, so the character joining `HH`, `MM`, `SS` is pulled out as
//! a parameter rather than hard-coded.
//!
//! The UTC offset suffix (`Z`, or `+HH:MM`/`-HH:MM`) always keeps its own
//! literal `:` regardless of `sep`, and is parsed by its fixed width so an
//! operator choosing `sep == '-'` cannot make the offset ambiguous with the
//! time-of-day fields.

use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// Formats `when` as `YYYY-MM-DDTHH<sep>MM<sep>SS` followed by its offset.
#[must_use]
pub fn format_time(when: OffsetDateTime, sep: char) -> String {
    format!(
        "{:04}-{:02}-{:02}T{:02}{sep}{:02}{sep}{:02}{}",
        when.year(),
        when.month() as u8,
        when.day(),
        when.hour(),
        when.minute(),
        when.second(),
        format_offset(when.offset()),
    )
}

fn format_offset(offset: UtcOffset) -> String {
    let total = offset.whole_seconds();
    if total == 0 {
        return "Z".to_string();
    }
    let sign = if total < 0 { '-' } else { '+' };
    let total = total.unsigned_abs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    format!("{sign}{hours:02}:{minutes:02}")
}

/// Parses a timestamp produced by [`format_time`] with the same `sep`.
///
/// Returns `None` rather than an error: an unparsable token just means the
/// filename it came from is not one this grammar recognizes.
#[must_use]
pub fn parse_time(token: &str, sep: char) -> Option<OffsetDateTime> {
    let (date_part, rest) = token.split_once('T')?;

    let mut date_fields = date_part.split('-');
    let year: i32 = date_fields.next()?.parse().ok()?;
    let month: u8 = date_fields.next()?.parse().ok()?;
    let day: u8 = date_fields.next()?.parse().ok()?;
    if date_fields.next().is_some() {
        return None;
    }

    let (offset, time_part) = split_offset(rest)?;

    let mut sep_buf = [0u8; 4];
    let sep_str: &str = sep.encode_utf8(&mut sep_buf);
    let mut time_fields = time_part.split(sep_str);
    let hour: u8 = time_fields.next()?.parse().ok()?;
    let minute: u8 = time_fields.next()?.parse().ok()?;
    let second: u8 = time_fields.next()?.parse().ok()?;
    if time_fields.next().is_some() {
        return None;
    }

    let month = Month::try_from(month).ok()?;
    let date = Date::from_calendar_date(year, month, day).ok()?;
    let time = Time::from_hms(hour, minute, second).ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_offset(offset))
}

/// Splits a trailing `Z` or fixed-width `+HH:MM`/`-HH:MM` offset off the end
/// of `rest`, returning the parsed offset and whatever precedes it.
fn split_offset(rest: &str) -> Option<(UtcOffset, &str)> {
    if let Some(time_part) = rest.strip_suffix('Z') {
        return Some((UtcOffset::UTC, time_part));
    }

    if rest.len() < 6 {
        return None;
    }
    let (time_part, offset_part) = rest.split_at(rest.len() - 6);

    let sign: i8 = match offset_part.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits = &offset_part[1..];
    let (hh, colon_mm) = digits.split_at(2);
    let mm = colon_mm.strip_prefix(':')?;
    let hours: i8 = hh.parse().ok()?;
    let minutes: i8 = mm.parse().ok()?;
    let offset = UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()?;
    Some((offset, time_part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_utc_with_default_separator() {
        let date = Date::from_calendar_date(2002, Month::August, 6).unwrap();
        let time = Time::from_hms(4, 22, 0).unwrap();
        let when = PrimitiveDateTime::new(date, time).assume_offset(UtcOffset::UTC);

        let formatted = format_time(when, ':');
        assert_eq!(formatted, "2002-08-06T04:22:00Z");
        assert_eq!(parse_time(&formatted, ':'), Some(when));
    }

    #[test]
    fn round_trips_negative_offset_with_custom_separator() {
        let date = Date::from_calendar_date(2002, Month::August, 6).unwrap();
        let time = Time::from_hms(4, 22, 0).unwrap();
        let offset = UtcOffset::from_hms(-7, 0, 0).unwrap();
        let when = PrimitiveDateTime::new(date, time).assume_offset(offset);

        let formatted = format_time(when, '_');
        assert_eq!(formatted, "2002-08-06T04_22_00-07:00");
        assert_eq!(parse_time(&formatted, '_'), Some(when));
    }

    #[test]
    fn rejects_malformed_token() {
        assert_eq!(parse_time("not-a-timestamp", ':'), None);
        assert_eq!(parse_time("2002-08-06T04:22:00", ':'), None);
    }
}
