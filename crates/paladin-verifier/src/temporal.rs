//! Date comparison for temporal claims.
//!
//! Unlike numeric checks, a parse failure here is an error returned to the
//! caller: it means the format string does not describe the data.

use chrono::format::{parse, ParseResult, Parsed, StrftimeItems};
use chrono::NaiveDateTime;
use thiserror::Error;

/// Year filled in when the format names no year field.
pub const DEFAULT_YEAR: i64 = 1900;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse `{input}` with format `{format}`: {reason}")]
pub struct DateError {
    pub input: String,
    pub format: String,
    pub reason: String,
}

/// Fields the format did not mention default to 1900-01-01 00:00:00.
fn fill_missing(parsed: &mut Parsed) -> ParseResult<()> {
    if parsed.timestamp().is_some() {
        return Ok(());
    }
    let has_year = parsed.year().is_some()
        || parsed.year_div_100().is_some()
        || parsed.year_mod_100().is_some()
        || parsed.isoyear().is_some();
    if !has_year {
        parsed.set_year(DEFAULT_YEAR)?;
    }
    let has_day_of_year = parsed.ordinal().is_some()
        || parsed.isoweek().is_some()
        || parsed.week_from_sun().is_some()
        || parsed.week_from_mon().is_some();
    if !has_day_of_year {
        if parsed.month().is_none() {
            parsed.set_month(1)?;
        }
        if parsed.day().is_none() {
            parsed.set_day(1)?;
        }
    }
    match (parsed.hour_div_12(), parsed.hour_mod_12()) {
        (None, None) => parsed.set_hour(0)?,
        // `%I` without `%p` reads as AM.
        (None, Some(_)) => parsed.set_ampm(false)?,
        _ => {}
    }
    if parsed.minute().is_none() {
        parsed.set_minute(0)?;
    }
    Ok(())
}

/// Parse with a strftime-style format.
pub fn parse_datetime(input: &str, format: &str) -> Result<NaiveDateTime, DateError> {
    let error = |err: chrono::format::ParseError| DateError {
        input: input.to_string(),
        format: format.to_string(),
        reason: err.to_string(),
    };

    let mut parsed = Parsed::new();
    parse(&mut parsed, input, StrftimeItems::new(format)).map_err(error)?;
    fill_missing(&mut parsed).map_err(error)?;
    parsed.to_naive_datetime_with_offset(0).map_err(error)
}

/// `date >= threshold`, both parsed with `format`.
pub fn date_on_or_after(date: &str, format: &str, threshold: &str) -> Result<bool, DateError> {
    let date = parse_datetime(date, format)?;
    let threshold = parse_datetime(threshold, format)?;
    Ok(date >= threshold)
}
