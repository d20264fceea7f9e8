use serde::Serialize;
use std::fmt;

use crate::error::TemporalFormatError;
use crate::process::utils::clean_str;
use crate::schema::FieldValue;

/// How a sheet encodes its date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateEncoding {
    /// `YYYY.MM`, where the fractional digits are a month code padded on the right.
    Fractional,
    /// A bare calendar year; month is always January.
    PlainYear,
}

impl DateEncoding {
    fn label(self) -> &'static str {
        match self {
            DateEncoding::Fractional => "fractional-year",
            DateEncoding::PlainYear => "plain-year",
        }
    }
}

impl fmt::Display for DateEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// First day of the month a record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemporalKey {
    pub year: i32,
    pub month: u32,
    pub date_string: String,
}

impl TemporalKey {
    fn new(year: i32, month: u32, raw: &str) -> Result<Self, TemporalFormatError> {
        if !(1..=12).contains(&month) {
            return Err(TemporalFormatError::MonthOutOfRange {
                raw: raw.to_string(),
                month,
            });
        }
        Ok(Self {
            year,
            month,
            date_string: format!("{:04}-{:02}-01", year, month),
        })
    }
}

/// Decode a raw date cell according to the declared `encoding`.
pub fn resolve(
    raw_date: &FieldValue,
    encoding: DateEncoding,
) -> Result<TemporalKey, TemporalFormatError> {
    // Display on f64 is the shortest form that round-trips, so 1871.1
    // renders as "1871.1" and the month code stays recoverable. A float
    // cell always carries a fractional part: a whole 1950.0 reads as
    // "1950.0", month code "00", and is rejected.
    let raw = match raw_date {
        FieldValue::Null => return Err(TemporalFormatError::Absent),
        FieldValue::Number(n) if !n.is_finite() => return Err(TemporalFormatError::Absent),
        FieldValue::Number(n) => {
            let s = n.to_string();
            if encoding == DateEncoding::Fractional && !s.contains('.') {
                format!("{}.0", s)
            } else {
                s
            }
        }
        FieldValue::Text(s) => clean_str(s),
    };
    if raw.is_empty() {
        return Err(TemporalFormatError::Absent);
    }

    match encoding {
        DateEncoding::Fractional => resolve_fractional(&raw),
        DateEncoding::PlainYear => resolve_plain_year(&raw),
    }
}

fn unparsable(raw: &str, encoding: DateEncoding) -> TemporalFormatError {
    TemporalFormatError::Unparsable {
        raw: raw.to_string(),
        encoding: encoding.label(),
    }
}

fn parse_year(digits: &str) -> Option<i32> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn resolve_fractional(raw: &str) -> Result<TemporalKey, TemporalFormatError> {
    let (year_part, month_part) = match raw.split_once('.') {
        Some((y, m)) => (y, m),
        None => (raw, "01"),
    };
    let year = parse_year(year_part).ok_or_else(|| unparsable(raw, DateEncoding::Fractional))?;
    if month_part.is_empty() || !month_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(unparsable(raw, DateEncoding::Fractional));
    }

    // "1" means October, not January
    let code = format!("{:0<2}", month_part);
    let month: u32 = code
        .parse()
        .map_err(|_| TemporalFormatError::MonthOutOfRange {
            raw: raw.to_string(),
            month: u32::MAX,
        })?;
    TemporalKey::new(year, month, raw)
}

fn resolve_plain_year(raw: &str) -> Result<TemporalKey, TemporalFormatError> {
    let year_part = match raw.split_once('.') {
        Some((y, frac)) if frac.chars().all(|c| c == '0') => y,
        Some(_) => return Err(unparsable(raw, DateEncoding::PlainYear)),
        None => raw,
    };
    let year = parse_year(year_part).ok_or_else(|| unparsable(raw, DateEncoding::PlainYear))?;
    TemporalKey::new(year, 1, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frac(n: f64) -> Result<TemporalKey, TemporalFormatError> {
        resolve(&FieldValue::Number(n), DateEncoding::Fractional)
    }

    fn key(year: i32, month: u32, date: &str) -> TemporalKey {
        TemporalKey {
            year,
            month,
            date_string: date.to_string(),
        }
    }

    #[test]
    fn fractional_month_codes() {
        assert_eq!(frac(1871.01), Ok(key(1871, 1, "1871-01-01")));
        assert_eq!(frac(1871.1), Ok(key(1871, 10, "1871-10-01")));
        assert_eq!(frac(1871.11), Ok(key(1871, 11, "1871-11-01")));
        assert_eq!(frac(2023.12), Ok(key(2023, 12, "2023-12-01")));
        assert_eq!(frac(1900.09), Ok(key(1900, 9, "1900-09-01")));
    }

    #[test]
    fn fractional_rejects_bad_months() {
        assert!(matches!(
            frac(2023.13),
            Err(TemporalFormatError::MonthOutOfRange { month: 13, .. })
        ));
        // "1871.0" pads to "00"
        assert!(matches!(
            resolve(&FieldValue::Text("1871.0".into()), DateEncoding::Fractional),
            Err(TemporalFormatError::MonthOutOfRange { month: 0, .. })
        ));
        assert!(matches!(
            frac(2023.123),
            Err(TemporalFormatError::MonthOutOfRange { month: 123, .. })
        ));
    }

    #[test]
    fn fractional_whole_number_is_month_zero() {
        let err = TemporalFormatError::MonthOutOfRange {
            raw: "1950.0".into(),
            month: 0,
        };
        assert_eq!(frac(1950.0), Err(err.clone()));
        // the same cell stored as text decodes the same way
        assert_eq!(
            resolve(&FieldValue::Text("1950.0".into()), DateEncoding::Fractional),
            Err(err)
        );
    }

    #[test]
    fn fractional_text_without_dot_is_january() {
        let k = resolve(&FieldValue::Text("1950".into()), DateEncoding::Fractional);
        assert_eq!(k, Ok(key(1950, 1, "1950-01-01")));
    }

    #[test]
    fn fractional_text_keeps_written_digits() {
        let k = resolve(&FieldValue::Text(" 1999.10 ".into()), DateEncoding::Fractional);
        assert_eq!(k, Ok(key(1999, 10, "1999-10-01")));
    }

    #[test]
    fn plain_year() {
        let k = resolve(&FieldValue::Number(1890.0), DateEncoding::PlainYear);
        assert_eq!(k, Ok(key(1890, 1, "1890-01-01")));
        let k = resolve(&FieldValue::Text("2015".into()), DateEncoding::PlainYear);
        assert_eq!(k, Ok(key(2015, 1, "2015-01-01")));
        assert!(matches!(
            resolve(&FieldValue::Number(1890.5), DateEncoding::PlainYear),
            Err(TemporalFormatError::Unparsable { .. })
        ));
    }

    #[test]
    fn absent_and_garbage() {
        for enc in [DateEncoding::Fractional, DateEncoding::PlainYear] {
            assert_eq!(resolve(&FieldValue::Null, enc), Err(TemporalFormatError::Absent));
            assert_eq!(
                resolve(&FieldValue::Text("  ".into()), enc),
                Err(TemporalFormatError::Absent)
            );
            assert!(matches!(
                resolve(&FieldValue::Text("Jan 1871".into()), enc),
                Err(TemporalFormatError::Unparsable { .. })
            ));
            assert!(matches!(
                resolve(&FieldValue::Number(-5.0), enc),
                Err(TemporalFormatError::Unparsable { .. })
            ));
        }
    }
}
