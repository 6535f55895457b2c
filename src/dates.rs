//! Tolerant invoice-date parsing.

use anyhow::Result;
use chrono::{DateTime, NaiveDate};

/// Handles parsing invoice dates from the formats that show up in
/// distributor exports.
pub struct DateParser;

impl DateParser {
    /// Parse a date string into a `NaiveDate`.
    ///
    /// Tries ISO (`2024-01-15`), US slash forms (`01/15/2024`, `01/15/24`),
    /// and full RFC 3339 timestamps, in that order.
    pub fn parse(raw: &str) -> Result<NaiveDate> {
        let trimmed = raw.trim();

        for format in ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"] {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return Ok(date);
            }
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.date_naive());
        }

        anyhow::bail!("Failed to parse invoice date: {}", raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso() {
        let date = DateParser::parse("2024-01-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_us_slash() {
        let date = DateParser::parse("01/15/2024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_two_digit_year() {
        let date = DateParser::parse("1/15/24").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_rfc3339() {
        let date = DateParser::parse("2024-01-15T08:30:00+00:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_whitespace() {
        assert!(DateParser::parse(" 2024-01-15 ").is_ok());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(DateParser::parse("not a date").is_err());
        assert!(DateParser::parse("").is_err());
    }
}
