//! Event date normalization
//!
//! Data entry produces dates in several shapes. ArchivesSpace wants
//! `YYYY-MM-DD`.

use chrono::NaiveDate;

/// Expected format reported back to the user
pub const DATE_FORMAT_HINT: &str = "YYYY-MM-DD";

/// Normalize a begin date to `YYYY-MM-DD`
///
/// Accepted shapes:
/// - `YYYY-MM-DD`
/// - `M/D/YYYY` and `M/D/YY`
/// - `YYYY/M/D`
/// - `M-D-YY`
pub fn normalize_date(value: &str) -> Result<String, String> {
    let value = value.trim();
    let format = date_format(value).ok_or_else(|| invalid(value))?;
    NaiveDate::parse_from_str(value, format)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| invalid(value))
}

fn date_format(value: &str) -> Option<&'static str> {
    if value.contains('/') {
        let parts: Vec<&str> = value.split('/').collect();
        if parts.len() != 3 {
            return None;
        }
        match (parts[0].len(), parts[2].len()) {
            (4, _) => Some("%Y/%m/%d"),
            (_, 4) => Some("%m/%d/%Y"),
            (_, 2) => Some("%m/%d/%y"),
            _ => None,
        }
    } else if value.contains('-') {
        let parts: Vec<&str> = value.split('-').collect();
        if parts.len() != 3 {
            return None;
        }
        match (parts[0].len(), parts[2].len()) {
            (4, _) => Some("%Y-%m-%d"),
            (_, 2) => Some("%m-%d-%y"),
            _ => None,
        }
    } else {
        None
    }
}

fn invalid(value: &str) -> String {
    format!(
        "invalid date '{}', expected {}",
        value, DATE_FORMAT_HINT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_dates_pass_through() {
        assert_eq!(normalize_date("2024-03-07").unwrap(), "2024-03-07");
        assert_eq!(normalize_date(" 2024-3-7 ").unwrap(), "2024-03-07");
    }

    #[test]
    fn test_us_slash_dates() {
        assert_eq!(normalize_date("3/7/2024").unwrap(), "2024-03-07");
        assert_eq!(normalize_date("03/07/24").unwrap(), "2024-03-07");
    }

    #[test]
    fn test_year_first_slash_dates() {
        assert_eq!(normalize_date("2024/03/07").unwrap(), "2024-03-07");
    }

    #[test]
    fn test_short_dash_dates() {
        assert_eq!(normalize_date("3-7-24").unwrap(), "2024-03-07");
    }

    #[test]
    fn test_rejected_dates() {
        for bad in ["", "March 7", "2024", "13/45/2024", "3/7/202", "2024-02-30", "1/2/3/4"] {
            let err = normalize_date(bad).unwrap_err();
            assert!(err.contains("expected YYYY-MM-DD"), "{bad}: {err}");
        }
    }
}
