//! Analysis date range inputs.

use chrono::{Duration, NaiveDate, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Text inputs for the analysis period, parsed on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRangeState {
    pub start_input: String,
    pub end_input: String,
}

impl Default for DateRangeState {
    fn default() -> Self {
        let end = Utc::now().date_naive();
        Self::new(end - Duration::days(90), end)
    }
}

impl DateRangeState {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_input: start.format(DATE_FORMAT).to_string(),
            end_input: end.format(DATE_FORMAT).to_string(),
        }
    }

    /// Parsed `(start, end)`, or a message for the first bad input.
    ///
    /// Ordering is checked when the analysis starts.
    pub fn parse(&self) -> Result<(NaiveDate, NaiveDate), String> {
        let start = parse_date("Start date", &self.start_input)?;
        let end = parse_date("End date", &self.end_input)?;
        Ok((start, end))
    }
}

fn parse_date(label: &str, input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|e| format!("{} '{}' is not YYYY-MM-DD: {}", label, input.trim(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_range() {
        let range = DateRangeState {
            start_input: "2024-01-01".into(),
            end_input: " 2024-03-31 ".into(),
        };
        let (start, end) = range.parse().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let range = DateRangeState {
            start_input: "01/01/2024".into(),
            end_input: "2024-03-31".into(),
        };
        assert!(range.parse().unwrap_err().starts_with("Start date"));
    }

    #[test]
    fn test_default_spans_ninety_days() {
        let (start, end) = DateRangeState::default().parse().unwrap();
        assert_eq!((end - start).num_days(), 90);
    }
}
