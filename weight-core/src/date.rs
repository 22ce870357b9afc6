use chrono::NaiveDate;

use crate::TrackerError;

/// Parse a `DD-MM-YYYY` date into a calendar day.
///
/// Exactly three dash separated groups of ASCII digits are accepted.
/// Days that do not exist on the calendar (`31-02-2024`) are rejected too.
pub fn parse_date(text: &str) -> Result<NaiveDate, TrackerError> {
    let malformed = || TrackerError::MalformedDate(text.to_string());

    let parts: Vec<&str> = text.trim().split('-').collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(malformed());
    };

    let day = numeric_segment(day).ok_or_else(malformed)?;
    let month = numeric_segment(month).ok_or_else(malformed)?;
    let year = numeric_segment(year).ok_or_else(malformed)?;
    let year = i32::try_from(year).map_err(|_| malformed())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(malformed)
}

fn numeric_segment(segment: &str) -> Option<u32> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse::<u32>().ok()
}
