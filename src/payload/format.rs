//! Field formatting rules for the outbound contract.
//!
//! Part A consumers take hyphenated dates, Part B consumers take compact
//! dates; free-text codes and phone numbers are normalized before they leave
//! the system.

use crate::decision::states::CoveragePart;
use chrono::NaiveDate;

/// Format a date for the wire: `YYYY-MM-DD` for Part A, `YYYYMMDD` for Part B
pub fn format_wire_date(date: NaiveDate, part: CoveragePart) -> String {
    match part {
        CoveragePart::A => date.format("%Y-%m-%d").to_string(),
        CoveragePart::B => date.format("%Y%m%d").to_string(),
    }
}

/// Strip the separators diagnosis codes arrive with ('.', '-', '/', spaces)
pub fn strip_code_separators(code: &str) -> String {
    code.chars()
        .filter(|c| !matches!(c, '.' | '-' | '/' | ' '))
        .collect()
}

/// Reduce a phone number to its digits
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}
