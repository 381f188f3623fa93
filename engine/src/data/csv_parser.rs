use csv::ReaderBuilder;
use std::fs;
use std::path::Path;

use crate::error::EngineError;

// Module for Japanese spreadsheet value handling: full-width numerals,
// currency punctuation, and the date spellings seen in uploaded files.
pub mod japanese_format {
    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use unicode_normalization::UnicodeNormalization;

    /// Full-width to half-width compatibility normalization (NFKC).
    /// "１，０００" becomes "1,000", "（税込）" becomes "(税込)".
    pub fn nfkc(s: &str) -> String {
        s.nfkc().collect()
    }

    // Parses amounts like "１，０００", "¥1,234.56" or "1000" into f64.
    // Everything except digits and the decimal point is stripped after
    // normalization, so the result is non-negative by construction.
    pub fn parse_amount(s: &str) -> Result<f64> {
        let normalized = nfkc(s);
        let cleaned: String = normalized
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if cleaned.is_empty() {
            return Err(anyhow!("No digits in amount '{}'", s.trim()));
        }
        cleaned
            .parse::<f64>()
            .map_err(|e| anyhow!("Failed to parse amount '{}': {}", s.trim(), e))
    }

    /// Tries each accepted format in order against the NFKC-normalized,
    /// trimmed cell text. Unparseable cells are the caller's problem —
    /// the reshaper drops the observation rather than zero-dating it.
    pub fn parse_date(s: &str, formats: &[String]) -> Result<NaiveDate> {
        let normalized = nfkc(s);
        let trimmed = normalized.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("Empty date cell"));
        }
        for format in formats {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return Ok(date);
            }
        }
        Err(anyhow!("Unrecognized date '{}'", trimmed))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn formats() -> Vec<String> {
            vec![
                "%Y-%m-%d".to_string(),
                "%Y/%m/%d".to_string(),
                "%Y年%m月%d日".to_string(),
            ]
        }

        #[test]
        fn test_parse_amount_full_width() {
            assert_eq!(parse_amount("１，０００").unwrap(), 1000.0);
        }

        #[test]
        fn test_parse_amount_currency_punctuation() {
            assert_eq!(parse_amount("¥1,234.56").unwrap(), 1234.56);
            assert_eq!(parse_amount("1,000,000円").unwrap(), 1000000.0);
        }

        #[test]
        fn test_parse_amount_plain() {
            assert_eq!(parse_amount("1000").unwrap(), 1000.0);
            assert_eq!(parse_amount(" 23.5 ").unwrap(), 23.5);
        }

        #[test]
        fn test_parse_amount_idempotent_on_clean_text() {
            let once = parse_amount("1000").unwrap();
            let twice = parse_amount(&once.to_string()).unwrap();
            assert_eq!(once, twice);
        }

        #[test]
        fn test_parse_amount_rejects_empty_and_garbage() {
            assert!(parse_amount("").is_err());
            assert!(parse_amount("未定").is_err());
            assert!(parse_amount("---").is_err());
        }

        #[test]
        fn test_parse_date_iso() {
            let date = parse_date("2024-04-01", &formats()).unwrap();
            assert_eq!(date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        }

        #[test]
        fn test_parse_date_slash_and_kanji() {
            let expected = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
            assert_eq!(parse_date("2024/07/01", &formats()).unwrap(), expected);
            assert_eq!(parse_date("2024年7月1日", &formats()).unwrap(), expected);
        }

        #[test]
        fn test_parse_date_full_width_digits() {
            let date = parse_date("２０２４－０４－０１", &formats()).unwrap();
            assert_eq!(date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        }

        #[test]
        fn test_parse_date_fails_closed() {
            assert!(parse_date("", &formats()).is_err());
            assert!(parse_date("not a date", &formats()).is_err());
            assert!(parse_date("2024-13-01", &formats()).is_err());
        }
    }
}

/// An uploaded table as raw text: one header row plus string cells.
/// Discarded as soon as normalization has produced canonical records.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub struct TableReader;

impl TableReader {
    /// Reads a comma-delimited table from raw upload bytes. Ragged rows
    /// are tolerated; missing trailing cells read as empty strings later.
    pub fn read_bytes(bytes: &[u8]) -> Result<RawTable, EngineError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(RawTable { headers, rows })
    }

    pub fn read_file(path: &Path) -> Result<RawTable, EngineError> {
        let bytes = fs::read(path)?;
        Self::read_bytes(&bytes)
    }
}
