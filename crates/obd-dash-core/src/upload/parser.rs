//! Delimited text parser
//!
//! The first non-blank line is the header row and every following line is a
//! comma separated record. Quoting is disabled, so a comma inside quotes
//! splits the value.

use std::collections::BTreeMap;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::CsvError;

/// One data row, keyed by header
///
/// A header with no matching column on this line maps to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    values: BTreeMap<String, Option<String>>,
}

impl CsvRow {
    /// Trimmed value under `header`, if the line had that column
    pub fn get(&self, header: &str) -> Option<&str> {
        self.values.get(header).and_then(|v| v.as_deref())
    }

    /// Raw slot for `header`: `None` if the header is unknown,
    /// `Some(None)` if the line was too short to fill it
    pub fn slot(&self, header: &str) -> Option<&Option<String>> {
        self.values.get(header)
    }

    /// Number of header slots
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(header, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for CsvRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        }
    }
}

/// A parsed file: header row plus data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    /// Trimmed header names, in file order
    pub headers: Vec<String>,
    /// Data rows, in file order
    pub rows: Vec<CsvRow>,
}

impl CsvTable {
    /// Parse raw text
    ///
    /// Never fails: blank lines are dropped, short lines leave trailing
    /// headers unfilled, extra columns are ignored.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
        let joined = lines.join("\n");

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .from_reader(joined.as_bytes());
        let mut records = reader.records().filter_map(Result::ok);

        let headers: Vec<String> = match records.next() {
            Some(record) => record.iter().map(str::to_string).collect(),
            None => return Self::default(),
        };

        let rows = records.map(|record| row_from_record(&headers, &record)).collect();
        Self { headers, rows }
    }

    /// Read and parse a file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CsvError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if there are no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the file had a header row at all
    pub fn has_header(&self) -> bool {
        !self.headers.is_empty()
    }
}

fn row_from_record(headers: &[String], record: &StringRecord) -> CsvRow {
    let mut values = BTreeMap::new();
    for (index, header) in headers.iter().enumerate() {
        // Duplicate headers: the rightmost column wins
        values.insert(header.clone(), record.get(index).map(str::to_string));
    }
    CsvRow { values }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_rows() {
        let table = CsvTable::parse("a, b\n1 ,2\n");
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("a"), Some("1"));
        assert_eq!(table.rows[0].get("b"), Some("2"));
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let table = CsvTable::parse("a,b\r\n\r\n1,2\r\n   \n3,4");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].get("b"), Some("4"));
    }

    #[test]
    fn test_quoted_comma_splits() {
        let table = CsvTable::parse("name,value\n\"a,b\",1");
        assert_eq!(table.rows[0].get("name"), Some("\"a"));
        assert_eq!(table.rows[0].get("value"), Some("b\""));
    }

    #[test]
    fn test_ragged_rows() {
        let table = CsvTable::parse("a,b,c\n1\n1,2,3,4\n");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].get("a"), Some("1"));
        assert_eq!(table.rows[0].slot("b"), Some(&None));
        assert_eq!(table.rows[1].get("c"), Some("3"));
        assert_eq!(table.rows[1].len(), 3);
    }

    #[test]
    fn test_duplicate_header_keeps_rightmost() {
        let table = CsvTable::parse("rpm,rpm\n1,2\n");
        assert_eq!(table.rows[0].get("rpm"), Some("2"));
    }

    #[test]
    fn test_empty_input() {
        let table = CsvTable::parse("\n  \n");
        assert!(!table.has_header());
        assert!(table.is_empty());
    }
}
