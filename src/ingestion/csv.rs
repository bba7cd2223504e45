//! Delimited-text record parser.

use std::io::Read;

use crate::error::EngineResult;
use crate::types::Record;

/// CSV dialect options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter (default `,`).
    pub delimiter: u8,
    /// Quote character (default `"`).
    pub quote: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

/// Lazy reader producing one [`Record`] per data line.
///
/// Rules:
///
/// - The first line holds the field names, in order. Duplicate names are not deduplicated;
///   they collapse to a single field holding the last value.
/// - A line with fewer fields than the header yields null for the missing trailing fields.
///   Fields beyond the header are ignored.
/// - Empty fields stay empty strings; blank lines are skipped; a UTF-8 BOM is stripped.
pub struct RecordReader<R> {
    rdr: csv::Reader<R>,
    headers: Vec<String>,
}

impl<R: Read> RecordReader<R> {
    /// Wrap `reader` and read the header line.
    pub fn new(reader: R, options: &CsvOptions) -> EngineResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(options.delimiter)
            .quote(options.quote)
            .from_reader(reader);
        let headers = rdr.headers()?.iter().map(str::to_owned).collect();
        Ok(Self { rdr, headers })
    }

    /// Header field names as read (duplicates included).
    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = EngineResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut raw = csv::StringRecord::new();
        match self.rdr.read_record(&mut raw) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => return Some(Err(e.into())),
        }

        let mut record = Record::with_capacity(self.headers.len());
        for (idx, name) in self.headers.iter().enumerate() {
            record.insert(name, raw.get(idx).map(str::to_owned));
        }
        Some(Ok(record))
    }
}

/// Parse a whole buffer into records.
///
/// Any decoding error fails the entire call; no partial result is returned. A header with no
/// data lines (or an empty buffer) yields an empty vector.
pub fn read_records(bytes: &[u8], options: &CsvOptions) -> EngineResult<Vec<Record>> {
    RecordReader::new(bytes, options)?.collect()
}

#[cfg(test)]
mod tests {
    use super::{read_records, CsvOptions, RecordReader};
    use crate::error::ErrorKind;

    #[test]
    fn every_record_carries_every_header_field() {
        let input = b"id,name,score\n1,Ada,98.5\n2,Grace\n3\n";
        let records = read_records(input, &CsvOptions::default()).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.len() == 3));
        assert_eq!(records[1].get("score"), Some(None));
        assert_eq!(records[2].get("name"), Some(None));
        assert_eq!(records[0].get("score"), Some(Some("98.5")));
    }

    #[test]
    fn empty_fields_stay_empty_strings() {
        let records = read_records(b"a,b\n,x\n", &CsvOptions::default()).unwrap();
        assert_eq!(records[0].get("a"), Some(Some("")));
    }

    #[test]
    fn header_only_and_empty_input_yield_no_records() {
        assert!(read_records(b"id,amount\n", &CsvOptions::default()).unwrap().is_empty());
        assert!(read_records(b"", &CsvOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn duplicate_header_names_last_value_wins() {
        let records = read_records(b"a,b,a\n1,2,3\n", &CsvOptions::default()).unwrap();
        assert_eq!(records[0].field_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(records[0].get("a"), Some(Some("3")));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let records = read_records(b"a,b\n1,2,3,4\n", &CsvOptions::default()).unwrap();
        assert_eq!(records[0].len(), 2);
        assert_eq!(records[0].get("b"), Some(Some("2")));
    }

    #[test]
    fn quoted_fields_and_custom_delimiter() {
        let opts = CsvOptions {
            delimiter: b';',
            ..Default::default()
        };
        let records = read_records(b"name;note\n\"Doe; J\";\"said \"\"hi\"\"\"\n", &opts).unwrap();
        assert_eq!(records[0].get("name"), Some(Some("Doe; J")));
        assert_eq!(records[0].get("note"), Some(Some("said \"hi\"")));
    }

    #[test]
    fn bom_is_stripped_from_first_header() {
        let records = read_records(b"\xEF\xBB\xBFid,v\n1,2\n", &CsvOptions::default()).unwrap();
        assert_eq!(records[0].get("id"), Some(Some("1")));
    }

    #[test]
    fn invalid_utf8_fails_the_whole_sequence() {
        let err = read_records(b"a,b\n1,2\n3,\xff\n", &CsvOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("csv error"));
    }

    #[test]
    fn reader_is_lazy_and_exposes_headers() {
        let mut rdr = RecordReader::new(&b"x,y\n1,2\n3,4\n"[..], &CsvOptions::default()).unwrap();
        assert_eq!(rdr.headers(), &["x".to_string(), "y".to_string()]);
        assert_eq!(rdr.next().unwrap().unwrap().get("x"), Some(Some("1")));
        assert_eq!(rdr.next().unwrap().unwrap().get("y"), Some(Some("4")));
        assert!(rdr.next().is_none());
    }
}
