//! Price history from a directory of CSV files.
//!
//! Each ticker lives in `<dir>/<TICKER>.csv` with a `date,close` header and
//! ISO dates. Rows may appear in any order. Files are read with the `csv`
//! crate into typed rows.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use portfolio_pulse::market_data::{PriceHistory, PricePoint, PriceSource};
use portfolio_pulse::{Error, Result, normalize_ticker};
use serde::Deserialize;

/// Reads `<TICKER>.csv` files from one directory.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", normalize_ticker(ticker)))
    }
}

fn unavailable(ticker: &str, reason: impl std::fmt::Display) -> Error {
    Error::DataUnavailable {
        ticker: ticker.to_string(),
        reason: reason.to_string(),
    }
}

/// One `date,close` row. Extra columns such as `open` or `volume` are ignored.
#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Close")]
    close: f64,
}

fn read_rows<R: std::io::Read>(ticker: &str, mut reader: csv::Reader<R>) -> Result<PriceHistory> {
    let mut points = Vec::new();
    for result in reader.deserialize() {
        let row: PriceRow = result.map_err(|e| unavailable(ticker, e))?;
        points.push(PricePoint {
            date: row.date,
            close: row.close,
        });
    }
    Ok(PriceHistory::new(points))
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All);
    builder
}

/// Parse `date,close` CSV text. The header row is required.
pub fn parse_csv(ticker: &str, contents: &str) -> Result<PriceHistory> {
    read_rows(ticker, reader_builder().from_reader(contents.as_bytes()))
}

impl PriceSource for CsvPriceSource {
    fn price_history(&self, ticker: &str, lookback_years: u32) -> Result<PriceHistory> {
        let path = self.file_for(ticker);
        let reader = reader_builder()
            .from_path(&path)
            .map_err(|e| unavailable(ticker, format!("{}: {e}", path.display())))?;
        let history = read_rows(ticker, reader)?.trailing(lookback_years);
        log::debug!("loaded {} closes for {ticker}", history.len());
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CSV: &str = "date,close\n2020-01-02,100.0\n2021-01-01,110.0\n2019-01-02,90.0\n";

    #[test]
    fn parse_sorts_rows() {
        let h = parse_csv("VTI", CSV).unwrap();
        assert_eq!(h.len(), 3);
        assert_eq!(h.points()[0].close, 90.0);
        assert_eq!(h.points()[2].close, 110.0);
    }

    #[test]
    fn column_order_and_extra_columns() {
        let h = parse_csv(
            "VTI",
            "Open,Close,Date,Volume\n4.0, 5.0 ,2020-01-01,100\n",
        )
        .unwrap();
        assert_eq!(h.len(), 1);
        assert_eq!(h.points()[0].close, 5.0);
    }

    #[test]
    fn quoted_fields() {
        let h = parse_csv("VTI", "date,close\n\"2020-01-02\",\"101.5\"\n").unwrap();
        assert_eq!(h.points()[0].close, 101.5);
    }

    #[test]
    fn bad_rows_are_unavailable() {
        assert!(matches!(
            parse_csv("VTI", "date,close\n2020-13-40,1.0\n"),
            Err(Error::DataUnavailable { .. })
        ));
        assert!(matches!(
            parse_csv("VTI", "date,close\n2020-01-01,abc\n"),
            Err(Error::DataUnavailable { .. })
        ));
        assert!(parse_csv("VTI", "date,price\n2020-01-01,1.0\n").is_err());
    }

    #[test]
    fn header_only_is_empty() {
        assert!(parse_csv("VTI", "date,close\n").unwrap().is_empty());
    }

    #[test]
    fn reads_ticker_file_with_lookback() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("VTI.csv"),
            "date,close\n2000-01-03,50.0\n2020-01-02,100.0\n2021-01-04,110.0\n",
        )
        .unwrap();
        let source = CsvPriceSource::new(dir.path());

        let h = source.price_history("vti", 5).unwrap();
        assert_eq!(h.len(), 2);
        assert!(matches!(
            source.price_history("BND", 5),
            Err(Error::DataUnavailable { .. })
        ));
    }
}
