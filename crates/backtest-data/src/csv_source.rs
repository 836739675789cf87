//! CSV bar source.

use std::io::Read;
use std::path::{Path, PathBuf};

use backtest_core::traits::{DataRequest, DataSource};
use backtest_core::{Bar, BarSeries, DataError};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{debug, info};

/// One CSV row. Header names follow the common export spellings.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Symbol", alias = "symbol", alias = "Ticker", default)]
    ticker: Option<String>,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close", default)]
    close: Option<f64>,
    /// Only used when there is no raw close column
    #[serde(rename = "Adj Close", alias = "adj_close", alias = "Adj_Close", default)]
    adj_close: Option<f64>,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// Reads OHLCV bars from CSV.
///
/// `path` is either a single file, or a directory holding one file per
/// symbol named `SYMBOL_TIMEFRAME.csv` or `SYMBOL.csv`. Files with a symbol
/// column may mix symbols; only matching rows are kept.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::ParseError(format!(
                "data path does not exist: {}",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File holding the bars for `request`.
    fn resolve(&self, request: &DataRequest) -> Result<PathBuf, DataError> {
        if self.path.is_file() {
            return Ok(self.path.clone());
        }

        let candidates = [
            format!("{}_{}.csv", request.symbol, request.timeframe),
            format!("{}.csv", request.symbol),
        ];
        candidates
            .iter()
            .map(|name| self.path.join(name))
            .find(|p| p.is_file())
            .ok_or_else(|| DataError::SymbolNotFound(request.symbol.clone()))
    }
}

impl DataSource for CsvDataSource {
    fn fetch(&self, request: &DataRequest) -> Result<BarSeries, DataError> {
        let file = self.resolve(request)?;
        debug!(path = %file.display(), symbol = %request.symbol, "Reading CSV bars");

        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&file)
            .map_err(|e| DataError::ParseError(format!("{}: {}", file.display(), e)))?;

        let bars = read_bars(reader, &request.symbol)?;
        let total = bars.len();
        let series = BarSeries::new(request.symbol.clone(), request.timeframe, bars)
            .between(request.start_millis(), request.end_millis());

        if series.is_empty() {
            return if total == 0 {
                Err(DataError::EmptySeries {
                    symbol: request.symbol.clone(),
                })
            } else {
                Err(DataError::NoDataAvailable)
            };
        }

        info!(
            symbol = %request.symbol,
            bars = series.len(),
            skipped = total - series.len(),
            "Loaded bars from CSV"
        );
        Ok(series)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Parse every row for `symbol`, oldest first.
fn read_bars<R: Read>(mut reader: csv::Reader<R>, symbol: &str) -> Result<Vec<Bar>, DataError> {
    let mut bars = Vec::new();

    for (row, result) in reader.deserialize::<CsvRecord>().enumerate() {
        let record = result.map_err(|e| DataError::ParseError(format!("row {}: {}", row + 1, e)))?;
        if let Some(ticker) = &record.ticker {
            if !ticker.eq_ignore_ascii_case(symbol) {
                continue;
            }
        }

        let timestamp = parse_timestamp(&record.date)?;
        let close = record.close.or(record.adj_close).ok_or_else(|| {
            DataError::ParseError(format!("row {}: missing close price", row + 1))
        })?;
        bars.push(Bar::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            close,
            record.volume,
        ));
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

/// Date, datetime or Unix timestamp (seconds or milliseconds) to Unix ms.
pub fn parse_timestamp(value: &str) -> Result<i64, DataError> {
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];
    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

    let value = value.trim();

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc().timestamp_millis());
            }
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp_millis());
    }

    // More than 10 digits means milliseconds
    if let Ok(ts) = value.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!("could not parse date: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backtest_core::Timeframe;
    use chrono::{TimeZone, Utc};
    use std::fs;

    const DAILY: &str = "\
Date,Open,High,Low,Close,Volume
2024-01-03,11,12,10,11.5,1200
2024-01-01,10,11,9,10.5,1000
2024-01-02,10.5,11.5,10,11,1100
";

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("backtest-data-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_timestamp() {
        let jan15 = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap().timestamp_millis();

        assert_eq!(parse_timestamp("2024-01-15").unwrap(), jan15);
        assert_eq!(parse_timestamp("2024/01/15").unwrap(), jan15);
        assert_eq!(parse_timestamp("01/15/2024").unwrap(), jan15);
        assert_eq!(parse_timestamp("2024-01-15 10:30:00").unwrap(), jan15 + 37_800_000);
        assert_eq!(parse_timestamp("2024-01-15T10:30:00Z").unwrap(), jan15 + 37_800_000);
        assert_eq!(parse_timestamp("1705312800000").unwrap(), 1_705_312_800_000);
        assert_eq!(parse_timestamp("1705312800").unwrap(), 1_705_312_800_000);
        assert!(matches!(parse_timestamp("yesterday"), Err(DataError::ParseError(_))));
    }

    #[test]
    fn test_rows_are_sorted() {
        let reader = ReaderBuilder::new().from_reader(DAILY.as_bytes());
        let bars = read_bars(reader, "AAPL").unwrap();

        assert_eq!(bars.len(), 3);
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(bars[0].close, 10.5);
    }

    #[test]
    fn test_adjusted_close_column() {
        let data = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-01-02,10,11,9,10.5,10.4,100
";
        let reader = ReaderBuilder::new().from_reader(data.as_bytes());
        let bars = read_bars(reader, "AAPL").unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 10.5);
        assert_eq!(bars[0].volume, 100.0);

        let adjusted_only = "\
Date,Open,High,Low,Adj Close
2024-01-02,10,11,9,10.4
";
        let reader = ReaderBuilder::new().from_reader(adjusted_only.as_bytes());
        assert_eq!(read_bars(reader, "AAPL").unwrap()[0].close, 10.4);

        let no_close = "Date,Open,High,Low\n2024-01-02,10,11,9\n";
        let reader = ReaderBuilder::new().from_reader(no_close.as_bytes());
        assert!(matches!(read_bars(reader, "AAPL"), Err(DataError::ParseError(_))));
    }

    #[test]
    fn test_symbol_column_filters_rows() {
        let data = "\
timestamp,symbol,open,high,low,close
1704067200,AAPL,10,11,9,10
1704067200,MSFT,20,21,19,20
1704153600,AAPL,10,11,9,10.5
";
        let reader = ReaderBuilder::new().from_reader(data.as_bytes());
        let bars = read_bars(reader, "aapl").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].volume, 0.0);
    }

    #[test]
    fn test_fetch_from_directory_with_range() {
        let dir = scratch_dir("dir");
        fs::write(dir.join("AAPL_1d.csv"), DAILY).unwrap();

        let source = CsvDataSource::new(&dir).unwrap();
        let all = source.fetch(&DataRequest::new("AAPL", Timeframe::Daily)).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.validate().is_ok());

        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        let ranged = source
            .fetch(&DataRequest::new("AAPL", Timeframe::Daily).with_range(start, end))
            .unwrap();
        assert_eq!(ranged.len(), 2);

        let later = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            source.fetch(&DataRequest::new("AAPL", Timeframe::Daily).with_range(later, later)),
            Err(DataError::NoDataAvailable)
        );
        assert!(matches!(
            source.fetch(&DataRequest::new("MSFT", Timeframe::Daily)),
            Err(DataError::SymbolNotFound(_))
        ));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_single_file_and_missing_path() {
        let dir = scratch_dir("file");
        let file = dir.join("bars.csv");
        fs::write(&file, DAILY).unwrap();

        let series = CsvDataSource::new(&file)
            .unwrap()
            .fetch(&DataRequest::new("ANY", Timeframe::Daily))
            .unwrap();
        assert_eq!(series.symbol, "ANY");
        assert_eq!(series.len(), 3);

        assert!(CsvDataSource::new(dir.join("missing.csv")).is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
