//! Configured runs from CSV files on disk.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use backtester::model::DataError;
use backtester::{
    load_config_str, run_with_settings, run_with_source, AppConfig, BacktestError,
    CachedDataSource, CsvDataSource, RunError, Session,
};
use rust_decimal_macros::dec;

const CLOSES: [f64; 10] = [10.0, 11.0, 12.0, 11.0, 10.0, 9.0, 10.0, 11.0, 12.0, 13.0];

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("backtester-e2e-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();

    let mut csv = String::from("Date,Open,High,Low,Close,Volume\n");
    for (i, close) in CLOSES.iter().enumerate() {
        csv.push_str(&format!(
            "2024-01-{:02},{c},{c},{c},{c},1000\n",
            i + 1,
            c = close
        ));
    }
    fs::write(dir.join("TEST_1d.csv"), csv).unwrap();
    dir
}

fn settings(dir: &PathBuf, extra_data: &str, strategy: &str) -> AppConfig {
    let toml = format!(
        r#"
[backtest]
initial_cash = 1000

[backtest.commission]
type = "none"

[backtest.slippage]
type = "none"

[backtest.strategy]
{strategy}

[data]
path = '{path}'
symbol = "TEST"
timeframe = "1d"
{extra_data}
"#,
        strategy = strategy,
        path = dir.display(),
        extra_data = extra_data,
    );
    load_config_str(&toml).unwrap()
}

const CROSSOVER: &str = r#"type = "ma_crossover"
fast_period = 3
slow_period = 5"#;

#[test]
fn test_hand_example_from_csv() {
    let dir = scratch_dir("hand");
    let report = run_with_settings(&settings(&dir, "", CROSSOVER)).unwrap();

    assert_eq!(report.symbol, "TEST");
    assert_eq!(report.bars_processed, 10);
    assert_eq!(report.trades.len(), 1);
    assert_eq!(report.trades[0].quantity, dec!(83));
    assert_eq!(report.final_equity(), Some(dec!(1083)));
    assert!((report.metrics.total_return - 0.083).abs() < 1e-10);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_date_range_limits_bars() {
    let dir = scratch_dir("range");
    let range = r#"start = "2024-01-01T00:00:00Z"
end = "2024-01-06T00:00:00Z""#;
    let report = run_with_settings(&settings(&dir, range, CROSSOVER)).unwrap();

    assert_eq!(report.bars_processed, 6);
    assert!(report.trades.is_empty());
    assert_eq!(report.final_equity(), Some(dec!(1000)));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_symbol_is_a_data_error() {
    let dir = scratch_dir("missing");
    let mut config = settings(&dir, "", CROSSOVER);
    config.data.symbol = "NOPE".to_string();

    assert!(matches!(
        run_with_settings(&config),
        Err(RunError::Backtest(BacktestError::Data(DataError::SymbolNotFound(_))))
    ));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_invalid_strategy_fails_before_loading() {
    let dir = scratch_dir("invalid");
    let bad = r#"type = "ma_crossover"
fast_period = 5
slow_period = 3"#;

    assert!(matches!(
        run_with_settings(&settings(&dir, "", bad)),
        Err(RunError::Settings(_))
    ));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_cached_source_serves_repeat_runs() {
    let dir = scratch_dir("cached");
    let config = settings(
        &dir,
        "",
        r#"type = "rsi_threshold"
period = 3"#,
    );
    let source = CachedDataSource::new(CsvDataSource::new(&dir).unwrap(), Duration::from_secs(60));

    let first = run_with_source(&config, &source).unwrap();
    let second = run_with_source(&config, &source).unwrap();
    assert_eq!(first.snapshots, second.snapshots);

    let stats = source.stats().unwrap();
    assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_session_reuses_bars_across_runs() {
    let dir = scratch_dir("session");
    let config = settings(&dir, "", CROSSOVER);
    let session = Session::new(&config.data).unwrap();

    let first = session.run(&config).unwrap();
    let mut rsi = config.clone();
    rsi.backtest.strategy = load_config_str(
        r#"
[backtest.strategy]
type = "rsi_threshold"
period = 3
"#,
    )
    .unwrap()
    .backtest
    .strategy;
    session.run(&rsi).unwrap();
    let again = session.run(&config).unwrap();

    assert_eq!(first.final_equity(), Some(dec!(1083)));
    assert_eq!(first.snapshots, again.snapshots);
    let stats = session.source().stats().unwrap();
    assert_eq!((stats.hits, stats.misses, stats.entries), (2, 1, 1));

    // A fresh file read each call still sees the same bars
    let plain = run_with_settings(&config).unwrap();
    assert_eq!(plain.snapshots, first.snapshots);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_shipped_config_is_valid() {
    let path = std::path::Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml"));
    let config = backtester::load_config(path).unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.backtest, backtester::BacktestConfig {
        strategy: config.backtest.strategy.clone(),
        ..Default::default()
    });
    assert_eq!(config.backtest.strategy.id(), "ma_crossover");
}
