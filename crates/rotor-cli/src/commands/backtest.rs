//! 백테스트 실행 명령.

use std::collections::HashMap;

use anyhow::Context;
use rotor_backtest::{BacktestConfig, BacktestEngine};
use rotor_core::{AppConfig, PriceSeries};
use rotor_data::CsvBarStore;
use tracing::info;

use super::report::backtest_stats_rows;

/// 저장소에서 유니버스 전체 심볼의 시계열을 로드합니다.
pub fn load_universe_series(config: &AppConfig) -> anyhow::Result<HashMap<String, PriceSeries>> {
    let store = CsvBarStore::new(&config.data.market_dir);
    let mut series = HashMap::new();
    for symbol in config.universe.symbols() {
        let loaded = store.load(&symbol).with_context(|| {
            format!("{symbol} 일봉 로드 실패. 먼저 `rotor update-data`를 실행하세요")
        })?;
        series.insert(symbol, loaded);
    }
    Ok(series)
}

/// 저장된 데이터 전체 기간으로 백테스트를 돌리고 리포트를 만듭니다.
pub fn run(config: &AppConfig, no_report: bool) -> anyhow::Result<()> {
    let series = load_universe_series(config)?;

    let engine = BacktestEngine::new(BacktestConfig::from_app_config(config));
    let outcome = engine.run(&series)?;

    println!("\n{}", outcome.summary());

    if no_report {
        return Ok(());
    }

    rotor_backtest::write_rebalances_csv(
        &config.report.backtest_rebalances_csv,
        &outcome.rebalances,
    )?;
    rotor_backtest::write_equity_csv(&config.report.backtest_equity_csv, &outcome.equity_curve)?;
    rotor_backtest::write_html_report(
        &config.report.backtest_html,
        "주간 ETF 로테이션 백테스트",
        &outcome.equity_curve,
        &backtest_stats_rows(&outcome.stats),
    )?;

    info!(
        rebalances = outcome.rebalances.len(),
        trading_days = outcome.equity_curve.len(),
        "백테스트 리포트 생성 완료"
    );
    println!("📁 리포트 저장:");
    println!("  {}", config.report.backtest_rebalances_csv.display());
    println!("  {}", config.report.backtest_equity_csv.display());
    println!("  {}", config.report.backtest_html.display());

    Ok(())
}
