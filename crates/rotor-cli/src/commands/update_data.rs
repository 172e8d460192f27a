//! 일봉 데이터 업데이트 명령.

use rotor_core::AppConfig;
use rotor_data::{CsvBarStore, MarketDataUpdater, YahooProvider};
use tracing::info;

/// 유니버스(또는 지정 심볼)의 일봉을 증분 업데이트합니다.
pub async fn run(config: &AppConfig, symbol: Option<&str>) -> anyhow::Result<()> {
    let store = CsvBarStore::new(&config.data.market_dir);
    let updater = MarketDataUpdater::new(store, config.data.retry.clone());
    let provider = YahooProvider::new();

    let symbols: Vec<String> = match symbol {
        Some(symbol) => vec![symbol.to_string()],
        None => config.universe.symbols(),
    };

    println!("\n📡 일봉 데이터 업데이트: {}개 심볼", symbols.len());
    println!(
        "기간: {} ~ {}",
        config.data.start_date,
        config
            .data
            .end_date
            .map_or("오늘".to_string(), |d| d.to_string())
    );

    let report = updater
        .update_universe(
            &provider,
            &symbols,
            config.data.start_date,
            config.data.end_date,
        )
        .await;

    for outcome in &report.updated {
        println!(
            "  ✅ {}: +{}행 (총 {}행, 마지막 {})",
            outcome.symbol,
            outcome.fetched_rows,
            outcome.total_rows,
            outcome
                .last_date
                .map_or("-".to_string(), |d| d.to_string())
        );
    }
    for (symbol, reason) in &report.failed {
        println!("  ❌ {}: {}", symbol, reason);
    }

    if report.is_complete() {
        info!(symbols = report.updated.len(), "데이터 업데이트 완료");
        Ok(())
    } else {
        anyhow::bail!("{}개 심볼 업데이트 실패", report.failed.len())
    }
}
