//! 페이퍼 트레이딩 체결 명령.

use rotor_backtest::{write_equity_csv, write_html_report, BacktestStats};
use rotor_core::AppConfig;
use rotor_paper::{
    write_blotter_csv, AccountRepository, JsonFileRepository, PaperAccount, PaperEngine,
    PaperEngineConfig, PaperError, PaperRunOutcome,
};
use rust_decimal::Decimal;
use tracing::info;

use super::backtest::load_universe_series;
use super::report::stats_rows;

/// 보류 중인 리밸런스를 체결합니다. `catch_up`이면 밀린 주를 전부 처리합니다.
pub async fn run(config: &AppConfig, catch_up: bool) -> anyhow::Result<()> {
    let series = load_universe_series(config)?;
    let repo = JsonFileRepository::new(&config.paper.account_path);
    let engine_config = PaperEngineConfig::from_app_config(config);
    let engine = PaperEngine::new(engine_config.clone());

    let mut account = match repo.load().await? {
        Some(account) => account,
        None => {
            println!(
                "🆕 신규 페이퍼 계좌 생성 (초기 자본 {})",
                engine_config.initial_capital
            );
            PaperAccount::new(engine_config.initial_capital)
        }
    };

    let mut processed = 0usize;
    loop {
        match engine.run_once(&mut account, &series) {
            Ok(outcome) => {
                processed += 1;
                print_outcome(&outcome);
                let path = write_blotter_csv(
                    &config.paper.blotter_dir,
                    outcome.trade_date,
                    &outcome.blotter,
                )?;
                println!("📁 블로터 저장: {}", path.display());
                // 리밸런스마다 저장해 중간 실패에도 진행분을 보존한다
                repo.save(&account).await?;
                if !catch_up {
                    break;
                }
            }
            Err(PaperError::UpToDate(as_of)) => {
                if processed == 0 {
                    println!("✅ 계좌가 이미 최신 상태입니다 (기준일 {as_of})");
                }
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if processed > 0 {
        // 순자산 캐시와 리포트는 리밸런스가 실제로 있었을 때만 갱신한다
        let stats = BacktestStats::from_equity_only(&account.history);
        write_equity_csv(&config.report.paper_equity_csv, &account.history)?;
        write_html_report(
            &config.report.paper_html,
            "페이퍼 트레이딩",
            &account.history,
            &stats_rows(&stats),
        )?;
        println!("📁 순자산 캐시: {}", config.report.paper_equity_csv.display());
        println!("📁 HTML 리포트: {}", config.report.paper_html.display());
        info!(
            rebalances = processed,
            points = account.history.len(),
            "페이퍼 리밸런스 처리 완료"
        );
    }
    Ok(())
}

fn print_outcome(outcome: &PaperRunOutcome) {
    let pct = Decimal::from(100);
    println!(
        "\n📋 리밸런스 체결: {} (신호일 {})",
        outcome.trade_date, outcome.signal_date
    );
    println!(
        "상태: {} | 승자: {} | 낙폭: {:.2}%",
        outcome.state,
        outcome.winner,
        outcome.drawdown * pct
    );
    for row in &outcome.blotter {
        println!(
            "  {:<4} {:<12} 목표 {:>6.2}% → {}주 (Δ{}주, 비용 {:.0})",
            row.action.to_string(),
            row.symbol,
            row.target_weight * pct,
            row.target_shares,
            row.delta_shares,
            row.estimated_cost
        );
    }
    println!("체결 후 평가액: {:.0}", outcome.post_value);
}
