//! 캐시된 순자산 곡선으로 리포트를 재생성하는 명령.

use rotor_backtest::{read_equity_csv, write_html_report, BacktestStats};
use rotor_core::AppConfig;
use rust_decimal::Decimal;

/// 백테스트나 페이퍼의 순자산 CSV 캐시를 읽어 HTML 리포트를 다시 만듭니다.
///
/// 백테스트를 다시 돌리거나 페이퍼 계좌를 건드리지 않습니다.
pub fn run(config: &AppConfig, source: &str) -> anyhow::Result<()> {
    let (equity_csv, html, title) = match source.to_lowercase().as_str() {
        "backtest" => (
            &config.report.backtest_equity_csv,
            &config.report.backtest_html,
            "주간 ETF 로테이션 백테스트 (캐시된 순자산)",
        ),
        "paper" => (
            &config.report.paper_equity_csv,
            &config.report.paper_html,
            "페이퍼 트레이딩 (캐시된 순자산)",
        ),
        other => anyhow::bail!("--source는 backtest 또는 paper만 지원합니다 (입력: {other})"),
    };

    if !equity_csv.exists() {
        anyhow::bail!(
            "순자산 캐시가 없습니다: {} (먼저 `rotor backtest` 또는 `rotor paper`를 실행하세요)",
            equity_csv.display()
        );
    }

    let curve = read_equity_csv(equity_csv)?;
    if curve.is_empty() {
        anyhow::bail!("순자산 캐시가 비어 있습니다: {}", equity_csv.display());
    }

    let stats = BacktestStats::from_equity_only(&curve);
    write_html_report(html, title, &curve, &stats_rows(&stats))?;

    println!("📁 리포트 재생성: {}", html.display());
    Ok(())
}

/// 순자산 곡선만으로 계산되는 공통 지표 행.
pub fn stats_rows(stats: &BacktestStats) -> Vec<(String, String)> {
    let pct = Decimal::from(100);
    let fmt_pct = |v: Decimal| format!("{:.2}%", v * pct);
    let fmt_opt_pct = |v: Option<Decimal>| v.map_or("-".to_string(), fmt_pct);
    let fmt_opt = |v: Option<Decimal>| v.map_or("-".to_string(), |d| format!("{:.2}", d));

    vec![
        ("거래일".to_string(), stats.trading_days.to_string()),
        (
            "최종 순자산".to_string(),
            format!("{:.0}", stats.final_equity),
        ),
        ("총 수익률".to_string(), fmt_pct(stats.total_return)),
        ("CAGR".to_string(), fmt_opt_pct(stats.cagr)),
        ("최대 낙폭".to_string(), fmt_pct(stats.max_drawdown)),
        ("샤프 비율".to_string(), fmt_opt(stats.sharpe)),
    ]
}

/// 백테스트 리포트용 전체 지표 행 (공통 지표 + 회전율/비용).
pub fn backtest_stats_rows(stats: &BacktestStats) -> Vec<(String, String)> {
    let pct = Decimal::from(100);
    let fmt_pct = |v: Decimal| format!("{:.2}%", v * pct);
    let fmt_opt_pct = |v: Option<Decimal>| v.map_or("-".to_string(), fmt_pct);

    let mut rows = stats_rows(stats);
    rows.push((
        "리밸런스 횟수".to_string(),
        stats.rebalance_count.to_string(),
    ));
    rows.push((
        "주간 평균 편도 회전율".to_string(),
        fmt_opt_pct(stats.avg_weekly_turnover_oneway),
    ));
    rows.push((
        "총 추정 비용".to_string(),
        format!("{:.0}", stats.estimated_total_cost),
    ));
    rows.push((
        "초기 자본 대비 비용".to_string(),
        fmt_pct(stats.estimated_cost_pct_initial),
    ));
    rows
}
