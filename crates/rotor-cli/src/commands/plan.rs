//! 주간 플랜 생성 명령.

use rotor_core::AppConfig;
use rotor_paper::{
    write_plan_csv, AccountRepository, JsonFileRepository, PaperAccount, PaperEngine,
    PaperEngineConfig,
};
use rust_decimal::Decimal;

use super::backtest::load_universe_series;

/// 최신 데이터 기준 다음 주 주문 계획을 출력하고 CSV로 저장합니다.
pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let series = load_universe_series(config)?;
    let repo = JsonFileRepository::new(&config.paper.account_path);
    let engine_config = PaperEngineConfig::from_app_config(config);
    let engine = PaperEngine::new(engine_config.clone());

    // 계좌가 없으면 초기 자본 기준 플랜을 만든다
    let account = repo
        .load()
        .await?
        .unwrap_or_else(|| PaperAccount::new(engine_config.initial_capital));

    let plan = engine.plan_weekly(&account, &series)?;

    let pct = Decimal::from(100);
    println!("\n🗓  주간 플랜 (신호일 {})", plan.signal_date);
    println!(
        "상태: {} | 승자: {} | 낙폭: {:.2}% | 평가액: {:.0}",
        plan.state,
        plan.winner_equity,
        plan.drawdown * pct,
        plan.equity_estimated
    );
    for row in &plan.rows {
        println!(
            "  {:<12} 목표 {:>6.2}% (기준가 {})",
            row.symbol,
            row.target_weight * pct,
            row.reference_price
        );
    }

    let path = write_plan_csv(&config.paper.blotter_dir, plan.signal_date, &plan.rows)?;
    println!("📁 플랜 저장: {}", path.display());

    Ok(())
}
