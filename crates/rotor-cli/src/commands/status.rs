//! 데이터 저장소와 페이퍼 계좌 현황 명령.

use rotor_core::AppConfig;
use rotor_data::CsvBarStore;
use rotor_paper::{AccountRepository, JsonFileRepository};

/// 캐시된 심볼별 일봉 현황과 계좌 상태를 출력합니다.
pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let store = CsvBarStore::new(&config.data.market_dir);
    let statuses = store.status()?;

    println!("\n📦 데이터 저장소: {}", store.root().display());
    if statuses.is_empty() {
        println!("  (캐시된 심볼 없음. `rotor update-data`를 먼저 실행하세요)");
    } else {
        for status in &statuses {
            println!(
                "  {:<12} {:>6}행  {} ~ {}",
                status.symbol,
                status.rows,
                status
                    .first_date
                    .map_or("-".to_string(), |d| d.to_string()),
                status
                    .last_date
                    .map_or("-".to_string(), |d| d.to_string()),
            );
        }
    }

    let repo = JsonFileRepository::new(&config.paper.account_path);
    match repo.load().await? {
        Some(account) => {
            println!("\n💼 페이퍼 계좌: {}", config.paper.account_path.display());
            println!(
                "  기준일: {}",
                account
                    .as_of
                    .map_or("없음 (신규)".to_string(), |d| d.to_string())
            );
            println!("  현금: {:.0}", account.cash);
            let mut positions: Vec<_> = account.positions.iter().collect();
            positions.sort();
            for (symbol, shares) in positions {
                println!("  {:<12} {}주", symbol, shares);
            }
            println!(
                "  게이트: {} (쿨다운 {}회 남음)",
                account.gate.state, account.gate.cooldown_left
            );
            println!("  체결 이력: {}건", account.trades.len());
        }
        None => {
            println!(
                "\n💼 페이퍼 계좌: 아직 없음 ({})",
                config.paper.account_path.display()
            );
        }
    }

    Ok(())
}
