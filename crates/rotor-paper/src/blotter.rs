//! 주문 블로터와 주간 플랜 CSV 출력
//!
//! 리밸런스 한 번마다 `paper_trades_YYYYMMDD.csv`, 플랜 조회마다
//! `weekly_plan_YYYYMMDD.csv`가 블로터 디렉터리에 생성됩니다.
//! 날짜는 체결일/신호일 기준입니다.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use rotor_core::RiskState;

use crate::error::PaperResult;

// ============================================================
// 행 타입
// ============================================================

/// 블로터 행의 주문 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    Sell,
    /// 밴드 유지 또는 현금 부족으로 체결 없음
    Hold,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
            TradeAction::Hold => write!(f, "HOLD"),
        }
    }
}

/// 리밸런스 블로터 한 행 (심볼 하나)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlotterRow {
    /// 체결일
    pub trade_date: NaiveDate,
    /// 신호 산출 기준일 (직전 거래일)
    pub signal_date: NaiveDate,
    /// 심볼
    pub symbol: String,
    /// 주문 방향
    pub action: TradeAction,
    /// 리밸런스 직전 보유 비중
    pub current_weight: Decimal,
    /// 노트레이드 밴드 적용 후 목표 비중
    pub target_weight: Decimal,
    /// 체결 후 보유 주수
    pub target_shares: i64,
    /// 체결 주수 증감 (매도는 음수)
    pub delta_shares: i64,
    /// 체결 기준가 (체결일 종가)
    pub reference_price: Decimal,
    /// 이 심볼에 부과된 추정 비용
    pub estimated_cost: Decimal,
    /// 리밸런스 시점의 리스크 상태
    pub state: RiskState,
}

/// 주간 플랜 한 행 (목표 비중이 있는 심볼 하나)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRow {
    /// 신호 산출 기준일 (가격 데이터의 마지막 거래일)
    pub signal_date: NaiveDate,
    /// 예정 체결일. 다음 거래일은 캘린더 없이 알 수 없으므로 비워 둡니다.
    pub planned_trade_date: Option<NaiveDate>,
    /// 심볼
    pub symbol: String,
    /// 목표 비중
    pub target_weight: Decimal,
    /// 신호일 종가
    pub reference_price: Decimal,
    /// 플랜 시점의 리스크 상태
    pub state: RiskState,
    /// 이번 주 승자 주식 ETF
    pub winner_equity: String,
    /// 신호일 기준 고점 대비 낙폭
    pub drawdown: Decimal,
    /// 신호일 기준 계좌 평가액
    pub equity_estimated: Decimal,
}

// ============================================================
// 파일 출력
// ============================================================

/// 블로터 파일 이름 (`paper_trades_YYYYMMDD.csv`)
pub fn blotter_file_name(trade_date: NaiveDate) -> String {
    format!("paper_trades_{}.csv", trade_date.format("%Y%m%d"))
}

/// 플랜 파일 이름 (`weekly_plan_YYYYMMDD.csv`)
pub fn plan_file_name(signal_date: NaiveDate) -> String {
    format!("weekly_plan_{}.csv", signal_date.format("%Y%m%d"))
}

/// 리밸런스 블로터를 CSV로 저장하고 경로를 반환합니다.
pub fn write_blotter_csv(
    dir: &Path,
    trade_date: NaiveDate,
    rows: &[BlotterRow],
) -> PaperResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(blotter_file_name(trade_date));

    let mut writer = csv::Writer::from_path(&path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "블로터 CSV 저장 완료");
    Ok(path)
}

/// 주간 플랜을 CSV로 저장하고 경로를 반환합니다.
pub fn write_plan_csv(
    dir: &Path,
    signal_date: NaiveDate,
    rows: &[PlanRow],
) -> PaperResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(plan_file_name(signal_date));

    let mut writer = csv::Writer::from_path(&path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "주간 플랜 CSV 저장 완료");
    Ok(path)
}

// ============================================================
// 테스트
// ============================================================
