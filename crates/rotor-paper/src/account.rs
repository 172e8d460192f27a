//! 페이퍼 트레이딩 계좌 모델
//!
//! 계좌는 JSON 파일 하나로 직렬화되는 순수 상태입니다. 현금, 정수 주수 포지션,
//! 순자산 이력, 리스크 게이트 스냅샷을 담고 있으며 실행 엔진이 리밸런스마다
//! 갱신합니다.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rotor_core::{EquityPoint, PriceSeries};
use rotor_signal::GateSnapshot;

// ============================================================
// 체결 기록
// ============================================================

/// 매매 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// 체결 한 건의 기록
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    /// 체결 ID
    pub id: Uuid,
    /// 체결일
    pub trade_date: NaiveDate,
    /// 심볼
    pub symbol: String,
    /// 매매 방향
    pub side: TradeSide,
    /// 체결 주수 (항상 양수)
    pub shares: i64,
    /// 체결 기준가 (종가)
    pub price: Decimal,
    /// 추정 비용 (수수료 + 세금 + 슬리피지)
    pub cost: Decimal,
}

// ============================================================
// 계좌
// ============================================================

/// 페이퍼 트레이딩 계좌 상태
///
/// `as_of`가 `None`이면 아직 한 번도 리밸런스하지 않은 신규 계좌이며,
/// 이 경우 실행 엔진은 가격 데이터의 첫 리밸런스 날짜부터 시작합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperAccount {
    /// 마지막으로 처리한 거래일
    pub as_of: Option<NaiveDate>,
    /// 현금 잔고
    pub cash: Decimal,
    /// 심볼별 보유 주수 (정수)
    #[serde(default)]
    pub positions: HashMap<String, i64>,
    /// 지금까지 기록된 순자산 최고점
    #[serde(default)]
    pub equity_peak: Decimal,
    /// 리스크 게이트 스냅샷
    #[serde(default)]
    pub gate: GateSnapshot,
    /// 일별 순자산 이력 (날짜 오름차순)
    #[serde(default)]
    pub history: Vec<EquityPoint>,
    /// 전체 체결 이력
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
}

impl PaperAccount {
    /// 초기 자본금으로 신규 계좌를 만듭니다.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            as_of: None,
            cash: initial_capital,
            positions: HashMap::new(),
            equity_peak: initial_capital,
            gate: GateSnapshot::default(),
            history: Vec::new(),
            trades: Vec::new(),
        }
    }

    /// 특정 심볼의 보유 주수 (없으면 0)
    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    /// 기준일 종가로 평가한 총 순자산 (현금 + 포지션 평가액)
    ///
    /// 가격을 찾을 수 없는 보유 종목은 평가에서 조용히 제외됩니다.
    /// 유니버스 교체 후 남은 구 종목이 여기에 해당합니다.
    pub fn total_equity(&self, series: &HashMap<String, PriceSeries>, date: NaiveDate) -> Decimal {
        let mut equity = self.cash;
        for (symbol, shares) in &self.positions {
            if let Some(price) = series.get(symbol).and_then(|s| s.close_asof(date)) {
                equity += Decimal::from(*shares) * price;
            }
        }
        equity
    }

    /// 순자산 이력에 한 점을 기록합니다.
    ///
    /// 같은 날짜가 이미 있으면 값을 교체하고, 없으면 날짜 순서를 유지하며
    /// 삽입합니다. 백필을 여러 번 돌려도 이력이 중복되지 않습니다.
    pub fn record_equity(&mut self, date: NaiveDate, equity: Decimal) {
        match self.history.binary_search_by_key(&date, |p| p.date) {
            Ok(idx) => self.history[idx].equity = equity,
            Err(idx) => self.history.insert(idx, EquityPoint::new(date, equity)),
        }
    }
}

// ============================================================
// 테스트
// ============================================================
