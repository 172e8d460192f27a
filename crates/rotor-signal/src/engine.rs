//! 주간 로테이션 신호 엔진.
//!
//! 점수 계산, 승자 선택, 목표 비중 산출을 하나의 평가로 묶습니다.
//! 게이트 상태 전이는 호출자(백테스트/페이퍼 엔진)가 먼저 수행하고,
//! 결정된 상태를 입력으로 넘깁니다.

use std::collections::HashMap;

use chrono::NaiveDate;
use rotor_core::config::{AllocationConfig, SignalConfig};
use rotor_core::domain::{PriceSeries, RiskState, WeeklySignal};
use rotor_core::types::Weight;
use rust_decimal::Decimal;
use tracing::info;

use crate::score::score_universe;
use crate::weights::{pick_winner, target_weights};

/// 리밸런스 한 번에 대한 평가 결과.
#[derive(Debug, Clone)]
pub struct RotationDecision {
    /// 신호 레코드 (랭킹, 승자, 상태, 낙폭)
    pub signal: WeeklySignal,
    /// 심볼별 목표 비중
    pub target_weights: HashMap<String, Weight>,
}

/// 신호 기준일 하나를 평가하는 엔진.
#[derive(Debug, Clone)]
pub struct RotationSignalEngine {
    signal: SignalConfig,
    allocation: AllocationConfig,
}

impl RotationSignalEngine {
    pub fn new(signal: SignalConfig, allocation: AllocationConfig) -> Self {
        Self { signal, allocation }
    }

    /// 신호 기준일의 랭킹과 목표 비중을 계산합니다.
    ///
    /// 점수 계산 가능한 자산이 하나도 없으면 첫 번째 주식형 ETF를
    /// 폴백 승자로 사용합니다.
    pub fn evaluate(
        &self,
        series: &HashMap<String, PriceSeries>,
        equity_etfs: &[String],
        defensive_etf: &str,
        signal_date: NaiveDate,
        state: RiskState,
        drawdown: Decimal,
    ) -> RotationDecision {
        let board = score_universe(series, equity_etfs, signal_date, &self.signal);

        let fallback = equity_etfs
            .first()
            .map(String::as_str)
            .unwrap_or(defensive_etf);
        let winner = pick_winner(&board, fallback);
        let weights = target_weights(state, &winner, defensive_etf, &self.allocation);

        info!(
            %signal_date,
            %state,
            winner = %winner,
            %drawdown,
            "주간 신호 평가"
        );

        RotationDecision {
            signal: WeeklySignal {
                signal_date,
                scores: board,
                selected: winner,
                state,
                drawdown,
            },
            target_weights: weights,
        }
    }
}
