//! 백테스트 성과 지표.
//!
//! 순자산 곡선과 리밸런스 기록에서 수익률/위험/비용 지표를 계산합니다.
//! 데이터 부족으로 정의되지 않는 지표는 `None`으로 표현합니다.

use rotor_core::EquityPoint;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::engine::RebalanceRecord;

/// 연간 거래일 수 (연율화 계산에 사용)
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// 백테스트 성과 지표 모음.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestStats {
    /// 시뮬레이션 거래일 수
    pub trading_days: usize,
    /// 리밸런스 횟수
    pub rebalance_count: usize,
    /// 최종 순자산
    pub final_equity: Decimal,
    /// 총 수익률 (최종/초기 - 1)
    pub total_return: Decimal,
    /// 연율화 수익률: (최종/초기)^(252/거래일) - 1
    pub cagr: Option<Decimal>,
    /// 최대 낙폭 (음수, 예: -0.25 = 고점 대비 25% 하락)
    pub max_drawdown: Decimal,
    /// 샤프 비율: sqrt(252) * 일일 수익률 평균 / 표본 표준편차
    pub sharpe: Option<Decimal>,
    /// 주간 평균 편도 회전율
    pub avg_weekly_turnover_oneway: Option<Decimal>,
    /// 총 추정 비용
    pub estimated_total_cost: Decimal,
    /// 초기 자본 대비 총 비용 비율
    pub estimated_cost_pct_initial: Decimal,
    /// 총 약정 금액 대비 비용 비율
    pub estimated_cost_over_gross_trade: Option<Decimal>,
}

impl BacktestStats {
    /// 순자산 곡선만으로 계산 가능한 지표를 채웁니다.
    ///
    /// 리밸런스 기록이 없는 경로(페이퍼 리포트 재생성 등)에서 사용하며,
    /// 회전율/비용 지표는 비워 둡니다.
    pub fn from_equity_only(curve: &[EquityPoint]) -> Self {
        let first = curve.first().map(|p| p.equity).unwrap_or(Decimal::ZERO);
        let last = curve.last().map(|p| p.equity).unwrap_or(Decimal::ZERO);
        let total_return = if first > Decimal::ZERO {
            last / first - Decimal::ONE
        } else {
            Decimal::ZERO
        };
        let returns = daily_returns(curve);

        Self {
            trading_days: curve.len(),
            rebalance_count: 0,
            final_equity: last,
            total_return,
            cagr: annualized_growth(first, last, curve.len()),
            max_drawdown: max_drawdown(curve),
            sharpe: sharpe_ratio(&returns),
            avg_weekly_turnover_oneway: None,
            estimated_total_cost: Decimal::ZERO,
            estimated_cost_pct_initial: Decimal::ZERO,
            estimated_cost_over_gross_trade: None,
        }
    }

    /// 곡선과 리밸런스 기록으로 전체 지표를 계산합니다.
    pub fn from_curve(
        curve: &[EquityPoint],
        rebalances: &[RebalanceRecord],
        initial_capital: Decimal,
    ) -> Self {
        let mut stats = Self::from_equity_only(curve);
        stats.rebalance_count = rebalances.len();

        if !rebalances.is_empty() {
            let turnover_sum: Decimal = rebalances.iter().map(|r| r.turnover_oneway).sum();
            stats.avg_weekly_turnover_oneway =
                Some(turnover_sum / Decimal::from(rebalances.len()));
        }

        let total_cost: Decimal = rebalances.iter().map(|r| r.estimated_cost).sum();
        stats.estimated_total_cost = total_cost;
        if initial_capital > Decimal::ZERO {
            stats.estimated_cost_pct_initial = total_cost / initial_capital;
        }

        let gross: Decimal = rebalances.iter().map(|r| r.gross_trade_value).sum();
        if gross > Decimal::ZERO {
            stats.estimated_cost_over_gross_trade = Some(total_cost / gross);
        }

        stats
    }
}

/// 일일 수익률 (직전 값이 0 이하인 구간은 건너뜀).
fn daily_returns(curve: &[EquityPoint]) -> Vec<Decimal> {
    curve
        .windows(2)
        .filter_map(|w| {
            if w[0].equity > Decimal::ZERO {
                Some(w[1].equity / w[0].equity - Decimal::ONE)
            } else {
                None
            }
        })
        .collect()
}

/// 최대 낙폭을 음수로 반환합니다 (0이면 낙폭 없음).
fn max_drawdown(curve: &[EquityPoint]) -> Decimal {
    let mut worst = Decimal::ZERO;
    let mut peak = Decimal::ZERO;
    for point in curve {
        peak = peak.max(point.equity);
        if peak > Decimal::ZERO {
            let dd = point.equity / peak - Decimal::ONE;
            worst = worst.min(dd);
        }
    }
    worst
}

/// 연율화 수익률: (last/first)^(252/days) - 1.
///
/// 분수 거듭제곱은 Decimal에 없어 f64 왕복으로 계산합니다.
/// 표시용 지표이므로 부동소수 오차는 허용합니다.
fn annualized_growth(first: Decimal, last: Decimal, days: usize) -> Option<Decimal> {
    if days == 0 || first <= Decimal::ZERO {
        return None;
    }
    let ratio = (last / first).to_f64()?;
    if ratio <= 0.0 {
        return None;
    }
    let exponent = f64::from(TRADING_DAYS_PER_YEAR) / days as f64;
    Decimal::from_f64(ratio.powf(exponent) - 1.0)
}

/// 샤프 비율: sqrt(252) * mean / std (표본 표준편차, ddof=1).
///
/// 수익률이 2개 미만이거나 변동이 전혀 없으면 `None`.
fn sharpe_ratio(returns: &[Decimal]) -> Option<Decimal> {
    if returns.len() < 2 {
        return None;
    }

    let n = Decimal::from(returns.len());
    let mean = returns.iter().copied().sum::<Decimal>() / n;
    let variance = returns
        .iter()
        .map(|r| (*r - mean) * (*r - mean))
        .sum::<Decimal>()
        / (n - Decimal::ONE);
    let std_dev = decimal_sqrt(variance);
    if std_dev <= Decimal::ZERO {
        return None;
    }

    Some(mean / std_dev * decimal_sqrt(Decimal::from(TRADING_DAYS_PER_YEAR)))
}

/// Decimal 제곱근 (뉴턴 방법, 최대 50회 반복).
fn decimal_sqrt(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut guess = value / Decimal::TWO;
    let precision = Decimal::new(1, 10);

    for _ in 0..50 {
        let next_guess = (guess + value / guess) / Decimal::TWO;
        if (next_guess - guess).abs() < precision {
            return next_guess;
        }
        guess = next_guess;
    }

    guess
}
